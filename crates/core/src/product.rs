//! Product model and document normalization.
//!
//! Product documents are written by hand in the database console, so every
//! field is optional on read. [`Product::from_document`] fills the gaps so the
//! rest of the storefront can rely on a complete value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::describe::{self, DescriptionSections};
use crate::types::{Price, ProductId};

/// Image shown when a product document has none.
pub const DEFAULT_PRODUCT_IMAGE: &str = "/static/images/elida-logo.svg";

/// Selectable variant axes of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variants {
    /// Color labels, e.g. `["Auksinė", "Bronzinė"]`.
    #[serde(default)]
    pub colors: Vec<String>,
    /// Size labels, e.g. `["100ml", "200ml"]`.
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl Variants {
    /// Read the `variants` map of a document.
    ///
    /// Non-string labels are skipped. Returns `None` when no axis has labels.
    #[must_use]
    pub fn from_document(value: Option<&Value>) -> Option<Self> {
        let map = value?.as_object()?;
        let variants = Self {
            colors: string_list(map.get("colors")),
            sizes: string_list(map.get("sizes")),
        };
        if variants.is_empty() {
            None
        } else {
            Some(variants)
        }
    }

    /// Whether neither axis has any label.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.sizes.is_empty()
    }
}

/// A catalog product after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Price,
    pub sku: String,
    pub image_url: String,
    pub variants: Option<Variants>,
    pub features: Option<Vec<String>>,
}

impl Product {
    /// Normalize a raw `products` document.
    ///
    /// - missing text fields become empty strings
    /// - the price goes through [`Price::from_document`]
    /// - the image comes from `imageurl`, then the older `image` field, then
    ///   [`DEFAULT_PRODUCT_IMAGE`]
    #[must_use]
    pub fn from_document(id: impl Into<ProductId>, data: &Map<String, Value>) -> Self {
        let image_url = ["imageurl", "image"]
            .iter()
            .map(|key| text_field(data, key))
            .find(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string());

        let features = Some(string_list(data.get("features"))).filter(|f| !f.is_empty());

        Self {
            id: id.into(),
            name: text_field(data, "name"),
            category: text_field(data, "category"),
            description: text_field(data, "description"),
            price: Price::from_document(data.get("price")),
            sku: text_field(data, "sku"),
            image_url,
            variants: Variants::from_document(data.get("variants")),
            features,
        }
    }

    /// Whether the product has selectable variants.
    #[must_use]
    pub const fn has_variants(&self) -> bool {
        self.variants.is_some()
    }

    /// Color labels, empty when the product has none.
    #[must_use]
    pub fn colors(&self) -> &[String] {
        self.variants.as_ref().map_or(&[], |v| v.colors.as_slice())
    }

    /// Size labels, empty when the product has none.
    #[must_use]
    pub fn sizes(&self) -> &[String] {
        self.variants.as_ref().map_or(&[], |v| v.sizes.as_slice())
    }

    /// Feature bullets, empty when the product has none.
    #[must_use]
    pub fn feature_list(&self) -> &[String] {
        self.features.as_deref().unwrap_or(&[])
    }

    /// The description split into display buckets.
    #[must_use]
    pub fn description_sections(&self) -> DescriptionSections {
        describe::categorize(&self.description)
    }
}

fn text_field(data: &Map<String, Value>, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
