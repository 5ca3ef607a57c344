//! Catalog filtering: free-text search, category and price range.
//!
//! The full product list is filtered on every request; the catalog is small
//! enough that no index is kept. The three predicates are independent, so
//! [`CatalogFilter::apply`] gives the same result in any evaluation order.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::Price;

/// Label of the "all categories" choice.
pub const ALL_CATEGORIES: &str = "Visi";

/// Lower bound of the default price range, in euros.
pub const DEFAULT_MIN_PRICE: u32 = 0;

/// Upper bound of the default price range, in euros.
pub const DEFAULT_MAX_PRICE: u32 = 200;

/// Which category a listing is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategorySelector {
    /// No restriction.
    #[default]
    All,
    /// Exact category name.
    Named(String),
}

impl CategorySelector {
    /// Read a `category` query parameter.
    ///
    /// A missing or blank parameter, or the [`ALL_CATEGORIES`] label, selects
    /// every category.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => Self::All,
            Some(name) => Self::Named(name.to_owned()),
        }
    }

    /// The label shown in the category picker.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Named(name) => name,
        }
    }

    /// Whether `category` passes this selector.
    ///
    /// Case-sensitive, but surrounding whitespace in the stored category is
    /// ignored, the same way [`categories`] lists it.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == category.trim(),
        }
    }
}

/// Search, category and price criteria for a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    query: String,
    category: CategorySelector,
    min_price: Price,
    max_price: Price,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: CategorySelector::All,
            min_price: Price::from_euros(DEFAULT_MIN_PRICE),
            max_price: Price::from_euros(DEFAULT_MAX_PRICE),
        }
    }
}

impl CatalogFilter {
    /// Set the search text. Surrounding whitespace is ignored.
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        query.trim().clone_into(&mut self.query);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: CategorySelector) -> Self {
        self.category = category;
        self
    }

    /// Set the inclusive price range. Bounds given in the wrong order are
    /// swapped.
    #[must_use]
    pub fn with_price_range(mut self, min: Price, max: Price) -> Self {
        if min <= max {
            self.min_price = min;
            self.max_price = max;
        } else {
            self.min_price = max;
            self.max_price = min;
        }
        self
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn category(&self) -> &CategorySelector {
        &self.category
    }

    #[must_use]
    pub const fn min_price(&self) -> Price {
        self.min_price
    }

    #[must_use]
    pub const fn max_price(&self) -> Price {
        self.max_price
    }

    /// Case-insensitive substring match on name or description.
    #[must_use]
    pub fn matches_query(&self, product: &Product) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        product.name.to_lowercase().contains(&needle)
            || product.description.to_lowercase().contains(&needle)
    }

    #[must_use]
    pub fn matches_category(&self, product: &Product) -> bool {
        self.category.matches(&product.category)
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn matches_price(&self, product: &Product) -> bool {
        self.min_price <= product.price && product.price <= self.max_price
    }

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_query(product) && self.matches_category(product) && self.matches_price(product)
    }

    /// Products passing every predicate, in catalog order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    /// Whether the filter differs from the default listing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}

/// Category picker entries: [`ALL_CATEGORIES`] first, then each distinct
/// product category in first-seen order. Blank categories are skipped.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORIES.to_owned()];
    for product in products {
        let category = product.category.trim();
        if !category.is_empty() && !out.iter().any(|c| c == category) {
            out.push(category.to_owned());
        }
    }
    out
}
