//! Cart and wishlist state.
//!
//! Both are plain values owned by a visitor's session. The storefront loads
//! them, applies one mutation, and writes them back; nothing here does I/O.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{Price, ProductId};

/// Upper bound on a single line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product has variants and one of them was not chosen.
    #[error("Prašome pasirinkti dydį ir spalvą")]
    MissingVariant,
    /// A chosen label is not offered by the product.
    #[error("Pasirinktas variantas neegzistuoja")]
    UnknownVariant,
    /// No line with the given id.
    #[error("Prekė krepšelyje nerasta")]
    LineNotFound,
}

/// The size and color a customer picked. Blank input counts as no choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSelection {
    pub size: Option<String>,
    pub color: Option<String>,
}

impl VariantSelection {
    #[must_use]
    pub fn new(size: Option<&str>, color: Option<&str>) -> Self {
        fn clean(value: Option<&str>) -> Option<String> {
            value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
        }
        Self {
            size: clean(size),
            color: clean(color),
        }
    }

    /// Check the selection against a product's variant axes.
    ///
    /// Every axis the product declares must have a choice, and the choice must
    /// be one of that axis' labels. Choices on undeclared axes are dropped.
    ///
    /// # Errors
    ///
    /// [`CartError::MissingVariant`] when a declared axis has no choice,
    /// [`CartError::UnknownVariant`] when a choice is not offered.
    pub fn validate_for(self, product: &Product) -> Result<Self, CartError> {
        Ok(Self {
            size: check_axis(product.sizes(), self.size)?,
            color: check_axis(product.colors(), self.color)?,
        })
    }
}

fn check_axis(labels: &[String], choice: Option<String>) -> Result<Option<String>, CartError> {
    if labels.is_empty() {
        return Ok(None);
    }
    match choice {
        None => Err(CartError::MissingVariant),
        Some(choice) if labels.contains(&choice) => Ok(Some(choice)),
        Some(_) => Err(CartError::UnknownVariant),
    }
}

/// One cart line: a product snapshot with a quantity and variant choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartItem {
    /// Stable key of the line, used by the update and remove forms.
    #[must_use]
    pub fn line_id(&self) -> String {
        line_id(&self.product.id, self.size.as_deref(), self.color.as_deref())
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }

    fn same_line(&self, id: &ProductId, selection: &VariantSelection) -> bool {
        self.product.id == *id && self.size == selection.size && self.color == selection.color
    }
}

/// Build a line key from its parts.
#[must_use]
pub fn line_id(product_id: &ProductId, size: Option<&str>, color: Option<&str>) -> String {
    format!(
        "{}|{}|{}",
        product_id,
        size.unwrap_or_default(),
        color.unwrap_or_default()
    )
}

/// A visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` of a product.
    ///
    /// Adding a line that is already in the cart increases its quantity.
    /// Quantities are capped at [`MAX_LINE_QUANTITY`]; a zero quantity adds
    /// one.
    ///
    /// # Errors
    ///
    /// Fails when the variant selection is incomplete or invalid; the cart is
    /// left unchanged.
    pub fn add(
        &mut self,
        product: &Product,
        selection: VariantSelection,
        quantity: u32,
    ) -> Result<(), CartError> {
        let selection = selection.validate_for(product)?;
        let quantity = quantity.max(1);

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.same_line(&product.id, &selection))
        {
            item.quantity = item.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            return Ok(());
        }

        self.items.push(CartItem {
            product: product.clone(),
            quantity: quantity.min(MAX_LINE_QUANTITY),
            size: selection.size,
            color: selection.color,
        });
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// [`CartError::LineNotFound`] if no line has that id.
    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return if self.remove(line_id) {
                Ok(())
            } else {
                Err(CartError::LineNotFound)
            };
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.line_id() == line_id)
            .ok_or(CartError::LineNotFound)?;
        item.quantity = quantity.min(MAX_LINE_QUANTITY);
        Ok(())
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&mut self, line_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.line_id() != line_id);
        self.items.len() != before
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all lines, shown in the header badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A visitor's wishlist of product snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<Product>,
}

impl Wishlist {
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|p| p.id == *id)
    }

    /// Add the product if absent, remove it if present.
    ///
    /// Returns whether the product is wishlisted afterwards.
    pub fn toggle(&mut self, product: &Product) -> bool {
        if self.contains(&product.id) {
            self.items.retain(|p| p.id != product.id);
            false
        } else {
            self.items.push(product.clone());
            true
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn product(id: &str, extra: Value) -> Product {
        let mut data = json!({ "name": format!("Produktas {id}"), "price": "10.00" });
        if let (Some(data), Some(extra)) = (data.as_object_mut(), extra.as_object()) {
            data.extend(extra.clone());
        }
        Product::from_document(id, data.as_object().unwrap())
    }

    fn with_variants(id: &str) -> Product {
        product(
            id,
            json!({ "variants": { "sizes": ["100ml", "200ml"], "colors": ["Auksinė", "Bronzinė"] } }),
        )
    }

    #[test]
    fn test_variant_product_requires_both_choices() {
        let selections = [
            (None, None),
            (Some("100ml"), None),
            (None, Some("Auksinė")),
            (Some(""), Some("Auksinė")),
            (Some("100ml"), Some("  ")),
        ];
        for id in ["a", "b", "c"] {
            let product = with_variants(id);
            for (size, color) in selections {
                let mut cart = Cart::default();
                let result = cart.add(&product, VariantSelection::new(size, color), 1);
                assert_eq!(result, Err(CartError::MissingVariant), "{size:?} {color:?}");
                assert!(cart.is_empty());
            }

            let mut cart = Cart::default();
            cart.add(&product, VariantSelection::new(Some("200ml"), Some("Bronzinė")), 1)
                .unwrap();
            assert_eq!(cart.item_count(), 1);
        }
    }

    #[test]
    fn test_plain_product_always_accepted() {
        let selections = [(None, None), (Some("100ml"), None), (Some("x"), Some("y"))];
        for id in ["a", "b"] {
            let product = product(id, json!({}));
            for (size, color) in selections {
                let mut cart = Cart::default();
                cart.add(&product, VariantSelection::new(size, color), 1).unwrap();
                assert_eq!(cart.items()[0].size, None);
                assert_eq!(cart.items()[0].color, None);
            }
        }
    }

    #[test]
    fn test_single_axis_product_requires_only_that_axis() {
        let product = product("s", json!({ "variants": { "sizes": ["50ml"] } }));
        let mut cart = Cart::default();
        cart.add(&product, VariantSelection::new(Some("50ml"), None), 1)
            .unwrap();
        assert_eq!(cart.items()[0].line_id(), "s|50ml|");
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let product = with_variants("a");
        let mut cart = Cart::default();
        let result = cart.add(&product, VariantSelection::new(Some("1l"), Some("Auksinė")), 1);
        assert_eq!(result, Err(CartError::UnknownVariant));
    }

    #[test]
    fn test_same_line_increments_quantity() {
        let product = with_variants("a");
        let mut cart = Cart::default();
        let pick = || VariantSelection::new(Some("100ml"), Some("Auksinė"));
        cart.add(&product, pick(), 1).unwrap();
        cart.add(&product, pick(), 2).unwrap();
        cart.add(&product, VariantSelection::new(Some("200ml"), Some("Auksinė")), 1)
            .unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.total(), Price::from_euros(40));
    }

    #[test]
    fn test_huge_catalog_price_does_not_break_totals() {
        let product = product("brangus", json!({ "price": "5e28" }));
        let mut cart = Cart::default();
        cart.add(&product, VariantSelection::new(None, None), 2).unwrap();

        assert_eq!(cart.items()[0].line_total(), Price::from_euros(2_000_000));
        assert_eq!(cart.total(), Price::from_euros(2_000_000));
    }

    #[test]
    fn test_update_and_remove() {
        let product = product("p", json!({}));
        let mut cart = Cart::default();
        cart.add(&product, VariantSelection::default(), 1).unwrap();
        let line = cart.items()[0].line_id();

        cart.update_quantity(&line, 5).unwrap();
        assert_eq!(cart.item_count(), 5);

        cart.update_quantity(&line, 500).unwrap();
        assert_eq!(cart.item_count(), MAX_LINE_QUANTITY);

        cart.update_quantity(&line, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.update_quantity(&line, 1), Err(CartError::LineNotFound));
        assert!(!cart.remove(&line));
    }

    #[test]
    fn test_wishlist_double_toggle_restores_state() {
        let first = product("w1", json!({}));
        let second = product("w2", json!({}));
        let mut wishlist = Wishlist::default();
        wishlist.toggle(&first);
        let before = wishlist.clone();

        assert!(wishlist.toggle(&second));
        assert!(wishlist.contains(&second.id));
        assert!(!wishlist.toggle(&second));
        assert_eq!(wishlist, before);

        assert!(!wishlist.toggle(&first));
        assert!(wishlist.is_empty());
    }
}
