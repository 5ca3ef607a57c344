//! Orders and bookings as stored in the document database.
//!
//! Field names follow the stored documents (camelCase), amounts are stored
//! as JSON numbers and timestamps as ISO-8601 strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{BookingId, BookingStatus, OrderId, OrderStatus, Price, ProductId, UserId};
use crate::validation::ValidationError;

/// Serialize a [`Price`] as a JSON number.
mod price_as_number {
    use rust_decimal::Decimal;
    use serde::{Deserializer, Serializer};

    use crate::types::Price;

    pub fn serialize<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&price.amount(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Price, D::Error> {
        let amount: Decimal = rust_decimal::serde::float::deserialize(deserializer)?;
        Ok(Price::new(amount))
    }
}

/// One purchased line, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at checkout.
    #[serde(with = "price_as_number")]
    pub price: Price,
    pub name: String,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Every field must be filled in.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyFields`] if any field is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            &self.name,
            &self.address,
            &self.city,
            &self.postal_code,
            &self.country,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ValidationError::EmptyFields);
        }
        Ok(())
    }
}

/// A customer order.
///
/// The document key is not part of the document body, so `id` is skipped by
/// serde and set by [`Order::from_document`] or after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip)]
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    #[serde(with = "price_as_number")]
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Turn a cart into a pending order placed at `now`.
    ///
    /// The cart's prices and names are copied, so later catalog edits do not
    /// change the order.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyCart`] for an empty cart, or the address'
    /// validation error.
    pub fn from_cart(
        user_id: UserId,
        cart: &Cart,
        shipping_address: ShippingAddress,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        shipping_address.validate()?;

        let items = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.product.id.clone(),
                quantity: item.quantity,
                price: item.product.price,
                name: item.product.name.clone(),
            })
            .collect();

        Ok(Self {
            id: OrderId::default(),
            user_id,
            items,
            total: cart.total(),
            status: OrderStatus::Pending,
            shipping_address,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decode a stored order document.
    ///
    /// # Errors
    ///
    /// Fails if a required field is missing or has the wrong shape.
    pub fn from_document(
        id: impl Into<OrderId>,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let mut order: Self = serde_json::from_value(data)?;
        order.id = id.into();
        Ok(order)
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// An appointment, written by the external booking system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(skip)]
    pub id: BookingId,
    pub user_id: UserId,
    pub date: NaiveDate,
    /// Local wall-clock time, e.g. `"14:30"`.
    pub time: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub service: Option<String>,
}

impl Booking {
    /// Decode a stored booking document.
    ///
    /// # Errors
    ///
    /// Fails if a required field is missing or has the wrong shape.
    pub fn from_document(
        id: impl Into<BookingId>,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let mut booking: Self = serde_json::from_value(data)?;
        booking.id = id.into();
        Ok(booking)
    }
}

/// Newest order first.
pub fn sort_orders_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Latest appointment first. Times are zero-padded `HH:MM`, so they
/// compare correctly as strings.
pub fn sort_bookings_newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| (b.date, &b.time).cmp(&(a.date, &a.time)));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cart::VariantSelection;
    use crate::product::Product;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Ona Onaitė".into(),
            address: "Gedimino pr. 1".into(),
            city: "Vilnius".into(),
            postal_code: "01103".into(),
            country: "Lietuva".into(),
        }
    }

    fn order_doc(created_at: &str) -> serde_json::Value {
        json!({
            "userId": "u1",
            "items": [{ "productId": "p1", "quantity": 2, "price": 12.5, "name": "Losjonas" }],
            "total": 25,
            "status": "processing",
            "shippingAddress": {
                "name": "Ona", "address": "Gatvė 1", "city": "Kaunas",
                "postalCode": "44000", "country": "Lietuva"
            },
            "createdAt": created_at,
            "updatedAt": created_at,
        })
    }

    #[test]
    fn test_order_from_document() {
        let order = Order::from_document("o1", order_doc("2024-03-01T10:00:00.000Z")).unwrap();
        assert_eq!(order.id.as_str(), "o1");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total, Price::from_euros(25));
        assert_eq!(order.items[0].line_total(), Price::from_euros(25));
        assert_eq!(order.shipping_address.postal_code, "44000");
        assert_eq!(order.item_count(), 2);
    }

    #[test]
    fn test_order_serializes_numbers_and_camel_case() {
        let order = Order::from_document("o1", order_doc("2024-03-01T10:00:00Z")).unwrap();
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["total"], json!(25.0));
        assert_eq!(value["items"][0]["price"], json!(12.5));
        assert_eq!(value["shippingAddress"]["postalCode"], "44000");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_orders_sort_newest_first() {
        let mut orders = vec![
            Order::from_document("old", order_doc("2024-01-01T00:00:00Z")).unwrap(),
            Order::from_document("new", order_doc("2024-03-01T00:00:00Z")).unwrap(),
        ];
        sort_orders_newest_first(&mut orders);
        assert_eq!(orders[0].id.as_str(), "new");
        assert_eq!(orders[1].id.as_str(), "old");
    }

    #[test]
    fn test_bookings_sort_newest_first() {
        let booking = |id: &str, date: &str, time: &str| {
            Booking::from_document(
                id,
                json!({ "userId": "u1", "date": date, "time": time, "status": "confirmed" }),
            )
            .unwrap()
        };
        let mut bookings = vec![
            booking("a", "2024-01-01", "10:00"),
            booking("b", "2024-03-01", "09:00"),
            booking("c", "2024-03-01", "15:30"),
        ];
        sort_bookings_newest_first(&mut bookings);
        let ids: Vec<_> = bookings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn test_from_cart() {
        let data = json!({ "name": "Losjonas", "price": "12.50" });
        let product = Product::from_document("p1", data.as_object().unwrap());
        let mut cart = Cart::default();
        cart.add(&product, VariantSelection::default(), 2).unwrap();

        let now = Utc::now();
        let order = Order::from_cart(UserId::new("u1"), &cart, address(), now).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Price::from_euros(25));
        assert_eq!(order.items[0].name, "Losjonas");
        assert_eq!(order.created_at, now);
        assert_eq!(order.updated_at, now);
    }

    #[test]
    fn test_from_cart_rejects_empty_cart_and_address() {
        let now = Utc::now();
        assert_eq!(
            Order::from_cart(UserId::new("u1"), &Cart::default(), address(), now),
            Err(ValidationError::EmptyCart)
        );

        let data = json!({ "name": "Losjonas", "price": 5 });
        let product = Product::from_document("p1", data.as_object().unwrap());
        let mut cart = Cart::default();
        cart.add(&product, VariantSelection::default(), 1).unwrap();
        let mut incomplete = address();
        incomplete.city = " ".into();
        assert_eq!(
            Order::from_cart(UserId::new("u1"), &cart, incomplete, now),
            Err(ValidationError::EmptyFields)
        );
    }
}
