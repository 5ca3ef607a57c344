//! Orders and bookings.
//!
//! Orders are written at checkout and read back on the profile page.
//! Bookings come from the external booking system and are only read.

use chrono::{SecondsFormat, Utc};
use elida_core::order::{sort_bookings_newest_first, sort_orders_newest_first};
use elida_core::{Booking, Cart, Order, OrderId, OrderStatus, ShippingAddress, UserId, ValidationError};
use secrecy::SecretString;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

use crate::firebase::{BackendError, Document, DocumentStore};

pub const ORDERS: &str = "orders";
pub const BOOKINGS: &str = "bookings";

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("order not found")]
    NotFound,

    #[error("order is {0} and can no longer be cancelled")]
    NotCancellable(OrderStatus),
}

/// A customer's purchase and appointment history.
///
/// Each list carries its own outcome so one failing query does not hide the
/// other.
#[derive(Debug)]
pub struct History {
    pub orders: Result<Vec<Order>, BackendError>,
    pub bookings: Result<Vec<Booking>, BackendError>,
}

/// Decode documents, skipping any that do not have the expected shape.
fn decode_all<T>(
    collection: &str,
    documents: Vec<Document>,
    decode: impl Fn(String, Value) -> Result<T, serde_json::Error>,
) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|Document { id, fields }| {
            decode(id.clone(), Value::Object(fields))
                .map_err(|e| {
                    tracing::warn!(collection, id = %id, error = %e, "Skipping malformed document");
                })
                .ok()
        })
        .collect()
}

/// Order and booking operations for one signed-in customer.
pub struct OrderService<'a> {
    store: &'a dyn DocumentStore,
    token: SecretString,
}

impl<'a> OrderService<'a> {
    /// `token` is the customer's ID token; every call is made as them.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, token: SecretString) -> Self {
        Self { store, token }
    }

    /// Place a pending order for the cart's contents.
    ///
    /// # Errors
    ///
    /// Validation errors for an empty cart or incomplete address, otherwise
    /// the backend error.
    #[instrument(skip(self, cart, address), fields(uid = %user_id))]
    pub async fn create_order(
        &self,
        user_id: &UserId,
        cart: &Cart,
        address: ShippingAddress,
    ) -> Result<Order, OrderError> {
        let mut order = Order::from_cart(user_id.clone(), cart, address, Utc::now())?;

        let fields = match serde_json::to_value(&order) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => return Err(BackendError::Parse(e).into()),
        };
        let id = self
            .store
            .create(ORDERS, fields, Some(&self.token))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create order");
                e
            })?;

        order.id = OrderId::new(id);
        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order)
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, BackendError> {
        let documents = self
            .store
            .query_eq(ORDERS, "userId", &Value::from(user_id.as_str()), Some(&self.token))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch orders");
                e
            })?;

        let mut orders = decode_all(ORDERS, documents, |id, value| Order::from_document(id, value));
        sort_orders_newest_first(&mut orders);
        Ok(orders)
    }

    /// The customer's bookings, latest appointment first.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_user_bookings(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Booking>, BackendError> {
        let documents = self
            .store
            .query_eq(BOOKINGS, "userId", &Value::from(user_id.as_str()), Some(&self.token))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch bookings");
                e
            })?;

        let mut bookings =
            decode_all(BOOKINGS, documents, |id, value| Booking::from_document(id, value));
        sort_bookings_newest_first(&mut bookings);
        Ok(bookings)
    }

    /// Orders and bookings, queried concurrently.
    pub async fn history(&self, user_id: &UserId) -> History {
        let (orders, bookings) = tokio::join!(
            self.fetch_user_orders(user_id),
            self.fetch_user_bookings(user_id)
        );
        History { orders, bookings }
    }

    /// One order, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Backend errors, or a malformed stored order.
    #[instrument(skip(self))]
    pub async fn fetch_order_by_id(&self, id: &str) -> Result<Option<Order>, BackendError> {
        let document = self
            .store
            .get(ORDERS, id, Some(&self.token))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch order");
                e
            })?;

        document
            .map(|doc| Order::from_document(doc.id, Value::Object(doc.fields)))
            .transpose()
            .map_err(BackendError::Parse)
    }

    /// An order that belongs to `user_id`. Someone else's order is reported
    /// as missing.
    ///
    /// # Errors
    ///
    /// [`OrderError::NotFound`] if missing or not theirs, else backend errors.
    pub async fn fetch_owned_order(&self, user_id: &UserId, id: &str) -> Result<Order, OrderError> {
        match self.fetch_order_by_id(id).await? {
            Some(order) if &order.user_id == user_id => Ok(order),
            _ => Err(OrderError::NotFound),
        }
    }

    /// Set an order's status and bump `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        let mut fields = Map::new();
        fields.insert("status".to_string(), Value::from(status.as_str()));
        fields.insert(
            "updatedAt".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        self.store
            .merge(ORDERS, id, fields, Some(&self.token))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to update order status");
                e
            })
    }

    /// Cancel the customer's own pending order.
    ///
    /// # Errors
    ///
    /// [`OrderError::NotFound`] for a missing or foreign order,
    /// [`OrderError::NotCancellable`] once it has left `pending`.
    pub async fn cancel_order(&self, user_id: &UserId, id: &str) -> Result<(), OrderError> {
        let order = self.fetch_owned_order(user_id, id).await?;
        if !order.status.is_cancellable() {
            return Err(OrderError::NotCancellable(order.status));
        }
        self.update_order_status(id, OrderStatus::Cancelled).await?;
        tracing::info!(order_id = id, "Order cancelled");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use elida_core::{Product, VariantSelection};
    use serde_json::json;

    use super::*;
    use crate::firebase::MemoryDocumentStore;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn service(store: &MemoryDocumentStore) -> OrderService<'_> {
        OrderService::new(store, SecretString::from("token"))
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Ona Onaitė".to_string(),
            address: "Gedimino pr. 1".to_string(),
            city: "Vilnius".to_string(),
            postal_code: "01103".to_string(),
            country: "Lietuva".to_string(),
        }
    }

    fn cart() -> Cart {
        let product = Product::from_document(
            "p1",
            &fields(json!({ "name": "Losjonas", "price": 19.99 })),
        );
        let mut cart = Cart::default();
        cart.add(&product, VariantSelection::default(), 2).unwrap();
        cart
    }

    fn order_doc(user: &str, created: &str, status: &str) -> Map<String, Value> {
        fields(json!({
            "userId": user,
            "items": [{ "productId": "p1", "quantity": 1, "price": 10.0, "name": "Losjonas" }],
            "total": 10.0,
            "status": status,
            "createdAt": created,
            "updatedAt": created,
        }))
    }

    fn booking_doc(user: &str, date: &str, time: &str) -> Map<String, Value> {
        fields(json!({ "userId": user, "date": date, "time": time, "status": "confirmed" }))
    }

    #[tokio::test]
    async fn test_create_order_is_pending_and_readable() {
        let store = MemoryDocumentStore::new();
        let orders = service(&store);
        let uid = UserId::new("uid-1");

        let placed = orders.create_order(&uid, &cart(), address()).await.unwrap();
        assert_eq!(placed.status, OrderStatus::Pending);

        let stored = orders.fetch_order_by_id(placed.id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.user_id, uid);
        assert_eq!(stored.total, placed.total);
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.shipping_address.city, "Vilnius");
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty_cart() {
        let store = MemoryDocumentStore::new();
        let err = service(&store)
            .create_order(&UserId::new("uid-1"), &Cart::default(), address())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(ValidationError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_history_sorted_newest_first() {
        let store = MemoryDocumentStore::new()
            .with_documents(
                ORDERS,
                [
                    ("o1".to_string(), order_doc("uid-1", "2024-01-01T10:00:00Z", "completed")),
                    ("o2".to_string(), order_doc("uid-1", "2024-03-01T10:00:00Z", "pending")),
                    ("o3".to_string(), order_doc("uid-2", "2024-05-01T10:00:00Z", "pending")),
                ],
            )
            .with_documents(
                BOOKINGS,
                [
                    ("b1".to_string(), booking_doc("uid-1", "2024-01-01", "10:00")),
                    ("b2".to_string(), booking_doc("uid-1", "2024-03-01", "09:00")),
                    ("b3".to_string(), booking_doc("uid-1", "2024-03-01", "15:30")),
                ],
            );

        let history = service(&store).history(&UserId::new("uid-1")).await;
        let orders = history.orders.unwrap();
        assert_eq!(
            orders.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
            ["o2", "o1"]
        );
        let bookings = history.bookings.unwrap();
        assert_eq!(
            bookings.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(),
            ["b3", "b2", "b1"]
        );
    }

    #[tokio::test]
    async fn test_one_failing_list_does_not_hide_the_other() {
        let store = MemoryDocumentStore::new().with_documents(
            BOOKINGS,
            [("b1".to_string(), booking_doc("uid-1", "2024-01-01", "10:00"))],
        );
        store.fail_collection(ORDERS).await;

        let history = service(&store).history(&UserId::new("uid-1")).await;
        assert!(history.orders.is_err());
        assert_eq!(history.bookings.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_order_is_skipped() {
        let store = MemoryDocumentStore::new().with_documents(
            ORDERS,
            [
                ("o1".to_string(), order_doc("uid-1", "2024-01-01T10:00:00Z", "pending")),
                ("bad".to_string(), fields(json!({ "userId": "uid-1", "total": "x" }))),
            ],
        );
        let orders = service(&store)
            .fetch_user_orders(&UserId::new("uid-1"))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_only_own_pending_order() {
        let store = MemoryDocumentStore::new().with_documents(
            ORDERS,
            [
                ("o1".to_string(), order_doc("uid-1", "2024-01-01T10:00:00Z", "pending")),
                ("o2".to_string(), order_doc("uid-1", "2024-01-02T10:00:00Z", "processing")),
                ("o3".to_string(), order_doc("uid-2", "2024-01-03T10:00:00Z", "pending")),
            ],
        );
        let orders = service(&store);
        let uid = UserId::new("uid-1");

        orders.cancel_order(&uid, "o1").await.unwrap();
        let cancelled = orders.fetch_order_by_id("o1").await.unwrap().unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        assert!(matches!(
            orders.cancel_order(&uid, "o2").await,
            Err(OrderError::NotCancellable(OrderStatus::Processing))
        ));
        assert!(matches!(orders.cancel_order(&uid, "o3").await, Err(OrderError::NotFound)));
        assert!(matches!(orders.cancel_order(&uid, "nope").await, Err(OrderError::NotFound)));
    }
}
