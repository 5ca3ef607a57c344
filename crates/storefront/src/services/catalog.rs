//! Product catalog reads.
//!
//! Fetches `products` documents, normalizes them into [`Product`]s and keeps
//! the results in a `moka` cache for the configured TTL. A zero TTL turns the
//! cache off.

use std::sync::Arc;
use std::time::Duration;

use elida_core::Product;
use moka::future::Cache;
use rand::seq::IndexedRandom;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::firebase::{BackendError, Document, DocumentStore};

/// Collection holding the catalog.
pub const PRODUCTS: &str = "products";

/// Number of products on the home page.
pub const FEATURED_COUNT: usize = 4;

#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Catalog reads with an in-process cache.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    store: Arc<dyn DocumentStore>,
    cache: Option<Cache<String, CacheValue>>,
}

fn normalize(documents: Vec<Document>) -> Vec<Product> {
    documents
        .into_iter()
        .map(|doc| Product::from_document(doc.id, &doc.fields))
        .collect()
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .build()
        });

        Self {
            inner: Arc::new(CatalogServiceInner { store, cache }),
        }
    }

    async fn cached(&self, key: &str) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn remember(&self, key: String, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; nothing partial is returned.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Arc<Vec<Product>>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.cached("products").await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let documents = self.inner.store.list(PRODUCTS, None).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch products");
            e
        })?;
        let products = Arc::new(normalize(documents));

        self.remember("products".to_string(), CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// One product, or `None` if no document has that id.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_product_by_id(&self, id: &str) -> Result<Option<Product>, BackendError> {
        let cache_key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let document = self.inner.store.get(PRODUCTS, id, None).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch product");
            e
        })?;
        let Some(doc) = document else {
            return Ok(None);
        };

        let product = Product::from_document(doc.id, &doc.fields);
        self.remember(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(Some(product))
    }

    /// Products whose category equals `category`, queried server-side.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_products_by_category(
        &self,
        category: &str,
    ) -> Result<Arc<Vec<Product>>, BackendError> {
        let cache_key = format!("category:{category}");
        if let Some(CacheValue::Products(products)) = self.cached(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(products);
        }

        let documents = self
            .inner
            .store
            .query_eq(PRODUCTS, "category", &Value::from(category), None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch products by category");
                e
            })?;
        let products = Arc::new(normalize(documents));

        self.remember(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Up to [`FEATURED_COUNT`] products picked at random.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    pub async fn featured(&self) -> Result<Vec<Product>, BackendError> {
        let products = self.fetch_products().await?;
        Ok(products
            .choose_multiple(&mut rand::rng(), FEATURED_COUNT)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Map, json};

    use super::*;
    use crate::firebase::MemoryDocumentStore;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn store() -> Arc<MemoryDocumentStore> {
        Arc::new(MemoryDocumentStore::new().with_documents(
            PRODUCTS,
            [
                (
                    "p1".to_string(),
                    fields(json!({ "name": "Losjonas", "category": "Kremai", "price": "19.99" })),
                ),
                (
                    "p2".to_string(),
                    fields(json!({ "name": "Purškiklis", "category": "Purškikliai", "price": 24 })),
                ),
                (
                    "p3".to_string(),
                    fields(json!({ "name": "Putos", "category": "Kremai" })),
                ),
            ],
        ))
    }

    #[tokio::test]
    async fn test_fetch_products_normalizes() {
        let catalog = CatalogService::new(store(), Duration::ZERO);
        let products = catalog.fetch_products().await.unwrap();
        assert_eq!(products.len(), 3);

        let putos = products.iter().find(|p| p.id.as_str() == "p3").unwrap();
        assert!(putos.price.amount().is_zero());
    }

    #[tokio::test]
    async fn test_missing_product_is_none() {
        let catalog = CatalogService::new(store(), Duration::ZERO);
        assert!(catalog.fetch_product_by_id("nope").await.unwrap().is_none());
        assert_eq!(
            catalog.fetch_product_by_id("p1").await.unwrap().unwrap().name,
            "Losjonas"
        );
    }

    #[tokio::test]
    async fn test_category_query_is_exact() {
        let catalog = CatalogService::new(store(), Duration::ZERO);
        let kremai = catalog.fetch_products_by_category("Kremai").await.unwrap();
        assert_eq!(kremai.len(), 2);
        assert!(catalog.fetch_products_by_category("kremai").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_serves_until_ttl() {
        let store = store();
        let catalog = CatalogService::new(store.clone(), Duration::from_secs(300));
        assert_eq!(catalog.fetch_products().await.unwrap().len(), 3);

        store
            .insert(PRODUCTS, "p4", fields(json!({ "name": "Naujas" })))
            .await;
        assert_eq!(catalog.fetch_products().await.unwrap().len(), 3);

        let uncached = CatalogService::new(store, Duration::ZERO);
        assert_eq!(uncached.fetch_products().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failure_is_returned() {
        let store = store();
        store.fail_collection(PRODUCTS).await;
        let catalog = CatalogService::new(store, Duration::ZERO);
        assert!(matches!(
            catalog.fetch_products().await,
            Err(BackendError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_featured_picks_distinct_products() {
        let catalog = CatalogService::new(store(), Duration::ZERO);
        let featured = catalog.featured().await.unwrap();
        assert_eq!(featured.len(), 3);
        let mut ids: Vec<_> = featured.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }
}
