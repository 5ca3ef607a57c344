//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::fs;

use crate::config::{BackendConfig, StorefrontConfig};
use crate::firebase::{
    DocumentStore, FirebaseIdentity, FirestoreClient, IdentityProvider, MemoryDocumentStore,
    MemoryIdentity,
};
use crate::models::CurrentUser;
use crate::services::catalog::PRODUCTS;
use crate::services::{AuthService, CatalogService, OrderService};

/// Products loaded by the memory backend when no seed file is configured.
const DEFAULT_SEED: &str = include_str!("../seed/products.json");

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to read seed file {path}: {source}")]
    SeedRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid product seed: {0}")]
    SeedParse(#[from] serde_json::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backends, the catalog cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    catalog: CatalogService,
}

impl AppState {
    /// Build the backends named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend's product seed cannot be read.
    pub async fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let (identity, store): (Arc<dyn IdentityProvider>, Arc<dyn DocumentStore>) =
            match &config.backend {
                BackendConfig::Firebase(firebase) => (
                    Arc::new(FirebaseIdentity::new(firebase)),
                    Arc::new(FirestoreClient::new(firebase)),
                ),
                BackendConfig::Memory { seed_file } => {
                    let seed = match seed_file {
                        Some(path) => read_seed(path).await?,
                        None => DEFAULT_SEED.to_string(),
                    };
                    let products = parse_seed(&seed)?;
                    tracing::info!(products = products.len(), "Using in-memory backend");
                    (
                        Arc::new(MemoryIdentity::new()),
                        Arc::new(MemoryDocumentStore::new().with_documents(PRODUCTS, products)),
                    )
                }
            };

        Ok(Self::with_backends(config, identity, store))
    }

    /// Build state around already constructed backends.
    #[must_use]
    pub fn with_backends(
        config: StorefrontConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let catalog = CatalogService::new(Arc::clone(&store), config.catalog_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                store,
                catalog,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Auth operations over the configured identity provider.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.inner.identity.as_ref(), self.inner.store.as_ref())
    }

    /// Order operations made on behalf of `user`.
    #[must_use]
    pub fn orders(&self, user: &CurrentUser) -> OrderService<'_> {
        OrderService::new(self.inner.store.as_ref(), user.id_token())
    }
}

async fn read_seed(path: &Path) -> Result<String, StateError> {
    fs::read_to_string(path)
        .await
        .map_err(|source| StateError::SeedRead {
            path: path.display().to_string(),
            source,
        })
}

/// A seed file is a JSON object of product id to product document.
fn parse_seed(seed: &str) -> Result<Vec<(String, Map<String, Value>)>, StateError> {
    let documents: Map<String, Value> = serde_json::from_str(seed)?;
    Ok(documents
        .into_iter()
        .filter_map(|(id, value)| match value {
            Value::Object(fields) => Some((id, fields)),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seed_parses() {
        let products = parse_seed(DEFAULT_SEED).unwrap();
        assert!(products.len() >= 4);
    }

    #[test]
    fn test_seed_skips_non_objects() {
        let products = parse_seed(r#"{"a": {"name": "A"}, "b": 3}"#).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].0, "a");
    }

    #[tokio::test]
    async fn test_memory_state_serves_seeded_catalog() {
        let state = AppState::new(StorefrontConfig::in_memory("http://localhost:3000"))
            .await
            .unwrap();
        let products = state.catalog().fetch_products().await.unwrap();
        assert_eq!(products.len(), parse_seed(DEFAULT_SEED).unwrap().len());
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_reported() {
        let mut config = StorefrontConfig::in_memory("http://localhost:3000");
        config.backend = BackendConfig::Memory {
            seed_file: Some("/nonexistent/products.json".into()),
        };
        assert!(matches!(
            AppState::new(config).await,
            Err(StateError::SeedRead { .. })
        ));
    }
}
