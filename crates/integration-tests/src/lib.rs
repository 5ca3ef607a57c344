//! Integration tests for the Elida storefront.
//!
//! Each test starts the real router on an ephemeral port, backed by the
//! in-memory identity provider and document store, and drives it over HTTP
//! with a cookie-keeping client that does not follow redirects.
//!
//! ```bash
//! cargo test -p elida-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;

use elida_core::UserId;
use elida_storefront::app;
use elida_storefront::config::StorefrontConfig;
use elida_storefront::firebase::{
    DocumentStore, IdentityProvider, MemoryDocumentStore, MemoryIdentity,
};
use elida_storefront::services::AuthService;
use elida_storefront::state::AppState;
use reqwest::{Client, Response, StatusCode, header, redirect};
use serde_json::{Map, Value, json};

/// Products every test starts with.
///
/// `putos` has both variant axes, `rinkinys` costs more than the default
/// price ceiling and `pirstine` has a string price.
#[must_use]
pub fn fixture_products() -> Vec<(String, Map<String, Value>)> {
    let products = [
        (
            "losjonas",
            json!({
                "name": "Bronzinis losjonas",
                "category": "Losjonai",
                "price": 29.99,
                "description": "Lengvas losjonas natūraliam įdegiui. Savybės: greitai įsigeria. Naudojimas: tepkite ant švarios odos.",
                "imageurl": "https://cdn.elida.lt/losjonas.jpg",
            }),
        ),
        (
            "putos",
            json!({
                "name": "Įdegio putos",
                "category": "Putos",
                "price": 45,
                "description": "Putos tolygiam įdegiui.",
                "variants": { "sizes": ["100ml", "200ml"], "colors": ["Light", "Dark"] },
            }),
        ),
        (
            "rinkinys",
            json!({
                "name": "Premium rinkinys",
                "category": "Rinkiniai",
                "price": 249,
                "description": "Viskas profesionaliam įdegiui namuose.",
            }),
        ),
        (
            "pirstine",
            json!({
                "name": "Aplikavimo pirštinė",
                "category": "Priedai",
                "price": "9.50",
                "description": "Pirštinė tolygiam priemonių paskirstymui.",
            }),
        ),
    ];

    products
        .into_iter()
        .map(|(id, value)| match value {
            Value::Object(fields) => (id.to_string(), fields),
            _ => unreachable!("fixture products are objects"),
        })
        .collect()
}

/// Adjusts the backends before the server starts.
pub struct TestContextBuilder {
    identity: MemoryIdentity,
    store: MemoryDocumentStore,
}

impl TestContextBuilder {
    #[must_use]
    pub fn identity(mut self, f: impl FnOnce(MemoryIdentity) -> MemoryIdentity) -> Self {
        self.identity = f(self.identity);
        self
    }

    #[must_use]
    pub fn documents(
        mut self,
        collection: &str,
        documents: impl IntoIterator<Item = (String, Map<String, Value>)>,
    ) -> Self {
        self.store = self.store.with_documents(collection, documents);
        self
    }

    /// Start the storefront and return a context pointing at it.
    pub async fn spawn(self) -> TestContext {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let identity = Arc::new(self.identity);
        let store = Arc::new(self.store);
        let state = AppState::with_backends(
            StorefrontConfig::in_memory(base_url.clone()),
            Arc::clone(&identity) as Arc<dyn IdentityProvider>,
            Arc::clone(&store) as Arc<dyn DocumentStore>,
        );

        tokio::spawn(async move {
            axum::serve(
                listener,
                app(state).into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        TestContext {
            client: new_client(),
            base_url,
            identity,
            store,
        }
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

/// A running storefront and a browser-like client for it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub identity: Arc<MemoryIdentity>,
    pub store: Arc<MemoryDocumentStore>,
}

impl TestContext {
    /// Storefront with the fixture catalog and default backends.
    pub async fn new() -> Self {
        Self::builder().spawn().await
    }

    #[must_use]
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder {
            identity: MemoryIdentity::new(),
            store: MemoryDocumentStore::new().with_documents("products", fixture_products()),
        }
    }

    /// A second visitor with its own cookies.
    #[must_use]
    pub fn other_visitor(&self) -> Self {
        Self {
            client: new_client(),
            base_url: self.base_url.clone(),
            identity: Arc::clone(&self.identity),
            store: Arc::clone(&self.store),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{path}", self.base_url)
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET a page that must render, and return its body.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.unwrap()
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// POST a form that must redirect, and return the target.
    pub async fn post_redirect(&self, path: &str, form: &[(&str, &str)]) -> String {
        location(&self.post(path, form).await)
    }

    /// Create an account without touching this visitor's session.
    pub async fn register(&self, email: &str, password: &str) -> UserId {
        AuthService::new(self.identity.as_ref(), self.store.as_ref())
            .sign_up(email, password, password)
            .await
            .unwrap()
            .uid
    }

    /// Sign this visitor in through the form.
    pub async fn sign_in(&self, email: &str, password: &str) {
        let target = self
            .post_redirect("/signin", &[("email", email), ("password", password)])
            .await;
        assert_eq!(target, "/profile");
    }

    /// Number shown in the cart badge fragment.
    pub async fn cart_count(&self) -> u32 {
        let fragment = self.page("/cart/count").await;
        let start = fragment.find('>').unwrap() + 1;
        let end = fragment[start..].find('<').unwrap() + start;
        fragment[start..end].trim().parse().unwrap()
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    assert!(
        response.status().is_redirection(),
        "expected a redirect, got {}",
        response.status()
    );
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}
