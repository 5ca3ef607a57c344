//! Access to the Firebase backend: identity and document database.
//!
//! # Architecture
//!
//! - Firebase is the source of truth - no local persistence, direct REST calls
//! - Two traits, [`IdentityProvider`] and [`DocumentStore`], hide the wire
//!   format from the rest of the storefront
//! - REST clients ([`FirebaseIdentity`], [`FirestoreClient`]) talk to the real
//!   project; in-memory backends ([`MemoryIdentity`], [`MemoryDocumentStore`])
//!   serve tests and `STOREFRONT_BACKEND=memory`
//!
//! Documents cross the trait boundary as plain JSON. The typed Firestore
//! value format lives in [`value`].

mod error;
mod firestore;
mod identity;
mod memory;
pub mod value;

use std::time::Duration;

use async_trait::async_trait;
use elida_core::UserId;
use secrecy::SecretString;
use serde_json::{Map, Value};

pub use error::{BackendError, IdentityError, ProviderErrorCode};
pub use firestore::FirestoreClient;
pub use identity::FirebaseIdentity;
pub use memory::{MemoryDocumentStore, MemoryIdentity};

/// A document read from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key within its collection.
    pub id: String,
    /// Decoded fields.
    pub fields: Map<String, Value>,
}

/// Document database operations used by the storefront.
///
/// Calls made on behalf of a signed-in customer pass their ID token so that
/// security rules see the customer; catalog reads pass `None`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of a collection.
    async fn list(
        &self,
        collection: &str,
        auth: Option<&SecretString>,
    ) -> Result<Vec<Document>, BackendError>;

    /// One document, or `None` if it does not exist.
    async fn get(
        &self,
        collection: &str,
        id: &str,
        auth: Option<&SecretString>,
    ) -> Result<Option<Document>, BackendError>;

    /// Documents whose `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        auth: Option<&SecretString>,
    ) -> Result<Vec<Document>, BackendError>;

    /// Create a document with a generated key and return the key.
    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        auth: Option<&SecretString>,
    ) -> Result<String, BackendError>;

    /// Write only the given fields, creating the document if needed.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        auth: Option<&SecretString>,
    ) -> Result<(), BackendError>;
}

/// A signed-in identity returned by the provider.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    /// Lifetime of `id_token`.
    pub expires_in: Duration,
}

/// Tokens returned by a refresh.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub uid: UserId,
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_in: Duration,
}

/// First leg of the Google sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleAuthStart {
    /// Where to send the browser.
    pub auth_uri: String,
    /// Opaque flow id; must be presented again when finishing.
    pub session_id: String,
}

/// Identity operations used by the storefront.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Email/password sign-in.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError>;

    /// Create an email/password account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    /// Send a password reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// Change the display name of the token's account.
    async fn update_display_name(
        &self,
        id_token: &SecretString,
        display_name: &str,
    ) -> Result<(), IdentityError>;

    /// Exchange a refresh token for a new ID token.
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshedTokens, IdentityError>;

    /// Start a Google sign-in that returns to `continue_uri`.
    async fn start_google_sign_in(
        &self,
        continue_uri: &str,
    ) -> Result<GoogleAuthStart, IdentityError>;

    /// Finish a Google sign-in. `request_uri` is the full callback URL the
    /// browser came back to.
    async fn finish_google_sign_in(
        &self,
        request_uri: &str,
        session_id: &str,
    ) -> Result<AuthSession, IdentityError>;
}
