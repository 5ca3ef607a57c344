//! In-process backends for tests and local demos.
//!
//! State lives in `tokio` locks and is lost on restart. The identity backend
//! mimics the provider's refusal codes so the storefront's error mapping can
//! be exercised without a Firebase project.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use elida_core::{Email, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use url::Url;

use super::{
    AuthSession, BackendError, Document, DocumentStore, GoogleAuthStart, IdentityError,
    IdentityProvider, ProviderErrorCode, RefreshedTokens,
};

// =============================================================================
// Documents
// =============================================================================

type Collection = BTreeMap<String, Map<String, Value>>;

/// A document store held in memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    failing: RwLock<HashSet<String>>,
    next_id: AtomicU64,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection before the store is shared.
    #[must_use]
    pub fn with_documents(
        mut self,
        collection: &str,
        documents: impl IntoIterator<Item = (String, Map<String, Value>)>,
    ) -> Self {
        self.collections
            .get_mut()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        self
    }

    /// Insert or replace one document.
    pub async fn insert(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Make every call touching `collection` fail with a 503.
    pub async fn fail_collection(&self, collection: &str) {
        self.failing.write().await.insert(collection.to_string());
    }

    /// A stored document's fields, for assertions.
    pub async fn document(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    async fn check(&self, collection: &str) -> Result<(), BackendError> {
        if self.failing.read().await.contains(collection) {
            return Err(BackendError::Status {
                status: 503,
                message: format!("collection {collection} is unavailable"),
            });
        }
        Ok(())
    }
}

fn to_documents<'a>(docs: impl Iterator<Item = (&'a String, &'a Map<String, Value>)>) -> Vec<Document> {
    docs.map(|(id, fields)| Document {
        id: id.clone(),
        fields: fields.clone(),
    })
    .collect()
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(
        &self,
        collection: &str,
        _auth: Option<&SecretString>,
    ) -> Result<Vec<Document>, BackendError> {
        self.check(collection).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| to_documents(docs.iter()))
            .unwrap_or_default())
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
        _auth: Option<&SecretString>,
    ) -> Result<Option<Document>, BackendError> {
        self.check(collection).await?;
        Ok(self.document(collection, id).await.map(|fields| Document {
            id: id.to_string(),
            fields,
        }))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        _auth: Option<&SecretString>,
    ) -> Result<Vec<Document>, BackendError> {
        self.check(collection).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| to_documents(docs.iter().filter(|(_, f)| f.get(field) == Some(value))))
            .unwrap_or_default())
    }

    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        _auth: Option<&SecretString>,
    ) -> Result<String, BackendError> {
        self.check(collection).await?;
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("{collection}-{n:06}");
        self.insert(collection, &id, fields).await;
        Ok(id)
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        _auth: Option<&SecretString>,
    ) -> Result<(), BackendError> {
        self.check(collection).await?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default()
            .extend(fields);
        Ok(())
    }
}

// =============================================================================
// Identity
// =============================================================================

const MIN_PROVIDER_PASSWORD: usize = 6;
const GOOGLE_DEMO_EMAIL: &str = "google.demo@elida.lt";
const GOOGLE_DEMO_NAME: &str = "Google Demo";

#[derive(Debug, Clone)]
struct MemoryUser {
    uid: String,
    email: String,
    password: Option<String>,
    display_name: Option<String>,
}

#[derive(Default)]
struct IdentityState {
    /// Keyed by lowercased email.
    users: HashMap<String, MemoryUser>,
    /// ID token → uid
    id_tokens: HashMap<String, String>,
    /// Refresh token → uid
    refresh_tokens: HashMap<String, String>,
    /// Google flow session id → continue URI
    google_flows: HashMap<String, String>,
    reset_requests: Vec<String>,
}

/// An identity provider held in memory.
pub struct MemoryIdentity {
    state: RwLock<IdentityState>,
    authorized_domains: Option<Vec<String>>,
    token_lifetime: Duration,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self {
            state: RwLock::default(),
            authorized_domains: None,
            token_lifetime: Duration::from_secs(3600),
        }
    }
}

impl MemoryIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only allow Google sign-in to return to these hosts.
    #[must_use]
    pub fn with_authorized_domains(mut self, domains: &[&str]) -> Self {
        self.authorized_domains = Some(domains.iter().map(|d| (*d).to_string()).collect());
        self
    }

    /// Lifetime of issued ID tokens. Zero makes every token expire at once.
    #[must_use]
    pub const fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Emails that asked for a password reset, oldest first.
    pub async fn reset_requests(&self) -> Vec<String> {
        self.state.read().await.reset_requests.clone()
    }

    /// Invalidate every refresh token of an account, as a password change
    /// or an admin "sign out everywhere" would.
    pub async fn revoke_sessions(&self, email: &str) {
        let mut state = self.state.write().await;
        let Some(uid) = state.users.get(&email.to_lowercase()).map(|u| u.uid.clone()) else {
            return;
        };
        state.refresh_tokens.retain(|_, owner| *owner != uid);
    }

    /// Current display name of an account.
    pub async fn display_name(&self, email: &str) -> Option<String> {
        self.state
            .read()
            .await
            .users
            .get(&email.to_lowercase())
            .and_then(|u| u.display_name.clone())
    }

    fn issue(state: &mut IdentityState, user: &MemoryUser, lifetime: Duration) -> AuthSession {
        let id_token = format!("id-{}", uuid::Uuid::new_v4());
        let refresh_token = format!("refresh-{}", uuid::Uuid::new_v4());
        state.id_tokens.insert(id_token.clone(), user.uid.clone());
        state.refresh_tokens.insert(refresh_token.clone(), user.uid.clone());

        AuthSession {
            uid: UserId::new(user.uid.clone()),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            id_token: SecretString::from(id_token),
            refresh_token: SecretString::from(refresh_token),
            expires_in: lifetime,
        }
    }

    fn refuse<T>(code: ProviderErrorCode) -> Result<T, IdentityError> {
        Err(IdentityError::Provider(code))
    }
}

fn looks_like_email(email: &str) -> bool {
    Email::parse(email).is_ok()
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        if !looks_like_email(email) {
            return Self::refuse(ProviderErrorCode::InvalidEmail);
        }
        let mut state = self.state.write().await;
        let user = match state.users.get(&email.to_lowercase()) {
            Some(user) if user.password.as_deref() == Some(password) => user.clone(),
            _ => return Self::refuse(ProviderErrorCode::InvalidLoginCredentials),
        };
        Ok(Self::issue(&mut state, &user, self.token_lifetime))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        if !looks_like_email(email) {
            return Self::refuse(ProviderErrorCode::InvalidEmail);
        }
        if password.chars().count() < MIN_PROVIDER_PASSWORD {
            return Self::refuse(ProviderErrorCode::WeakPassword);
        }
        let mut state = self.state.write().await;
        let key = email.to_lowercase();
        if state.users.contains_key(&key) {
            return Self::refuse(ProviderErrorCode::EmailExists);
        }
        let user = MemoryUser {
            uid: format!("uid-{}", uuid::Uuid::new_v4().simple()),
            email: email.to_string(),
            password: Some(password.to_string()),
            display_name: None,
        };
        state.users.insert(key, user.clone());
        Ok(Self::issue(&mut state, &user, self.token_lifetime))
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&email.to_lowercase()) {
            return Self::refuse(ProviderErrorCode::EmailNotFound);
        }
        state.reset_requests.push(email.to_string());
        Ok(())
    }

    async fn update_display_name(
        &self,
        id_token: &SecretString,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let mut state = self.state.write().await;
        let Some(uid) = state.id_tokens.get(id_token.expose_secret()).cloned() else {
            return Self::refuse(ProviderErrorCode::InvalidIdToken);
        };
        if let Some(user) = state.users.values_mut().find(|u| u.uid == uid) {
            user.display_name = Some(display_name.to_string());
        }
        Ok(())
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshedTokens, IdentityError> {
        let mut state = self.state.write().await;
        let Some(uid) = state.refresh_tokens.remove(refresh_token.expose_secret()) else {
            return Self::refuse(ProviderErrorCode::InvalidRefreshToken);
        };
        let id_token = format!("id-{}", uuid::Uuid::new_v4());
        let next_refresh = format!("refresh-{}", uuid::Uuid::new_v4());
        state.id_tokens.insert(id_token.clone(), uid.clone());
        state.refresh_tokens.insert(next_refresh.clone(), uid.clone());

        Ok(RefreshedTokens {
            uid: UserId::new(uid),
            id_token: SecretString::from(id_token),
            refresh_token: SecretString::from(next_refresh),
            expires_in: self.token_lifetime,
        })
    }

    async fn start_google_sign_in(
        &self,
        continue_uri: &str,
    ) -> Result<GoogleAuthStart, IdentityError> {
        let url = Url::parse(continue_uri)
            .map_err(|e| BackendError::Decode(format!("invalid continue URI: {e}")))?;
        let host = url.host_str().unwrap_or_default();
        if let Some(domains) = &self.authorized_domains
            && !domains.iter().any(|d| d == host)
        {
            return Self::refuse(ProviderErrorCode::UnauthorizedDomain);
        }

        let session_id = uuid::Uuid::new_v4().simple().to_string();
        self.state
            .write()
            .await
            .google_flows
            .insert(session_id.clone(), continue_uri.to_string());

        // No consent screen: send the browser straight back with a code.
        let mut auth_uri = url;
        auth_uri.query_pairs_mut().append_pair("code", "memory-google");
        Ok(GoogleAuthStart {
            auth_uri: auth_uri.into(),
            session_id,
        })
    }

    async fn finish_google_sign_in(
        &self,
        request_uri: &str,
        session_id: &str,
    ) -> Result<AuthSession, IdentityError> {
        let mut state = self.state.write().await;
        let Some(continue_uri) = state.google_flows.remove(session_id) else {
            return Self::refuse(ProviderErrorCode::InvalidIdpResponse);
        };
        let has_code = Url::parse(request_uri)
            .map(|u| u.query_pairs().any(|(k, v)| k == "code" && v == "memory-google"))
            .unwrap_or(false);
        if !has_code || !request_uri.starts_with(continue_uri.as_str()) {
            return Self::refuse(ProviderErrorCode::InvalidIdpResponse);
        }

        let user = state
            .users
            .entry(GOOGLE_DEMO_EMAIL.to_string())
            .or_insert_with(|| MemoryUser {
                uid: format!("uid-{}", uuid::Uuid::new_v4().simple()),
                email: GOOGLE_DEMO_EMAIL.to_string(),
                password: None,
                display_name: Some(GOOGLE_DEMO_NAME.to_string()),
            })
            .clone();
        Ok(Self::issue(&mut state, &user, self.token_lifetime))
    }
}
