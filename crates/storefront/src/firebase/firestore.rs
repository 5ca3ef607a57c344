//! Firestore REST client.
//!
//! Speaks the `v1` document API with the project's web API key. Requests
//! made for a signed-in customer carry their ID token as a bearer token so
//! security rules apply to them.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use url::Url;

use super::value::{decode_fields, encode_fields};
use super::{BackendError, Document, DocumentStore};
use crate::config::FirebaseConfig;

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

/// Client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// `.../projects/{project}/databases/(default)/documents`
    documents_url: String,
    api_key: SecretString,
}

impl FirestoreClient {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self::with_base_url(config, FIRESTORE_BASE)
    }

    /// Create a client against another API root, such as the local emulator.
    #[must_use]
    pub fn with_base_url(config: &FirebaseConfig, base_url: &str) -> Self {
        let documents_url = format!(
            "{}/projects/{}/databases/(default)/documents",
            base_url.trim_end_matches('/'),
            config.project_id
        );

        Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                documents_url,
                api_key: config.api_key.clone(),
            }),
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&format!("{}{path}", self.inner.documents_url))
            .map_err(|e| BackendError::Decode(format!("invalid document URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", self.inner.api_key.expose_secret());
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send a request and return the status with the raw body.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        auth: Option<&SecretString>,
    ) -> Result<(StatusCode, String), BackendError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(token) = auth {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    /// Parse a success body, or turn an error body into a `BackendError`.
    fn parse(status: StatusCode, text: &str) -> Result<Value, BackendError> {
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Firestore returned non-success status"
            );
            let message = serde_json::from_str::<Value>(text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
                .unwrap_or_else(|| text.chars().take(200).collect());
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse Firestore response"
            );
            BackendError::Parse(e)
        })
    }

    async fn call(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        auth: Option<&SecretString>,
    ) -> Result<Value, BackendError> {
        let (status, text) = self.send(method, url, body, auth).await?;
        Self::parse(status, &text)
    }
}

/// Convert a REST document resource into a [`Document`].
fn to_document(resource: &Value) -> Result<Document, BackendError> {
    let name = resource["name"]
        .as_str()
        .ok_or_else(|| BackendError::Decode("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = resource["fields"]
        .as_object()
        .map(decode_fields)
        .unwrap_or_default();
    Ok(Document { id, fields })
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    #[instrument(skip(self, auth))]
    async fn list(
        &self,
        collection: &str,
        auth: Option<&SecretString>,
    ) -> Result<Vec<Document>, BackendError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = self.url(&format!("/{collection}"), &params)?;
            let page = self.call(Method::GET, url, None, auth).await?;

            if let Some(items) = page["documents"].as_array() {
                for item in items {
                    documents.push(to_document(item)?);
                }
            }

            match page["nextPageToken"].as_str() {
                Some(next) if !next.is_empty() => page_token = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(count = documents.len(), "Listed collection");
        Ok(documents)
    }

    #[instrument(skip(self, auth))]
    async fn get(
        &self,
        collection: &str,
        id: &str,
        auth: Option<&SecretString>,
    ) -> Result<Option<Document>, BackendError> {
        let url = self.url(&format!("/{collection}/{}", urlencoding::encode(id)), &[])?;
        let (status, text) = self.send(Method::GET, url, None, auth).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resource = Self::parse(status, &text)?;
        to_document(&resource).map(Some)
    }

    #[instrument(skip(self, value, auth))]
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        auth: Option<&SecretString>,
    ) -> Result<Vec<Document>, BackendError> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": super::value::encode_value(value),
                    }
                }
            }
        });
        let url = self.url(":runQuery", &[])?;
        let results = self.call(Method::POST, url, Some(&body), auth).await?;

        // One entry per match; an empty result is a single entry with only `readTime`.
        results
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.get("document").is_some())
                    .map(|row| to_document(&row["document"]))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    #[instrument(skip(self, fields, auth))]
    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        auth: Option<&SecretString>,
    ) -> Result<String, BackendError> {
        let body = json!({ "fields": encode_fields(&fields) });
        let url = self.url(&format!("/{collection}"), &[])?;
        let resource = self.call(Method::POST, url, Some(&body), auth).await?;
        Ok(to_document(&resource)?.id)
    }

    #[instrument(skip(self, fields, auth))]
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        auth: Option<&SecretString>,
    ) -> Result<(), BackendError> {
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        let url = self.url(&format!("/{collection}/{}", urlencoding::encode(id)), &mask)?;
        let body = json!({ "fields": encode_fields(&fields) });
        self.call(Method::PATCH, url, Some(&body), auth).await?;
        Ok(())
    }
}
