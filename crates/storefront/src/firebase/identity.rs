//! Firebase Auth REST client (Identity Toolkit and Secure Token APIs).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use elida_core::UserId;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::instrument;

use super::{
    AuthSession, BackendError, GoogleAuthStart, IdentityError, IdentityProvider,
    ProviderErrorCode, RefreshedTokens,
};
use crate::config::FirebaseConfig;

const IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_BASE: &str = "https://securetoken.googleapis.com/v1";

/// Client for Firebase Auth.
#[derive(Clone)]
pub struct FirebaseIdentity {
    inner: Arc<FirebaseIdentityInner>,
}

struct FirebaseIdentityInner {
    client: reqwest::Client,
    identity_base: String,
    secure_token_base: String,
    api_key: SecretString,
}

/// Successful body of `signInWithPassword`, `signUp` and `signInWithIdp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// Successful body of the secure token endpoint (snake_case on this one).
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriResponse {
    auth_uri: Option<String>,
    session_id: Option<String>,
}

fn parse_expires_in(raw: &str) -> Duration {
    Duration::from_secs(raw.trim().parse().unwrap_or(3600))
}

impl From<SignInResponse> for AuthSession {
    fn from(r: SignInResponse) -> Self {
        Self {
            uid: UserId::new(r.local_id),
            email: r.email,
            display_name: r.display_name.filter(|n| !n.is_empty()),
            id_token: SecretString::from(r.id_token),
            refresh_token: SecretString::from(r.refresh_token),
            expires_in: parse_expires_in(&r.expires_in),
        }
    }
}

impl FirebaseIdentity {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self::with_base_urls(config, IDENTITY_BASE, SECURE_TOKEN_BASE)
    }

    /// Create a client against other API roots, such as the auth emulator.
    #[must_use]
    pub fn with_base_urls(
        config: &FirebaseConfig,
        identity_base: &str,
        secure_token_base: &str,
    ) -> Self {
        Self {
            inner: Arc::new(FirebaseIdentityInner {
                client: reqwest::Client::new(),
                identity_base: identity_base.trim_end_matches('/').to_string(),
                secure_token_base: secure_token_base.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        }
    }

    /// POST to `accounts:{operation}` and decode the answer.
    async fn accounts<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &Value,
    ) -> Result<T, IdentityError> {
        let url = format!(
            "{}/accounts:{operation}?key={}",
            self.inner.identity_base,
            urlencoding::encode(self.inner.api_key.expose_secret())
        );
        let response = self
            .inner
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(BackendError::from)?;
        Self::decode(operation, response).await
    }

    async fn decode<T: DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        let status = response.status();
        let text = response.text().await.map_err(BackendError::from)?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_owned));
            return match message {
                // Provider refusals are expected outcomes, not failures of ours.
                Some(message) if status.is_client_error() => {
                    let code = ProviderErrorCode::parse(&message);
                    tracing::info!(operation, code = %code, "Identity provider refused request");
                    Err(IdentityError::Provider(code))
                }
                message => {
                    tracing::error!(
                        operation,
                        status = %status,
                        body = %text.chars().take(500).collect::<String>(),
                        "Identity provider returned non-success status"
                    );
                    Err(BackendError::Status {
                        status: status.as_u16(),
                        message: message.unwrap_or_else(|| text.chars().take(200).collect()),
                    }
                    .into())
                }
            };
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                operation,
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse identity response"
            );
            IdentityError::Backend(BackendError::Parse(e))
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response: SignInResponse = self.accounts("signInWithPassword", &body).await?;
        Ok(response.into())
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response: SignInResponse = self.accounts("signUp", &body).await?;
        Ok(response.into())
    }

    #[instrument(skip(self))]
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        let _: Value = self.accounts("sendOobCode", &body).await?;
        Ok(())
    }

    #[instrument(skip(self, id_token))]
    async fn update_display_name(
        &self,
        id_token: &SecretString,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let body = json!({
            "idToken": id_token.expose_secret(),
            "displayName": display_name,
            "returnSecureToken": false,
        });
        let _: Value = self.accounts("update", &body).await?;
        Ok(())
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshedTokens, IdentityError> {
        let url = format!(
            "{}/token?key={}",
            self.inner.secure_token_base,
            urlencoding::encode(self.inner.api_key.expose_secret())
        );
        let response = self
            .inner
            .client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(BackendError::from)?;
        let r: RefreshResponse = Self::decode("token", response).await?;

        Ok(RefreshedTokens {
            uid: UserId::new(r.user_id),
            id_token: SecretString::from(r.id_token),
            refresh_token: SecretString::from(r.refresh_token),
            expires_in: parse_expires_in(&r.expires_in),
        })
    }

    #[instrument(skip(self))]
    async fn start_google_sign_in(
        &self,
        continue_uri: &str,
    ) -> Result<GoogleAuthStart, IdentityError> {
        let body = json!({
            "providerId": "google.com",
            "continueUri": continue_uri,
            "customParameter": { "prompt": "select_account" },
        });
        let response: CreateAuthUriResponse = self.accounts("createAuthUri", &body).await?;

        match (response.auth_uri, response.session_id) {
            (Some(auth_uri), Some(session_id)) => Ok(GoogleAuthStart {
                auth_uri,
                session_id,
            }),
            _ => Err(BackendError::Decode(
                "createAuthUri answered without authUri or sessionId".to_string(),
            )
            .into()),
        }
    }

    #[instrument(skip(self, request_uri, session_id))]
    async fn finish_google_sign_in(
        &self,
        request_uri: &str,
        session_id: &str,
    ) -> Result<AuthSession, IdentityError> {
        let body = json!({
            "requestUri": request_uri,
            "sessionId": session_id,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        let response: SignInResponse = self.accounts("signInWithIdp", &body).await?;
        Ok(response.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_response_into_session() {
        let response: SignInResponse = serde_json::from_value(json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "uid-1",
            "email": "ona@elida.lt",
            "displayName": "",
            "idToken": "id",
            "refreshToken": "refresh",
            "expiresIn": "3600",
            "registered": true
        }))
        .unwrap();

        let session = AuthSession::from(response);
        assert_eq!(session.uid.as_str(), "uid-1");
        assert_eq!(session.display_name, None);
        assert_eq!(session.expires_in, Duration::from_secs(3600));
        assert_eq!(session.id_token.expose_secret(), "id");
    }

    #[test]
    fn test_refresh_response_is_snake_case() {
        let response: RefreshResponse = serde_json::from_value(json!({
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "r2",
            "id_token": "i2",
            "user_id": "uid-1",
            "project_id": "123"
        }))
        .unwrap();
        assert_eq!(response.user_id, "uid-1");
        assert_eq!(parse_expires_in(&response.expires_in), Duration::from_secs(3600));
    }

    #[test]
    fn test_bad_expires_in_defaults_to_an_hour() {
        assert_eq!(parse_expires_in("soon"), Duration::from_secs(3600));
    }
}
