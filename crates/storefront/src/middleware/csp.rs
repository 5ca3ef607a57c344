//! Per-request nonce for the few inline scripts the storefront renders.
//!
//! The Google sign-in done page closes its popup with an inline script; the
//! CSP header only lets it run when its `nonce` attribute matches.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Random bytes behind each nonce.
const NONCE_BYTES: usize = 16;

#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Stores a fresh [`CspNonce`] in the request extensions.
///
/// Runs outside `security_headers_middleware`, which reads the nonce back
/// when it writes the policy.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    /// An empty nonce when the middleware is missing; inline scripts then
    /// simply stay blocked.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = parts.extensions.get::<Self>() {
            return Ok(nonce.clone());
        }
        tracing::warn!("No CSP nonce on request, inline scripts will be blocked");
        Ok(Self(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request as HttpRequest;

    use super::*;

    #[test]
    fn test_nonces_are_unique_and_sized() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        // 16 bytes encode to 24 base64 characters.
        assert_eq!(a.value().len(), 24);
    }

    #[tokio::test]
    async fn test_missing_nonce_extracts_empty() {
        let (mut parts, ()) = HttpRequest::new(()).into_parts();
        let nonce = CspNonce::from_request_parts(&mut parts, &()).await.unwrap_or_else(|e| match e {});
        assert!(nonce.value().is_empty());
    }
}
