//! Response hardening headers.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, header::CONTENT_SECURITY_POLICY},
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Build the CSP header for a request's nonce.
///
/// Inline scripts run only with the nonce. Product images may come from the
/// document database's storage bucket, so any https image is allowed.
fn content_security_policy(nonce: Option<&CspNonce>) -> String {
    let script_src = match nonce {
        Some(nonce) if !nonce.value().is_empty() => format!("'self' 'nonce-{}'", nonce.value()),
        _ => "'self'".to_string(),
    };
    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Fixed headers sent with every response.
///
/// Cross-origin opener policy stays loose enough for the Google sign-in
/// popup to reach back into this window. Responses are never cached since
/// most pages show the visitor's cart or account.
const FIXED_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), geolocation=(), microphone=(), payment=(), usb=(), browsing-topics=()",
    ),
    ("cache-control", "no-store, max-age=0"),
    ("cross-origin-opener-policy", "same-origin-allow-popups"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-dns-prefetch-control", "off"),
];

/// Add the fixed headers and a per-request CSP to every response.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let csp = content_security_policy(request.extensions().get::<CspNonce>());
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for &(name, value) in FIXED_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_carries_nonce() {
        let nonce = CspNonce("abc123".to_string());
        let csp = content_security_policy(Some(&nonce));
        assert!(csp.contains("script-src 'self' 'nonce-abc123';"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_fixed_header_names_are_lowercase() {
        for (name, _) in FIXED_HEADERS {
            assert_eq!(*name, name.to_ascii_lowercase());
        }
    }

    #[test]
    fn test_csp_without_nonce_allows_only_self() {
        let csp = content_security_policy(None);
        assert!(csp.contains("script-src 'self';"));
        assert!(!csp.contains("nonce"));
    }
}
