//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for inline scripts)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Security headers (CSP, frame and isolation policies)
//! 7. Rate limiting on credential and cart endpoints (governor)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{RateLimiterLayer, auth_rate_limiter, cart_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
