//! Data every full page needs: header state and the alert area.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use tower_sessions::Session;
use url::Url;

use crate::messages::Notice;
use crate::middleware::CspNonce;
use crate::models::{CurrentUser, keys};

use super::cart::load_cart;
use super::wishlist::load_wishlist;

/// `?error=` and `?notice=` codes left by a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Header and alert state for the base layout.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nonce: String,
    /// Greeting for the signed-in user, if any.
    pub user_name: Option<String>,
    pub cart_count: u32,
    pub wishlist_count: usize,
    pub error: Option<&'static str>,
    pub notice: Option<&'static str>,
}

impl PageContext {
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user_name.is_some()
    }

    /// Show an error decided by the handler rather than the query string.
    #[must_use]
    pub const fn with_error(mut self, notice: Notice) -> Self {
        self.error = Some(notice.message());
        self
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let messages = Query::<MessageQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        let mut page = Self {
            nonce,
            error: Notice::text_for(messages.error.as_deref()),
            notice: Notice::text_for(messages.notice.as_deref()),
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>() {
            page.user_name = session
                .get::<CurrentUser>(keys::CURRENT_USER)
                .await
                .ok()
                .flatten()
                .map(|user| user.greeting_name().to_owned());
            page.cart_count = load_cart(session).await.item_count();
            page.wishlist_count = load_wishlist(session).await.len();
        }

        Ok(page)
    }
}

/// A local path to send the browser back to. Anything that could leave the
/// site falls back to `default`.
#[must_use]
pub fn safe_return_path(candidate: Option<&str>, default: &str) -> String {
    match candidate {
        Some(path) if is_local_path(path) => path.to_owned(),
        _ => default.to_owned(),
    }
}

/// Browsers drop tabs and newlines from URLs and treat `\` like `/`, so any
/// of those could turn `/\t/host` into `//host`.
fn is_local_path(path: &str) -> bool {
    if !path.starts_with('/')
        || path.starts_with("//")
        || path.contains('\\')
        || path.chars().any(|c| c.is_control() || c.is_whitespace())
    {
        return false;
    }
    let Ok(base) = Url::parse("http://elida.invalid/") else {
        return false;
    };
    base.join(path)
        .is_ok_and(|resolved| resolved.origin() == base.origin())
}

/// Append `?error=` (or `&error=`) for a notice to a local path.
#[must_use]
pub fn with_error(path: &str, notice: Notice) -> String {
    with_param(path, "error", notice)
}

/// Append `?notice=` (or `&notice=`) for a notice to a local path.
#[must_use]
pub fn with_notice(path: &str, notice: Notice) -> String {
    with_param(path, "notice", notice)
}

fn with_param(path: &str, key: &str, notice: Notice) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", notice.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_path_rejects_offsite() {
        assert_eq!(safe_return_path(Some("/products/p1"), "/cart"), "/products/p1");
        assert_eq!(safe_return_path(Some("//evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("https://evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("/\\evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("/\t/evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("/\n/evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("/ /evil.example"), "/cart"), "/cart");
        assert_eq!(
            safe_return_path(Some("/category/Losjonai?x=1"), "/cart"),
            "/category/Losjonai?x=1"
        );
        assert_eq!(safe_return_path(None, "/cart"), "/cart");
    }

    #[test]
    fn test_params_are_appended() {
        assert_eq!(
            with_error("/signin", Notice::SignInFailed),
            "/signin?error=sign_in_failed"
        );
        assert_eq!(
            with_error("/signin?mode=signup", Notice::PasswordTooShort),
            "/signin?mode=signup&error=password_too_short"
        );
        assert_eq!(
            with_notice("/password-reset", Notice::ResetSent),
            "/password-reset?notice=reset_sent"
        );
    }
}
