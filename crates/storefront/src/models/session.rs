//! Session-related types.
//!
//! Types stored in the session for authentication state. The session store
//! is server-side, so tokens never reach the browser; only the session id
//! cookie does.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use elida_core::UserId;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::firebase::{AuthSession, RefreshedTokens};

/// Refresh this long before the provider's expiry to avoid racing it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Session-stored user identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    /// When `id_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn expiry(now: DateTime<Utc>, lifetime: std::time::Duration) -> DateTime<Utc> {
    let lifetime = Duration::from_std(lifetime).unwrap_or_else(|_| Duration::hours(1));
    now + lifetime
}

impl CurrentUser {
    /// Build the session identity from a fresh sign-in at `now`.
    #[must_use]
    pub fn from_auth(session: AuthSession, now: DateTime<Utc>) -> Self {
        use secrecy::ExposeSecret;

        Self {
            uid: session.uid,
            email: session.email,
            display_name: session.display_name,
            id_token: session.id_token.expose_secret().to_owned(),
            refresh_token: session.refresh_token.expose_secret().to_owned(),
            expires_at: expiry(now, session.expires_in),
        }
    }

    /// Swap in refreshed tokens.
    pub fn apply_refresh(&mut self, tokens: RefreshedTokens, now: DateTime<Utc>) {
        use secrecy::ExposeSecret;

        self.id_token = tokens.id_token.expose_secret().to_owned();
        self.refresh_token = tokens.refresh_token.expose_secret().to_owned();
        self.expires_at = expiry(now, tokens.expires_in);
    }

    #[must_use]
    pub fn id_token(&self) -> SecretString {
        SecretString::from(self.id_token.clone())
    }

    #[must_use]
    pub fn refresh_token(&self) -> SecretString {
        SecretString::from(self.refresh_token.clone())
    }

    /// Whether the ID token needs refreshing before use.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    /// Name for greetings: the display name, else the email.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// How the Google flow was opened in the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoogleFlowKind {
    /// A popup window the callback page closes again.
    #[default]
    Popup,
    /// Full-page redirect, used when the popup was blocked.
    Redirect,
}

impl GoogleFlowKind {
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("redirect") => Self::Redirect,
            _ => Self::Popup,
        }
    }
}

/// A Google sign-in in progress. Consumed by the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleFlow {
    pub session_id: String,
    pub kind: GoogleFlowKind,
}

/// Session keys.
pub mod keys {
    /// The signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// The visitor's wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Pending Google sign-in.
    pub const GOOGLE_FLOW: &str = "google_flow";
}
