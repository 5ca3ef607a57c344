//! Authentication extractors.
//!
//! Every request resolves the session identity before the handler runs.
//! [`RequireAuth`] also renews an expired ID token, so handlers can always
//! call the backend as the customer.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::error::clear_sentry_user;
use crate::messages::Notice;
use crate::models::{CurrentUser, keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, redirects to the sign-in page.
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Labas, {}!", user.greeting_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Why a protected route was refused.
#[derive(Debug)]
pub enum AuthRejection {
    /// Nobody is signed in.
    RedirectToSignIn,
    /// The token could not be renewed; the user was signed out.
    SessionExpired,
    /// The session layer is missing from the stack.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to("/signin").into_response(),
            Self::SessionExpired => Redirect::to(&format!(
                "/signin?error={}",
                Notice::SessionExpired.code()
            ))
            .into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSession)?;

        let mut user: CurrentUser = session
            .get(keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToSignIn)?;

        if user.is_expired(Utc::now()) {
            if let Err(e) = state.auth().refresh(&mut user).await {
                tracing::info!(uid = %user.uid, error = %e, "Token refresh failed, signing out");
                if let Err(e) = clear_current_user(&session).await {
                    tracing::warn!(error = %e, "Failed to clear expired session");
                }
                return Err(AuthRejection::SessionExpired);
            }
            if let Err(e) = set_current_user(&session, &user).await {
                tracing::warn!(error = %e, "Failed to store refreshed tokens");
            }
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike [`RequireAuth`], this never rejects and never refreshes tokens.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session. Cart and wishlist stay.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    clear_sentry_user();
    Ok(())
}
