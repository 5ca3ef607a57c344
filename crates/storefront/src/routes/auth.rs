//! Email and password authentication routes.
//!
//! Every form posts back and redirects. Failures come back as an `?error=`
//! code the sign-in page turns into text, so a refresh never resubmits.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, with_error, with_notice};
use crate::error::{Result, set_sentry_user};
use crate::filters;
use crate::messages::Notice;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthError;
use crate::state::AppState;

/// Where a signed-in user lands.
pub const PROFILE_PATH: &str = "/profile";
const SIGN_IN_PATH: &str = "/signin";
const SIGN_UP_PATH: &str = "/signin?mode=signup";
const RESET_PATH: &str = "/password-reset";

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Password reset form data.
#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    pub mode: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in and sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signin.html")]
pub struct SignInTemplate {
    pub page: PageContext,
    /// Show the sign-up form instead of the sign-in form.
    pub signup: bool,
}

/// Password reset page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset.html")]
pub struct PasswordResetTemplate {
    pub page: PageContext,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Make `user` the session identity.
///
/// The session id is replaced first so an id planted before sign-in is
/// worthless afterwards.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn establish_session(
    session: &Session,
    user: &CurrentUser,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    set_current_user(session, user).await?;
    set_sentry_user(&user.uid, Some(&user.email));
    tracing::info!(uid = %user.uid, "User signed in");
    Ok(())
}

fn failure_redirect(path: &str, err: &AuthError) -> Response {
    if err.is_server_error() {
        tracing::error!(error = %err, "Authentication backend failed");
    } else {
        tracing::info!(error = %err, "Authentication refused");
    }
    Redirect::to(&with_error(path, err.notice())).into_response()
}

// =============================================================================
// Sign In / Sign Up
// =============================================================================

/// Display the sign-in page, or the sign-up form with `?mode=signup`.
pub async fn signin_page(
    OptionalAuth(user): OptionalAuth,
    page: PageContext,
    Query(query): Query<SignInQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(PROFILE_PATH).into_response();
    }

    SignInTemplate {
        page,
        signup: query.mode.as_deref() == Some("signup"),
    }
    .into_response()
}

/// Handle the sign-in form.
#[instrument(skip(state, session, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Result<Response> {
    match state.auth().sign_in(&form.email, &form.password).await {
        Ok(user) => {
            establish_session(&session, &user).await?;
            Ok(Redirect::to(PROFILE_PATH).into_response())
        }
        Err(e) => Ok(failure_redirect(SIGN_IN_PATH, &e)),
    }
}

/// Handle the sign-up form.
#[instrument(skip(state, session, form))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Response> {
    match state
        .auth()
        .sign_up(&form.email, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => {
            establish_session(&session, &user).await?;
            Ok(Redirect::to(PROFILE_PATH).into_response())
        }
        Err(e) => Ok(failure_redirect(SIGN_UP_PATH, &e)),
    }
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the password reset page.
pub async fn password_reset_page(OptionalAuth(user): OptionalAuth, page: PageContext) -> Response {
    if user.is_some() {
        return Redirect::to(PROFILE_PATH).into_response();
    }
    PasswordResetTemplate { page }.into_response()
}

/// Handle the password reset form.
#[instrument(skip(state, form))]
pub async fn password_reset(
    State(state): State<AppState>,
    Form(form): Form<PasswordResetForm>,
) -> Response {
    match state.auth().reset_password(&form.email).await {
        Ok(()) => Redirect::to(&with_notice(RESET_PATH, Notice::ResetSent)).into_response(),
        Err(e) => failure_redirect(RESET_PATH, &e),
    }
}

// =============================================================================
// Sign Out
// =============================================================================

/// Handle sign-out. The cart and wishlist survive.
#[instrument(skip(session))]
pub async fn sign_out(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;
    Ok(Redirect::to("/").into_response())
}
