//! Google sign-in through the identity provider's IdP endpoints.
//!
//! The sign-in page opens `/auth/google` in a popup. When the browser blocks
//! the popup, the page script navigates to `/auth/google?flow=redirect`
//! instead. Either way the provider sends the browser back to
//! [`CALLBACK_PATH`], which finishes the sign-in.
//!
//! In a popup the callback answers with a tiny page that points the opener at
//! the destination and closes itself. A full-page flow just gets a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{OriginalUri, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::auth::{PROFILE_PATH, establish_session};
use super::page::with_error;
use crate::error::Result;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::{GoogleFlow, GoogleFlowKind, keys};
use crate::services::AuthError;
use crate::state::AppState;

/// Where the provider returns the browser.
pub const CALLBACK_PATH: &str = "/auth/google/callback";

#[derive(Debug, Default, Deserialize)]
pub struct StartQuery {
    pub flow: Option<String>,
}

/// Closes the popup and moves the opener to `target`.
#[derive(Template, WebTemplate)]
#[template(path = "auth/google_done.html")]
pub struct GoogleDoneTemplate {
    pub nonce: String,
    pub target: String,
}

fn finish(kind: GoogleFlowKind, nonce: CspNonce, target: String) -> Response {
    match kind {
        GoogleFlowKind::Redirect => Redirect::to(&target).into_response(),
        GoogleFlowKind::Popup => GoogleDoneTemplate {
            nonce: nonce.0,
            target,
        }
        .into_response(),
    }
}

fn failure_target(err: &AuthError) -> String {
    if err.is_server_error() {
        tracing::error!(error = %err, "Google sign-in failed");
    } else {
        tracing::info!(error = %err, "Google sign-in refused");
    }
    with_error("/signin", err.notice())
}

/// Start the Google flow.
#[instrument(skip(state, user, session, nonce))]
pub async fn start(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    nonce: CspNonce,
    Query(query): Query<StartQuery>,
) -> Result<Response> {
    let kind = GoogleFlowKind::from_param(query.flow.as_deref());
    if user.is_some() {
        return Ok(finish(kind, nonce, PROFILE_PATH.to_owned()));
    }

    let continue_uri = format!(
        "{}{CALLBACK_PATH}",
        state.config().base_url.trim_end_matches('/')
    );

    match state.auth().start_google(&continue_uri).await {
        Ok(started) => {
            let flow = GoogleFlow {
                session_id: started.session_id,
                kind,
            };
            session.insert(keys::GOOGLE_FLOW, &flow).await?;
            Ok(Redirect::to(&started.auth_uri).into_response())
        }
        Err(e) => Ok(finish(kind, nonce, failure_target(&e))),
    }
}

/// Finish the Google flow. The pending flow is removed whatever the outcome.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    OriginalUri(uri): OriginalUri,
) -> Result<Response> {
    let Some(flow) = session.remove::<GoogleFlow>(keys::GOOGLE_FLOW).await? else {
        // No way to tell how the flow was opened; the done page copes with both.
        let target = failure_target(&AuthError::InvalidSessionState);
        return Ok(finish(GoogleFlowKind::Popup, nonce, target));
    };

    let request_uri = format!(
        "{}{}",
        state.config().base_url.trim_end_matches('/'),
        uri.path_and_query().map_or(CALLBACK_PATH, |pq| pq.as_str())
    );

    let target = match state
        .auth()
        .finish_google(&request_uri, &flow.session_id)
        .await
    {
        Ok(user) => {
            establish_session(&session, &user).await?;
            PROFILE_PATH.to_owned()
        }
        Err(e) => failure_target(&e),
    };

    Ok(finish(flow.kind, nonce, target))
}
