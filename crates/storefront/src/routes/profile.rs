//! Profile, order history and booking history.
//!
//! Every handler here requires a signed-in user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use elida_core::{Booking, Order};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::auth::PROFILE_PATH;
use super::page::{PageContext, with_error, with_notice};
use crate::error::Result;
use crate::filters;
use crate::messages::Notice;
use crate::middleware::{RequireAuth, set_current_user};
use crate::services::OrderError;
use crate::state::AppState;

/// Display name form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub display_name: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/index.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub email: String,
    pub display_name: String,
    pub orders: Vec<Order>,
    pub orders_failed: bool,
    pub bookings: Vec<Booking>,
    pub bookings_failed: bool,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/order.html")]
pub struct OrderTemplate {
    pub page: PageContext,
    pub order: Order,
}

fn order_path(id: &str) -> String {
    format!("{PROFILE_PATH}/orders/{}", urlencoding::encode(id))
}

/// Display the profile with order and booking history.
#[instrument(skip_all, fields(uid = %user.uid))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> impl IntoResponse {
    let history = state.orders(&user).history(&user.uid).await;
    let (orders, orders_failed) = match history.orders {
        Ok(orders) => (orders, false),
        Err(_) => (Vec::new(), true),
    };
    let (bookings, bookings_failed) = match history.bookings {
        Ok(bookings) => (bookings, false),
        Err(_) => (Vec::new(), true),
    };

    ProfileTemplate {
        page,
        display_name: user.display_name.clone().unwrap_or_default(),
        email: user.email,
        orders,
        orders_failed,
        bookings,
        bookings_failed,
    }
}

/// Change the display name.
#[instrument(skip_all, fields(uid = %user.uid))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(mut user): RequireAuth,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    match state.auth().update_profile(&mut user, &form.display_name).await {
        Ok(()) => {
            set_current_user(&session, &user).await?;
            Ok(Redirect::to(&with_notice(PROFILE_PATH, Notice::ProfileUpdated)).into_response())
        }
        Err(e) => {
            tracing::info!(error = %e, "Profile update failed");
            Ok(Redirect::to(&with_error(PROFILE_PATH, e.notice())).into_response())
        }
    }
}

/// Display one of the user's orders.
#[instrument(skip(state, user, page), fields(uid = %user.uid))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state.orders(&user).fetch_owned_order(&user.uid, &id).await?;
    Ok(OrderTemplate { page, order })
}

/// Cancel one of the user's pending orders.
#[instrument(skip(state, user), fields(uid = %user.uid))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let path = order_path(&id);
    match state.orders(&user).cancel_order(&user.uid, &id).await {
        Ok(()) => Ok(Redirect::to(&with_notice(&path, Notice::OrderCancelled)).into_response()),
        Err(OrderError::NotCancellable(_)) => {
            Ok(Redirect::to(&with_error(&path, Notice::OrderNotCancellable)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
