//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::{IntoResponse, Redirect}};
use elida_core::Wishlist;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, safe_return_path};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::keys;
use crate::state::AppState;

/// The visitor's wishlist; empty if none was stored yet.
pub async fn load_wishlist(session: &Session) -> Wishlist {
    session
        .get::<Wishlist>(keys::WISHLIST)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistTemplate {
    pub page: PageContext,
    pub wishlist: Wishlist,
}

/// Display the wishlist.
#[instrument(skip_all)]
pub async fn show(page: PageContext, session: Session) -> impl IntoResponse {
    WishlistTemplate {
        page,
        wishlist: load_wishlist(&session).await,
    }
}

/// Add or remove a product.
#[instrument(skip(state, session), fields(product_id = %form.product_id))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect> {
    let product = state
        .catalog()
        .fetch_product_by_id(&form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut wishlist = load_wishlist(&session).await;
    let added = wishlist.toggle(&product);
    session.insert(keys::WISHLIST, &wishlist).await?;
    tracing::debug!(added, "Wishlist toggled");

    Ok(Redirect::to(&safe_return_path(form.return_to.as_deref(), "/wishlist")))
}
