//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Mutations are plain form posts
//! that redirect back, so the pages work without JavaScript.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use elida_core::{Cart, VariantSelection};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, safe_return_path, with_error};
use super::products::product_path;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::messages::Notice;
use crate::models::keys;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// The visitor's cart; empty if none was stored yet.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Page to return to on success; defaults to the cart.
    pub return_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: Cart,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(page: PageContext, session: Session) -> impl IntoResponse {
    CartShowTemplate {
        page,
        cart: load_cart(&session).await,
    }
}

/// Add a product to the cart.
///
/// An incomplete or unknown variant selection sends the customer back to the
/// product page with the reason; nothing is added.
#[instrument(skip(state, session), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state
        .catalog()
        .fetch_product_by_id(&form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let selection = VariantSelection::new(form.size.as_deref(), form.color.as_deref());
    let mut cart = load_cart(&session).await;

    if let Err(e) = cart.add(&product, selection, form.quantity.unwrap_or(1)) {
        tracing::debug!(error = %e, "Add to cart rejected");
        let back = product_path(product.id.as_str());
        return Ok(Redirect::to(&with_error(&back, Notice::from(e))).into_response());
    }

    save_cart(&session, &cart).await?;
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product.id.as_str())]));

    let target = safe_return_path(form.return_to.as_deref(), "/cart");
    Ok(Redirect::to(&target).into_response())
}

/// Change a line's quantity. Zero removes it.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await;
    if let Err(e) = cart.update_quantity(&form.line_id, form.quantity) {
        return Ok(Redirect::to(&with_error("/cart", Notice::from(e))));
    }
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await;
    if !cart.remove(&form.line_id) {
        return Ok(Redirect::to(&with_error("/cart", Notice::CartLineMissing)));
    }
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Cart count badge fragment.
#[instrument(skip_all)]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}
