//! Checkout: turns the session cart into a pending order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use elida_core::{Cart, ShippingAddress};
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{load_cart, save_cart};
use super::page::{PageContext, with_error, with_notice};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::messages::Notice;
use crate::middleware::RequireAuth;
use crate::services::OrderError;
use crate::state::AppState;

const CHECKOUT_PATH: &str = "/checkout";

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: Cart,
    /// Prefilled recipient name.
    pub name: String,
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip_all, fields(uid = %user.uid))]
pub async fn show(RequireAuth(user): RequireAuth, page: PageContext, session: Session) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Redirect::to(&with_error("/cart", Notice::CartEmpty)).into_response();
    }

    CheckoutTemplate {
        page,
        cart,
        name: user.display_name.unwrap_or_default(),
    }
    .into_response()
}

/// Place the order and empty the cart.
#[instrument(skip_all, fields(uid = %user.uid))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(address): Form<ShippingAddress>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;

    let order = match state
        .orders(&user)
        .create_order(&user.uid, &cart, address)
        .await
    {
        Ok(order) => order,
        Err(OrderError::Validation(e)) => {
            let path = if cart.is_empty() { "/cart" } else { CHECKOUT_PATH };
            return Ok(Redirect::to(&with_error(path, e.into())).into_response());
        }
        Err(_) => {
            return Ok(Redirect::to(&with_error(CHECKOUT_PATH, Notice::OrderFailed)).into_response());
        }
    };

    cart.clear();
    save_cart(&session, &cart).await?;
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));

    let target = format!("/profile/orders/{}", urlencoding::encode(order.id.as_str()));
    Ok(Redirect::to(&with_notice(&target, Notice::OrderPlaced)).into_response())
}
