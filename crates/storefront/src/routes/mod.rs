//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (featured products)
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (catalog reachable)
//!
//! # Catalog
//! GET  /products                      - Listing (?q=&category=&min_price=&max_price=)
//! GET  /products/{id}                 - Product detail
//! GET  /products/{id}/quick-view      - Quick view fragment
//! GET  /category/{name}               - One category, queried server-side
//!
//! # Cart and wishlist (session-backed)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add a line
//! POST /cart/update                   - Change a line's quantity
//! POST /cart/remove                   - Remove a line
//! GET  /cart/count                    - Cart count badge (fragment)
//! GET  /wishlist                      - Wishlist page
//! POST /wishlist/toggle               - Add or remove a product
//!
//! # Auth
//! GET  /signin                        - Sign-in page (?mode=signup for sign-up)
//! POST /signin                        - Sign in
//! POST /signup                        - Create an account
//! GET  /password-reset                - Password reset page
//! POST /password-reset                - Send the reset email
//! POST /signout                       - Sign out
//! GET  /auth/google                   - Start Google sign-in (?flow=popup|redirect)
//! GET  /auth/google/callback          - Finish Google sign-in
//!
//! # Account (requires auth)
//! GET  /profile                       - Profile, orders and bookings
//! POST /profile                       - Change display name
//! GET  /profile/orders/{id}           - Order detail
//! POST /profile/orders/{id}/cancel    - Cancel a pending order
//! GET  /checkout                      - Checkout form
//! POST /checkout                      - Place the order
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod google;
pub mod health;
pub mod home;
pub mod page;
pub mod products;
pub mod profile;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{RateLimiterLayer, auth_rate_limiter, cart_rate_limiter};
use crate::state::AppState;

fn limited(router: Router<AppState>, limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    match limiter {
        Some(layer) => router.route_layer(layer),
        None => router,
    }
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/products/{id}/quick-view", get(products::quick_view))
        .route("/category/{name}", get(products::category))
}

/// Create the cart and wishlist routes router.
pub fn cart_routes(rate_limit: bool) -> Router<AppState> {
    let mutations = Router::new()
        .route("/cart/add", post(cart::add))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove", post(cart::remove))
        .route("/wishlist/toggle", post(wishlist::toggle));

    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/count", get(cart::count))
        .route("/wishlist", get(wishlist::show))
        .merge(limited(mutations, rate_limit.then(cart_rate_limiter)))
}

/// Create the auth routes router.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let credentials = Router::new()
        .route("/signin", post(auth::sign_in))
        .route("/signup", post(auth::sign_up))
        .route("/password-reset", post(auth::password_reset));

    Router::new()
        .route("/signin", get(auth::signin_page))
        .route("/password-reset", get(auth::password_reset_page))
        .route("/signout", post(auth::sign_out))
        .route("/auth/google", get(google::start))
        .route(google::CALLBACK_PATH, get(google::callback))
        .merge(limited(credentials, rate_limit.then(auth_rate_limiter)))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::index).post(profile::update))
        .route("/profile/orders/{id}", get(profile::order))
        .route("/profile/orders/{id}/cancel", post(profile::cancel_order))
        .route("/checkout", get(checkout::show).post(checkout::place))
}

/// Create all routes for the storefront.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(product_routes())
        .merge(cart_routes(rate_limit))
        .merge(auth_routes(rate_limit))
        .merge(account_routes())
}
