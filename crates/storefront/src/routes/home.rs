//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use elida_core::Product;
use tracing::instrument;

use super::page::PageContext;
use crate::filters;
use crate::state::AppState;

/// A hero banner call to action.
#[derive(Clone)]
pub struct HeroSlide {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub button_text: &'static str,
    pub button_url: &'static str,
}

const HERO: HeroSlide = HeroSlide {
    title: "Tobulas įdegis be saulės",
    subtitle: "Profesionalios savaiminio įdegio priemonės namams ir salonui.",
    button_text: "Peržiūrėti produktus",
    button_url: "/products",
};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub hero: HeroSlide,
    /// Empty when the catalog could not be loaded.
    pub featured: Vec<Product>,
}

/// Display the home page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    // The catalog service already logged the failure.
    let featured = state.catalog().featured().await.unwrap_or_default();

    HomeTemplate {
        page,
        hero: HERO,
        featured,
    }
}
