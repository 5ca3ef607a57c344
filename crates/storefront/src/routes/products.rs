//! Product route handlers.
//!
//! The listing filters the full catalog on every request; the category page
//! asks the document database for one category instead.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use elida_core::catalog::{DEFAULT_MAX_PRICE, DEFAULT_MIN_PRICE};
use elida_core::{CatalogFilter, CategorySelector, DescriptionSections, Price, Product, categories};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::page::PageContext;
use super::wishlist::load_wishlist;
use crate::error::{AppError, Result};
use crate::filters;
use crate::messages::Notice;
use crate::state::AppState;

/// A product in a grid, with its wishlist state.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub product: Product,
    pub wishlisted: bool,
}

/// Listing query parameters. Prices arrive as free text from the form.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn parse_price(raw: Option<&str>, default: u32) -> Price {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(&s.replace(',', ".")).ok())
        .map_or_else(|| Price::from_euros(default), Price::new)
}

impl CatalogQuery {
    fn to_filter(&self) -> CatalogFilter {
        CatalogFilter::default()
            .with_query(self.q.as_deref().unwrap_or_default())
            .with_category(CategorySelector::from_param(self.category.as_deref()))
            .with_price_range(
                parse_price(self.min_price.as_deref(), DEFAULT_MIN_PRICE),
                parse_price(self.max_price.as_deref(), DEFAULT_MAX_PRICE),
            )
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<String>,
    pub query: String,
    pub selected_category: String,
    pub min_price: String,
    pub max_price: String,
    /// Filters narrowed the list, so an empty result means "no match".
    pub filtered: bool,
    pub load_failed: bool,
}

/// Single-category page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/category.html")]
pub struct CategoryTemplate {
    pub page: PageContext,
    pub category: String,
    /// Where the wishlist buttons come back to.
    pub return_to: String,
    pub products: Vec<ProductCard>,
    pub load_failed: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub sections: DescriptionSections,
    pub wishlisted: bool,
    pub return_to: String,
}

/// Detail page path for a product id.
#[must_use]
pub fn product_path(id: &str) -> String {
    format!("/products/{}", urlencoding::encode(id))
}

/// Quick view fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub product: Product,
    pub sections: DescriptionSections,
}

async fn cards<'a>(session: &Session, products: impl IntoIterator<Item = &'a Product>) -> Vec<ProductCard> {
    let wishlist = load_wishlist(session).await;
    products
        .into_iter()
        .map(|product| ProductCard {
            wishlisted: wishlist.contains(&product.id),
            product: product.clone(),
        })
        .collect()
}

/// Display product listing page.
#[instrument(skip(state, page, session))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let filter = query.to_filter();

    let (products, categories, load_failed, page) = match state.catalog().fetch_products().await {
        Ok(all) => (
            cards(&session, filter.apply(&all)).await,
            categories(&all),
            false,
            page,
        ),
        Err(_) => (
            Vec::new(),
            categories(&[]),
            true,
            page.with_error(Notice::CatalogUnavailable),
        ),
    };

    ProductsIndexTemplate {
        page,
        products,
        categories,
        query: filter.query().to_owned(),
        selected_category: filter.category().label().to_owned(),
        min_price: filter.min_price().amount().to_string(),
        max_price: filter.max_price().amount().to_string(),
        filtered: filter.is_active(),
        load_failed,
    }
}

/// Display one category, queried server-side.
#[instrument(skip(state, page, session))]
pub async fn category(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let (products, load_failed, page) =
        match state.catalog().fetch_products_by_category(&name).await {
            Ok(products) => (cards(&session, products.iter()).await, false, page),
            Err(_) => (Vec::new(), true, page.with_error(Notice::CatalogUnavailable)),
        };

    CategoryTemplate {
        page,
        return_to: format!("/category/{}", urlencoding::encode(&name)),
        category: name,
        products,
        load_failed,
    }
}

async fn find(state: &AppState, id: &str) -> Result<Product> {
    state
        .catalog()
        .fetch_product_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Display product detail page.
#[instrument(skip(state, page, session))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = find(&state, &id).await?;
    let wishlisted = load_wishlist(&session).await.contains(&product.id);

    Ok(ProductShowTemplate {
        page,
        sections: product.description_sections(),
        return_to: product_path(product.id.as_str()),
        product,
        wishlisted,
    })
}

/// Quick view fragment, loaded into a dialog over the product grid.
#[instrument(skip(state))]
pub async fn quick_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = find(&state, &id).await?;
    Ok(QuickViewTemplate {
        sections: product.description_sections(),
        product,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_params_fall_back_to_defaults() {
        let query = CatalogQuery {
            min_price: Some("abc".to_string()),
            max_price: Some(String::new()),
            ..CatalogQuery::default()
        };
        let filter = query.to_filter();
        assert_eq!(filter.min_price(), Price::from_euros(DEFAULT_MIN_PRICE));
        assert_eq!(filter.max_price(), Price::from_euros(DEFAULT_MAX_PRICE));
        assert!(!filter.is_active());
    }

    #[test]
    fn test_product_path_encodes_id() {
        assert_eq!(product_path("losjonas"), "/products/losjonas");
        assert_eq!(product_path("a b/c"), "/products/a%20b%2Fc");
    }

    #[test]
    fn test_decimal_comma_is_accepted() {
        assert_eq!(
            parse_price(Some("12,50"), 0),
            Price::new(Decimal::new(1250, 2))
        );
    }

    #[test]
    fn test_category_param_all_sentinel() {
        let query = CatalogQuery {
            category: Some("Visi".to_string()),
            q: Some("  losjonas ".to_string()),
            ..CatalogQuery::default()
        };
        let filter = query.to_filter();
        assert_eq!(filter.category(), &CategorySelector::All);
        assert_eq!(filter.query(), "losjonas");
        assert!(filter.is_active());
    }
}
