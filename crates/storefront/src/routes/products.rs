//! Product route handlers.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fuelstack_core::Money;
use fuelstack_core::models::{Brand, Category, Product};
use fuelstack_core::rating::RatingSummary;

use crate::db::Page;
use crate::db::catalog::{CatalogRepository, ProductFilter, ProductSort};
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::routes::Paginated;
use crate::state::AppState;

/// Default products per page.
const DEFAULT_PER_PAGE: i64 = 24;

/// Largest page a client may ask for.
const MAX_PER_PAGE: i64 = 48;

/// How many related products to show.
const RELATED_LIMIT: i64 = 8;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[serde(default)]
    pub in_stock: bool,
}

impl ProductListQuery {
    fn into_filter(self) -> Result<(ProductFilter, Page)> {
        if self.min_price.is_some_and(|p| p.is_sign_negative())
            || self.max_price.is_some_and(|p| p.is_sign_negative())
        {
            return Err(AppError::BadRequest("prices cannot be negative".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_price cannot exceed max_price".to_string(),
            ));
        }

        let page = Page::new(self.page, self.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE);
        let filter = ProductFilter {
            category: non_blank(self.category),
            brand: non_blank(self.brand),
            q: non_blank(self.q),
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock,
            sort: self.sort,
        };
        Ok((filter, page))
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// A product with everything the detail page shows.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: Money,
    pub in_stock: bool,
    pub category: Option<Category>,
    pub brand: Option<Brand>,
    pub rating: RatingSummary,
}

/// List active products.
///
/// # Route
///
/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Paginated<Product>>> {
    let (filter, page) = query.into_filter()?;
    let (products, total) = CatalogRepository::new(state.pool())
        .list_products(&filter, page)
        .await?;

    Ok(Json(Paginated::new(products, total, page)))
}

/// Look up an active product by slug or fail with 404.
pub(crate) async fn active_product(state: &AppState, slug: &str) -> Result<Product> {
    CatalogRepository::new(state.pool())
        .get_active_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Product detail.
///
/// # Route
///
/// `GET /api/products/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = active_product(&state, &slug).await?;

    let catalog = CatalogRepository::new(state.pool());
    let category = match product.category_id {
        Some(id) => catalog.get_category(id).await?,
        None => None,
    };
    let brand = match product.brand_id {
        Some(id) => catalog.get_brand(id).await?,
        None => None,
    };
    let rating = ReviewRepository::new(state.pool())
        .summary(product.id)
        .await?;

    Ok(Json(ProductDetail {
        effective_price: product.effective_price(),
        in_stock: product.in_stock(),
        category,
        brand,
        rating,
        product,
    }))
}

/// Other products from the same category.
///
/// # Route
///
/// `GET /api/products/{slug}/related`
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let product = active_product(&state, &slug).await?;
    let related = CatalogRepository::new(state.pool())
        .related(&product, RELATED_LIMIT)
        .await?;

    Ok(Json(related))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(s: &str) -> ProductListQuery {
        let uri: axum::http::Uri = format!("/api/products?{s}").parse().unwrap();
        axum::extract::Query::<ProductListQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_query_parses_sort_and_paging() {
        let (filter, page) = query("sort=price_desc&page=2&per_page=100&in_stock=true")
            .into_filter()
            .unwrap();
        assert_eq!(filter.sort, ProductSort::PriceDesc);
        assert!(filter.in_stock);
        assert_eq!(page.number, 2);
        assert_eq!(page.size, MAX_PER_PAGE);
    }

    #[test]
    fn test_query_defaults() {
        let (filter, page) = query("q=%20%20&category=whey").into_filter().unwrap();
        assert_eq!(filter.sort, ProductSort::Newest);
        assert_eq!(filter.q, None);
        assert_eq!(filter.category.as_deref(), Some("whey"));
        assert_eq!(page.size, DEFAULT_PER_PAGE);
        assert_eq!(page.number, 1);
    }

    #[test]
    fn test_query_rejects_inverted_price_range() {
        assert!(matches!(
            query("min_price=50000&max_price=10000").into_filter(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query("min_price=-1").into_filter(),
            Err(AppError::BadRequest(_))
        ));
    }
}
