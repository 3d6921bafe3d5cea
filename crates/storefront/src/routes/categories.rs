//! Category and brand route handlers.

use axum::extract::State;
use tracing::instrument;

use fuelstack_core::models::{Brand, Category};

use crate::db::catalog::{CatalogRepository, CategoryWithCount};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::state::AppState;

/// All categories with active product counts.
///
/// # Route
///
/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CategoryWithCount>>> {
    Ok(Json(
        CatalogRepository::new(state.pool()).list_categories().await?,
    ))
}

/// One category.
///
/// # Route
///
/// `GET /api/categories/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    CatalogRepository::new(state.pool())
        .get_category_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// All brands.
///
/// # Route
///
/// `GET /api/brands`
#[instrument(skip(state))]
pub async fn brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    Ok(Json(CatalogRepository::new(state.pool()).list_brands().await?))
}
