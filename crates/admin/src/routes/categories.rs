//! Product category and brand handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fuelstack_core::models::{Brand, Category};
use fuelstack_core::{BrandId, CategoryId, LocalizedText};

use crate::db::categories::{AdminCategory, BrandWrite, CategoryWrite};
use crate::db::{BrandRepository, CategoryRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::routes::input::{
    optional_text, optional_url, required_localized, required_text, resolve_localized_slug,
    resolve_slug,
};
use crate::state::AppState;

const MAX_BRAND_NAME: usize = 120;
const MAX_COUNTRY: usize = 80;

/// Body of category create and update.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub slug: Option<String>,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl CategoryRequest {
    fn into_write(self) -> Result<CategoryWrite> {
        let name = required_localized("name", self.name)?;
        Ok(CategoryWrite {
            slug: resolve_localized_slug(self.slug.as_deref(), &name)?,
            name,
            description: self.description.filter(|d| !d.is_blank()),
            image_url: optional_url("image_url", self.image_url.as_deref())?,
            sort_order: self.sort_order,
        })
    }
}

/// Body of brand create and update.
#[derive(Debug, Deserialize)]
pub struct BrandRequest {
    pub slug: Option<String>,
    pub name: String,
    pub logo_url: Option<String>,
    pub country: Option<String>,
}

impl BrandRequest {
    fn into_write(self) -> Result<BrandWrite> {
        let name = required_text("name", &self.name, MAX_BRAND_NAME)?;
        Ok(BrandWrite {
            slug: resolve_slug(self.slug.as_deref(), &name)?,
            name,
            logo_url: optional_url("logo_url", self.logo_url.as_deref())?,
            country: optional_text("country", self.country.as_deref(), MAX_COUNTRY)?,
        })
    }
}

/// All categories with product counts.
///
/// # Route
///
/// `GET /api/admin/categories`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<AdminCategory>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// # Route
///
/// `GET /api/admin/categories/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// # Route
///
/// `POST /api/admin/categories`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = body.into_write()?;
    let created = CategoryRepository::new(state.pool())
        .create(&category)
        .await?;

    tracing::info!(category_id = %created.id, slug = %created.slug, "Category created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// # Route
///
/// `PUT /api/admin/categories/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    let category = body.into_write()?;
    let updated = CategoryRepository::new(state.pool())
        .update(id, &category)
        .await?;
    Ok(Json(updated))
}

/// Delete a category. Refused with `products_count` while products use it.
///
/// # Route
///
/// `DELETE /api/admin/categories/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// All brands by name.
///
/// # Route
///
/// `GET /api/admin/brands`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn brands_index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Brand>>> {
    let brands = BrandRepository::new(state.pool()).list().await?;
    Ok(Json(brands))
}

/// # Route
///
/// `GET /api/admin/brands/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn brands_show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BrandId>,
) -> Result<Json<Brand>> {
    BrandRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))
}

/// # Route
///
/// `POST /api/admin/brands`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn brands_create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<BrandRequest>,
) -> Result<(StatusCode, Json<Brand>)> {
    let brand = body.into_write()?;
    let created = BrandRepository::new(state.pool()).create(&brand).await?;

    tracing::info!(brand_id = %created.id, slug = %created.slug, "Brand created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// # Route
///
/// `PUT /api/admin/brands/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn brands_update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BrandId>,
    Json(body): Json<BrandRequest>,
) -> Result<Json<Brand>> {
    let brand = body.into_write()?;
    let updated = BrandRepository::new(state.pool()).update(id, &brand).await?;
    Ok(Json(updated))
}

/// Delete a brand. Its products stay, without a brand.
///
/// # Route
///
/// `DELETE /api/admin/brands/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn brands_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BrandId>,
) -> Result<StatusCode> {
    BrandRepository::new(state.pool()).delete(id).await?;
    tracing::info!(brand_id = %id, "Brand deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fuelstack_core::Locale;
    use serde_json::json;

    #[test]
    fn test_category_blank_description_dropped() {
        let request: CategoryRequest = serde_json::from_value(json!({
            "name": {"mn": "Уураг", "en": "Protein"},
            "description": {"mn": "", "en": " "},
        }))
        .unwrap();

        let write = request.into_write().unwrap();
        assert_eq!(write.slug.as_str(), "protein");
        assert_eq!(write.name.get(Locale::Mn), Some("Уураг"));
        assert!(write.description.is_none());
        assert_eq!(write.sort_order, 0);
    }

    #[test]
    fn test_category_bad_image_url() {
        let request: CategoryRequest = serde_json::from_value(json!({
            "name": {"en": "Protein"},
            "image_url": "ftp://files/protein.png",
        }))
        .unwrap();
        assert!(request.into_write().is_err());
    }

    #[test]
    fn test_brand_slug_and_optional_fields() {
        let request = BrandRequest {
            slug: None,
            name: " Optimum Nutrition ".to_string(),
            logo_url: Some(String::new()),
            country: Some("USA".to_string()),
        };

        let write = request.into_write().unwrap();
        assert_eq!(write.name, "Optimum Nutrition");
        assert_eq!(write.slug.as_str(), "optimum-nutrition");
        assert_eq!(write.logo_url, None);
        assert_eq!(write.country.as_deref(), Some("USA"));
    }
}
