//! Product management handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fuelstack_core::models::Product;
use fuelstack_core::{BrandId, CategoryId, LocalizedText, Money, ProductId};

use crate::db::products::{ImageWrite, ProductListFilter, ProductWrite};
use crate::db::{Page, ProductRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::routes::Paginated;
use crate::routes::input::{http_url, optional_text, required_localized, resolve_localized_slug};
use crate::state::AppState;

const MAX_IMAGES: usize = 20;
const MAX_ALT_LENGTH: usize = 200;

/// Query parameters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
    pub active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A product image: a bare URL or a URL with alt text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImageRequest {
    Url(String),
    Detailed { url: String, alt: Option<String> },
}

/// Body of product create and update. Images are given in display order and
/// replace the existing set.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub slug: Option<String>,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub price: Money,
    pub discount_price: Option<Money>,
    #[serde(default)]
    pub stock: i32,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub images: Vec<ImageRequest>,
}

const fn default_active() -> bool {
    true
}

/// Body of `PATCH /api/admin/products/{id}/stock`.
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub stock: i32,
}

fn validate_stock(stock: i32) -> Result<i32> {
    if stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".to_string()));
    }
    Ok(stock)
}

impl ProductRequest {
    fn into_write(self) -> Result<ProductWrite> {
        let name = required_localized("name", self.name)?;
        let slug = resolve_localized_slug(self.slug.as_deref(), &name)?;

        if self.price.is_zero() {
            return Err(AppError::BadRequest(
                "price must be greater than zero".to_string(),
            ));
        }
        if self.discount_price.is_some_and(|discount| discount >= self.price) {
            return Err(AppError::BadRequest(
                "discount_price must be lower than price".to_string(),
            ));
        }
        let stock = validate_stock(self.stock)?;

        if self.images.len() > MAX_IMAGES {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_IMAGES} images are allowed"
            )));
        }
        let images = self
            .images
            .into_iter()
            .map(|image| {
                let (url, alt) = match image {
                    ImageRequest::Url(url) => (url, None),
                    ImageRequest::Detailed { url, alt } => (url, alt),
                };
                Ok(ImageWrite {
                    url: http_url("image url", &url)?,
                    alt: optional_text("image alt", alt.as_deref(), MAX_ALT_LENGTH)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductWrite {
            slug,
            name,
            description: self.description,
            price: self.price,
            discount_price: self.discount_price,
            stock,
            category_id: self.category_id,
            brand_id: self.brand_id,
            is_active: self.is_active,
            is_featured: self.is_featured,
            images,
        })
    }
}

/// Products in any state, newest first.
///
/// # Route
///
/// `GET /api/admin/products`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Paginated<Product>>> {
    let page = Page::new(query.page, query.per_page);
    let filter = ProductListFilter {
        q: query.q,
        category_id: query.category_id,
        active: query.active,
    };

    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(Json(Paginated::new(products, total, page)))
}

/// One product with its images.
///
/// # Route
///
/// `GET /api/admin/products/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Create a product. The slug is derived from the name when omitted.
///
/// # Route
///
/// `POST /api/admin/products`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = body.into_write()?;
    let created = ProductRepository::new(state.pool()).create(&product).await?;

    tracing::info!(product_id = %created.id, slug = %created.slug, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a product, including its images.
///
/// # Route
///
/// `PUT /api/admin/products/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let product = body.into_write()?;
    let updated = ProductRepository::new(state.pool())
        .update(id, &product)
        .await?;

    Ok(Json(updated))
}

/// Set the stock level.
///
/// # Route
///
/// `PATCH /api/admin/products/{id}/stock`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, stock = body.stock))]
pub async fn update_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<StockRequest>,
) -> Result<Json<Product>> {
    let stock = validate_stock(body.stock)?;
    let updated = ProductRepository::new(state.pool())
        .set_stock(id, stock)
        .await?;

    Ok(Json(updated))
}

/// Delete a product. Past orders keep their line snapshots.
///
/// # Route
///
/// `DELETE /api/admin/products/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> ProductRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_slug_derived_from_english_name() {
        let write = request(json!({
            "name": {"mn": "Уураг", "en": "Whey Gold 2kg"},
            "price": 189000,
        }))
        .into_write()
        .unwrap();

        assert_eq!(write.slug.as_str(), "whey-gold-2kg");
        assert!(write.is_active);
        assert!(!write.is_featured);
        assert_eq!(write.stock, 0);
    }

    #[test]
    fn test_discount_must_be_lower_than_price() {
        let err = request(json!({
            "name": {"en": "BCAA"},
            "price": 50000,
            "discount_price": 50000,
        }))
        .into_write()
        .unwrap_err();
        assert!(err.to_string().contains("discount_price"));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let result = request(json!({
            "name": {"en": "BCAA"},
            "price": 50000,
            "stock": -1,
        }))
        .into_write();
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_price_fails_to_parse() {
        let result = serde_json::from_value::<ProductRequest>(json!({
            "name": {"en": "BCAA"},
            "price": -5,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_images_keep_order_and_accept_both_shapes() {
        let write = request(json!({
            "name": {"en": "Creatine"},
            "price": 45000,
            "images": [
                "https://cdn.fuelstack.mn/front.jpg",
                {"url": "https://cdn.fuelstack.mn/back.jpg", "alt": "Label"},
            ],
        }))
        .into_write()
        .unwrap();

        assert_eq!(
            write.images,
            vec![
                ImageWrite {
                    url: "https://cdn.fuelstack.mn/front.jpg".to_string(),
                    alt: None,
                },
                ImageWrite {
                    url: "https://cdn.fuelstack.mn/back.jpg".to_string(),
                    alt: Some("Label".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_blank_name_rejected() {
        let result = request(json!({
            "name": {"mn": " ", "en": ""},
            "slug": "blank",
            "price": 1000,
        }))
        .into_write();
        assert!(result.is_err());
    }
}
