//! Catalog queries: products, categories and brands.
//!
//! The storefront only ever sees active products.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use fuelstack_core::models::{Brand, Category, Product, ProductImage};
use fuelstack_core::{
    BrandId, CategoryId, LocalizedText, Money, ProductId, ProductImageId, Slug,
};

use super::{Page, RepositoryError, search_pattern};

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.slug, p.name, p.description, p.price, \
    p.discount_price, p.stock, p.category_id, p.brand_id, p.is_active, p.is_featured, \
    p.rating_avg, p.rating_count, p.created_at, p.updated_at";

/// Price a customer pays, in SQL. `LEAST` ignores NULL.
const EFFECTIVE_PRICE: &str = "LEAST(p.discount_price, p.price)";

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    slug: Slug,
    name: LocalizedText,
    description: LocalizedText,
    price: Money,
    discount_price: Option<Money>,
    stock: i32,
    category_id: Option<CategoryId>,
    brand_id: Option<BrandId>,
    is_active: bool,
    is_featured: bool,
    rating_avg: Decimal,
    rating_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub(crate) const fn id(&self) -> ProductId {
        self.id
    }

    pub(crate) fn into_product(self, images: Vec<ProductImage>) -> Product {
        Product {
            id: self.id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            price: self.price,
            discount_price: self.discount_price,
            stock: self.stock,
            category_id: self.category_id,
            brand_id: self.brand_id,
            is_active: self.is_active,
            is_featured: self.is_featured,
            rating_avg: self.rating_avg,
            rating_count: self.rating_count,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductImageRow {
    id: ProductImageId,
    product_id: ProductId,
    url: String,
    alt: Option<String>,
    position: i32,
}

#[derive(sqlx::FromRow)]
pub(crate) struct CategoryRow {
    id: CategoryId,
    slug: Slug,
    name: LocalizedText,
    description: Option<LocalizedText>,
    image_url: Option<String>,
    sort_order: i32,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryCountRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    products_count: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct BrandRow {
    id: BrandId,
    slug: Slug,
    name: String,
    logo_url: Option<String>,
    country: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            logo_url: row.logo_url,
            country: row.country,
            created_at: row.created_at,
        }
    }
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Popular,
}

impl ProductSort {
    fn order_by(self) -> String {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC".to_owned(),
            Self::PriceAsc => format!("{EFFECTIVE_PRICE} ASC, p.id"),
            Self::PriceDesc => format!("{EFFECTIVE_PRICE} DESC, p.id"),
            Self::Rating => "p.rating_avg DESC, p.rating_count DESC, p.id".to_owned(),
            Self::Popular => "p.sold_count DESC, p.rating_count DESC, p.id".to_owned(),
        }
    }
}

/// Filters for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Brand slug.
    pub brand: Option<String>,
    /// Free-text search over localized names.
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: bool,
    pub sort: ProductSort,
}

/// A category with its number of active products.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub products_count: i64,
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching a filter, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let conditions = format!(
            r"
            p.is_active
              AND ($1::text IS NULL OR c.slug = $1)
              AND ($2::text IS NULL OR b.slug = $2)
              AND ($3::text IS NULL
                   OR p.name->>'mn' ILIKE $3
                   OR p.name->>'en' ILIKE $3)
              AND ($4::numeric IS NULL OR {EFFECTIVE_PRICE} >= $4)
              AND ($5::numeric IS NULL OR {EFFECTIVE_PRICE} <= $5)
              AND (NOT $6 OR p.stock > 0)
            "
        );
        let from = "FROM shop.product p \
                    LEFT JOIN shop.category c ON c.id = p.category_id \
                    LEFT JOIN shop.brand b ON b.id = p.brand_id";
        let q = search_pattern(filter.q.as_deref());

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} {from} WHERE {conditions} ORDER BY {} LIMIT $7 OFFSET $8",
            filter.sort.order_by()
        ))
        .bind(filter.category.as_deref())
        .bind(filter.brand.as_deref())
        .bind(q.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.in_stock)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) {from} WHERE {conditions}"))
                .bind(filter.category.as_deref())
                .bind(filter.brand.as_deref())
                .bind(q.as_deref())
                .bind(filter.min_price)
                .bind(filter.max_price)
                .bind(filter.in_stock)
                .fetch_one(self.pool)
                .await?;

        Ok((self.attach_images(rows).await?, total))
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.slug = $1 AND p.is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(self.attach_images(row.into_iter().collect()).await?.pop())
    }

    /// Get active products by ID, in no particular order. Missing or inactive
    /// IDs are absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.id = ANY($1) AND p.is_active"
        ))
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// Up to `limit` other active products in the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let Some(category_id) = product.category_id else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM shop.product p
            WHERE p.category_id = $1 AND p.id <> $2 AND p.is_active
            ORDER BY p.rating_avg DESC, p.created_at DESC
            LIMIT $3
            "
        ))
        .bind(category_id)
        .bind(product.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// List categories with their active product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<CategoryWithCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(
            r"
            SELECT c.id, c.slug, c.name, c.description, c.image_url, c.sort_order, c.created_at,
                   COUNT(p.id) FILTER (WHERE p.is_active) AS products_count
            FROM shop.category c
            LEFT JOIN shop.product p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.sort_order, c.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CategoryWithCount {
                category: row.category.into(),
                products_count: row.products_count,
            })
            .collect())
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, slug, name, description, image_url, sort_order, created_at
            FROM shop.category WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, slug, name, description, image_url, sort_order, created_at
            FROM shop.category WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// List all brands by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandRow>(
            "SELECT id, slug, name, logo_url, country, created_at FROM shop.brand ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Brand::from).collect())
    }

    /// Get a brand by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_brand(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(
            "SELECT id, slug, name, logo_url, country, created_at FROM shop.brand WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Brand::from))
    }

    /// Load images for product rows, preserving row order.
    pub(crate) async fn attach_images(
        &self,
        rows: Vec<ProductRow>,
    ) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|row| row.id().as_i32()).collect();

        let images = sqlx::query_as::<_, ProductImageRow>(
            r"
            SELECT id, product_id, url, alt, position
            FROM shop.product_image
            WHERE product_id = ANY($1)
            ORDER BY product_id, position, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_product: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
        for image in images {
            by_product
                .entry(image.product_id)
                .or_default()
                .push(ProductImage {
                    id: image.id,
                    url: image.url,
                    alt: image.alt,
                    position: image.position,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let images = by_product.remove(&row.id()).unwrap_or_default();
                row.into_product(images)
            })
            .collect())
    }
}
