//! Product management.
//!
//! Images are owned by their product and replaced wholesale on every write,
//! in the same transaction as the product row.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use fuelstack_core::models::{Product, ProductImage};
use fuelstack_core::{
    BrandId, CategoryId, LocalizedText, Money, ProductId, ProductImageId, Slug,
};

use super::{Page, RepositoryError, search_pattern, write_conflict};

const PRODUCT_COLUMNS: &str = "id, slug, name, description, price, discount_price, stock, \
    category_id, brand_id, is_active, is_featured, rating_avg, rating_count, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
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
    fn into_product(self, images: Vec<ProductImage>) -> Product {
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

/// A product image to store; position is its index in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageWrite {
    pub url: String,
    pub alt: Option<String>,
}

/// A validated product, ready to insert or overwrite.
#[derive(Debug, Clone)]
pub struct ProductWrite {
    pub slug: Slug,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub stock: i32,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
    pub is_active: bool,
    pub is_featured: bool,
    pub images: Vec<ImageWrite>,
}

/// Filters for the admin product list. Inactive products are included
/// unless `active` says otherwise.
#[derive(Debug, Clone, Default)]
pub struct ProductListFilter {
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
    pub active: Option<bool>,
}

/// Repository for product administration.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductListFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let conditions = r"
            ($1::text IS NULL
             OR slug ILIKE $1
             OR name->>'mn' ILIKE $1
             OR name->>'en' ILIKE $1)
            AND ($2::int IS NULL OR category_id = $2)
            AND ($3::bool IS NULL OR is_active = $3)
        ";
        let q = search_pattern(filter.q.as_deref());

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE {conditions} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(q.as_deref())
        .bind(filter.category_id)
        .bind(filter.active)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM shop.product WHERE {conditions}"))
                .bind(q.as_deref())
                .bind(filter.category_id)
                .bind(filter.active)
                .fetch_one(self.pool)
                .await?;

        Ok((self.attach_images(rows).await?, total))
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(self.attach_images(row.into_iter().collect()).await?.pop())
    }

    /// Insert a product with its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the
    /// category/brand doesn't exist.
    pub async fn create(&self, product: &ProductWrite) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO shop.product
                (slug, name, description, price, discount_price, stock,
                 category_id, brand_id, is_active, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            ",
        )
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.stock)
        .bind(product.category_id)
        .bind(product.brand_id)
        .bind(product.is_active)
        .bind(product.is_featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(product_conflict)?;

        replace_images(&mut tx, id, &product.images).await?;
        tx.commit().await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Overwrite a product and replace its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken or the
    /// category/brand doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        product: &ProductWrite,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE shop.product SET
                slug = $2, name = $3, description = $4, price = $5, discount_price = $6,
                stock = $7, category_id = $8, brand_id = $9, is_active = $10,
                is_featured = $11, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.stock)
        .bind(product.category_id)
        .bind(product.brand_id)
        .bind(product.is_active)
        .bind(product.is_featured)
        .execute(&mut *tx)
        .await
        .map_err(product_conflict)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        replace_images(&mut tx, id, &product.images).await?;
        tx.commit().await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Set the stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_stock(&self, id: ProductId, stock: i32) -> Result<Product, RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.product SET stock = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(stock)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Order lines keep their snapshot with `product_id` NULL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of products, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM shop.product")
            .fetch_one(self.pool)
            .await?)
    }

    /// Active products at or below a stock level, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product \
             WHERE is_active AND stock <= $1 ORDER BY stock, id LIMIT $2"
        ))
        .bind(threshold)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    async fn attach_images(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|row| row.id.as_i32()).collect();

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
                let images = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(images)
            })
            .collect())
    }
}

fn product_conflict(e: sqlx::Error) -> RepositoryError {
    write_conflict(
        e,
        "a product with this slug already exists",
        "category or brand does not exist",
    )
}

async fn replace_images(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    images: &[ImageWrite],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.product_image WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

    for (position, image) in images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO shop.product_image (product_id, url, alt, position) VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(&image.url)
        .bind(image.alt.as_deref())
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
