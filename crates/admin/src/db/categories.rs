//! Product categories and brands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use fuelstack_core::models::{Brand, Category};
use fuelstack_core::{BrandId, CategoryId, LocalizedText, Slug};

use super::{RepositoryError, conflict_on_unique};

const CATEGORY_COLUMNS: &str = "c.id, c.slug, c.name, c.description, c.image_url, c.sort_order, c.created_at";
const BRAND_COLUMNS: &str = "id, slug, name, logo_url, country, created_at";

#[derive(sqlx::FromRow)]
struct CategoryRow {
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

/// A category with the number of products (active or not) filed under it.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCategory {
    #[serde(flatten)]
    pub category: Category,
    pub products_count: i64,
}

/// Fields of a category to insert or overwrite.
#[derive(Debug, Clone)]
pub struct CategoryWrite {
    pub slug: Slug,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub image_url: Option<String>,
    pub sort_order: i32,
}

#[derive(sqlx::FromRow)]
struct BrandRow {
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

/// Fields of a brand to insert or overwrite.
#[derive(Debug, Clone)]
pub struct BrandWrite {
    pub slug: Slug,
    pub name: String,
    pub logo_url: Option<String>,
    pub country: Option<String>,
}

/// Repository for category administration.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in display order, with product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(&format!(
            r"
            SELECT {CATEGORY_COLUMNS}, COUNT(p.id) AS products_count
            FROM shop.category c
            LEFT JOIN shop.product p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.sort_order, c.id
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| AdminCategory {
                category: row.category.into(),
                products_count: row.products_count,
            })
            .collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.category c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, category: &CategoryWrite) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category AS c (slug, name, description, image_url, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING c.id, c.slug, c.name, c.description, c.image_url, c.sort_order, c.created_at
            ",
        )
        .bind(&category.slug)
        .bind(&category.name)
        .bind(category.description.as_ref())
        .bind(category.image_url.as_deref())
        .bind(category.sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a category with this slug already exists"))?;

        Ok(row.into())
    }

    /// Overwrite a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        category: &CategoryWrite,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.category AS c
            SET slug = $2, name = $3, description = $4, image_url = $5, sort_order = $6
            WHERE c.id = $1
            RETURNING c.id, c.slug, c.name, c.description, c.image_url, c.sort_order, c.created_at
            ",
        )
        .bind(id)
        .bind(&category.slug)
        .bind(&category.name)
        .bind(category.description.as_ref())
        .bind(category.image_url.as_deref())
        .bind(category.sort_order)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a category with this slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category that no product references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InUse` with the product count if any product
    /// is filed under it. Returns `RepositoryError::NotFound` if it doesn't exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.product WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if count > 0 {
            return Err(RepositoryError::InUse {
                entity: "category",
                count_key: "products_count",
                count,
            });
        }

        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Repository for brand administration.
pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All brands by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandRow>(&format!(
            "SELECT {BRAND_COLUMNS} FROM shop.brand ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a brand by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(&format!(
            "SELECT {BRAND_COLUMNS} FROM shop.brand WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, brand: &BrandWrite) -> Result<Brand, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(&format!(
            "INSERT INTO shop.brand (slug, name, logo_url, country) VALUES ($1, $2, $3, $4) \
             RETURNING {BRAND_COLUMNS}"
        ))
        .bind(&brand.slug)
        .bind(&brand.name)
        .bind(brand.logo_url.as_deref())
        .bind(brand.country.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a brand with this slug already exists"))?;

        Ok(row.into())
    }

    /// Overwrite a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: BrandId, brand: &BrandWrite) -> Result<Brand, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(&format!(
            "UPDATE shop.brand SET slug = $2, name = $3, logo_url = $4, country = $5 \
             WHERE id = $1 RETURNING {BRAND_COLUMNS}"
        ))
        .bind(id)
        .bind(&brand.slug)
        .bind(&brand.name)
        .bind(brand.logo_url.as_deref())
        .bind(brand.country.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a brand with this slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a brand. Its products stay, with no brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand doesn't exist.
    pub async fn delete(&self, id: BrandId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.brand WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
