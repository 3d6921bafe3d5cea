//! Wishlist repository.

use sqlx::PgPool;

use fuelstack_core::models::Product;
use fuelstack_core::{ProductId, UserId};

use super::RepositoryError;
use super::catalog::{CatalogRepository, PRODUCT_COLUMNS, ProductRow};

/// Repository for a user's wishlist.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Wishlisted products, most recently added first.
    ///
    /// Inactive products stay listed so the customer can remove them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.wishlist w
            JOIN shop.product p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        CatalogRepository::new(self.pool).attach_images(rows).await
    }

    /// Add the product if absent, remove it if present. Returns whether the
    /// product is wishlisted afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn toggle(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM shop.wishlist WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !removed {
            sqlx::query("INSERT INTO shop.wishlist (user_id, product_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.is_foreign_key_violation()
                    {
                        return RepositoryError::NotFound;
                    }
                    RepositoryError::Database(e)
                })?;
        }

        tx.commit().await?;
        Ok(!removed)
    }

    /// Remove a product from the wishlist. Removing an absent entry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.wishlist WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
