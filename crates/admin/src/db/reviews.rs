//! Review and comment moderation.
//!
//! Deleting a review recomputes the product's denormalised rating in the
//! same transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fuelstack_core::models::{Comment, Review};
use fuelstack_core::rating::refresh_product_rating;
use fuelstack_core::{CommentId, ProductId, ReviewId, UserId};

use super::{Page, RepositoryError};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    author_name: Option<String>,
    rating: i16,
    title: Option<String>,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            author_name: row.author_name,
            rating: row.rating,
            title: row.title,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    product_id: ProductId,
    user_id: UserId,
    author_name: Option<String>,
    parent_id: Option<CommentId>,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            author_name: row.author_name,
            parent_id: row.parent_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

/// Repository for moderating reviews and comments.
pub struct ModerationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ModerationRepository<'a> {
    /// Create a new moderation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews, newest first, optionally for one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_reviews(
        &self,
        product_id: Option<ProductId>,
        page: Page,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.product_id, r.user_id, u.name AS author_name,
                   r.rating, r.title, r.body, r.created_at
            FROM shop.review r
            JOIN shop.user u ON u.id = r.user_id
            WHERE $1::int IS NULL OR r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(product_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.review WHERE $1::int IS NULL OR product_id = $1",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Delete a review and refresh the product's rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn delete_review(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id: ProductId =
            sqlx::query_scalar("DELETE FROM shop.review WHERE id = $1 RETURNING product_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        refresh_product_rating(&mut *tx, product_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Comments, newest first, optionally for one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_comments(
        &self,
        product_id: Option<ProductId>,
        page: Page,
    ) -> Result<(Vec<Comment>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT c.id, c.product_id, c.user_id, u.name AS author_name,
                   c.parent_id, c.body, c.created_at
            FROM shop.comment c
            JOIN shop.user u ON u.id = c.user_id
            WHERE $1::int IS NULL OR c.product_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(product_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.comment WHERE $1::int IS NULL OR product_id = $1",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Delete a comment. Replies to it go too.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment doesn't exist.
    pub async fn delete_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.comment WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
