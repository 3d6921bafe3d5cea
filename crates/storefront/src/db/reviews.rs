//! Review repository.
//!
//! Inserting or deleting a review recomputes the product's denormalised
//! `rating_avg` / `rating_count` in the same transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fuelstack_core::models::Review;
use fuelstack_core::rating::{RatingSummary, refresh_product_rating};
use fuelstack_core::{ProductId, ReviewId, UserId};

use super::{RepositoryError, conflict_on_unique};

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

/// Fields of a new review.
#[derive(Debug, Clone)]
pub struct NewReview<'a> {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i16,
    pub title: Option<&'a str>,
    pub body: &'a str,
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.product_id, r.user_id, u.name AS author_name,
                   r.rating, r.title, r.body, r.created_at
            FROM shop.review r
            JOIN shop.user u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Rating summary for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, product_id: ProductId) -> Result<RatingSummary, RepositoryError> {
        let ratings: Vec<i16> =
            sqlx::query_scalar("SELECT rating FROM shop.review WHERE product_id = $1")
                .bind(product_id)
                .fetch_all(self.pool)
                .await?;

        Ok(RatingSummary::from_ratings(ratings))
    }

    /// Add a review and refresh the product's rating aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    pub async fn create(&self, review: NewReview<'_>) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO shop.review (product_id, user_id, rating, title, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, user_id,
                      (SELECT name FROM shop.user WHERE id = $2) AS author_name,
                      rating, title, body, created_at
            ",
        )
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(review.title)
        .bind(review.body)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "you have already reviewed this product"))?;

        refresh_product_rating(&mut *tx, review.product_id).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete one of the user's own reviews and refresh the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist or isn't theirs.
    pub async fn delete_own(&self, user_id: UserId, id: ReviewId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id: ProductId = sqlx::query_scalar(
            "DELETE FROM shop.review WHERE id = $1 AND user_id = $2 RETURNING product_id",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        refresh_product_rating(&mut *tx, product_id).await?;
        tx.commit().await?;

        Ok(())
    }
}
