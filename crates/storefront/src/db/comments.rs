//! Product comment repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fuelstack_core::models::Comment;
use fuelstack_core::{CommentId, ProductId, UserId};

use super::RepositoryError;

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

/// Repository for product comments.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a product's comments, oldest first so threads read top-down.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT c.id, c.product_id, c.user_id, u.name AS author_name,
                   c.parent_id, c.body, c.created_at
            FROM shop.comment c
            JOIN shop.user u ON u.id = c.user_id
            WHERE c.product_id = $1
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    /// The product a comment belongs to, if the comment exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_of(&self, id: CommentId) -> Result<Option<ProductId>, RepositoryError> {
        let product_id = sqlx::query_scalar("SELECT product_id FROM shop.comment WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product_id)
    }

    /// Add a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        parent_id: Option<CommentId>,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            INSERT INTO shop.comment (product_id, user_id, parent_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id,
                      (SELECT name FROM shop.user WHERE id = $2) AS author_name,
                      parent_id, body, created_at
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(body)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
