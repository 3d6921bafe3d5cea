//! Product reviews and comments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{CommentId, ProductId, ReviewId, UserId};

/// A star rating with text. One per user per product.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Reviewer display name at read time.
    pub author_name: Option<String>,
    pub rating: i16,
    pub title: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A product discussion comment, optionally replying to another.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: Option<String>,
    pub parent_id: Option<CommentId>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
