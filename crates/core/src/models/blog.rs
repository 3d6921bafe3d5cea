//! Blog content.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{BlogCategoryId, BlogPostId, BlogTagId, PostStatus, Slug, UserId};

/// A blog category.
#[derive(Debug, Clone, Serialize)]
pub struct BlogCategory {
    pub id: BlogCategoryId,
    pub slug: Slug,
    pub name: String,
    pub description: Option<String>,
    /// Number of posts in the category, when the query computed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_count: Option<i64>,
}

/// A blog tag. Tags attach to posts through a join table.
#[derive(Debug, Clone, Serialize)]
pub struct BlogTag {
    pub id: BlogTagId,
    pub slug: Slug,
    pub name: String,
}

/// A blog post. `content` is markdown.
#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub slug: Slug,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub status: PostStatus,
    pub category_id: Option<BlogCategoryId>,
    pub author_id: Option<UserId>,
    pub view_count: i64,
    pub tags: Vec<BlogTag>,
    /// Set the first time the post is published.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Whether the post is visible on the storefront.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(self.status, PostStatus::Published)
    }
}
