//! Blog route handlers. Drafts and archived posts are never visible here.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fuelstack_core::models::{BlogCategory, BlogPost, BlogTag};

use crate::content::render_markdown;
use crate::db::Page;
use crate::db::blog::BlogRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::routes::Paginated;
use crate::routes::products::non_blank;
use crate::state::AppState;

const POSTS_PER_PAGE: i64 = 12;

/// Query parameters for the post listing.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub page: Option<i64>,
}

/// A post with its rendered body and category.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: BlogPost,
    pub content_html: String,
    pub category: Option<BlogCategory>,
}

/// Published posts, newest first.
///
/// # Route
///
/// `GET /api/blog/posts`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<Paginated<BlogPost>>> {
    let page = Page::new(query.page, None, POSTS_PER_PAGE, POSTS_PER_PAGE);
    let category = non_blank(query.category);
    let tag = non_blank(query.tag);

    let (posts, total) = BlogRepository::new(state.pool())
        .list_published(category.as_deref(), tag.as_deref(), page)
        .await?;

    Ok(Json(Paginated::new(posts, total, page)))
}

/// A published post. Each request counts as a view.
///
/// # Route
///
/// `GET /api/blog/posts/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetail>> {
    let repo = BlogRepository::new(state.pool());
    let post = repo
        .view_published(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let category = match post.category_id {
        Some(id) => repo.get_category(id).await?,
        None => None,
    };

    Ok(Json(PostDetail {
        content_html: render_markdown(&post.content),
        category,
        post,
    }))
}

/// Blog categories with published post counts.
///
/// # Route
///
/// `GET /api/blog/categories`
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<BlogCategory>>> {
    Ok(Json(BlogRepository::new(state.pool()).list_categories().await?))
}

/// All tags.
///
/// # Route
///
/// `GET /api/blog/tags`
#[instrument(skip(state))]
pub async fn tags(State(state): State<AppState>) -> Result<Json<Vec<BlogTag>>> {
    Ok(Json(BlogRepository::new(state.pool()).list_tags().await?))
}
