//! Blog post, blog category and tag handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fuelstack_core::models::{BlogCategory, BlogPost, BlogTag};
use fuelstack_core::{BlogCategoryId, BlogPostId, BlogTagId, PostStatus};

use crate::db::blog::{BlogCategoryWrite, PostWrite, TagWrite};
use crate::db::{BlogRepository, Page};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::routes::Paginated;
use crate::routes::input::{optional_text, optional_url, required_text, resolve_slug};
use crate::state::AppState;

const MAX_TITLE: usize = 200;
const MAX_EXCERPT: usize = 500;
const MAX_CONTENT: usize = 100_000;
const MAX_NAME: usize = 80;
const MAX_DESCRIPTION: usize = 500;

/// Query parameters for the post list.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub status: Option<PostStatus>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Body of post create and update. `tag_ids` replaces the post's tags.
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub slug: Option<String>,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    pub category_id: Option<BlogCategoryId>,
    #[serde(default)]
    pub tag_ids: Vec<BlogTagId>,
}

impl PostRequest {
    fn into_write(self) -> Result<PostWrite> {
        let title = required_text("title", &self.title, MAX_TITLE)?;
        let content = required_text("content", &self.content, MAX_CONTENT)?;

        let mut tag_ids = Vec::with_capacity(self.tag_ids.len());
        for id in self.tag_ids {
            if !tag_ids.contains(&id) {
                tag_ids.push(id);
            }
        }

        Ok(PostWrite {
            slug: resolve_slug(self.slug.as_deref(), &title)?,
            title,
            excerpt: optional_text("excerpt", self.excerpt.as_deref(), MAX_EXCERPT)?,
            content,
            cover_image_url: optional_url("cover_image_url", self.cover_image_url.as_deref())?,
            status: self.status,
            category_id: self.category_id,
            tag_ids,
        })
    }
}

/// Body of blog category create and update.
#[derive(Debug, Deserialize)]
pub struct BlogCategoryRequest {
    pub slug: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

impl BlogCategoryRequest {
    fn into_write(self) -> Result<BlogCategoryWrite> {
        let name = required_text("name", &self.name, MAX_NAME)?;
        Ok(BlogCategoryWrite {
            slug: resolve_slug(self.slug.as_deref(), &name)?,
            name,
            description: optional_text(
                "description",
                self.description.as_deref(),
                MAX_DESCRIPTION,
            )?,
        })
    }
}

/// Body of tag create and update.
#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub slug: Option<String>,
    pub name: String,
}

impl TagRequest {
    fn into_write(self) -> Result<TagWrite> {
        let name = required_text("name", &self.name, MAX_NAME)?;
        Ok(TagWrite {
            slug: resolve_slug(self.slug.as_deref(), &name)?,
            name,
        })
    }
}

// =============================================================================
// Posts
// =============================================================================

/// Posts in any status, newest first.
///
/// # Route
///
/// `GET /api/admin/blog/posts`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn posts_index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<PostListQuery>,
) -> Result<Json<Paginated<BlogPost>>> {
    let page = Page::new(query.page, query.per_page);
    let (posts, total) = BlogRepository::new(state.pool())
        .list_posts(query.status, query.q.as_deref(), page)
        .await?;

    Ok(Json(Paginated::new(posts, total, page)))
}

/// # Route
///
/// `GET /api/admin/blog/posts/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn posts_show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BlogPostId>,
) -> Result<Json<BlogPost>> {
    BlogRepository::new(state.pool())
        .get_post(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

/// Create a post authored by the current admin.
///
/// # Route
///
/// `POST /api/admin/blog/posts`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn posts_create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<PostRequest>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let post = body.into_write()?;
    let created = BlogRepository::new(state.pool())
        .create_post(&post, admin.id)
        .await?;

    tracing::info!(post_id = %created.id, slug = %created.slug, status = ?created.status, "Post created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// # Route
///
/// `PUT /api/admin/blog/posts/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn posts_update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BlogPostId>,
    Json(body): Json<PostRequest>,
) -> Result<Json<BlogPost>> {
    let post = body.into_write()?;
    let updated = BlogRepository::new(state.pool())
        .update_post(id, &post)
        .await?;
    Ok(Json(updated))
}

/// # Route
///
/// `DELETE /api/admin/blog/posts/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn posts_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BlogPostId>,
) -> Result<StatusCode> {
    BlogRepository::new(state.pool()).delete_post(id).await?;
    tracing::info!(post_id = %id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

/// Blog categories with post counts.
///
/// # Route
///
/// `GET /api/admin/blog/categories`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn categories_index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<BlogCategory>>> {
    let categories = BlogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// # Route
///
/// `POST /api/admin/blog/categories`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn categories_create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<BlogCategoryRequest>,
) -> Result<(StatusCode, Json<BlogCategory>)> {
    let category = body.into_write()?;
    let created = BlogRepository::new(state.pool())
        .create_category(&category)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// # Route
///
/// `PUT /api/admin/blog/categories/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn categories_update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BlogCategoryId>,
    Json(body): Json<BlogCategoryRequest>,
) -> Result<Json<BlogCategory>> {
    let category = body.into_write()?;
    let updated = BlogRepository::new(state.pool())
        .update_category(id, &category)
        .await?;
    Ok(Json(updated))
}

/// Delete a blog category. Refused with `posts_count` while posts use it.
///
/// # Route
///
/// `DELETE /api/admin/blog/categories/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn categories_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BlogCategoryId>,
) -> Result<StatusCode> {
    BlogRepository::new(state.pool()).delete_category(id).await?;
    tracing::info!(blog_category_id = %id, "Blog category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Tags
// =============================================================================

/// # Route
///
/// `GET /api/admin/blog/tags`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn tags_index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<BlogTag>>> {
    let tags = BlogRepository::new(state.pool()).list_tags().await?;
    Ok(Json(tags))
}

/// # Route
///
/// `POST /api/admin/blog/tags`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn tags_create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<TagRequest>,
) -> Result<(StatusCode, Json<BlogTag>)> {
    let tag = body.into_write()?;
    let created = BlogRepository::new(state.pool()).create_tag(&tag).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// # Route
///
/// `PUT /api/admin/blog/tags/{id}`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn tags_update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BlogTagId>,
    Json(body): Json<TagRequest>,
) -> Result<Json<BlogTag>> {
    let tag = body.into_write()?;
    let updated = BlogRepository::new(state.pool()).update_tag(id, &tag).await?;
    Ok(Json(updated))
}

/// Delete a tag, detaching it from every post.
///
/// # Route
///
/// `DELETE /api/admin/blog/tags/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn tags_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BlogTagId>,
) -> Result<StatusCode> {
    BlogRepository::new(state.pool()).delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_defaults_to_draft_and_dedupes_tags() {
        let request: PostRequest = serde_json::from_value(json!({
            "title": "How much protein do you need?",
            "content": "# Short answer\n\nMore than you think.",
            "tag_ids": [3, 1, 3],
        }))
        .unwrap();

        let write = request.into_write().unwrap();
        assert_eq!(write.status, PostStatus::Draft);
        assert_eq!(write.slug.as_str(), "how-much-protein-do-you-need");
        assert_eq!(write.tag_ids, vec![BlogTagId::new(3), BlogTagId::new(1)]);
    }

    #[test]
    fn test_post_requires_content() {
        let request: PostRequest = serde_json::from_value(json!({
            "title": "Empty",
            "content": "   ",
        }))
        .unwrap();
        assert!(request.into_write().is_err());
    }

    #[test]
    fn test_mongolian_title_needs_explicit_slug() {
        let request: PostRequest = serde_json::from_value(json!({
            "title": "Креатин гэж юу вэ",
            "content": "...",
            "status": "published",
        }))
        .unwrap();
        assert!(request.into_write().is_err());
    }

    #[test]
    fn test_tag_slug_from_name() {
        let write = TagRequest {
            slug: None,
            name: "Pre-Workout".to_string(),
        }
        .into_write()
        .unwrap();
        assert_eq!(write.slug.as_str(), "pre-workout");
    }
}
