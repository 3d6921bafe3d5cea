//! Review and comment moderation handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fuelstack_core::models::{Comment, Review};
use fuelstack_core::{CommentId, ProductId, ReviewId};

use crate::db::{ModerationRepository, Page};
use crate::error::Result;
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::routes::Paginated;
use crate::state::AppState;

/// Query parameters shared by the review and comment lists.
#[derive(Debug, Default, Deserialize)]
pub struct ModerationQuery {
    pub product_id: Option<ProductId>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Reviews, newest first.
///
/// # Route
///
/// `GET /api/admin/reviews`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn reviews_index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ModerationQuery>,
) -> Result<Json<Paginated<Review>>> {
    let page = Page::new(query.page, query.per_page);
    let (reviews, total) = ModerationRepository::new(state.pool())
        .list_reviews(query.product_id, page)
        .await?;

    Ok(Json(Paginated::new(reviews, total, page)))
}

/// Delete a review and recompute the product's rating.
///
/// # Route
///
/// `DELETE /api/admin/reviews/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn reviews_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    ModerationRepository::new(state.pool())
        .delete_review(id)
        .await?;
    tracing::info!(review_id = %id, "Review removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Comments, newest first.
///
/// # Route
///
/// `GET /api/admin/comments`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn comments_index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ModerationQuery>,
) -> Result<Json<Paginated<Comment>>> {
    let page = Page::new(query.page, query.per_page);
    let (comments, total) = ModerationRepository::new(state.pool())
        .list_comments(query.product_id, page)
        .await?;

    Ok(Json(Paginated::new(comments, total, page)))
}

/// # Route
///
/// `DELETE /api/admin/comments/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn comments_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CommentId>,
) -> Result<StatusCode> {
    ModerationRepository::new(state.pool())
        .delete_comment(id)
        .await?;
    tracing::info!(comment_id = %id, "Comment removed");
    Ok(StatusCode::NO_CONTENT)
}
