//! Review and comment route handlers.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fuelstack_core::models::{Comment, Review};
use fuelstack_core::rating::{RatingSummary, validate_rating};
use fuelstack_core::{CommentId, ReviewId};

use crate::db::RepositoryError;
use crate::db::comments::CommentRepository;
use crate::db::reviews::{NewReview, ReviewRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::routes::products::active_product;
use crate::state::AppState;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_REVIEW_LENGTH: usize = 5_000;
const MAX_COMMENT_LENGTH: usize = 2_000;

/// Reviews with their summary.
#[derive(Debug, Serialize)]
pub struct ReviewList {
    pub reviews: Vec<Review>,
    pub summary: RatingSummary,
}

/// Body of a new review.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub title: Option<String>,
    pub body: String,
}

/// Body of a new comment.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    pub parent_id: Option<CommentId>,
}

/// Trim text and check it is non-empty and within `max` characters.
fn required_text<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value)
}

/// A product's reviews.
///
/// # Route
///
/// `GET /api/products/{slug}/reviews`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ReviewList>> {
    let product = active_product(&state, &slug).await?;
    let repo = ReviewRepository::new(state.pool());

    Ok(Json(ReviewList {
        reviews: repo.list_for_product(product.id).await?,
        summary: repo.summary(product.id).await?,
    }))
}

/// Review a product. One review per customer per product.
///
/// # Route
///
/// `POST /api/products/{slug}/reviews`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let rating = validate_rating(body.rating).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let text = required_text("body", &body.body, MAX_REVIEW_LENGTH)?;
    let title = match body.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Some(required_text("title", t, MAX_TITLE_LENGTH)?),
        _ => None,
    };

    let product = active_product(&state, &slug).await?;
    let review = ReviewRepository::new(state.pool())
        .create(NewReview {
            product_id: product.id,
            user_id: user.id,
            rating,
            title,
            body: text,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            other => other.into(),
        })?;

    add_breadcrumb(
        "review",
        "Posted review",
        Some(&[("product", product.slug.as_str())]),
    );

    Ok((StatusCode::CREATED, Json(review)))
}

/// Delete one of your own reviews.
///
/// # Route
///
/// `DELETE /api/reviews/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    ReviewRepository::new(state.pool())
        .delete_own(user.id, id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Review not found".to_string()),
            other => other.into(),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// A product's comments, oldest first.
///
/// # Route
///
/// `GET /api/products/{slug}/comments`
#[instrument(skip(state))]
pub async fn comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Comment>>> {
    let product = active_product(&state, &slug).await?;
    Ok(Json(
        CommentRepository::new(state.pool())
            .list_for_product(product.id)
            .await?,
    ))
}

/// Comment on a product, optionally replying to another comment.
///
/// # Route
///
/// `POST /api/products/{slug}/comments`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let text = required_text("body", &body.body, MAX_COMMENT_LENGTH)?;
    let product = active_product(&state, &slug).await?;
    let repo = CommentRepository::new(state.pool());

    if let Some(parent_id) = body.parent_id
        && repo.product_of(parent_id).await? != Some(product.id)
    {
        return Err(AppError::BadRequest(
            "parent comment does not belong to this product".to_string(),
        ));
    }

    let comment = repo
        .create(product.id, user.id, body.parent_id, text)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("body", "  great  ", 10).ok(), Some("great"));
        assert!(matches!(
            required_text("body", "   ", 10),
            Err(AppError::BadRequest(msg)) if msg == "body is required"
        ));
        assert!(matches!(
            required_text("body", "abcdef", 5),
            Err(AppError::BadRequest(_))
        ));
    }
}
