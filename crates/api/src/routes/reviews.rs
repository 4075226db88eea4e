//! Review route handlers.
//!
//! One review per (user, product); no purchase-verification gate. The
//! read/unread flag drives the admin moderation queue.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use voltshop_core::ReviewId;

use crate::db::products::ProductRepository;
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::review::{Review, rating_in_range};
use crate::routes::{ApiResponse, message, ok};
use crate::state::AppState;

/// Listing envelope with a count, matching the historical wire shape.
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Review>,
}

/// Unread-count envelope.
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub success: bool,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewBody {
    pub slug: Option<String>,
    pub rating: i32,
    pub review: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewBody {
    pub rating: i32,
    pub review: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub unread: Option<String>,
}

/// Create the review routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list_all).delete(delete_all))
        .route("/product/{slug}", get(list_for_product))
        .route("/unread-count", get(unread_count))
        .route("/mark-read", patch(mark_all_read))
        .route("/{id}", patch(update).delete(delete_one))
}

/// Create a review, addressed by product slug.
#[instrument(skip(state, user, body))]
async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateReviewBody>,
) -> Result<impl IntoResponse> {
    let slug = body
        .slug
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Product slug is required".to_string()))?;

    if !rating_in_range(body.rating) {
        return Err(AppError::Validation("Rating must be between 1 and 5".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let review = ReviewRepository::new(state.pool())
        .create(user.id, product.id, body.rating, &body.review)
        .await?;

    Ok((
        StatusCode::CREATED,
        ok("Review created successfully", review),
    ))
}

/// List reviews for one product, addressed by slug.
#[instrument(skip(state))]
async fn list_for_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ReviewListResponse>> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product.id)
        .await?;

    if reviews.is_empty() {
        return Err(AppError::NotFound(
            "No reviews found for this product".to_string(),
        ));
    }

    Ok(Json(ReviewListResponse {
        success: true,
        count: reviews.len(),
        data: reviews,
    }))
}

/// List every review, optionally only unread ones.
#[instrument(skip(state, _admin))]
async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<ReviewListResponse>> {
    let unread_only = query.unread.as_deref() == Some("true");
    let reviews = ReviewRepository::new(state.pool())
        .list_all(unread_only)
        .await?;

    Ok(Json(ReviewListResponse {
        success: true,
        count: reviews.len(),
        data: reviews,
    }))
}

/// Count unread reviews.
#[instrument(skip(state, _admin))]
async fn unread_count(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<UnreadCountResponse>> {
    let count = ReviewRepository::new(state.pool()).unread_count().await?;
    Ok(Json(UnreadCountResponse {
        success: true,
        count,
    }))
}

/// Mark every unread review as read.
#[instrument(skip(state, _admin))]
async fn mark_all_read(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<()>>> {
    let flipped = ReviewRepository::new(state.pool()).mark_all_read().await?;
    Ok(message(format!("Marked {flipped} reviews as read")))
}

async fn require_owner(state: &AppState, id: ReviewId, user_id: voltshop_core::UserId) -> Result<()> {
    let owner = ReviewRepository::new(state.pool())
        .get_owner(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    if owner != user_id {
        return Err(AppError::Forbidden(
            "Unauthorized to modify this review".to_string(),
        ));
    }
    Ok(())
}

/// Update an owned review.
#[instrument(skip(state, user, body))]
async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<ReviewId>,
    Json(body): Json<UpdateReviewBody>,
) -> Result<Json<ApiResponse<Review>>> {
    require_owner(&state, id, user.id).await?;

    if !rating_in_range(body.rating) {
        return Err(AppError::Validation("Rating must be between 1 and 5".to_string()));
    }

    let review = ReviewRepository::new(state.pool())
        .update(id, body.rating, &body.review)
        .await?;

    Ok(ok("Review updated successfully", review))
}

/// Delete an owned review and return the remaining reviews.
#[instrument(skip(state, user))]
async fn delete_one(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<ReviewId>,
) -> Result<Json<ApiResponse<Vec<Review>>>> {
    require_owner(&state, id, user.id).await?;

    let reviews = ReviewRepository::new(state.pool());
    reviews.delete(id).await?;

    let remaining = reviews.list_all(false).await?;
    Ok(ok("Review deleted successfully", remaining))
}

/// Delete every review.
#[instrument(skip(state, _admin))]
async fn delete_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<Review>>>> {
    let reviews = ReviewRepository::new(state.pool());
    let deleted = reviews.delete_all().await?;

    Ok(ok(
        format!("All reviews deleted successfully. Deleted count: {deleted}"),
        Vec::new(),
    ))
}
