//! Wishlist route handlers.
//!
//! The wishlist and the cart are independent sets: a plain save never
//! evicts a cart entry. Only the explicit move operation deletes from the
//! cart while inserting here.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Serialize;
use tracing::instrument;

use voltshop_core::{ProductId, WishlistItemId};

use crate::db::products::ProductRepository;
use crate::db::wishlists::WishlistRepository;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::wishlist::WishlistItem;
use crate::routes::{ApiResponse, ok};
use crate::state::AppState;

/// Listing envelope with a count, matching the historical wire shape.
#[derive(Debug, Serialize)]
pub struct WishlistListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<WishlistItem>,
}

/// Create the wishlist routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/clear", delete(clear))
        .route("/{id}", post(add).delete(remove))
        .route("/{id}/move-from-cart", post(move_from_cart))
}

async fn ensure_product(state: &AppState, product_id: ProductId) -> Result<()> {
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(())
}

/// Save a product to the caller's wishlist.
#[instrument(skip(state, user))]
async fn add(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    ensure_product(&state, product_id).await?;

    let wishlists = WishlistRepository::new(state.pool());
    if wishlists.exists(user.id, product_id).await? {
        return Err(AppError::Conflict("Already in wishlist".to_string()));
    }

    let item = wishlists.insert(user.id, product_id).await?;
    Ok((StatusCode::CREATED, ok("Added to wishlist", item)))
}

/// Save a product and drop the matching cart entry ("move to wishlist").
#[instrument(skip(state, user))]
async fn move_from_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    ensure_product(&state, product_id).await?;

    let wishlists = WishlistRepository::new(state.pool());
    if wishlists.exists(user.id, product_id).await? {
        return Err(AppError::Conflict("Already in wishlist".to_string()));
    }

    let item = wishlists
        .insert_and_remove_from_cart(user.id, product_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        ok("Added to wishlist (removed from cart)", item),
    ))
}

/// List the caller's wishlist, newest first.
#[instrument(skip(state, user))]
async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<WishlistListResponse>> {
    let items = WishlistRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(WishlistListResponse {
        success: true,
        count: items.len(),
        data: items,
    }))
}

/// Remove one entry and return the remaining list.
#[instrument(skip(state, user))]
async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<WishlistItemId>,
) -> Result<Json<ApiResponse<Vec<WishlistItem>>>> {
    let wishlists = WishlistRepository::new(state.pool());

    if !wishlists.remove(user.id, id).await? {
        return Err(AppError::NotFound("Item not found".to_string()));
    }

    let items = wishlists.list_for_user(user.id).await?;
    Ok(ok("Removed", items))
}

/// Delete every entry. Idempotent.
#[instrument(skip(state, user))]
async fn clear(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<WishlistItem>>>> {
    WishlistRepository::new(state.pool()).clear(user.id).await?;
    Ok(ok("Wishlist cleared", Vec::new()))
}
