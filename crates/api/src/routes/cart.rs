//! Cart route handlers.
//!
//! Every mutation returns the recomputed cart summary so clients never
//! need a follow-up read. Stock checks here are advisory: they hold at
//! the instant of the write, while the hard guarantee is enforced by the
//! order engine at checkout.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use voltshop_core::{CartItemId, ProductId};

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::cart::{CartSummary, group_carts_by_user, stock_exceeded_message};
use crate::routes::{ApiResponse, ok};
use crate::state::AppState;

/// Cart mutation/read response: the envelope with the summary spread in.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub success: bool,
    pub msg: String,
    #[serde(flatten)]
    pub summary: CartSummary,
}

fn cart_response(msg: impl Into<String>, summary: CartSummary) -> Json<CartResponse> {
    Json(CartResponse {
        success: true,
        msg: msg.into(),
        summary,
    })
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Quantity-update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartBody {
    pub quantity: i32,
}

/// Create the cart routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(add))
        .route("/move-from-wishlist", post(move_from_wishlist))
        .route("/", get(show))
        .route("/all", get(all))
        .route("/update/{id}", patch(update))
        .route("/remove/{id}", delete(remove))
        .route("/clear", delete(clear))
}

async fn checked_total(
    state: &AppState,
    user_id: voltshop_core::UserId,
    body: &AddToCartBody,
) -> Result<i32> {
    if body.quantity < 1 {
        return Err(AppError::Validation("Invalid quantity value".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .get_by_id(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let existing = CartRepository::new(state.pool())
        .held_quantity(user_id, body.product_id)
        .await?;
    let total = existing + body.quantity;

    if total > product.quantity {
        return Err(AppError::InsufficientStock(stock_exceeded_message(
            product.quantity,
            existing,
        )));
    }

    Ok(total)
}

/// Add a product, merging with any existing entry.
#[instrument(skip(state, user))]
async fn add(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<AddToCartBody>,
) -> Result<Json<CartResponse>> {
    let total = checked_total(&state, user.id, &body).await?;

    let carts = CartRepository::new(state.pool());
    carts.upsert(user.id, body.product_id, total).await?;

    let summary = CartSummary::from_lines(carts.lines_for_user(user.id).await?);
    Ok(cart_response("Cart updated", summary))
}

/// Add a product and drop the matching wishlist entry ("move to cart").
#[instrument(skip(state, user))]
async fn move_from_wishlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<AddToCartBody>,
) -> Result<Json<CartResponse>> {
    let total = checked_total(&state, user.id, &body).await?;

    let carts = CartRepository::new(state.pool());
    carts
        .upsert_and_remove_from_wishlist(user.id, body.product_id, total)
        .await?;

    let summary = CartSummary::from_lines(carts.lines_for_user(user.id).await?);
    Ok(cart_response("Added to cart (removed from wishlist)", summary))
}

/// Summarize the caller's cart.
#[instrument(skip(state, user))]
async fn show(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CartResponse>> {
    let lines = CartRepository::new(state.pool())
        .lines_for_user(user.id)
        .await?;
    Ok(cart_response("Cart retrieved", CartSummary::from_lines(lines)))
}

/// Overwrite the quantity of one entry.
#[instrument(skip(state, user))]
async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateCartBody>,
) -> Result<Json<CartResponse>> {
    if body.quantity < 1 {
        return Err(AppError::Validation("Invalid quantity value".to_string()));
    }

    let carts = CartRepository::new(state.pool());
    let entry = carts
        .get_entry_with_stock(user.id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

    if body.quantity > entry.stock {
        return Err(AppError::InsufficientStock(format!(
            "Only {} in stock",
            entry.stock
        )));
    }

    carts.set_quantity(user.id, item_id, body.quantity).await?;

    let summary = CartSummary::from_lines(carts.lines_for_user(user.id).await?);
    Ok(cart_response("Cart item updated", summary))
}

/// Remove one entry.
#[instrument(skip(state, user))]
async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartResponse>> {
    let carts = CartRepository::new(state.pool());

    if !carts.remove(user.id, item_id).await? {
        return Err(AppError::NotFound("Cart item not found".to_string()));
    }

    let summary = CartSummary::from_lines(carts.lines_for_user(user.id).await?);
    Ok(cart_response("Cart item removed", summary))
}

/// Delete every entry. Idempotent.
#[instrument(skip(state, user))]
async fn clear(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CartResponse>> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(cart_response("All cart items cleared", CartSummary::empty()))
}

/// Every cart in the store, grouped by owner.
#[instrument(skip(state, _admin))]
async fn all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<crate::models::cart::AdminCartGroup>>>> {
    let rows = CartRepository::new(state.pool())
        .all_lines_with_owners()
        .await?;
    Ok(ok("All carts fetched", group_carts_by_user(rows)))
}
