//! Checkout and order route handlers.
//!
//! Order creation is all-or-nothing (see `db::orders`). Confirmation and
//! cancellation emails are fire-and-forget: a notification failure is
//! logged and never rolls back or fails an order mutation that already
//! committed.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use voltshop_core::{OrderId, OrderStatus};

use crate::db::orders::{CheckoutError, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::order::{DeliveryDetails, Order};
use crate::models::user::User;
use crate::routes::{ApiResponse, ok};
use crate::services::templates::{order_cancelled_email, order_confirmation_email};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub street: Option<String>,
    pub landmark: Option<String>,
    pub region: Option<String>,
    pub notes: Option<String>,
}

/// Administrative status-override body.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Create the checkout routes router.
///
/// Merged at the API root, so the externally visible paths are
/// `POST /checkout`, `PATCH /cancel/{id}`, `PATCH /status/{id}`,
/// `DELETE /delete-order/{id}`, and `GET /orders[/all]`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create))
        .route("/orders", get(user_orders))
        .route("/orders/all", get(all_orders))
        .route("/cancel/{id}", patch(cancel))
        .route("/status/{id}", patch(update_status))
        .route("/delete-order/{id}", delete(delete_order))
}

fn delivery_from(body: CheckoutBody) -> Result<DeliveryDetails> {
    let missing = || {
        AppError::Validation(
            "Please provide all required fields: street, landmark, region, and notes".to_string(),
        )
    };
    let field = |value: Option<String>| value.filter(|v| !v.is_empty()).ok_or_else(missing);

    Ok(DeliveryDetails {
        street: field(body.street)?,
        landmark: field(body.landmark)?,
        region: field(body.region)?,
        note: field(body.notes)?,
    })
}

fn spawn_email(state: &AppState, user: &User, subject: &'static str, html: String) {
    let mailer = state.mailer().clone();
    let to = user.email.to_string();
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, subject, &html).await {
            warn!(error = %e, %to, subject, "Order notification failed");
        }
    });
}

/// Convert the caller's cart into a pending order.
#[instrument(skip(state, user))]
async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<ApiResponse<Order>>> {
    let delivery = delivery_from(body)?;

    let order = OrderRepository::new(state.pool())
        .create(user.id, &delivery)
        .await
        .map_err(|e| match e {
            CheckoutError::EmptyCart => AppError::EmptyCart,
            CheckoutError::InsufficientStock { name, available } => AppError::InsufficientStock(
                format!("Insufficient stock for {name}. Available: {available}"),
            ),
            CheckoutError::Repository(e) => AppError::Database(e),
        })?;

    spawn_email(
        &state,
        &user,
        "Your Order Confirmation - Voltshop",
        order_confirmation_email(&user.name, &order),
    );

    Ok(ok("Checkout successful", order))
}

/// Cancel a pending order. Guarded: no transition out of a terminal state.
#[instrument(skip(state, user))]
async fn cancel(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>> {
    let orders = OrderRepository::new(state.pool());

    let status = orders
        .get_status_owned(user.id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if !status.is_cancellable() {
        let msg = match status {
            OrderStatus::Successful => "Cannot cancel a successful order",
            _ => "Order is already cancelled",
        };
        return Err(AppError::InvalidTransition(msg.to_string()));
    }

    orders.set_status(order_id, OrderStatus::Cancelled).await?;
    let order = orders
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    // Cancellation stock stays reserved; restock happens only on delete
    spawn_email(
        &state,
        &user,
        "Order Cancelled - Voltshop",
        order_cancelled_email(),
    );

    Ok(ok("Order cancelled", order))
}

/// Administrative status override. Deliberately unguarded: any known
/// status can be set regardless of the current one.
#[instrument(skip(state, _admin))]
async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(order_id): Path<OrderId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ApiResponse<Order>>> {
    let status: OrderStatus = body
        .status
        .parse()
        .map_err(|_| AppError::Validation("Invalid status".to_string()))?;

    let orders = OrderRepository::new(state.pool());
    orders.set_status(order_id, status).await.map_err(|e| {
        if matches!(e, crate::db::RepositoryError::NotFound) {
            AppError::NotFound("Order not found".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    let order = orders
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(ok("Order status updated", order))
}

/// Hard-delete an order with compensating restock. No status guard: a
/// successful order can be deleted and restocked.
#[instrument(skip(state, user))]
async fn delete_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = OrderRepository::new(state.pool());

    if !orders.delete_owned(user.id, order_id).await? {
        return Err(AppError::NotFound("Order not found".to_string()));
    }

    warn!(
        order_id = %order_id,
        user_id = %user.id,
        "Order hard-deleted with compensating restock"
    );

    let remaining = orders.list_for_user(user.id).await?;
    Ok(ok("Order deleted successfully", remaining))
}

/// The caller's orders, newest first.
#[instrument(skip(state, user))]
async fn user_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(ok("Orders retrieved", orders))
}

/// Every order in the store, newest first.
#[instrument(skip(state, _admin))]
async fn all_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(ok("Orders retrieved", orders))
}
