//! Contact-message route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, patch, post},
};
use serde::Deserialize;
use tracing::instrument;

use voltshop_core::ContactId;

use crate::db::RepositoryError;
use crate::db::contacts::ContactRepository;
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, RequireAdmin};
use crate::models::contact::ContactMessage;
use crate::routes::{ApiResponse, message, ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateContactBody {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

/// Create the contact routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list).delete(delete_all))
        .route("/{id}", delete(delete_one))
        .route("/{id}/read", patch(mark_read))
}

/// Store a contact-form submission.
#[instrument(skip(state, user, body))]
async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateContactBody>,
) -> Result<Json<ApiResponse<()>>> {
    for (value, field) in [
        (&body.name, "name"),
        (&body.email, "email"),
        (&body.phone, "phone"),
        (&body.subject, "subject"),
        (&body.message, "message"),
    ] {
        if value.is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }

    ContactRepository::new(state.pool())
        .create(
            user.id,
            &body.name,
            &body.email,
            &body.phone,
            &body.subject,
            &body.message,
        )
        .await?;

    Ok(message(
        "Your message has been sent successfully. We will get back to you soon!",
    ))
}

/// List every contact message.
#[instrument(skip(state, _admin))]
async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<ContactMessage>>>> {
    let messages = ContactRepository::new(state.pool()).list_all().await?;
    Ok(ok("Contact history retrieved successfully", messages))
}

/// Mark one message as read.
#[instrument(skip(state, _admin))]
async fn mark_read(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactId>,
) -> Result<Json<ApiResponse<ContactMessage>>> {
    let updated = ContactRepository::new(state.pool())
        .mark_read(id)
        .await
        .map_err(|e| {
            if matches!(e, RepositoryError::NotFound) {
                AppError::NotFound("Contact not found".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    Ok(ok("Contact marked as read", updated))
}

/// Delete one message and return the remaining ones.
#[instrument(skip(state, _admin))]
async fn delete_one(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactId>,
) -> Result<Json<ApiResponse<Vec<ContactMessage>>>> {
    let contacts = ContactRepository::new(state.pool());

    if !contacts.delete(id).await? {
        return Err(AppError::NotFound("Contact not found".to_string()));
    }

    let remaining = contacts.list_all().await?;
    Ok(ok("Contact deleted successfully", remaining))
}

/// Delete every message.
#[instrument(skip(state, _admin))]
async fn delete_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<ContactMessage>>>> {
    let contacts = ContactRepository::new(state.pool());
    let deleted = contacts.delete_all().await?;

    Ok(ok(
        format!("All contacts deleted successfully. Deleted count: {deleted}"),
        Vec::new(),
    ))
}
