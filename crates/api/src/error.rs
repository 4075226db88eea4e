//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures unexpected errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; business-rule failures become structured JSON
//! with a human-readable message, everything else collapses to a generic
//! 500/502 so internals never reach the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::mailer::MailerError;
use crate::services::media::MediaError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested quantity exceeds available stock.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Illegal order-status change.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity absent or not owned by caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violated (duplicate review, wishlist entry, email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication helper failure.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Notification gateway failure.
    #[error("Email error: {0}")]
    Email(#[from] MailerError),

    /// Media store failure.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    msg: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InsufficientStock(_)
            | Self::EmptyCart
            | Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Token(_) => StatusCode::UNAUTHORIZED,
                AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Email(_) | Self::Media(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(e) => e.to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Token(_) => "Invalid or expired token".to_string(),
                AuthError::PasswordHash => "Internal server error".to_string(),
            },
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Email(_) | Self::Media(_) => "External service error".to_string(),
            Self::Validation(msg)
            | Self::InsufficientStock(msg)
            | Self::InvalidTransition(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::EmptyCart => "Cart is empty".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture unexpected failures to Sentry; business failures stay local
        let unexpected = match &self {
            Self::Database(err) => !matches!(
                err,
                RepositoryError::NotFound | RepositoryError::Conflict(_)
            ),
            Self::Internal(_) | Self::Email(_) | Self::Media(_) => true,
            _ => false,
        };
        if unexpected {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success: false,
            msg: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found");

        let err = AppError::InsufficientStock("Only 3 in stock".to_string());
        assert_eq!(err.to_string(), "Insufficient stock: Only 3 in stock");
    }

    #[test]
    fn test_business_errors_map_to_4xx() {
        assert_eq!(
            get_status(AppError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::InsufficientStock("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::InvalidTransition("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unexpected_errors_are_masked() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(get_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = AppError::Database(RepositoryError::NotFound);
        assert_eq!(get_status(err), StatusCode::NOT_FOUND);
    }
}
