//! HTTP route handlers.
//!
//! # Route Structure (all under /api/v1)
//!
//! ```text
//! # Users
//! POST   /users/signup                  - Create account, send OTP
//! POST   /users/verify-otp              - Verify account
//! POST   /users/resend-otp              - Re-send OTP
//! POST   /users/login                   - Issue bearer token
//! POST   /users/logout                  - Clear login flag
//! POST   /users/forgot-password         - Send reset link
//! POST   /users/reset-password/{token}  - Set new password
//! GET    /users                         - List users (admin)
//! GET    /users/{id}                    - Get user (self or admin)
//! PATCH  /users/{id}                    - Update profile
//! DELETE /users/{id}                    - Delete user (admin)
//!
//! # Catalog
//! POST   /categories                    - Create category (admin, multipart)
//! PATCH  /categories/{id}               - Update category (admin, multipart)
//! GET    /categories                    - List categories
//! GET    /categories/{slug}             - Get category by slug
//! POST   /products                      - Create product (admin, multipart)
//! GET    /products?page&limit           - Paginated listing + low-stock sidecar
//! GET    /products/category/{slug}      - Paginated listing by category
//! GET    /products/{id_or_slug}         - Get product
//! PUT    /products/{id}                 - Full update (admin, multipart)
//! PATCH  /products/{id}                 - Partial update (admin, JSON)
//! DELETE /products/{id}                 - Delete product (admin)
//!
//! # Cart
//! POST   /cart/add                      - Add with stock-aware merge
//! POST   /cart/move-from-wishlist       - Add + drop wishlist entry
//! GET    /cart                          - Summarize
//! GET    /cart/all                      - All carts grouped (admin)
//! PATCH  /cart/update/{id}              - Overwrite quantity
//! DELETE /cart/remove/{id}              - Remove one entry
//! DELETE /cart/clear                    - Clear
//!
//! # Wishlist
//! POST   /wishlist/{product_id}                 - Save product
//! POST   /wishlist/{product_id}/move-from-cart  - Save + drop cart entry
//! GET    /wishlist                              - List
//! DELETE /wishlist/clear                        - Clear
//! DELETE /wishlist/{id}                         - Remove one entry
//!
//! # Checkout (merged at the API root)
//! POST   /checkout                      - Create order from cart
//! GET    /orders                        - Caller's orders
//! GET    /orders/all                    - All orders (admin)
//! PATCH  /cancel/{id}                   - Guarded cancel
//! PATCH  /status/{id}                   - Unguarded status override (admin)
//! DELETE /delete-order/{id}             - Hard delete + compensating restock
//!
//! # Reviews / Contact
//! POST   /reviews, GET /reviews/product/{slug}, GET /reviews?unread=true, ...
//! POST   /contact, GET /contact, PATCH /contact/{id}/read, ...
//! ```

pub mod cart;
pub mod categories;
pub mod checkout;
pub mod contact;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wishlist;

use axum::{Json, Router, extract::Multipart};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Standard response envelope: `{success, msg, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// A successful envelope with data.
pub fn ok<T: Serialize>(msg: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        msg: msg.into(),
        data: Some(data),
    })
}

/// A successful envelope with a message only.
pub fn message(msg: impl Into<String>) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        msg: msg.into(),
        data: None,
    })
}

/// One uploaded file from a multipart form.
pub struct UploadField {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Collected multipart form: text fields by name plus file fields.
#[derive(Default)]
pub struct MultipartForm {
    pub fields: std::collections::HashMap<String, String>,
    pub files: Vec<UploadField>,
}

impl MultipartForm {
    /// Read every field of a multipart request into memory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the form cannot be read.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            let filename = field.file_name().map(ToOwned::to_owned);
            match filename {
                Some(filename) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Malformed file field: {e}")))?;
                    form.files.push(UploadField {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Malformed text field: {e}")))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// A required text field.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the missing field.
    pub fn require(&self, name: &str) -> Result<&str, AppError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation(format!("{name} is required.")))
    }

    /// An optional text field (empty counts as absent).
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new().nest(
        "/api/v1",
        Router::new()
            .nest("/users", users::routes())
            .nest("/categories", categories::routes())
            .nest("/products", products::routes())
            .nest("/reviews", reviews::routes())
            .nest("/contact", contact::routes())
            .nest("/wishlist", wishlist::routes())
            .nest("/cart", cart::routes())
            .merge(checkout::routes()),
    )
}
