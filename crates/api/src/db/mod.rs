//! Database operations for the Voltshop `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Accounts, OTP and password-reset token lifecycle
//! - `categories` - Catalog categories with slugs and images
//! - `products` - Catalog products: price, discount, stock, low-stock flag
//! - `cart_items` - Per-user cart ledger, UNIQUE(user, product)
//! - `wishlist_items` - Per-user wishlist ledger, UNIQUE(user, product)
//! - `orders` / `order_items` - Immutable price-snapshot orders
//! - `reviews` - One review per (user, product)
//! - `contact_messages` - Contact form submissions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p voltshop-cli -- migrate
//! ```

pub mod carts;
pub mod categories;
pub mod contacts;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Error type shared by all repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to `Conflict` when it is a unique violation.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
