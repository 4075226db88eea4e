//! Admin account management commands.
//!
//! Creates pre-verified admin accounts directly, bypassing the OTP signup
//! flow. Useful for bootstrapping a fresh deployment.

use sqlx::PgPool;

use voltshop_api::services::auth::{hash_password, validate_password};
use voltshop_core::Email;

/// Errors from admin account management.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] voltshop_core::EmailError),

    #[error("Auth error: {0}")]
    Auth(#[from] voltshop_api::services::auth::AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("An account with this email already exists")]
    EmailTaken,
}

/// Create a verified admin account.
///
/// # Errors
///
/// Returns `AdminError` if validation fails, the email is taken, or the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    phone: &str,
    password: &str,
) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let database_url = std::env::var("VOLTSHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AdminError::MissingEnvVar("VOLTSHOP_DATABASE_URL"))?;

    let pool = PgPool::connect(&database_url).await?;

    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, phone, role, is_verified)
         VALUES ($1, $2, $3, $4, 'admin', TRUE)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(name)
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(phone)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AdminError::EmailTaken);
    }

    tracing::info!(email = %email, "Admin account created");
    Ok(())
}
