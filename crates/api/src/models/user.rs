//! Account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use voltshop_core::{Email, UserId, UserRole};

/// A user account.
///
/// Credential material (password hash, OTP code, reset-token digest) never
/// appears here; the repository exposes it through dedicated methods only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub street: Option<String>,
    pub landmark: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_login: bool,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
