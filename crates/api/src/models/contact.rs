//! Contact message model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use voltshop_core::{ContactId, UserId};

/// A contact-form submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
