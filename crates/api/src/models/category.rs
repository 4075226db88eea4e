//! Catalog category models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use voltshop_core::{CategoryId, UserId};

/// A catalog category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub admin_id: UserId,
    pub name: String,
    pub slug: String,
    pub image_url: String,
    pub image_public_id: String,
    pub created_at: DateTime<Utc>,
}

/// Compact category reference embedded in product and cart responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}
