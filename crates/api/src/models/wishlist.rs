//! Wishlist model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use voltshop_core::{UserId, WishlistItemId};

use super::product::ProductRef;

/// A saved wishlist entry, joined to its product.
///
/// Wishlist rows follow their product (deleted products take their entries
/// with them), so the product reference is always present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub user_id: UserId,
    pub product: ProductRef,
    pub created_at: DateTime<Utc>,
}
