//! Review models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use voltshop_core::{ProductId, ReviewId};

use super::UserRef;
use super::product::ProductRef;

/// A product review, joined to its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user: UserRef,
    pub product_id: ProductId,
    /// Current product record, populated for moderation listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRef>,
    /// 1 to 5 stars.
    pub rating: i32,
    #[serde(rename = "review")]
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Valid rating bounds.
pub const MIN_RATING: i32 = 1;
/// Valid rating bounds.
pub const MAX_RATING: i32 = 5;

/// Returns true if the rating is within the allowed range.
#[must_use]
pub const fn rating_in_range(rating: i32) -> bool {
    rating >= MIN_RATING && rating <= MAX_RATING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(!rating_in_range(0));
        assert!(rating_in_range(1));
        assert!(rating_in_range(5));
        assert!(!rating_in_range(6));
    }
}
