//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Error parsing an [`OrderStatus`] from a string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid order status: {0}")]
pub struct OrderStatusError(pub String);

/// Lifecycle status of an order.
///
/// The guarded state machine is:
///
/// ```text
/// pending -> successful   (terminal)
/// pending -> cancelled    (terminal)
/// ```
///
/// [`OrderStatus::can_transition_to`] encodes the guarded transitions used
/// by the customer-facing cancel path. The administrative status override
/// deliberately bypasses this guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Successful,
    Cancelled,
}

impl OrderStatus {
    /// All known statuses, used for administrative input validation.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Successful, Self::Cancelled];

    /// Returns true if the guarded state machine allows `self -> next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Successful | Self::Cancelled)
        )
    }

    /// Returns true if the order can still be cancelled by its owner.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Successful => "successful",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "successful" => Ok(Self::Successful),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderStatusError(other.to_owned())),
        }
    }
}

/// Error parsing a [`UserRole`] from a string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid user role: {0}")]
pub struct UserRoleError(pub String);

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    User,
    /// Store administrator.
    Admin,
}

impl UserRole {
    /// Returns true for administrator accounts.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = UserRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UserRoleError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Successful));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        for next in OrderStatus::ALL {
            assert!(!OrderStatus::Successful.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_only_pending_is_cancellable() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(!OrderStatus::Successful.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("user".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("root".parse::<UserRole>().is_err());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::User.is_admin());
    }
}
