//! Core types for Voltshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{effective_unit_price, line_total};
pub use status::{OrderStatus, OrderStatusError, UserRole, UserRoleError};
