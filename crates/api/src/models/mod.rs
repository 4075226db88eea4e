//! Domain models returned by the repository layer and serialized on the wire.

pub mod cart;
pub mod category;
pub mod contact;
pub mod order;
pub mod product;
pub mod review;
pub mod user;
pub mod wishlist;

use serde::Serialize;

use voltshop_core::{Email, UserId};

/// Compact user reference embedded in joined responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}
