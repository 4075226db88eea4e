//! Order models.
//!
//! Orders are immutable snapshots: each line freezes the effective unit
//! price at creation time. Product references in lines are optional so a
//! later product deletion cannot invalidate order history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use voltshop_core::{OrderId, OrderStatus, UserId};

use super::product::ProductRef;

/// An order with its snapshot lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub street: String,
    pub landmark: String,
    pub region: String,
    pub note: String,
    pub status: OrderStatus,
    pub products: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One snapshot line of an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Current product record, when it still exists.
    pub product: Option<ProductRef>,
    pub quantity: i32,
    /// Effective unit price frozen at order time.
    pub price: Decimal,
}

impl Order {
    /// Sum of the frozen line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.products
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum()
    }
}

/// Delivery fields captured at checkout.
#[derive(Debug, Clone)]
pub struct DeliveryDetails {
    pub street: String,
    pub landmark: String,
    pub region: String,
    pub note: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use voltshop_core::ProductId;

    #[test]
    fn test_order_total_uses_frozen_prices() {
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            street: "12 Battery Rd".to_string(),
            landmark: "Opposite the depot".to_string(),
            region: "Greater Accra".to_string(),
            note: "Call on arrival".to_string(),
            status: OrderStatus::Pending,
            products: vec![
                OrderLine {
                    product: Some(ProductRef {
                        id: ProductId::new(1),
                        name: "Panel".to_string(),
                        slug: "panel".to_string(),
                        price: "99.00".parse().unwrap(),
                        images: vec![],
                    }),
                    quantity: 2,
                    price: "10.00".parse().unwrap(),
                },
                OrderLine {
                    // Product deleted after ordering; snapshot survives
                    product: None,
                    quantity: 1,
                    price: "20.00".parse().unwrap(),
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(order.total(), "40.00".parse().unwrap());
    }
}
