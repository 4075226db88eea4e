//! Cart ledger models and summary math.
//!
//! A cart summary joins every cart row to a current product snapshot and
//! computes per-line totals plus a subtotal. `totalItems` counts distinct
//! line entries, not summed quantities; the grouped admin view sums
//! quantities instead. Both shapes are long-standing API behavior and are
//! kept as-is.

use rust_decimal::Decimal;
use serde::Serialize;

use voltshop_core::{CartItemId, ProductId, effective_unit_price, line_total};

use super::UserRef;
use super::category::CategoryRef;

/// One cart row joined to its current product snapshot.
///
/// Produced by the repository; rows whose product has been deleted never
/// appear (cart rows follow their product).
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: CartItemId,
    pub quantity: i32,
    pub product: CartProduct,
}

/// Product snapshot inside a [`CartLine`].
#[derive(Debug, Clone)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub discount: Decimal,
    /// Current available stock, for client-side quantity pickers.
    pub stock: i32,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub images: Vec<String>,
    pub category: Option<CategoryRef>,
}

/// Wire shape of one summarized cart line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    pub product: CartProductView,
    pub quantity: i32,
    pub total: Decimal,
}

/// Wire shape of the product inside a summarized cart line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProductView {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub discount_price: Decimal,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub stock: i32,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<CategoryRef>,
}

/// Summarized cart: detailed lines, subtotal, and distinct entry count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub detailed_items: Vec<CartLineView>,
    pub subtotal: Decimal,
    /// Count of distinct line entries, not summed quantities.
    pub total_items: usize,
}

impl CartSummary {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            detailed_items: Vec::new(),
            subtotal: Decimal::ZERO,
            total_items: 0,
        }
    }

    /// Summarize joined cart lines.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let total_items = lines.len();
        let mut subtotal = Decimal::ZERO;

        let detailed_items = lines
            .into_iter()
            .map(|line| {
                let p = line.product;
                let total = line_total(p.price, p.discount, line.quantity);
                subtotal += total;

                CartLineView {
                    id: line.id,
                    product: CartProductView {
                        id: p.id,
                        name: p.name,
                        price: p.price,
                        discount_price: p.discount,
                        image: p.images.first().cloned(),
                        images: p.images,
                        stock: p.stock,
                        description: p.description,
                        brand: p.brand,
                        category: p.category,
                    },
                    quantity: line.quantity,
                    total,
                }
            })
            .collect();

        Self {
            detailed_items,
            subtotal,
            total_items,
        }
    }
}

/// One line in the grouped admin view of all carts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCartLine {
    pub product: CartProductView,
    pub quantity: i32,
    pub total: Decimal,
}

/// All cart rows of one user, grouped for the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCartGroup {
    pub user: UserRef,
    pub items: Vec<AdminCartLine>,
    pub subtotal: Decimal,
    /// Summed quantities (differs from the per-user summary on purpose).
    pub total_items: i64,
}

/// Cart row with its owner, as read for the admin listing.
#[derive(Debug, Clone)]
pub struct OwnedCartLine {
    pub user: UserRef,
    pub line: CartLine,
}

/// Group cart rows by owner, preserving first-seen user order.
#[must_use]
pub fn group_carts_by_user(rows: Vec<OwnedCartLine>) -> Vec<AdminCartGroup> {
    let mut groups: Vec<AdminCartGroup> = Vec::new();

    for row in rows {
        let p = row.line.product;
        let total = line_total(p.price, p.discount, row.line.quantity);
        let item = AdminCartLine {
            product: CartProductView {
                id: p.id,
                name: p.name,
                price: p.price,
                discount_price: p.discount,
                image: p.images.first().cloned(),
                images: p.images,
                stock: p.stock,
                description: p.description,
                brand: p.brand,
                category: p.category,
            },
            quantity: row.line.quantity,
            total,
        };

        let existing = groups.iter().position(|g| g.user.id == row.user.id);
        if let Some(group) = existing.and_then(|pos| groups.get_mut(pos)) {
            group.subtotal += total;
            group.total_items += i64::from(row.line.quantity);
            group.items.push(item);
        } else {
            groups.push(AdminCartGroup {
                user: row.user,
                subtotal: total,
                total_items: i64::from(row.line.quantity),
                items: vec![item],
            });
        }
    }

    groups
}

/// Compose the out-of-stock message for a cart add.
#[must_use]
pub fn stock_exceeded_message(available: i32, in_cart: i32) -> String {
    format!("Only {available} item(s) in stock. You already have {in_cart} in your cart.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use voltshop_core::{Email, UserId};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(id: i32, qty: i32, price: &str, discount: &str) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            quantity: qty,
            product: CartProduct {
                id: ProductId::new(id * 10),
                name: format!("Product {id}"),
                price: dec(price),
                discount: dec(discount),
                stock: 100,
                description: None,
                brand: None,
                images: vec![format!("https://img.example/{id}.jpg")],
                category: None,
            },
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = CartSummary::empty();
        assert!(summary.detailed_items.is_empty());
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.total_items, 0);
    }

    #[test]
    fn test_summary_uses_effective_prices() {
        let summary = CartSummary::from_lines(vec![
            line(1, 2, "10.00", "0"),
            line(2, 1, "20.00", "15.00"),
        ]);

        assert_eq!(summary.subtotal, dec("35.00"));
        assert_eq!(summary.detailed_items[0].total, dec("20.00"));
        assert_eq!(summary.detailed_items[1].total, dec("15.00"));
    }

    #[test]
    fn test_total_items_counts_entries_not_quantities() {
        let summary = CartSummary::from_lines(vec![
            line(1, 5, "10.00", "0"),
            line(2, 7, "20.00", "0"),
        ]);
        assert_eq!(summary.total_items, 2);
    }

    #[test]
    fn test_first_image_becomes_primary() {
        let summary = CartSummary::from_lines(vec![line(1, 1, "10.00", "0")]);
        assert_eq!(
            summary.detailed_items[0].product.image.as_deref(),
            Some("https://img.example/1.jpg")
        );
    }

    #[test]
    fn test_admin_grouping_sums_quantities() {
        let alice = UserRef {
            id: UserId::new(1),
            name: "Alice".to_string(),
            email: Email::parse("alice@example.com").unwrap(),
        };
        let bob = UserRef {
            id: UserId::new(2),
            name: "Bob".to_string(),
            email: Email::parse("bob@example.com").unwrap(),
        };

        let groups = group_carts_by_user(vec![
            OwnedCartLine {
                user: alice.clone(),
                line: line(1, 2, "10.00", "0"),
            },
            OwnedCartLine {
                user: bob,
                line: line(2, 1, "5.00", "0"),
            },
            OwnedCartLine {
                user: alice,
                line: line(3, 3, "1.00", "0"),
            },
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user.name, "Alice");
        assert_eq!(groups[0].items.len(), 2);
        // Grouped view sums quantities, unlike the per-user summary
        assert_eq!(groups[0].total_items, 5);
        assert_eq!(groups[0].subtotal, dec("23.00"));
        assert_eq!(groups[1].total_items, 1);
    }

    #[test]
    fn test_stock_exceeded_message() {
        assert_eq!(
            stock_exceeded_message(3, 2),
            "Only 3 item(s) in stock. You already have 2 in your cart."
        );
    }
}
