//! Catalog product models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use voltshop_core::{ProductId, UserId, effective_unit_price};

use super::category::CategoryRef;

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub warranty: String,
    pub price: Decimal,
    /// Absolute override price; zero means no discount.
    pub discount: Decimal,
    /// Available stock. Mutated only by the order engine and admin edits.
    pub quantity: i32,
    pub is_trending: bool,
    pub is_new_arrival: bool,
    pub category: Option<CategoryRef>,
    pub images: Vec<String>,
    pub image_public_ids: Vec<String>,
    pub notified_low_stock: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a buyer pays for one unit.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective_unit_price(self.price, self.discount)
    }
}

/// Compact product reference embedded in order and wishlist responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub images: Vec<String>,
}

/// Low-stock sidecar entry attached to paginated product listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockWarning {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub quantity: i32,
    pub image: Vec<String>,
    pub message: String,
}

impl LowStockWarning {
    /// Build the warning entry for a product under the threshold.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            quantity: product.quantity,
            image: product.images.clone(),
            message: format!(
                "Only {} left in stock for {}",
                product.quantity, product.name
            ),
        }
    }
}

/// Pagination metadata for product listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub limit: i64,
}

impl Pagination {
    /// Compute page count from a total row count.
    #[must_use]
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            total,
            page,
            pages,
            limit,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_product(quantity: i32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Solar Inverter 3kW".to_string(),
            slug: "solar-inverter-3kw".to_string(),
            description: None,
            brand: Some("Voltix".to_string()),
            warranty: String::new(),
            price: "499.99".parse().unwrap(),
            discount: Decimal::ZERO,
            quantity,
            is_trending: false,
            is_new_arrival: false,
            category: None,
            images: vec!["https://img.example/inverter.jpg".to_string()],
            image_public_ids: vec!["products/inverter".to_string()],
            notified_low_stock: false,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_discount() {
        let mut product = sample_product(10);
        assert_eq!(product.effective_price(), "499.99".parse().unwrap());
        product.discount = "450.00".parse().unwrap();
        assert_eq!(product.effective_price(), "450.00".parse().unwrap());
    }

    #[test]
    fn test_low_stock_warning_message() {
        let product = sample_product(2);
        let warning = LowStockWarning::for_product(&product);
        assert_eq!(warning.quantity, 2);
        assert_eq!(
            warning.message,
            "Only 2 left in stock for Solar Inverter 3kW"
        );
    }

    #[test]
    fn test_pagination_rounds_up() {
        let p = Pagination::new(21, 1, 10);
        assert_eq!(p.pages, 3);
        let p = Pagination::new(20, 2, 10);
        assert_eq!(p.pages, 2);
        let p = Pagination::new(0, 1, 10);
        assert_eq!(p.pages, 0);
    }
}
