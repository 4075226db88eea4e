//! Transactional email bodies.
//!
//! Plain string templates, matching what the storefront frontend expects.
//! Subjects live with the call sites; only HTML bodies are built here.

use crate::db::products::LowStockProduct;
use crate::models::order::Order;

/// Body for the signup verification code.
#[must_use]
pub fn verify_otp_email(otp: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; background-color: #f9f9f9;">
  <h2 style="color: #333">Welcome to Voltshop</h2>
  <p>Thank you for signing up! Please use the code below to verify your email:</p>
  <h1 style="background: #eee; padding: 10px; display: inline-block;">{otp}</h1>
  <p>This code will expire in 30 minutes.</p>
  <p>If you did not request this, you can safely ignore this email.</p>
  <p style="color: #555;">&mdash; The Voltshop Team</p>
</div>"#
    )
}

/// Body for a re-sent verification code.
#[must_use]
pub fn resend_otp_email(otp: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; background-color: #f9f9f9;">
  <h2 style="color: #333">Voltshop - New Verification Code</h2>
  <p>Here is your new code to verify your email address:</p>
  <h1 style="background: #eee; padding: 10px; display: inline-block;">{otp}</h1>
  <p>This code will expire in 30 minutes.</p>
  <p>If you did not request this, you can safely ignore this email.</p>
  <p style="color: #555;">&mdash; The Voltshop Team</p>
</div>"#
    )
}

/// Body for the password-reset link.
#[must_use]
pub fn password_reset_email(reset_link: &str) -> String {
    format!(
        r#"<div style="font-family: 'Segoe UI', sans-serif; background-color: #f4f4f4; padding: 40px;">
  <div style="max-width: 600px; margin: auto; background: white; border-radius: 10px; padding: 30px;">
    <h2 style="color: #2c3e50; text-align: center;">Password Reset Request</h2>
    <p style="font-size: 16px; color: #333;">
      We received a request to reset the password for your Voltshop account.
      Click the button below to set a new password. This link will expire in 15 minutes.
    </p>
    <div style="text-align: center; margin: 30px 0;">
      <a href="{reset_link}" style="background-color: #1d72b8; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none; font-weight: bold; display: inline-block;">
        Reset Password
      </a>
    </div>
    <p style="font-size: 14px; color: #777;">
      If you did not request this, please ignore this email. Your password will remain unchanged.
    </p>
  </div>
</div>"#
    )
}

/// Body for the order confirmation.
#[must_use]
pub fn order_confirmation_email(user_name: &str, order: &Order) -> String {
    let mut lines = String::new();
    for line in &order.products {
        let name = line
            .product
            .as_ref()
            .map_or("(unavailable product)", |p| p.name.as_str());
        lines.push_str(&format!(
            "<li>{name} &times; {} at {} each</li>",
            line.quantity, line.price
        ));
    }

    format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; background-color: #f9f9f9;">
  <h2 style="color: #333">Thank you for your order, {user_name}!</h2>
  <p>Your order #{} is confirmed and pending delivery.</p>
  <ul>{lines}</ul>
  <p><strong>Total: {}</strong></p>
  <p>Delivery: {}, {} ({})</p>
  <p>Note: {}</p>
  <p style="color: #555;">&mdash; The Voltshop Team</p>
</div>"#,
        order.id,
        order.total(),
        order.street,
        order.landmark,
        order.region,
        order.note,
    )
}

/// Body for the cancellation notice.
#[must_use]
pub fn order_cancelled_email() -> String {
    r#"<div style="font-family: Arial, sans-serif; padding: 20px; background-color: #f9f9f9;">
  <h2 style="color: #333">Your order has been cancelled</h2>
  <p>Your Voltshop order was cancelled as requested. If this was a mistake,
  simply place the order again.</p>
  <p style="color: #555;">&mdash; The Voltshop Team</p>
</div>"#
        .to_string()
}

/// Body for the batched low-stock alert.
#[must_use]
pub fn low_stock_alert_email(products: &[LowStockProduct]) -> String {
    let product_list = products
        .iter()
        .map(|p| format!("{} (Qty: {})", p.name, p.quantity))
        .collect::<Vec<_>>()
        .join("<br>");

    format!(
        r"<h3>Voltshop</h3>
<h4>Low Stock Alert</h4>
<p>The following products are low in stock:</p>
<p>{product_list}</p>"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use voltshop_core::{OrderId, OrderStatus, ProductId, UserId};

    use crate::models::order::OrderLine;
    use crate::models::product::ProductRef;

    #[test]
    fn test_otp_emails_contain_code() {
        assert!(verify_otp_email("123456").contains("123456"));
        assert!(resend_otp_email("654321").contains("654321"));
    }

    #[test]
    fn test_reset_email_contains_link() {
        let body = password_reset_email("https://shop.example/reset-password/tok");
        assert!(body.contains("https://shop.example/reset-password/tok"));
        assert!(body.contains("15 minutes"));
    }

    #[test]
    fn test_order_confirmation_lists_lines_and_total() {
        let order = crate::models::order::Order {
            id: OrderId::new(9),
            user_id: UserId::new(1),
            street: "12 Battery Rd".to_string(),
            landmark: "Opposite the depot".to_string(),
            region: "East".to_string(),
            note: "Call ahead".to_string(),
            status: OrderStatus::Pending,
            products: vec![OrderLine {
                product: Some(ProductRef {
                    id: ProductId::new(5),
                    name: "Solar Panel 200W".to_string(),
                    slug: "solar-panel-200w".to_string(),
                    price: "120.00".parse().unwrap(),
                    images: vec![],
                }),
                quantity: 2,
                price: "110.00".parse().unwrap(),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = order_confirmation_email("Ada", &order);
        assert!(body.contains("Ada"));
        assert!(body.contains("Solar Panel 200W"));
        assert!(body.contains("220.00"));
        assert!(body.contains("12 Battery Rd"));
    }

    #[test]
    fn test_low_stock_alert_lists_products() {
        let body = low_stock_alert_email(&[
            LowStockProduct {
                id: 1,
                name: "Fuse Box".to_string(),
                quantity: 2,
            },
            LowStockProduct {
                id: 2,
                name: "Breaker".to_string(),
                quantity: 4,
            },
        ]);

        assert!(body.contains("Fuse Box (Qty: 2)"));
        assert!(body.contains("Breaker (Qty: 4)"));
    }
}
