//! Order engine repository.
//!
//! Order creation converts the caller's cart into an immutable snapshot in
//! a single transaction: the cart lines are read with the product rows
//! locked, stock is checked for the whole cart before any decrement, each
//! product is decremented with a conditional update that can never drive
//! stock negative, and the cart is emptied. If any line fails, nothing is
//! written.
//!
//! Deletion is the compensating inverse: every line's quantity is added
//! back to its product, skipping products that no longer exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use voltshop_core::{OrderId, OrderStatus, ProductId, UserId, effective_unit_price};

use super::RepositoryError;
use crate::models::order::{DeliveryDetails, Order, OrderLine};
use crate::models::product::ProductRef;

/// Errors from converting a cart into an order.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The caller's cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A line wants more units than the product has.
    #[error("insufficient stock for {name}: available {available}")]
    InsufficientStock { name: String, available: i32 },

    /// Underlying database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Internal order row.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    street: String,
    landmark: String,
    region: String,
    note: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, products: Vec<OrderLine>) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            street: self.street,
            landmark: self.landmark,
            region: self.region,
            note: self.note,
            status,
            products,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Internal order-item row joined to the current product (if it exists).
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    order_id: i32,
    product_id: Option<i32>,
    quantity: i32,
    unit_price: Decimal,
    product_name: Option<String>,
    product_slug: Option<String>,
    product_price: Option<Decimal>,
    product_images: Option<Vec<String>>,
}

impl ItemRow {
    fn into_line(self) -> OrderLine {
        let product = match (
            self.product_id,
            self.product_name,
            self.product_slug,
            self.product_price,
        ) {
            (Some(id), Some(name), Some(slug), Some(price)) => Some(ProductRef {
                id: ProductId::new(id),
                name,
                slug,
                price,
                images: self.product_images.unwrap_or_default(),
            }),
            _ => None,
        };

        OrderLine {
            product,
            quantity: self.quantity,
            price: self.unit_price,
        }
    }
}

/// Cart line as read inside the checkout transaction.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLineRow {
    quantity: i32,
    product_id: i32,
    name: String,
    slug: String,
    price: Decimal,
    discount: Decimal,
    stock: i32,
    images: Vec<String>,
}

const ORDER_COLUMNS: &str =
    "id, user_id, street, landmark, region, note, status, created_at, updated_at";

const ITEM_SELECT: &str = "SELECT oi.order_id, oi.product_id, oi.quantity, oi.unit_price, \
     p.name AS product_name, p.slug AS product_slug, \
     p.price AS product_price, p.images AS product_images \
     FROM order_items oi \
     LEFT JOIN products p ON p.id = oi.product_id";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert the user's cart into a pending order.
    ///
    /// All-or-nothing: the whole cart is stock-checked against locked
    /// product rows before any decrement; on any failure the transaction
    /// rolls back with no stock mutated and no order created. On success
    /// every line's effective unit price is frozen, stock is decremented,
    /// and the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    /// Returns `CheckoutError::InsufficientStock` if any line exceeds stock.
    /// Returns `CheckoutError::Repository` for database failures.
    pub async fn create(
        &self,
        user_id: UserId,
        delivery: &DeliveryDetails,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CheckoutLineRow>(
            "SELECT ci.quantity, p.id AS product_id, p.name, p.slug, p.price, p.discount,
                    p.quantity AS stock, p.images
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.user_id = $1
             ORDER BY ci.created_at ASC
             FOR UPDATE OF p",
        )
        .bind(user_id.as_i32())
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Check the entire cart before mutating anything
        for line in &lines {
            if line.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    name: line.name.clone(),
                    available: line.stock,
                });
            }
        }

        for line in &lines {
            let result = sqlx::query(
                "UPDATE products SET quantity = quantity - $1, updated_at = NOW()
                 WHERE id = $2 AND quantity >= $1",
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;

            // The rows are locked, so this only fires on a logic error
            if result.rows_affected() == 0 {
                return Err(CheckoutError::InsufficientStock {
                    name: line.name.clone(),
                    available: line.stock,
                });
            }
        }

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, street, landmark, region, note)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(&delivery.street)
        .bind(&delivery.landmark)
        .bind(&delivery.region)
        .bind(&delivery.note)
        .fetch_one(&mut *tx)
        .await?;

        let mut products = Vec::with_capacity(lines.len());
        for line in lines {
            let unit_price = effective_unit_price(line.price, line.discount);

            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(unit_price)
            .execute(&mut *tx)
            .await?;

            products.push(OrderLine {
                product: Some(ProductRef {
                    id: ProductId::new(line.product_id),
                    name: line.name,
                    slug: line.slug,
                    price: line.price,
                    images: line.images,
                }),
                quantity: line.quantity,
                price: unit_price,
            });
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(order_row.into_order(products)?)
    }

    /// Status of an order owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is invalid.
    pub async fn get_status_owned(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<OrderStatus>, RepositoryError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 AND user_id = $2")
                .bind(order_id.as_i32())
                .bind(user_id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        status
            .map(|s| {
                s.parse().map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid order status in database: {e}"
                    ))
                })
            })
            .transpose()
    }

    /// Set an order's status. No transition guard is applied here; callers
    /// own the guard (the customer cancel path checks, the administrative
    /// override does not).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status.as_str())
                .bind(order_id.as_i32())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Get an order with its snapshot lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items_for_orders(&[row.id]).await?;
                let products = items.into_iter().map(ItemRow::into_line).collect();
                Ok(Some(row.into_order(products)?))
            }
            None => Ok(None),
        }
    }

    /// List the caller's orders with lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List every order with lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Hard-delete an owned order, restoring stock for every line.
    ///
    /// Lines whose product has since been deleted are skipped. No status
    /// guard applies: deleting a successful order restocks it.
    ///
    /// # Returns
    ///
    /// Returns `true` if the order existed and was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_owned(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<i32> =
            sqlx::query_scalar("SELECT id FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(order_id.as_i32())
                .bind(user_id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;

        if owned.is_none() {
            return Ok(false);
        }

        // Compensating restock; product_id is NULL for deleted products
        sqlx::query(
            "UPDATE products p SET quantity = p.quantity + oi.quantity, updated_at = NOW()
             FROM order_items oi
             WHERE oi.order_id = $1 AND oi.product_id = p.id",
        )
        .bind(order_id.as_i32())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn items_for_orders(&self, order_ids: &[i32]) -> Result<Vec<ItemRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "{ITEM_SELECT} WHERE oi.order_id = ANY($1) ORDER BY oi.id ASC"
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let items = self.items_for_orders(&ids).await?;

        let mut by_order: std::collections::HashMap<i32, Vec<OrderLine>> =
            std::collections::HashMap::new();
        for item in items {
            by_order
                .entry(item.order_id)
                .or_default()
                .push(item.into_line());
        }

        rows.into_iter()
            .map(|row| {
                let products = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(products)
            })
            .collect()
    }
}
