//! Cart ledger repository.
//!
//! Quantities are validated against product stock by the route layer
//! before any write; the checks are advisory between concurrent requests.
//! The hard stock guarantee lives in the order engine (`db::orders`).

use rust_decimal::Decimal;
use sqlx::PgPool;

use voltshop_core::{CartItemId, CategoryId, Email, ProductId, UserId};

use super::RepositoryError;
use crate::models::UserRef;
use crate::models::cart::{CartLine, CartProduct, OwnedCartLine};
use crate::models::category::CategoryRef;

/// Cart row joined to its product and category.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    quantity: i32,
    product_id: i32,
    product_name: String,
    price: Decimal,
    discount: Decimal,
    stock: i32,
    description: Option<String>,
    brand: Option<String>,
    images: Vec<String>,
    category_id: Option<i32>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef {
                id: CategoryId::new(id),
                name,
                slug,
            }),
            _ => None,
        };

        Self {
            id: CartItemId::new(row.id),
            quantity: row.quantity,
            product: CartProduct {
                id: ProductId::new(row.product_id),
                name: row.product_name,
                price: row.price,
                discount: row.discount,
                stock: row.stock,
                description: row.description,
                brand: row.brand,
                images: row.images,
                category,
            },
        }
    }
}

const CART_LINE_SELECT: &str = "SELECT ci.id, ci.quantity, \
     p.id AS product_id, p.name AS product_name, p.price, p.discount, \
     p.quantity AS stock, p.description, p.brand, p.images, \
     c.id AS category_id, c.name AS category_name, c.slug AS category_slug \
     FROM cart_items ci \
     JOIN products p ON p.id = ci.product_id \
     LEFT JOIN categories c ON c.id = p.category_id";

/// A cart entry with the current stock of its product.
#[derive(Debug, sqlx::FromRow)]
pub struct EntryWithStock {
    pub id: i32,
    pub quantity: i32,
    pub stock: i32,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Quantity currently held by a user for a product (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn held_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<i32, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Upsert a cart entry to the given absolute quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, product_id)
             DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a cart entry and drop the matching wishlist entry atomically.
    ///
    /// Used by the explicit "move to cart" operation; a plain add never
    /// touches the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_and_remove_from_wishlist(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, product_id)
             DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_i32())
            .bind(product_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetch an owned cart entry with its product's current stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_entry_with_stock(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<EntryWithStock>, RepositoryError> {
        let row = sqlx::query_as::<_, EntryWithStock>(
            "SELECT ci.id, ci.quantity, p.quantity AS stock
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.id = $1 AND ci.user_id = $2",
        )
        .bind(item_id.as_i32())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Overwrite the quantity of an owned cart entry.
    ///
    /// # Returns
    ///
    /// Returns `true` if the entry existed and was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $1, updated_at = NOW()
             WHERE id = $2 AND user_id = $3",
        )
        .bind(quantity)
        .bind(item_id.as_i32())
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove an owned cart entry.
    ///
    /// # Returns
    ///
    /// Returns `true` if the entry existed and was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id.as_i32())
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every cart entry of a user. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// All cart lines of a user joined to current product snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "{CART_LINE_SELECT} WHERE ci.user_id = $1 ORDER BY ci.created_at ASC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every cart line in the store with its owner, for the admin listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if an owner email is invalid.
    pub async fn all_lines_with_owners(&self) -> Result<Vec<OwnedCartLine>, RepositoryError> {
        #[derive(Debug, sqlx::FromRow)]
        struct OwnedRow {
            user_id: i32,
            user_name: String,
            user_email: String,
            #[sqlx(flatten)]
            line: CartLineRow,
        }

        let rows = sqlx::query_as::<_, OwnedRow>(
            "SELECT u.id AS user_id, u.name AS user_name, u.email AS user_email, \
                    ci.id, ci.quantity, \
                    p.id AS product_id, p.name AS product_name, p.price, p.discount, \
                    p.quantity AS stock, p.description, p.brand, p.images, \
                    c.id AS category_id, c.name AS category_name, c.slug AS category_slug \
             FROM cart_items ci \
             JOIN users u ON u.id = ci.user_id \
             JOIN products p ON p.id = ci.product_id \
             LEFT JOIN categories c ON c.id = p.category_id \
             ORDER BY u.id, ci.created_at ASC",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let email = Email::parse(&row.user_email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                Ok(OwnedCartLine {
                    user: UserRef {
                        id: UserId::new(row.user_id),
                        name: row.user_name,
                        email,
                    },
                    line: row.line.into(),
                })
            })
            .collect()
    }
}
