//! Wishlist ledger repository.
//!
//! Cart and wishlist are independent sets; only the explicit move
//! operations delete from one while inserting into the other.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use voltshop_core::{ProductId, UserId, WishlistItemId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::product::ProductRef;
use crate::models::wishlist::WishlistItem;

/// Wishlist row joined to its product.
#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    product_id: i32,
    product_name: String,
    product_slug: String,
    price: Decimal,
    images: Vec<String>,
}

impl From<WishlistRow> for WishlistItem {
    fn from(row: WishlistRow) -> Self {
        Self {
            id: WishlistItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product: ProductRef {
                id: ProductId::new(row.product_id),
                name: row.product_name,
                slug: row.product_slug,
                price: row.price,
                images: row.images,
            },
            created_at: row.created_at,
        }
    }
}

const WISHLIST_SELECT: &str = "SELECT w.id, w.user_id, w.created_at, \
     p.id AS product_id, p.name AS product_name, p.slug AS product_slug, \
     p.price, p.images \
     FROM wishlist_items w \
     JOIN products p ON p.id = w.product_id";

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a (user, product) pair is already saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM wishlist_items WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Save a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the pair already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistItem, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO wishlist_items (user_id, product_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Already in wishlist"))?;

        self.get_by_id(WishlistItemId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Save a product and drop the matching cart entry atomically.
    ///
    /// Used by the explicit "move to wishlist" operation; a plain add never
    /// touches the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the pair already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert_and_remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_i32())
            .bind(product_id.as_i32())
            .execute(&mut *tx)
            .await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO wishlist_items (user_id, product_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Already in wishlist"))?;

        tx.commit().await?;

        self.get_by_id(WishlistItemId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a wishlist entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: WishlistItemId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let row = sqlx::query_as::<_, WishlistRow>(&format!("{WISHLIST_SELECT} WHERE w.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// List a user's wishlist, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(&format!(
            "{WISHLIST_SELECT} WHERE w.user_id = $1 ORDER BY w.created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Remove an owned wishlist entry.
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
        id: WishlistItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE id = $1 AND user_id = $2")
            .bind(id.as_i32())
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every wishlist entry of a user. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
