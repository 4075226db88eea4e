//! Product repository for database operations.
//!
//! Stock is mutated here only through admin edits; the order engine owns
//! the transactional decrement/restock paths (see `db::orders`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use voltshop_core::{CategoryId, ProductId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::category::CategoryRef;
use crate::models::product::Product;

/// Internal row type: product columns plus its joined category.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    brand: Option<String>,
    warranty: String,
    price: Decimal,
    discount: Decimal,
    quantity: i32,
    is_trending: bool,
    is_new_arrival: bool,
    images: Vec<String>,
    image_public_ids: Vec<String>,
    notified_low_stock: bool,
    created_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_id: Option<i32>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef {
                id: CategoryId::new(id),
                name,
                slug,
            }),
            _ => None,
        };

        Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            brand: row.brand,
            warranty: row.warranty,
            price: row.price,
            discount: row.discount,
            quantity: row.quantity,
            is_trending: row.is_trending,
            is_new_arrival: row.is_new_arrival,
            category,
            images: row.images,
            image_public_ids: row.image_public_ids,
            notified_low_stock: row.notified_low_stock,
            created_by: row.created_by.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.slug, p.description, p.brand, p.warranty, \
     p.price, p.discount, p.quantity, p.is_trending, p.is_new_arrival, \
     p.images, p.image_public_ids, p.notified_low_stock, p.created_by, \
     p.created_at, p.updated_at, \
     c.id AS category_id, c.name AS category_name, c.slug AS category_slug \
     FROM products p LEFT JOIN categories c ON c.id = p.category_id";

/// Fields for creating a product.
#[derive(Debug)]
pub struct NewProduct<'n> {
    pub name: &'n str,
    pub slug: &'n str,
    pub description: Option<&'n str>,
    pub brand: Option<&'n str>,
    pub warranty: &'n str,
    pub price: Decimal,
    pub discount: Decimal,
    pub quantity: i32,
    pub is_trending: bool,
    pub is_new_arrival: bool,
    pub category_id: CategoryId,
    pub images: Vec<String>,
    pub image_public_ids: Vec<String>,
    pub created_by: UserId,
}

/// Partial update for a product; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ProductPatch {
    pub name_slug: Option<(String, String)>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub warranty: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub quantity: Option<i32>,
    pub is_trending: Option<bool>,
    pub is_new_arrival: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub images: Option<(Vec<String>, Vec<String>)>,
    /// Set when a restock crosses back over the low-stock threshold.
    pub clear_low_stock_flag: bool,
}

/// Product facts needed for a low-stock alert.
#[derive(Debug, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: NewProduct<'_>) -> Result<Product, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products
                 (name, slug, description, brand, warranty, price, discount, quantity,
                  is_trending, is_new_arrival, category_id, images, image_public_ids, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING id",
        )
        .bind(new.name)
        .bind(new.slug)
        .bind(new.description)
        .bind(new.brand)
        .bind(new.warranty)
        .bind(new.price)
        .bind(new.discount)
        .bind(new.quantity)
        .bind(new.is_trending)
        .bind(new.is_new_arrival)
        .bind(new.category_id.as_i32())
        .bind(&new.images)
        .bind(&new.image_public_ids)
        .bind(new.created_by.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A product with this slug already exists"))?;

        self.get_by_id(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product by numeric ID or slug, whichever the input parses as.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id_or_slug(
        &self,
        id_or_slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        if let Ok(id) = id_or_slug.parse::<i32>() {
            let row = sqlx::query_as::<_, ProductRow>(&format!(
                "{PRODUCT_SELECT} WHERE p.id = $1 OR p.slug = $2"
            ))
            .bind(id)
            .bind(id_or_slug)
            .fetch_optional(self.pool)
            .await?;
            return Ok(row.map(Into::into));
        }

        self.get_by_slug(id_or_slug).await
    }

    /// Total product count, for pagination metadata.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// List one page of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} ORDER BY p.created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Product count within one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_category(&self, category_id: CategoryId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(category_id.as_i32())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// List one page of products within a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_page_by_category(
        &self,
        category_id: CategoryId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.category_id = $1
             ORDER BY p.created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(category_id.as_i32())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Check whether a slug is taken, optionally ignoring one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(
        &self,
        slug: &str,
        exclude: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Apply a partial update, keeping current values for omitted fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug already exists.
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products
             SET name = COALESCE($1, name),
                 slug = COALESCE($2, slug),
                 description = COALESCE($3, description),
                 brand = COALESCE($4, brand),
                 warranty = COALESCE($5, warranty),
                 price = COALESCE($6, price),
                 discount = COALESCE($7, discount),
                 quantity = COALESCE($8, quantity),
                 is_trending = COALESCE($9, is_trending),
                 is_new_arrival = COALESCE($10, is_new_arrival),
                 category_id = COALESCE($11, category_id),
                 images = COALESCE($12, images),
                 image_public_ids = COALESCE($13, image_public_ids),
                 notified_low_stock = CASE WHEN $14 THEN FALSE ELSE notified_low_stock END,
                 updated_at = NOW()
             WHERE id = $15",
        )
        .bind(patch.name_slug.as_ref().map(|(name, _)| name.as_str()))
        .bind(patch.name_slug.as_ref().map(|(_, slug)| slug.as_str()))
        .bind(patch.description)
        .bind(patch.brand)
        .bind(patch.warranty)
        .bind(patch.price)
        .bind(patch.discount)
        .bind(patch.quantity)
        .bind(patch.is_trending)
        .bind(patch.is_new_arrival)
        .bind(patch.category_id.map(|id| id.as_i32()))
        .bind(patch.images.as_ref().map(|(urls, _)| urls.clone()))
        .bind(patch.images.as_ref().map(|(_, ids)| ids.clone()))
        .bind(patch.clear_low_stock_flag)
        .bind(id.as_i32())
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A product with this slug already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product and return its media public IDs for cleanup.
    ///
    /// Cart and wishlist rows follow the product via `ON DELETE CASCADE`;
    /// order items keep their snapshot with a nulled product reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<Option<Vec<String>>, RepositoryError> {
        let public_ids: Option<Vec<String>> =
            sqlx::query_scalar("DELETE FROM products WHERE id = $1 RETURNING image_public_ids")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(public_ids)
    }

    /// Products below the threshold that have not been flagged yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_low_stock_unnotified(
        &self,
        threshold: i32,
    ) -> Result<Vec<LowStockProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, LowStockProduct>(
            "SELECT id, name, quantity FROM products
             WHERE quantity < $1 AND NOT notified_low_stock
             ORDER BY quantity ASC",
        )
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Flag the given products as notified for this depletion episode.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_low_stock_notified(&self, ids: &[i32]) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE products SET notified_low_stock = TRUE WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
