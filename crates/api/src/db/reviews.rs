//! Review repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use voltshop_core::{Email, ProductId, ReviewId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::UserRef;
use crate::models::product::ProductRef;
use crate::models::review::Review;

/// Review row joined to its author and (optionally) its product.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    user_id: i32,
    user_name: String,
    user_email: String,
    product_id: i32,
    rating: i32,
    body: String,
    is_read: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_name: Option<String>,
    product_slug: Option<String>,
    product_price: Option<Decimal>,
    product_images: Option<Vec<String>>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let product = match (
            row.product_name,
            row.product_slug,
            row.product_price,
            row.product_images,
        ) {
            (Some(name), Some(slug), Some(price), Some(images)) => Some(ProductRef {
                id: ProductId::new(row.product_id),
                name,
                slug,
                price,
                images,
            }),
            _ => None,
        };

        Ok(Self {
            id: ReviewId::new(row.id),
            user: UserRef {
                id: UserId::new(row.user_id),
                name: row.user_name,
                email,
            },
            product_id: ProductId::new(row.product_id),
            product,
            rating: row.rating,
            body: row.body,
            is_read: row.is_read,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const REVIEW_SELECT: &str = "SELECT r.id, r.user_id, u.name AS user_name, u.email AS user_email, \
     r.product_id, r.rating, r.body, r.is_read, r.created_at, r.updated_at, \
     p.name AS product_name, p.slug AS product_slug, \
     p.price AS product_price, p.images AS product_images \
     FROM reviews r \
     JOIN users u ON u.id = r.user_id \
     LEFT JOIN products p ON p.id = r.product_id";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a review for a (user, product) pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the pair already has a review.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i32,
        body: &str,
    ) -> Result<Review, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO reviews (user_id, product_id, rating, body)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(rating)
        .bind(body)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "You have already reviewed this product"))?;

        self.get_by_id(ReviewId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List reviews for one product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List all reviews, optionally only unread ones, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, unread_only: bool) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE ($1 = FALSE OR r.is_read = FALSE) ORDER BY r.created_at DESC"
        ))
        .bind(unread_only)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count unread reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE is_read = FALSE")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Mark every unread review as read.
    ///
    /// # Returns
    ///
    /// The number of reviews flipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("UPDATE reviews SET is_read = TRUE WHERE is_read = FALSE")
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Owner of a review, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owner(&self, id: ReviewId) -> Result<Option<UserId>, RepositoryError> {
        let owner: Option<i32> = sqlx::query_scalar("SELECT user_id FROM reviews WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(owner.map(UserId::new))
    }

    /// Update a review's rating and body.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn update(
        &self,
        id: ReviewId,
        rating: i32,
        body: &str,
    ) -> Result<Review, RepositoryError> {
        let result = sqlx::query(
            "UPDATE reviews SET rating = $1, body = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(rating)
        .bind(body)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a review.
    ///
    /// # Returns
    ///
    /// Returns `true` if the review existed and was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every review.
    ///
    /// # Returns
    ///
    /// The number of reviews deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews").execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
