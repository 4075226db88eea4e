//! Category repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use voltshop_core::{CategoryId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::category::Category;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    admin_id: i32,
    name: String,
    slug: String,
    image_url: String,
    image_public_id: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            admin_id: UserId::new(row.admin_id),
            name: row.name,
            slug: row.slug,
            image_url: row.image_url,
            image_public_id: row.image_public_id,
            created_at: row.created_at,
        }
    }
}

const CATEGORY_COLUMNS: &str =
    "id, admin_id, name, slug, image_url, image_public_id, created_at";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        admin_id: UserId,
        name: &str,
        slug: &str,
        image_url: &str,
        image_public_id: &str,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories (admin_id, name, slug, image_url, image_public_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(admin_id.as_i32())
        .bind(name)
        .bind(slug)
        .bind(image_url)
        .bind(image_public_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A category with this name already exists"))?;

        Ok(row.into())
    }

    /// Check whether a slug is taken, optionally ignoring one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(
        &self,
        slug: &str,
        exclude: Option<CategoryId>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE slug = $1 AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all categories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Update name/slug and/or image, keeping current values for omitted parts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug already exists.
    pub async fn update(
        &self,
        id: CategoryId,
        name_slug: Option<(&str, &str)>,
        image: Option<(&str, &str)>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE categories
             SET name = COALESCE($1, name),
                 slug = COALESCE($2, slug),
                 image_url = COALESCE($3, image_url),
                 image_public_id = COALESCE($4, image_public_id)
             WHERE id = $5
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(name_slug.map(|(name, _)| name))
        .bind(name_slug.map(|(_, slug)| slug))
        .bind(image.map(|(url, _)| url))
        .bind(image.map(|(_, public_id)| public_id))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Another category with this name already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
