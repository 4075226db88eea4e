//! Contact-message repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use voltshop_core::{ContactId, UserId};

use super::RepositoryError;
use crate::models::contact::ContactMessage;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i32,
    user_id: i32,
    name: String,
    email: String,
    phone: String,
    subject: String,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactMessage {
    fn from(row: ContactRow) -> Self {
        Self {
            id: ContactId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            subject: row.subject,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

const CONTACT_COLUMNS: &str =
    "id, user_id, name, email, phone, subject, message, is_read, created_at";

/// Repository for contact-message database operations.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a contact-form submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
        phone: &str,
        subject: &str,
        message: &str,
    ) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "INSERT INTO contact_messages (user_id, name, email, phone, subject, message)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(subject)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// List every contact message, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Mark one message as read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message doesn't exist.
    pub async fn mark_read(&self, id: ContactId) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "UPDATE contact_messages SET is_read = TRUE WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete one message.
    ///
    /// # Returns
    ///
    /// Returns `true` if the message existed and was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ContactId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every message.
    ///
    /// # Returns
    ///
    /// The number of messages deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM contact_messages")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
