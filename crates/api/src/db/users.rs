//! User repository for database operations.
//!
//! Credential material (password hash, OTP code, reset-token digest) is
//! only ever returned from the dedicated lookup methods here, never on the
//! [`User`] model itself.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use voltshop_core::{Email, UserId, UserRole};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::User;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    phone: String,
    street: Option<String>,
    landmark: Option<String>,
    role: String,
    is_verified: bool,
    is_login: bool,
    last_login: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role: UserRole = row.role.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            street: row.street,
            landmark: row.landmark,
            role,
            is_verified: row.is_verified,
            is_login: row.is_login,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, phone, street, landmark, role, is_verified, \
     is_login, last_login, created_at, updated_at";

/// Pending OTP state for a user.
#[derive(Debug)]
pub struct OtpState {
    pub user: User,
    pub otp_code: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Count admin accounts, used to enforce the admin seat limit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_admins(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Create a new unverified user with a pending OTP.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        phone: &str,
        role: UserRole,
        otp_code: &str,
        otp_expires_at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, password_hash, phone, role, otp_code, otp_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(phone)
        .bind(role.as_str())
        .bind(otp_code)
        .bind(otp_expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "This user already exists"))?;

        row.try_into()
    }

    /// Get the pending OTP state for an email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_otp_state(&self, email: &Email) -> Result<Option<OtpState>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct OtpRow {
            #[sqlx(flatten)]
            user: UserRow,
            otp_code: Option<String>,
            otp_expires_at: Option<DateTime<Utc>>,
        }

        let row = sqlx::query_as::<_, OtpRow>(&format!(
            "SELECT {USER_COLUMNS}, otp_code, otp_expires_at FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(OtpState {
                user: r.user.try_into()?,
                otp_code: r.otp_code,
                otp_expires_at: r.otp_expires_at,
            })),
            None => Ok(None),
        }
    }

    /// Mark a user as verified and clear their OTP.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn mark_verified(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users
             SET is_verified = TRUE, otp_code = NULL, otp_expires_at = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Replace the pending OTP for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_otp(
        &self,
        id: UserId,
        otp_code: &str,
        otp_expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET otp_code = $1, otp_expires_at = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(otp_code)
        .bind(otp_expires_at)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Get a user's password hash by email.
    ///
    /// Returns `None` if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct HashRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, HashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Record a successful or ended login session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_login(&self, id: UserId, is_login: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users
             SET is_login = $1,
                 last_login = CASE WHEN $1 THEN NOW() ELSE last_login END,
                 updated_at = NOW()
             WHERE id = $2",
        )
        .bind(is_login)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a password-reset token digest with its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_reset_token(
        &self,
        id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET reset_token_hash = $1, reset_expires_at = $2, updated_at = NOW()
             WHERE id = $3",
        )
        .bind(token_hash)
        .bind(expires_at)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Look up a user by an unexpired reset-token digest.
    ///
    /// Also returns the current password hash so the caller can reject
    /// reusing the previous password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct HashRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, HashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users
             WHERE reset_token_hash = $1 AND reset_expires_at > NOW()"
        ))
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Set a new password and clear any reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn reset_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users
             SET password_hash = $1, reset_token_hash = NULL, reset_expires_at = NULL,
                 updated_at = NOW()
             WHERE id = $2",
        )
        .bind(password_hash)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Update profile fields, keeping current values for omitted ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: Option<&str>,
        phone: Option<&str>,
        street: Option<&str>,
        landmark: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users
             SET name = COALESCE($1, name),
                 phone = COALESCE($2, phone),
                 street = COALESCE($3, street),
                 landmark = COALESCE($4, landmark),
                 updated_at = NOW()
             WHERE id = $5
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(phone)
        .bind(street)
        .bind(landmark)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a user.
    ///
    /// Reviews, cart rows and wishlist rows follow the account via
    /// `ON DELETE CASCADE`.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
