//! Authentication helpers.
//!
//! Password hashing with Argon2id, JWT bearer tokens, one-time codes for
//! email verification, and password-reset tokens (random value sent to the
//! user, SHA-256 digest stored).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use voltshop_core::{UserId, UserRole};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Bearer token lifetime.
const TOKEN_TTL_DAYS: i64 = 7;

/// One-time verification codes live this long.
pub const OTP_TTL_MINUTES: i64 = 30;

/// Password-reset tokens live this long.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// Errors from the authentication helpers.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] voltshop_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Token could not be issued or verified.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// JWT claims carried by every bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: i32,
    /// Account role at issuance time.
    pub role: UserRole,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Validate password strength.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// An unparseable hash counts as a mismatch rather than an error; the
/// caller only ever needs yes or no.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Issue a bearer token for a user.
///
/// # Errors
///
/// Returns `AuthError::Token` if signing fails.
pub fn sign_token(
    user_id: UserId,
    role: UserRole,
    secret: &SecretString,
) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id.as_i32(),
        role,
        exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )?;

    Ok(token)
}

/// Decode and validate a bearer token.
///
/// # Errors
///
/// Returns `AuthError::Token` if the token is malformed, expired, or
/// carries a bad signature.
pub fn decode_token(token: &str, secret: &SecretString) -> Result<Claims, AuthError> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::default(),
    )?;

    Ok(data.claims)
}

/// Generate a 6-digit one-time code.
#[must_use]
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Expiry timestamp for a freshly issued OTP.
#[must_use]
pub fn otp_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(OTP_TTL_MINUTES)
}

/// Generate a password-reset token.
///
/// Returns the raw token (mailed to the user) and its digest (stored).
#[must_use]
pub fn generate_reset_token() -> (String, String) {
    let bytes: [u8; 32] = rand::rng().random();
    let raw = URL_SAFE_NO_PAD.encode(bytes);
    let digest = hash_reset_token(&raw);
    (raw, digest)
}

/// Digest a raw reset token for storage or lookup.
#[must_use]
pub fn hash_reset_token(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Expiry timestamp for a freshly issued reset token.
#[must_use]
pub fn reset_token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_secret() -> SecretString {
        SecretString::from("kJ8#mN2$pQ5!rT9@wX3^zA6&cF0*eH4%")
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("long enough password").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = test_secret();
        let token = sign_token(UserId::new(42), UserRole::Admin, &secret).unwrap();
        let claims = decode_token(&token, &secret).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = sign_token(UserId::new(1), UserRole::User, &test_secret()).unwrap();
        let other = SecretString::from("b".repeat(32));
        assert!(decode_token(&token, &other).is_err());
    }

    #[test]
    fn test_otp_is_six_digits() {
        for _ in 0..32 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_reset_token_digest_is_deterministic() {
        let (raw, digest) = generate_reset_token();
        assert_eq!(hash_reset_token(&raw), digest);
        // The raw token never equals its digest
        assert_ne!(raw, digest);
    }
}
