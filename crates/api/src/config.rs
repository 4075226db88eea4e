//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VOLTSHOP_DATABASE_URL` - `PostgreSQL` connection string
//! - `VOLTSHOP_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `CLIENT_URL` - Comma-separated allowed frontend origins; the first one
//!   is also used to build password-reset links
//! - `FROM_EMAIL` - Verified sender address for transactional email
//! - `SENDGRID_API_KEY` - SendGrid API key
//! - `CLOUDINARY_CLOUD_NAME` / `CLOUDINARY_API_KEY` / `CLOUDINARY_API_SECRET`
//!
//! ## Optional
//! - `VOLTSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `VOLTSHOP_PORT` - Listen port (default: 3000)
//! - `CLOUDINARY_FOLDER` - Upload folder (default: products)
//! - `LOW_STOCK_THRESHOLD` - Alert threshold (default: 5)
//! - `LOW_STOCK_SWEEP_SECS` - Sweep interval in seconds (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Allowed frontend origins for CORS
    pub cors_origins: Vec<String>,
    /// Primary frontend URL, used in password-reset links
    pub client_url: String,
    /// JWT signing secret
    pub jwt_secret: SecretString,
    /// Transactional email configuration
    pub email: EmailConfig,
    /// Media storage configuration
    pub cloudinary: CloudinaryConfig,
    /// Low-stock sweep configuration
    pub low_stock: LowStockConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Transactional email (SendGrid) configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct EmailConfig {
    /// Verified sender address. Low-stock alerts are also delivered here.
    pub from_email: String,
    /// SendGrid API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from_email", &self.from_email)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Cloudinary media storage configuration.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Cloud name (appears in upload URLs)
    pub cloud_name: String,
    /// API key (not secret, appears in signed requests)
    pub api_key: String,
    /// API secret used for request signing
    pub api_secret: SecretString,
    /// Upload folder
    pub folder: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .finish()
    }
}

/// Low-stock sweep configuration.
#[derive(Debug, Clone)]
pub struct LowStockConfig {
    /// Products below this quantity trigger an alert.
    pub threshold: i32,
    /// Seconds between sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for LowStockConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            sweep_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("VOLTSHOP_DATABASE_URL")?;
        let host = get_env_or_default("VOLTSHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("VOLTSHOP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("VOLTSHOP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("VOLTSHOP_PORT".to_string(), e.to_string()))?;

        let client_urls = get_required_env("CLIENT_URL")?;
        let cors_origins: Vec<String> = client_urls
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        let client_url = cors_origins
            .first()
            .cloned()
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar("CLIENT_URL".to_string(), "no origins given".to_string())
            })?;

        let jwt_secret = get_validated_secret("VOLTSHOP_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "VOLTSHOP_JWT_SECRET")?;

        let email = EmailConfig {
            from_email: get_required_env("FROM_EMAIL")?,
            api_key: get_required_secret("SENDGRID_API_KEY")?,
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
            api_key: get_required_env("CLOUDINARY_API_KEY")?,
            api_secret: get_required_secret("CLOUDINARY_API_SECRET")?,
            folder: get_env_or_default("CLOUDINARY_FOLDER", "products"),
        };

        let low_stock = LowStockConfig {
            threshold: get_env_or_default("LOW_STOCK_THRESHOLD", "5")
                .parse::<i32>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("LOW_STOCK_THRESHOLD".to_string(), e.to_string())
                })?,
            sweep_interval_secs: get_env_or_default("LOW_STOCK_SWEEP_SECS", "60")
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("LOW_STOCK_SWEEP_SECS".to_string(), e.to_string())
                })?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            cors_origins,
            client_url,
            jwt_secret,
            email,
            cloudinary,
            low_stock,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by managed postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the JWT secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-signing-key-here", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_jwt_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_jwt_secret(&secret, "TEST_JWT").is_err());
    }

    #[test]
    fn test_validate_jwt_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_jwt_secret(&secret, "TEST_JWT").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            client_url: "http://localhost:5173".to_string(),
            jwt_secret: SecretString::from("x".repeat(32)),
            email: EmailConfig {
                from_email: "shop@voltshop.io".to_string(),
                api_key: SecretString::from("sg-key"),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: "voltshop".to_string(),
                api_key: "123456".to_string(),
                api_secret: SecretString::from("cloud-secret"),
                folder: "products".to_string(),
            },
            low_stock: LowStockConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_email_config_debug_redacts_api_key() {
        let config = EmailConfig {
            from_email: "shop@voltshop.io".to_string(),
            api_key: SecretString::from("super_secret_sendgrid_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("shop@voltshop.io"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_sendgrid_key"));
    }

    #[test]
    fn test_cloudinary_config_debug_redacts_secret() {
        let config = CloudinaryConfig {
            cloud_name: "voltshop".to_string(),
            api_key: "123456".to_string(),
            api_secret: SecretString::from("super_secret_cloudinary"),
            folder: "products".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("voltshop"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_cloudinary"));
    }
}
