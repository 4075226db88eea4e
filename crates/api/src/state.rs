//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::services::mailer::{Mailer, MailerError};
use crate::services::media::MediaClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool, configuration, and the
/// external collaborator clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    mailer: Mailer,
    media: MediaClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailer HTTP client cannot be constructed.
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, MailerError> {
        let mailer = Mailer::new(&config.email)?;
        let media = MediaClient::new(&config.cloudinary);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mailer,
                media,
            }),
        })
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the notification gateway client.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Get a reference to the media store client.
    #[must_use]
    pub fn media(&self) -> &MediaClient {
        &self.inner.media
    }
}
