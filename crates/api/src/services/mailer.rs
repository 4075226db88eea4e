//! SendGrid notification gateway client.
//!
//! Thin wrapper over the v3 mail-send endpoint. Callers decide whether a
//! send failure is fatal: signup surfaces it, order paths log and move on.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use thiserror::Error;

use crate::config::EmailConfig;

/// SendGrid API endpoint.
const SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur when sending mail.
#[derive(Debug, Error)]
pub enum MailerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client could not be constructed.
    #[error("Client error: {0}")]
    Client(String),
}

/// Transactional email client.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    from_email: String,
}

impl Mailer {
    /// Create a new mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &EmailConfig) -> Result<Self, MailerError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| MailerError::Client(format!("Invalid API key format: {e}")))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            from_email: config.from_email.clone(),
        })
    }

    /// The configured sender address.
    #[must_use]
    pub fn from_email(&self) -> &str {
        &self.from_email
    }

    /// Send one HTML email.
    ///
    /// # Errors
    ///
    /// Returns `MailerError::Api` on a non-success response (202 Accepted
    /// is the expected status).
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError> {
        let body = json!({
            "personalizations": [{
                "to": [{ "email": to }]
            }],
            "from": { "email": self.from_email },
            "subject": subject,
            "content": [{
                "type": "text/html",
                "value": html
            }]
        });

        let response = self.client.post(SEND_URL).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(to, subject, "Email dispatched");
        Ok(())
    }
}
