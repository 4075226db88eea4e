//! Cloudinary media store client.
//!
//! Implements the two operations the catalog needs: upload an image (URL +
//! public ID back) and destroy one by public ID. Requests are signed with
//! the account secret per Cloudinary's SHA-1 scheme: the sorted parameter
//! string with the secret appended, hex-digested.

use std::fmt::Write as _;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::config::CloudinaryConfig;

/// Errors that can occur when talking to the media store.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A stored image: delivery URL plus the ID used for later deletion.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Cloudinary API client.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    folder: String,
}

impl MediaClient {
    /// Create a new media client from configuration.
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        }
    }

    /// Upload one image, returning its delivery URL and public ID.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Api` on a non-success response.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadedImage, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", &self.folder), ("timestamp", &timestamp)],
            self.api_secret.expose_secret(),
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_owned());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature", signature);

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<UploadedImage>()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))
    }

    /// Delete an image by public ID.
    ///
    /// A `not found` result is treated as success so repeated cleanup of
    /// the same image stays idempotent.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Api` on a non-success response or an
    /// unexpected result value.
    pub async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            self.api_secret.expose_secret(),
        );

        let form = [
            ("public_id", public_id),
            ("api_key", &self.api_key),
            ("timestamp", &timestamp),
            ("signature", &signature),
        ];

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/destroy",
            self.cloud_name
        );
        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;

        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Api {
                status: status.as_u16(),
                message: format!("unexpected destroy result: {other}"),
            }),
        }
    }
}

/// Sign request parameters per Cloudinary's scheme.
///
/// Parameters must be passed sorted by key; the secret is appended to the
/// `key=value&...` string and the whole thing SHA-1 hex-digested.
fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha1::digest(format!("{joined}{secret}").as_bytes());

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_params_known_digest() {
        // With no parameters only the secret is digested; sha1("abc") is a
        // well-known test vector.
        let signature = sign_params(&[], "abc");
        assert_eq!(signature, "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_sign_params_joins_sorted_pairs() {
        let a = sign_params(&[("folder", "products"), ("timestamp", "100")], "s");
        let b = sign_params(&[("folder", "products"), ("timestamp", "100")], "s");
        let c = sign_params(&[("folder", "products"), ("timestamp", "101")], "s");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
