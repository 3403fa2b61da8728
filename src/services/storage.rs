use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage credentials are not configured")]
    NotConfigured,

    #[error("storage request failed: {0}")]
    Request(String),

    #[error("storage rejected the request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected storage response: {0}")]
    BadResponse(String),
}

/// Where an uploaded file ended up.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

/// Remote file store for report documents.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload raw bytes and return the public URL plus the provider's id.
    async fn upload(&self, bytes: &[u8], file_name: &str) -> Result<StoredObject, StorageError>;

    /// Remove a previously uploaded object by its provider id.
    async fn destroy(&self, public_id: &str) -> Result<(), StorageError>;
}

/// Cloudinary-backed store using the signed REST upload API.
///
/// Signatures are SHA-256 hex digests over the sorted parameter string
/// with the API secret appended, which Cloudinary accepts alongside its
/// SHA-1 default.
pub struct CloudinaryStorage {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct UploadReply {
    secure_url: String,
    public_id: String,
}

impl CloudinaryStorage {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn credentials() -> Result<(&'static str, &'static str, &'static str), StorageError> {
        config::config()
            .storage
            .credentials()
            .ok_or(StorageError::NotConfigured)
    }

    fn endpoint(cloud_name: &str, action: &str) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/{}", cloud_name, action)
    }
}

impl Default for CloudinaryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign request parameters the way Cloudinary expects: sort by key,
/// join as `k=v&k=v`, append the secret, hex-encode the digest.
fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, bytes: &[u8], file_name: &str) -> Result<StoredObject, StorageError> {
        let (cloud_name, api_key, api_secret) = Self::credentials()?;
        let folder = config::config().storage.folder.as_str();
        let timestamp = Utc::now().timestamp().to_string();

        let signature = sign_params(
            &[
                ("access_mode", "public"),
                ("folder", folder),
                ("timestamp", &timestamp),
            ],
            api_secret,
        );

        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", api_key.to_string())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("access_mode", "public")
            .text("signature", signature);

        let response = self
            .client
            .post(Self::endpoint(cloud_name, "auto/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|err| StorageError::BadResponse(err.to_string()))?;

        Ok(StoredObject {
            url: reply.secure_url,
            public_id: reply.public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError> {
        let (cloud_name, api_key, api_secret) = Self::credentials()?;
        let timestamp = Utc::now().timestamp().to_string();

        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            api_secret,
        );

        let form = [
            ("public_id", public_id.to_string()),
            ("api_key", api_key.to_string()),
            ("timestamp", timestamp),
            ("signature", signature),
        ];

        let response = self
            .client
            .post(Self::endpoint(cloud_name, "image/destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_order_insensitive() {
        let forward = sign_params(&[("folder", "x"), ("timestamp", "123")], "secret");
        let reversed = sign_params(&[("timestamp", "123"), ("folder", "x")], "secret");
        assert_eq!(forward, reversed);
    }

    #[test]
    fn signature_is_hex_sha256() {
        let signature = sign_params(&[("timestamp", "123")], "secret");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_secret() {
        let params = [("folder", "healthmate/reports"), ("timestamp", "123")];
        assert_ne!(sign_params(&params, "a"), sign_params(&params, "b"));
    }
}
