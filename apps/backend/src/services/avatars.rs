//! Avatar uploads to a hosted image service.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;
use crate::errors::ErrorCode;

#[derive(Clone)]
pub struct AvatarClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl AvatarClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Build from `IMAGE_HOST_BASE_URL` and `IMAGE_HOST_API_KEY`.
    /// Returns None when either is unset.
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("IMAGE_HOST_BASE_URL").ok()?;
        let api_key = env::var("IMAGE_HOST_API_KEY").ok()?;
        Some(Self::new(base_url, api_key))
    }

    /// Stable identifier for a user's avatar so re-uploads replace the
    /// previous image instead of accumulating.
    pub fn public_id(username: &str, user_id: i64) -> String {
        format!("contacts_app/{username}_id{user_id}")
    }

    /// Upload raw image bytes and return the hosted URL.
    pub async fn upload(
        &self,
        public_id: &str,
        content_type: &str,
        bytes: bytes::Bytes,
    ) -> Result<String, AppError> {
        let resp = self
            .http
            .post(format!("{}/upload", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", content_type)
            .query(&[("public_id", public_id)])
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                AppError::unavailable(
                    ErrorCode::AvatarUnavailable,
                    format!("Image host unreachable: {e}"),
                )
            })?;

        if !resp.status().is_success() {
            return Err(AppError::unavailable(
                ErrorCode::AvatarUnavailable,
                format!("Image host returned {}", resp.status()),
            ));
        }

        let parsed: UploadResponse = resp.json().await.map_err(|e| {
            AppError::unavailable(
                ErrorCode::AvatarUnavailable,
                format!("Malformed image host response: {e}"),
            )
        })?;
        Ok(parsed.url)
    }
}

#[cfg(test)]
mod tests {
    use super::AvatarClient;

    #[test]
    fn public_id_is_stable_per_user() {
        assert_eq!(
            AvatarClient::public_id("alice", 7),
            "contacts_app/alice_id7"
        );
    }
}
