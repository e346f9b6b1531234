//! Server-side admin verification.
//!
//! An alternate verification step that POSTs the freshly issued id token to
//! a backend endpoint and requires an `is_admin` answer. Disabled unless a
//! base URL is configured; the domain allow-list remains the primary
//! authorization gate either way.

use serde::Deserialize;
use std::time::Duration;

use super::identity::ProviderError;

/// Default timeout for verification requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the `{base_url}/admin/verify` endpoint.
#[derive(Clone)]
pub struct RemoteAdminVerifier {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    is_admin: bool,
}

impl RemoteAdminVerifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Ask the backend whether the holder of this id token is an admin.
    ///
    /// `Ok(false)` covers both an explicit denial and a non-success status;
    /// transport failures surface as `Unavailable` so the caller can fail
    /// closed.
    pub async fn verify_admin(&self, id_token: &str) -> Result<bool, ProviderError> {
        let url = format!("{}/admin/verify", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(id_token)
            .send()
            .await
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Other(err.to_string()))?;

        Ok(body.is_admin)
    }
}
