//! Userinfo endpoint client.

use tracing::debug;

use super::{TokenError, UserProfile};

/// Client for the userinfo endpoint a metadata document may advertise.
///
/// Requires an access token carrying the `profile` scope; servers answer
/// 403 otherwise.
#[derive(Debug, Clone)]
pub struct UserInfoClient {
    /// Userinfo endpoint URL from discovery
    userinfo_endpoint: String,

    /// HTTP client
    http_client: reqwest::Client,
}

impl UserInfoClient {
    /// Create a userinfo client for an endpoint.
    pub fn new(userinfo_endpoint: String) -> Self {
        Self::with_http_client(userinfo_endpoint, reqwest::Client::new())
    }

    /// Create a userinfo client using the provided HTTP client.
    pub fn with_http_client(userinfo_endpoint: String, http_client: reqwest::Client) -> Self {
        Self {
            userinfo_endpoint,
            http_client,
        }
    }

    /// Fetch the profile for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the request fails, the endpoint answers
    /// with a non-success status, or the response is malformed.
    pub async fn fetch(&self, access_token: &str) -> Result<UserProfile, TokenError> {
        debug!(endpoint = %self.userinfo_endpoint, "fetching userinfo");
        let response = self
            .http_client
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| TokenError::Network {
                url: self.userinfo_endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Http {
                endpoint: self.userinfo_endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| TokenError::InvalidJson {
                message: e.to_string(),
            })
    }
}
