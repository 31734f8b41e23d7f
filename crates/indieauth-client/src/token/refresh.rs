//! Refresh-token grants against the token endpoint.
//!
//! Servers may rotate refresh tokens: when the response carries a new
//! `refresh_token`, the old one must be discarded and the new one stored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{TokenError, UserProfile};

/// Successful token endpoint response.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token
    pub access_token: String,

    /// Token type, normally `Bearer`
    pub token_type: String,

    /// Lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// Replacement refresh token, when the server rotates them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scopes, space-separated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// The identity the token is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me: Option<String>,

    /// Profile information, when the `profile` scope was granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,

    /// Additional response fields
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

// Manual Debug impl to keep tokens out of logs
impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scope", &self.scope)
            .field("me", &self.me)
            .field("profile", &self.profile)
            .finish()
    }
}

/// Client for the refresh-token grant.
#[derive(Debug, Clone)]
pub struct TokenRefreshClient {
    /// Token endpoint URL from discovery
    token_endpoint: String,

    /// The client identifier registered with the server
    client_id: String,

    /// HTTP client
    http_client: reqwest::Client,
}

impl TokenRefreshClient {
    /// Create a refresh client for a token endpoint.
    pub fn new(token_endpoint: String, client_id: String) -> Self {
        Self::with_http_client(token_endpoint, client_id, reqwest::Client::new())
    }

    /// Create a refresh client using the provided HTTP client.
    pub fn with_http_client(
        token_endpoint: String,
        client_id: String,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            token_endpoint,
            client_id,
            http_client,
        }
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// `scope` may request a narrower scope than originally granted;
    /// requesting a broader one is a server-side error.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the request fails, the endpoint answers
    /// with a non-success status, or the response body is not a token
    /// response.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        scope: Option<&str>,
    ) -> Result<TokenResponse, TokenError> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.client_id),
        ];
        if let Some(scope) = scope {
            form.push(("scope", scope));
        }

        debug!(endpoint = %self.token_endpoint, "refreshing access token");
        let response = self
            .http_client
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::Network {
                url: self.token_endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Http {
                endpoint: self.token_endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| TokenError::InvalidJson {
                message: e.to_string(),
            })
    }
}
