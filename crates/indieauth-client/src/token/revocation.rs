//! Token revocation (RFC 7009).

use tracing::debug;

use super::TokenError;

/// Client for the revocation endpoint.
///
/// Per RFC 7009 a server answers 200 even for tokens it does not recognize,
/// so a success only means the token is no longer usable, not that it ever
/// was.
#[derive(Debug, Clone)]
pub struct TokenRevocationClient {
    /// Revocation endpoint URL from discovery
    revocation_endpoint: String,

    /// HTTP client
    http_client: reqwest::Client,
}

impl TokenRevocationClient {
    /// Create a revocation client for an endpoint.
    pub fn new(revocation_endpoint: String) -> Self {
        Self::with_http_client(revocation_endpoint, reqwest::Client::new())
    }

    /// Create a revocation client using the provided HTTP client.
    pub fn with_http_client(revocation_endpoint: String, http_client: reqwest::Client) -> Self {
        Self {
            revocation_endpoint,
            http_client,
        }
    }

    /// Revoke a token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the request fails or the endpoint answers
    /// with a non-success status.
    pub async fn revoke(
        &self,
        token: &str,
        token_type_hint: Option<&str>,
    ) -> Result<(), TokenError> {
        let mut form = vec![("token", token)];
        if let Some(hint) = token_type_hint {
            form.push(("token_type_hint", hint));
        }

        debug!(endpoint = %self.revocation_endpoint, "revoking token");
        let response = self
            .http_client
            .post(&self.revocation_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::Network {
                url: self.revocation_endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Http {
                endpoint: self.revocation_endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
