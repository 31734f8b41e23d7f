//! Token introspection (RFC 7662).
//!
//! Real-time validity checks against the authorization server, which is the
//! only way to observe revocation for opaque tokens.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::TokenError;

/// Introspection response per RFC 7662 Section 2.2, extended with the
/// identity binding IndieAuth servers report.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active (REQUIRED)
    pub active: bool,

    /// The identity the token is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me: Option<String>,

    /// Client the token was issued to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Scope(s) associated with the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Expiration timestamp (seconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Issued-at timestamp (seconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Additional fields
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

/// Token introspection client.
#[derive(Clone)]
pub struct IntrospectionClient {
    /// Introspection endpoint URL from discovery
    endpoint: String,

    /// Client ID for authenticating with the endpoint
    client_id: String,

    /// Client secret, for confidential clients
    client_secret: Option<String>,

    /// HTTP client
    http_client: reqwest::Client,
}

// Manual Debug impl to keep the client secret out of logs
impl std::fmt::Debug for IntrospectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntrospectionClient")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl IntrospectionClient {
    /// Create an introspection client.
    ///
    /// `client_secret` is `None` for public clients.
    pub fn new(endpoint: String, client_id: String, client_secret: Option<String>) -> Self {
        Self {
            endpoint,
            client_id,
            client_secret,
            http_client: reqwest::Client::new(),
        }
    }

    /// Introspect a token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the request fails, the endpoint answers
    /// with a non-success status, or the response is malformed.
    pub async fn introspect(
        &self,
        token: &str,
        token_type_hint: Option<&str>,
    ) -> Result<IntrospectionResponse, TokenError> {
        let mut form = vec![("token", token), ("client_id", self.client_id.as_str())];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret));
        }
        if let Some(hint) = token_type_hint {
            form.push(("token_type_hint", hint));
        }

        let response = self
            .http_client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::Network {
                url: self.endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Http {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<IntrospectionResponse>()
            .await
            .map_err(|e| TokenError::InvalidJson {
                message: e.to_string(),
            })
    }

    /// Check whether a token is active; a shortcut over [`Self::introspect`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] under the same conditions as
    /// [`Self::introspect`].
    pub async fn is_token_active(&self, token: &str) -> Result<bool, TokenError> {
        let response = self.introspect(token, Some("access_token")).await?;
        Ok(response.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_response_parses_identity_binding() {
        let json = r#"{
            "active": true,
            "me": "https://user.example.net/",
            "client_id": "https://app.example.com/",
            "scope": "create update",
            "exp": 1419356238,
            "iat": 1419350238
        }"#;
        let response: IntrospectionResponse = serde_json::from_str(json).unwrap();
        assert!(response.active);
        assert_eq!(response.me.as_deref(), Some("https://user.example.net/"));
        assert_eq!(response.scope.as_deref(), Some("create update"));
    }

    #[test]
    fn inactive_response_needs_only_the_flag() {
        let response: IntrospectionResponse = serde_json::from_str(r#"{"active": false}"#).unwrap();
        assert!(!response.active);
        assert!(response.me.is_none());
    }

    #[test]
    fn debug_output_redacts_client_secret() {
        let client = IntrospectionClient::new(
            "https://auth.example.com/introspect".to_owned(),
            "client".to_owned(),
            Some("hunter2".to_owned()),
        );
        let debug = format!("{client:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
