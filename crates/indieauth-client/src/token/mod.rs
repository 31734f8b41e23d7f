//! # Token Lifecycle Services
//!
//! Independent request/response clients for the endpoints a discovery result
//! names: token refresh, revocation (RFC 7009), introspection (RFC 7662),
//! and userinfo. Each client wraps one endpoint URL and a `reqwest` client;
//! none of them hold flow state.
//!
//! ## Submodules
//!
//! - `refresh` - refresh-token grants against the token endpoint
//! - `revocation` - token revocation
//! - `introspection` - real-time token validity checks
//! - `userinfo` - profile information for an access token

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod introspection;
pub mod refresh;
pub mod revocation;
pub mod userinfo;

pub use introspection::{IntrospectionClient, IntrospectionResponse};
pub use refresh::{TokenRefreshClient, TokenResponse};
pub use revocation::TokenRevocationClient;
pub use userinfo::UserInfoClient;

/// Failures shared by every token lifecycle client.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Connection-level failure
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The endpoint answered with a non-success status
    #[error("{endpoint} returned {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body was not the expected JSON shape
    #[error("Invalid response JSON: {message}")]
    InvalidJson { message: String },
}

/// Profile information a server may attach to token and userinfo responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    /// Email address, only present when the `email` scope was granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Additional profile fields
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}
