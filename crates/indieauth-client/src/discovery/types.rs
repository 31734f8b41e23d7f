//! # Discovery Types
//!
//! The discovery result record, the method tag describing which precedence
//! tier produced it, the server metadata document shape, and the discovery
//! error taxonomy.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which precedence tier produced a discovery result.
///
/// A closed enum rather than a string so the tiers stay exhaustively
/// testable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryMethod {
    /// No discovery has produced this result (failures, defaults)
    #[default]
    Unknown,
    /// `indieauth-metadata` relation found in an HTTP `Link` header
    MetadataLinkHeader,
    /// `indieauth-metadata` relation found in HTML `<link>` markup
    MetadataHtmlLink,
    /// Legacy `authorization_endpoint` + `token_endpoint` pair in `Link` headers
    LegacyLinkHeader,
    /// Legacy endpoint pair in HTML `<link>` markup
    LegacyHtmlLink,
    /// Served from the discovery cache
    Cached,
}

/// Discovery failures, grouped by the error classes callers need to tell
/// apart: missing input, transport failures, HTTP status failures, and
/// protocol-level problems with an otherwise well-formed response.
///
/// Serializable because it travels inside a persisted [`DiscoveryResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DiscoveryError {
    /// Empty or missing profile URL; rejected before any I/O
    #[error("Profile URL is required")]
    MissingProfileUrl,

    /// A URL that could not be parsed at all
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Connection-level failure: DNS, refused, timeout
    #[error("Network error requesting {url}: {message}")]
    Network { url: String, message: String },

    /// Redirect chain exceeded the hop limit
    #[error("Too many redirects while fetching {url}")]
    TooManyRedirects { url: String },

    /// The profile URL answered with a non-success status
    #[error("Profile URL returned {status}")]
    ProfileStatus { status: u16 },

    /// The metadata endpoint answered with a non-success status
    #[error("Metadata endpoint returned {status}")]
    MetadataStatus { status: u16 },

    /// The metadata document was not valid JSON
    #[error("Invalid metadata JSON: {message}")]
    InvalidMetadataJson { message: String },

    /// The metadata document lacks `authorization_endpoint` or `token_endpoint`
    #[error("Metadata missing required endpoints")]
    MetadataMissingEndpoints,

    /// Every precedence tier came up empty
    #[error("No IndieAuth endpoints found")]
    NoEndpointsFound,

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {message}")]
    Client { message: String },
}

/// The outcome of one discovery attempt.
///
/// Immutable once returned. Serializable so the caller can persist it across
/// the browser redirect round-trip and feed it back into confirmation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Whether two endpoint URLs were located
    pub success: bool,

    /// The authorization endpoint, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    /// The token endpoint, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    /// Why discovery failed, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DiscoveryError>,

    /// Issuer identifier from the metadata document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// UserInfo endpoint from the metadata document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// Revocation endpoint from the metadata document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,

    /// Introspection endpoint from the metadata document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,

    /// Scopes the server advertises, in document order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,

    /// PKCE code challenge methods the server advertises
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,

    /// Which precedence tier produced this result
    #[serde(default)]
    pub method: DiscoveryMethod,

    /// When discovery completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<DateTime<Utc>>,

    /// Every URL visited while fetching the profile, redirects included
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovered_urls: Vec<String>,

    /// The canonicalized profile URL discovery ran against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl DiscoveryResult {
    /// Build a failed result carrying the given error.
    pub fn failure(error: DiscoveryError) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::default()
        }
    }

    /// Human-readable error message, when this result is a failure.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// IndieAuth server metadata document.
///
/// The endpoint fields the protocol requires are optional here so their
/// absence surfaces as [`DiscoveryError::MetadataMissingEndpoints`] rather
/// than a JSON parse failure. Unrecognized members are preserved in
/// `additional_fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMetadata {
    /// The server's issuer identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// REQUIRED by the protocol. URL of the authorization endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    /// REQUIRED by the protocol. URL of the token endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    /// URL of the introspection endpoint (RFC 7662)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,

    /// URL of the revocation endpoint (RFC 7009)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,

    /// URL of the userinfo endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// Scope values the server supports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,

    /// PKCE code challenge methods the server supports (RFC 7636)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,

    /// Additional metadata fields
    #[serde(flatten)]
    pub additional_fields: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_message() {
        let result = DiscoveryResult::failure(DiscoveryError::NoEndpointsFound);
        assert!(!result.success);
        assert_eq!(
            result.error_message().as_deref(),
            Some("No IndieAuth endpoints found")
        );
        assert_eq!(result.method, DiscoveryMethod::Unknown);
    }

    #[test]
    fn status_errors_embed_the_status() {
        let result = DiscoveryResult::failure(DiscoveryError::ProfileStatus { status: 404 });
        assert_eq!(
            result.error_message().as_deref(),
            Some("Profile URL returned 404")
        );
    }

    #[test]
    fn result_round_trips_through_serde() {
        let result = DiscoveryResult {
            success: true,
            authorization_endpoint: Some("https://auth.example.com/auth".to_owned()),
            token_endpoint: Some("https://auth.example.com/token".to_owned()),
            issuer: Some("https://auth.example.com/".to_owned()),
            scopes_supported: Some(vec!["profile".to_owned(), "email".to_owned()]),
            method: DiscoveryMethod::MetadataLinkHeader,
            discovered_at: Some(Utc::now()),
            discovered_urls: vec!["https://example.com/".to_owned()],
            original_url: Some("https://example.com/".to_owned()),
            ..DiscoveryResult::default()
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: DiscoveryResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn metadata_parses_with_unknown_fields_preserved() {
        let json = r#"{
            "issuer": "https://auth.example.com/",
            "authorization_endpoint": "https://auth.example.com/auth",
            "token_endpoint": "https://auth.example.com/token",
            "code_challenge_methods_supported": ["S256"],
            "grant_types_supported": ["authorization_code"]
        }"#;
        let metadata: ServerMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(
            metadata.authorization_endpoint.as_deref(),
            Some("https://auth.example.com/auth")
        );
        assert!(metadata.additional_fields.contains_key("grant_types_supported"));
    }

    #[test]
    fn metadata_tolerates_missing_endpoints() {
        let metadata: ServerMetadata =
            serde_json::from_str(r#"{"issuer": "https://a.example/"}"#).unwrap();
        assert!(metadata.authorization_endpoint.is_none());
        assert!(metadata.token_endpoint.is_none());
    }
}
