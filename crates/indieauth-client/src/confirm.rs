//! # Authorization Server Confirmation
//!
//! Post-authentication verification that the server which issued an identity
//! assertion is entitled to speak for the returned identity URL.
//!
//! The returned identity may legitimately differ from what the user typed —
//! subdomain delegation and path-based multi-user services both do this — so
//! exact string matching would reject valid flows. Skipping verification
//! entirely would let any server claim any identity. The middle path is an
//! ordered set of checks, cheapest first:
//!
//! 1. exact match against the canonicalized input
//! 2. match against a URL visited during the original discovery's redirect
//!    chain (no network)
//! 3. re-discovery of the returned URL, requiring its authorization endpoint
//!    to equal the original's
//!
//! Check 3 is the security boundary: an attacker's page cannot claim an
//! identity whose real authorization endpoint differs from the attacker's.
//!
//! Issuer validation rides along here: it compares the issuer recorded at
//! discovery time with the `iss` parameter returned on the callback, using
//! ordinal case-sensitive equality — stricter than the host matching used
//! for URLs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::canonicalize;
use crate::discovery::{DiscoveryEngine, DiscoveryError, DiscoveryOptions, DiscoveryResult};

/// Which check confirmed the authorization server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationMethod {
    /// Not confirmed
    #[default]
    Unknown,
    /// Returned identity equals the canonicalized input
    ExactMatch,
    /// Returned identity appeared in the original discovery's redirect chain
    RedirectChainMatch,
    /// Re-discovery of the returned identity yielded the same authorization
    /// endpoint
    ReDiscoveryMatch,
}

/// Why confirmation was refused.
///
/// `EndpointMismatch` is the security rejection: it means a server asserted
/// an identity whose authorization endpoint is not the one that ran the
/// flow. The other variants are input or transport problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ConfirmationError {
    /// The original discovery result was not a success
    #[error("Original discovery was not successful")]
    OriginalDiscoveryFailed,

    /// The authorization server returned no identity URL
    #[error("Returned identity URL is required")]
    MissingIdentityUrl,

    /// Re-discovery of the returned identity failed
    #[error("Re-discovery of {url} failed: {source}")]
    ReDiscoveryFailed {
        url: String,
        source: DiscoveryError,
    },

    /// Re-discovered authorization endpoint differs from the original
    #[error(
        "Authorization endpoint mismatch for {returned}: original discovery found {original} but re-discovery found {rediscovered}"
    )]
    EndpointMismatch {
        returned: String,
        original: String,
        rediscovered: String,
    },
}

/// The outcome of one confirmation attempt. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationResult {
    /// Whether the server was confirmed
    pub success: bool,

    /// Which check succeeded
    pub method: ConfirmationMethod,

    /// Why confirmation was refused, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ConfirmationError>,
}

impl ConfirmationResult {
    fn confirmed(method: ConfirmationMethod) -> Self {
        Self {
            success: true,
            method,
            error: None,
        }
    }

    fn rejected(error: ConfirmationError) -> Self {
        Self {
            success: false,
            method: ConfirmationMethod::Unknown,
            error: Some(error),
        }
    }

    /// Human-readable error message, when this result is a rejection.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Confirms that the authorization server answering for a returned identity
/// is the one the original discovery found.
#[derive(Debug, Clone)]
pub struct ConfirmationEngine {
    engine: DiscoveryEngine,
}

impl ConfirmationEngine {
    /// Create a confirmation engine that re-discovers through `engine` when
    /// the cheap checks do not settle the question.
    pub fn new(engine: DiscoveryEngine) -> Self {
        Self { engine }
    }

    /// Run the ordered confirmation checks; the first success wins.
    ///
    /// `canonicalized_input` is the canonicalized profile URL the user
    /// originally supplied; `returned_me` is the identity URL asserted by
    /// the authorization server.
    pub async fn confirm(
        &self,
        original: &DiscoveryResult,
        returned_me: &str,
        canonicalized_input: &str,
    ) -> ConfirmationResult {
        if !original.success {
            return ConfirmationResult::rejected(ConfirmationError::OriginalDiscoveryFailed);
        }
        if returned_me.trim().is_empty() {
            return ConfirmationResult::rejected(ConfirmationError::MissingIdentityUrl);
        }

        let returned = canonicalize(returned_me);
        if returned.eq_ignore_ascii_case(canonicalized_input) {
            return ConfirmationResult::confirmed(ConfirmationMethod::ExactMatch);
        }

        // Any URL visited during the original discovery already proved it
        // leads to the same server; matching it avoids a re-discovery fetch.
        if original
            .discovered_urls
            .iter()
            .any(|visited| canonicalize(visited).eq_ignore_ascii_case(&returned))
        {
            return ConfirmationResult::confirmed(ConfirmationMethod::RedirectChainMatch);
        }

        let rediscovered = self
            .engine
            .discover(&returned, &DiscoveryOptions::default())
            .await;
        if !rediscovered.success {
            let source = rediscovered
                .error
                .unwrap_or(DiscoveryError::NoEndpointsFound);
            return ConfirmationResult::rejected(ConfirmationError::ReDiscoveryFailed {
                url: returned,
                source,
            });
        }

        let original_endpoint = original.authorization_endpoint.as_deref().unwrap_or("");
        let rediscovered_endpoint = rediscovered.authorization_endpoint.as_deref().unwrap_or("");
        if original_endpoint.eq_ignore_ascii_case(rediscovered_endpoint) {
            ConfirmationResult::confirmed(ConfirmationMethod::ReDiscoveryMatch)
        } else {
            ConfirmationResult::rejected(ConfirmationError::EndpointMismatch {
                returned,
                original: original_endpoint.to_owned(),
                rediscovered: rediscovered_endpoint.to_owned(),
            })
        }
    }
}

/// Why an issuer comparison failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum IssuerError {
    /// An issuer was recorded at discovery time but the callback carried none
    #[error("Expected issuer {expected} but the callback carried none")]
    Missing { expected: String },

    /// The callback issuer differs from the recorded one
    #[error("Issuer mismatch: expected {expected} but received {received}")]
    Mismatch { expected: String, received: String },
}

/// Compare the issuer recorded during discovery with the one received on the
/// authentication callback.
///
/// Ordinal, case-sensitive equality — issuer identifiers are opaque strings,
/// not URLs to be normalized. With no expected issuer (legacy discovery
/// without metadata) there is no baseline and validation is skipped.
///
/// # Errors
///
/// Returns [`IssuerError`] when an expected issuer is missing from or
/// contradicted by the callback.
pub fn validate_issuer(
    expected: Option<&str>,
    received: Option<&str>,
) -> Result<(), IssuerError> {
    match (expected, received) {
        (None, _) => Ok(()),
        (Some(expected), Some(received)) if expected == received => Ok(()),
        (Some(expected), Some(received)) => Err(IssuerError::Mismatch {
            expected: expected.to_owned(),
            received: received.to_owned(),
        }),
        (Some(expected), None) => Err(IssuerError::Missing {
            expected: expected.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_validation_skipped_without_baseline() {
        assert_eq!(validate_issuer(None, None), Ok(()));
        assert_eq!(validate_issuer(None, Some("https://a.example/")), Ok(()));
    }

    #[test]
    fn issuer_validation_is_case_sensitive() {
        assert_eq!(
            validate_issuer(Some("https://a.example/"), Some("https://a.example/")),
            Ok(())
        );
        assert!(matches!(
            validate_issuer(Some("https://a.example/"), Some("https://A.example/")),
            Err(IssuerError::Mismatch { .. })
        ));
    }

    #[test]
    fn missing_received_issuer_is_a_failure_not_a_skip() {
        assert!(matches!(
            validate_issuer(Some("https://a.example/"), None),
            Err(IssuerError::Missing { .. })
        ));
    }

    #[test]
    fn mismatch_message_names_both_endpoints() {
        let error = ConfirmationError::EndpointMismatch {
            returned: "https://evil.example/".to_owned(),
            original: "https://auth.example.com/auth".to_owned(),
            rediscovered: "https://evil.example/auth".to_owned(),
        };
        let message = error.to_string();
        assert!(message.contains("mismatch"));
        assert!(message.contains("https://auth.example.com/auth"));
        assert!(message.contains("https://evil.example/auth"));
    }
}
