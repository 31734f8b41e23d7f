//! Common test utilities for integration tests.
//!
//! Provides a mock IndieAuth authorization server: a profile page that
//! advertises endpoints plus the metadata/token/introspection endpoints the
//! advertisement points at.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Well-known path the mock serves its metadata document at.
pub const METADATA_PATH: &str = "/.well-known/oauth-authorization-server";

/// Mock IndieAuth server: one wiremock instance playing both the profile
/// host and the authorization server.
pub struct MockIndieAuthServer {
    pub server: MockServer,
}

impl MockIndieAuthServer {
    /// Start a fresh mock server.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URI of the server, no trailing slash.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The profile URL under test.
    pub fn profile_url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Absolute URL of the metadata document.
    pub fn metadata_url(&self) -> String {
        format!("{}{}", self.server.uri(), METADATA_PATH)
    }

    /// Authorization endpoint named by the metadata document.
    pub fn authorization_endpoint(&self) -> String {
        format!("{}/auth", self.server.uri())
    }

    /// Token endpoint named by the metadata document.
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.server.uri())
    }

    /// The metadata document the mock serves.
    pub fn metadata_document(&self) -> Value {
        json!({
            "issuer": format!("{}/", self.server.uri()),
            "authorization_endpoint": self.authorization_endpoint(),
            "token_endpoint": self.token_endpoint(),
            "code_challenge_methods_supported": ["S256"],
        })
    }

    /// Mount the profile page with a `Link` header advertising the metadata
    /// document. Expects exactly `expected_requests` hits.
    pub async fn mock_profile_with_metadata_link_header(&self, expected_requests: u64) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "Link",
                        format!("<{}>; rel=\"indieauth-metadata\"", self.metadata_url()).as_str(),
                    )
                    .set_body_string("<html><head></head><body>profile</body></html>"),
            )
            .expect(expected_requests)
            .mount(&self.server)
            .await;
    }

    /// Mount the metadata document. Expects exactly `expected_requests` hits.
    pub async fn mock_metadata(&self, expected_requests: u64) {
        Mock::given(method("GET"))
            .and(path(METADATA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(self.metadata_document()))
            .expect(expected_requests)
            .mount(&self.server)
            .await;
    }
}
