//! # IndieAuth Client Engine
//!
//! Client-side implementation of the IndieAuth decentralized-identity
//! protocol: given a user-supplied profile URL, locate that user's
//! authorization, token, and introspection endpoints, verify that the server
//! answering for them is actually authorized to speak for the claimed
//! identity, and cache results to avoid repeated network round-trips.
//!
//! ## Architecture
//!
//! - [`canonical`] - profile URL canonicalization and cache-key normalization
//! - [`profile`] - structural validation of identity URLs
//! - [`linkrel`] - RFC 8288 `Link` header and HTML `<link rel>` parsing
//! - [`cache`] - TTL cache of discovery results, explicitly injected
//! - [`discovery`] - the endpoint discovery engine and its result types
//! - [`confirm`] - authorization server confirmation and issuer validation
//! - [`token`] - refresh, revocation, introspection, and userinfo clients
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use indieauth_client::{
//!     canonicalize, validate_profile_url, ConfirmationEngine, DiscoveryCache,
//!     DiscoveryEngine, DiscoveryOptions,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let me = "ALICE.example.com";
//! validate_profile_url(&canonicalize(me))?;
//! let canonical = canonicalize(me);
//!
//! let engine = DiscoveryEngine::new()?.with_cache(Arc::new(DiscoveryCache::new()));
//! let discovery = engine.discover(&canonical, &DiscoveryOptions::default()).await;
//! if !discovery.success {
//!     return Err(discovery.error_message().unwrap_or_default().into());
//! }
//!
//! // ... browser redirect round-trip through discovery.authorization_endpoint ...
//! let returned_me = "https://alice.example.com/";
//!
//! let confirmation = ConfirmationEngine::new(engine)
//!     .confirm(&discovery, returned_me, &canonical)
//!     .await;
//! assert!(confirmation.success);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Expected failures — malformed input, unreachable hosts, malformed remote
//! responses, security rejections — are returned as typed values; nothing in
//! the public surface panics on remote misbehavior. Discovery and
//! confirmation return result records with an `error` field, the validators
//! and token clients return `Result`.
//!
//! ## Standards
//!
//! - **IndieAuth** (W3C/IndieWeb living spec) - discovery, identity
//!   verification, token endpoints
//! - **RFC 8288** - Web Linking (`Link` headers)
//! - **RFC 7009** - token revocation
//! - **RFC 7662** - token introspection

pub mod cache;
pub mod canonical;
pub mod confirm;
pub mod discovery;
pub mod linkrel;
pub mod profile;
pub mod token;

#[doc(inline)]
pub use cache::{DEFAULT_CACHE_TTL, DiscoveryCache};

#[doc(inline)]
pub use canonical::{cache_key, canonicalize};

#[doc(inline)]
pub use confirm::{
    ConfirmationEngine, ConfirmationError, ConfirmationMethod, ConfirmationResult, IssuerError,
    validate_issuer,
};

#[doc(inline)]
pub use discovery::{
    DiscoveryConfig, DiscoveryEngine, DiscoveryError, DiscoveryMethod, DiscoveryOptions,
    DiscoveryResult, ServerMetadata,
};

#[doc(inline)]
pub use linkrel::{LinkRelation, find_first_by_relation, parse_html_links, parse_link_headers, resolve_url};

#[doc(inline)]
pub use profile::{ProfileUrlError, validate_profile_url};

#[doc(inline)]
pub use token::{
    IntrospectionClient, IntrospectionResponse, TokenError, TokenRefreshClient,
    TokenResponse, TokenRevocationClient, UserInfoClient, UserProfile,
};
