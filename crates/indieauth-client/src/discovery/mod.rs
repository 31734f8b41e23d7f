//! # Endpoint Discovery
//!
//! Given a canonicalized profile URL, locate the authorization server that
//! speaks for it: the authorization and token endpoints, and optionally the
//! server metadata document naming issuer, introspection, revocation, and
//! userinfo endpoints.
//!
//! Discovery consults sources in a strict precedence order (HTTP `Link`
//! headers before HTML markup, metadata documents before legacy endpoint
//! pairs) and short-circuits on the first satisfied tier; see
//! [`engine`] for the exact tiers. Results are immutable records that
//! serialize cleanly, so callers can persist them across a browser redirect
//! round-trip and hand them back for authorization server confirmation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use indieauth_client::{DiscoveryCache, DiscoveryEngine, DiscoveryOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(DiscoveryCache::new());
//! let engine = DiscoveryEngine::new()?.with_cache(cache);
//!
//! let result = engine
//!     .discover("https://example.com/", &DiscoveryOptions::default())
//!     .await;
//!
//! if result.success {
//!     println!("authorize at {:?}", result.authorization_endpoint);
//! } else {
//!     println!("discovery failed: {:?}", result.error_message());
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod types;

pub use engine::{DiscoveryConfig, DiscoveryEngine, DiscoveryOptions};
pub use types::{DiscoveryError, DiscoveryMethod, DiscoveryResult, ServerMetadata};
