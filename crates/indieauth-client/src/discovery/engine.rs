//! # Discovery Engine
//!
//! Locates a profile URL's authorization, token, and metadata endpoints.
//!
//! ## Precedence
//!
//! Tiers are consulted highest first and the first satisfied tier wins, even
//! when a later tier would yield different URLs:
//!
//! 1. `indieauth-metadata` relation in HTTP `Link` headers
//! 2. `indieauth-metadata` relation in HTML `<link>` markup
//! 3. legacy `authorization_endpoint` + `token_endpoint` pair in `Link`
//!    headers (both required)
//! 4. the same pair in HTML markup
//!
//! A metadata document named by tier 1 or 2 is authoritative: if fetching or
//! parsing it fails, discovery fails without falling back to the legacy
//! tiers.
//!
//! ## Transport
//!
//! Redirects are followed manually (the client is built with
//! `Policy::none()`) so every visited URL can be recorded for the
//! authorization server confirmation step, and so relative link targets
//! resolve against the *final* URL rather than the one the user typed. An
//! optional `HEAD` pre-flight can find endpoints from headers alone; a `HEAD`
//! that yields nothing usable is inconclusive and discovery re-fetches with
//! `GET`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use http::header::{LINK, LOCATION};
use http::{Method, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::cache::{DEFAULT_CACHE_TTL, DiscoveryCache};
use crate::canonical::canonicalize;
use crate::linkrel::{find_first_by_relation, parse_html_links, resolve_url};

use super::types::{DiscoveryError, DiscoveryMethod, DiscoveryResult, ServerMetadata};

/// Link relation advertising the server metadata document.
const REL_INDIEAUTH_METADATA: &str = "indieauth-metadata";
/// Legacy link relation for the authorization endpoint.
const REL_AUTHORIZATION_ENDPOINT: &str = "authorization_endpoint";
/// Legacy link relation for the token endpoint.
const REL_TOKEN_ENDPOINT: &str = "token_endpoint";

/// Per-call discovery options.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Try a `HEAD` request first and attempt discovery from its `Link`
    /// headers before falling back to `GET`
    pub use_head_optimization: bool,

    /// Skip the cache lookup for this call (a successful result is still
    /// written back)
    pub bypass_cache: bool,

    /// TTL for the cached result; [`DEFAULT_CACHE_TTL`] when absent
    pub cache_expiration: Option<Duration>,
}

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Per-request timeout (default: 10 seconds)
    pub request_timeout: Duration,

    /// User agent for outgoing requests
    pub user_agent: String,

    /// Redirect hop limit per fetch (default: 10)
    pub max_redirects: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            user_agent: format!("indieauth-client/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// One fetched response plus the transport facts discovery needs.
struct Fetched {
    status: StatusCode,
    /// Raw `Link` header values, in response order
    link_values: Vec<String>,
    /// The final URL after redirects; the effective base for relative links
    final_url: Url,
    /// Every URL visited, the initial request and each redirect target
    visited: Vec<String>,
    /// Response body; only read for successful `GET`s
    body: Option<String>,
}

/// IndieAuth endpoint discovery engine.
///
/// Stateless between calls apart from the optional cache, which is an
/// explicitly constructed instance passed in by the caller — the engine holds
/// no ambient global state. Cloning is cheap: the HTTP client and cache are
/// shared handles.
#[derive(Debug, Clone)]
pub struct DiscoveryEngine {
    client: reqwest::Client,
    config: DiscoveryConfig,
    cache: Option<Arc<DiscoveryCache>>,
}

impl DiscoveryEngine {
    /// Create an engine with default configuration and no cache.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DiscoveryError> {
        Self::with_config(DiscoveryConfig::default())
    }

    /// Create an engine with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Client`] if the HTTP client cannot be built.
    pub fn with_config(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DiscoveryError::Client {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            config,
            cache: None,
        })
    }

    /// Create an engine around a caller-supplied HTTP client.
    ///
    /// The client must not follow redirects on its own; the engine follows
    /// them manually to record the visited chain.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            config: DiscoveryConfig::default(),
            cache: None,
        }
    }

    /// Attach a discovery cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DiscoveryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Discover the endpoints for a profile URL.
    ///
    /// Failures are returned as a failed [`DiscoveryResult`], never as a
    /// panic or a propagated transport error. Only successful results are
    /// cached.
    pub async fn discover(&self, profile_url: &str, options: &DiscoveryOptions) -> DiscoveryResult {
        if profile_url.trim().is_empty() {
            return DiscoveryResult::failure(DiscoveryError::MissingProfileUrl);
        }
        let canonical = canonicalize(profile_url);

        if let Some(cache) = &self.cache
            && !options.bypass_cache
            && let Some(hit) = cache.get(&canonical)
        {
            debug!(profile_url = %canonical, "discovery cache hit");
            return hit;
        }

        let result = self.discover_over_network(&canonical, options).await;

        if result.success && let Some(cache) = &self.cache {
            let ttl = options.cache_expiration.unwrap_or(DEFAULT_CACHE_TTL);
            cache.set(&canonical, result.clone(), ttl);
        }
        result
    }

    async fn discover_over_network(
        &self,
        profile_url: &str,
        options: &DiscoveryOptions,
    ) -> DiscoveryResult {
        if options.use_head_optimization {
            match self.fetch(Method::HEAD, profile_url).await {
                Ok(fetched) if fetched.status.is_success() => {
                    if let Some(metadata_url) = find_first_by_relation(
                        fetched.link_values.iter().map(String::as_str),
                        REL_INDIEAUTH_METADATA,
                    ) {
                        let resolved = resolve_url(&metadata_url, Some(&fetched.final_url));
                        return self
                            .fetch_metadata(
                                &resolved,
                                DiscoveryMethod::MetadataLinkHeader,
                                &fetched.visited,
                                profile_url,
                            )
                            .await;
                    }
                    let auth = find_first_by_relation(
                        fetched.link_values.iter().map(String::as_str),
                        REL_AUTHORIZATION_ENDPOINT,
                    );
                    let token = find_first_by_relation(
                        fetched.link_values.iter().map(String::as_str),
                        REL_TOKEN_ENDPOINT,
                    );
                    if let (Some(auth), Some(token)) = (auth, token) {
                        return legacy_result(
                            DiscoveryMethod::LegacyLinkHeader,
                            &auth,
                            &token,
                            &fetched,
                            profile_url,
                        );
                    }
                    // A HEAD with no usable Link headers is inconclusive,
                    // not a failure
                    debug!(profile_url, "HEAD yielded no usable Link headers, retrying with GET");
                }
                Ok(fetched) => {
                    debug!(
                        profile_url,
                        status = fetched.status.as_u16(),
                        "HEAD returned non-success, retrying with GET"
                    );
                }
                Err(error) => {
                    debug!(profile_url, %error, "HEAD request failed, retrying with GET");
                }
            }
        }

        let fetched = match self.fetch(Method::GET, profile_url).await {
            Ok(fetched) => fetched,
            Err(error) => {
                warn!(profile_url, %error, "profile fetch failed");
                return DiscoveryResult::failure(error);
            }
        };
        if !fetched.status.is_success() {
            return DiscoveryResult::failure(DiscoveryError::ProfileStatus {
                status: fetched.status.as_u16(),
            });
        }

        let html_links = fetched
            .body
            .as_deref()
            .map(parse_html_links)
            .unwrap_or_default();

        if let Some(metadata_url) = find_first_by_relation(
            fetched.link_values.iter().map(String::as_str),
            REL_INDIEAUTH_METADATA,
        ) {
            let resolved = resolve_url(&metadata_url, Some(&fetched.final_url));
            return self
                .fetch_metadata(
                    &resolved,
                    DiscoveryMethod::MetadataLinkHeader,
                    &fetched.visited,
                    profile_url,
                )
                .await;
        }

        if let Some(link) = html_links
            .iter()
            .find(|link| link.relation.eq_ignore_ascii_case(REL_INDIEAUTH_METADATA))
        {
            let resolved = resolve_url(&link.url, Some(&fetched.final_url));
            return self
                .fetch_metadata(
                    &resolved,
                    DiscoveryMethod::MetadataHtmlLink,
                    &fetched.visited,
                    profile_url,
                )
                .await;
        }

        let header_auth = find_first_by_relation(
            fetched.link_values.iter().map(String::as_str),
            REL_AUTHORIZATION_ENDPOINT,
        );
        let header_token = find_first_by_relation(
            fetched.link_values.iter().map(String::as_str),
            REL_TOKEN_ENDPOINT,
        );
        if let (Some(auth), Some(token)) = (header_auth, header_token) {
            return legacy_result(
                DiscoveryMethod::LegacyLinkHeader,
                &auth,
                &token,
                &fetched,
                profile_url,
            );
        }

        let html_auth = html_links
            .iter()
            .find(|link| link.relation.eq_ignore_ascii_case(REL_AUTHORIZATION_ENDPOINT))
            .map(|link| link.url.clone());
        let html_token = html_links
            .iter()
            .find(|link| link.relation.eq_ignore_ascii_case(REL_TOKEN_ENDPOINT))
            .map(|link| link.url.clone());
        if let (Some(auth), Some(token)) = (html_auth, html_token) {
            return legacy_result(
                DiscoveryMethod::LegacyHtmlLink,
                &auth,
                &token,
                &fetched,
                profile_url,
            );
        }

        DiscoveryResult::failure(DiscoveryError::NoEndpointsFound)
    }

    /// Fetch and parse a server metadata document. Failures here are
    /// terminal for the discovery attempt; the legacy tiers are not
    /// consulted once a metadata link has been advertised.
    async fn fetch_metadata(
        &self,
        metadata_url: &str,
        method: DiscoveryMethod,
        visited: &[String],
        profile_url: &str,
    ) -> DiscoveryResult {
        debug!(metadata_url, "fetching server metadata");
        let fetched = match self.fetch(Method::GET, metadata_url).await {
            Ok(fetched) => fetched,
            Err(error) => {
                warn!(metadata_url, %error, "metadata fetch failed");
                return DiscoveryResult::failure(error);
            }
        };
        if !fetched.status.is_success() {
            return DiscoveryResult::failure(DiscoveryError::MetadataStatus {
                status: fetched.status.as_u16(),
            });
        }

        let body = fetched.body.unwrap_or_default();
        let metadata: ServerMetadata = match serde_json::from_str(&body) {
            Ok(metadata) => metadata,
            Err(error) => {
                return DiscoveryResult::failure(DiscoveryError::InvalidMetadataJson {
                    message: error.to_string(),
                });
            }
        };

        let auth = metadata
            .authorization_endpoint
            .as_deref()
            .filter(|s| !s.is_empty());
        let token = metadata.token_endpoint.as_deref().filter(|s| !s.is_empty());
        let (Some(auth), Some(token)) = (auth, token) else {
            return DiscoveryResult::failure(DiscoveryError::MetadataMissingEndpoints);
        };

        DiscoveryResult {
            success: true,
            authorization_endpoint: Some(auth.to_owned()),
            token_endpoint: Some(token.to_owned()),
            error: None,
            issuer: metadata.issuer.clone(),
            userinfo_endpoint: metadata.userinfo_endpoint.clone(),
            revocation_endpoint: metadata.revocation_endpoint.clone(),
            introspection_endpoint: metadata.introspection_endpoint.clone(),
            scopes_supported: metadata.scopes_supported.clone(),
            code_challenge_methods_supported: metadata.code_challenge_methods_supported.clone(),
            method,
            discovered_at: Some(Utc::now()),
            discovered_urls: visited.to_vec(),
            original_url: Some(profile_url.to_owned()),
        }
    }

    /// Issue one request, following redirects manually and recording every
    /// visited URL. The body is only read for successful `GET`s.
    async fn fetch(&self, method: Method, url: &str) -> Result<Fetched, DiscoveryError> {
        let mut current = Url::parse(url).map_err(|e| DiscoveryError::InvalidUrl {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        let mut visited = vec![current.to_string()];
        let mut hops = 0;

        loop {
            let response = self
                .client
                .request(method.clone(), current.clone())
                .send()
                .await
                .map_err(|e| DiscoveryError::Network {
                    url: current.to_string(),
                    message: e.to_string(),
                })?;
            let status = response.status();

            if status.is_redirection()
                && let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
            {
                if hops >= self.config.max_redirects {
                    return Err(DiscoveryError::TooManyRedirects {
                        url: url.to_owned(),
                    });
                }
                hops += 1;
                let next = current.join(location).map_err(|e| DiscoveryError::InvalidUrl {
                    url: location.to_owned(),
                    message: e.to_string(),
                })?;
                debug!(from = %current, to = %next, "following redirect");
                visited.push(next.to_string());
                current = next;
                continue;
            }

            let link_values = response
                .headers()
                .get_all(LINK)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(str::to_owned)
                .collect();
            let final_url = response.url().clone();
            let body = if method == Method::GET && status.is_success() {
                Some(
                    response
                        .text()
                        .await
                        .map_err(|e| DiscoveryError::Network {
                            url: current.to_string(),
                            message: e.to_string(),
                        })?,
                )
            } else {
                None
            };

            return Ok(Fetched {
                status,
                link_values,
                final_url,
                visited,
                body,
            });
        }
    }
}

fn legacy_result(
    method: DiscoveryMethod,
    auth: &str,
    token: &str,
    fetched: &Fetched,
    profile_url: &str,
) -> DiscoveryResult {
    DiscoveryResult {
        success: true,
        authorization_endpoint: Some(resolve_url(auth, Some(&fetched.final_url))),
        token_endpoint: Some(resolve_url(token, Some(&fetched.final_url))),
        method,
        discovered_at: Some(Utc::now()),
        discovered_urls: fetched.visited.clone(),
        original_url: Some(profile_url.to_owned()),
        ..DiscoveryResult::default()
    }
}
