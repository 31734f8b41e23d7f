//! # Profile URL Canonicalization
//!
//! Normalizes arbitrary user input into the canonical profile URL form used
//! everywhere else in the crate: discovery, cache keys, and authorization
//! server confirmation all compare canonicalized strings.
//!
//! The rules are deliberately narrow:
//!
//! - bare hosts (`example.com`) get an `https://` scheme prepended
//! - the scheme and host are lowercased; path case is preserved (path case
//!   sensitivity is server-defined)
//! - an empty path becomes `/`
//! - the fragment is stripped
//! - port and query string pass through untouched
//!
//! `canonicalize` is idempotent: feeding its output back in returns the same
//! string.

use url::Url;

/// Canonicalize a user-supplied profile URL.
///
/// Empty or whitespace-only input is returned unchanged; callers are expected
/// to guard with [`crate::profile::validate_profile_url`]. Input that cannot
/// be parsed as a URL is returned with only the scheme prepended, so the
/// downstream validator reports the malformation instead of this function
/// guessing.
pub fn canonicalize(input: &str) -> String {
    if input.trim().is_empty() {
        return input.to_owned();
    }

    let candidate = if input.contains("://") {
        input.to_owned()
    } else {
        format!("https://{input}")
    };

    let Ok(mut url) = Url::parse(&candidate) else {
        return candidate;
    };

    // Url::parse already lowercases the scheme and host and defaults an empty
    // path to "/". Only the fragment needs explicit removal.
    url.set_fragment(None);
    url.to_string()
}

/// Normalize a profile URL into a discovery-cache key.
///
/// Keys are the canonical form lowercased with at most one trailing slash
/// stripped, so `https://Example.com/` and `https://example.com` collide.
pub fn cache_key(profile_url: &str) -> String {
    let canonical = canonicalize(profile_url).to_ascii_lowercase();
    match canonical.strip_suffix('/') {
        Some(stripped) => stripped.to_owned(),
        None => canonical,
    }
}
