//! # Link Relation Parsing
//!
//! Extracts `(url, relation)` pairs from the two places a server may
//! advertise its endpoints: RFC 8288 `Link` response headers and HTML
//! `<link rel="...">` elements. Both parsers are tolerant — a malformed entry
//! is skipped and the rest of the input still yields results — because
//! discovery runs against arbitrary pages on the open web.
//!
//! Relation matching is case-insensitive and first-wins in document order;
//! the protocol requires the first advertised endpoint to take precedence, so
//! ordering here is a correctness property, not a convenience.

use std::collections::HashMap;

use url::Url;

/// A single link relation: a target URL associated with a `rel` value.
///
/// Ephemeral; produced per discovery attempt and discarded once endpoints are
/// extracted. A header entry or HTML element whose `rel` holds several
/// whitespace-separated tokens yields one `LinkRelation` per token, keeping
/// first-wins matching well-defined over tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRelation {
    /// The link target, possibly relative until resolved
    pub url: String,
    /// A single `rel` token
    pub relation: String,
}

/// Parse RFC 8288 `Link` header values into link relations.
///
/// Each header value may hold multiple comma-separated entries of the form
/// `<url>; rel="value"; other=...`. Entries without a `rel` parameter are
/// silently skipped, as are entries that do not parse at all.
pub fn parse_link_headers<'a, I>(values: I) -> impl Iterator<Item = LinkRelation> + 'a
where
    I: IntoIterator<Item = &'a str> + 'a,
{
    values
        .into_iter()
        .flat_map(|value| split_entries(value).into_iter())
        .flat_map(|entry| parse_entry(entry).into_iter())
}

/// Find the first link (document order) whose relation matches `relation`,
/// case-insensitively, and return its target URL.
pub fn find_first_by_relation<'a, I>(values: I, relation: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str> + 'a,
{
    parse_link_headers(values)
        .find(|link| link.relation.eq_ignore_ascii_case(relation))
        .map(|link| link.url)
}

/// Resolve a possibly-relative URL against a base.
///
/// A URL that already parses as absolute `http`/`https` is returned as-is.
/// Anything else resolves against `base` when one is present, and is
/// otherwise returned unchanged. Root-relative paths like `/x` are always
/// relative-parse errors, never platform file URIs, so they take the join
/// path on every host OS.
pub fn resolve_url(url: &str, base: Option<&Url>) -> String {
    if let Ok(parsed) = Url::parse(url)
        && matches!(parsed.scheme(), "http" | "https")
    {
        return url.to_owned();
    }
    match base.and_then(|base| base.join(url).ok()) {
        Some(resolved) => resolved.to_string(),
        None => url.to_owned(),
    }
}

/// Split one header value into entries on commas, ignoring commas inside
/// `<...>` targets and quoted parameter values.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut in_target = false;
    let mut in_quotes = false;
    for (i, c) in value.char_indices() {
        match c {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries
}

/// Parse one `<url>; rel="value"` entry. Returns one relation per `rel`
/// token, or an empty vec for entries without a usable `rel`.
fn parse_entry(entry: &str) -> Vec<LinkRelation> {
    let Some(rest) = entry.trim().strip_prefix('<') else {
        return Vec::new();
    };
    let Some((target, params)) = rest.split_once('>') else {
        return Vec::new();
    };

    for param in params.split(';') {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("rel") {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        return value
            .split_whitespace()
            .map(|token| LinkRelation {
                url: target.to_owned(),
                relation: token.to_owned(),
            })
            .collect();
    }
    Vec::new()
}

/// Extract link relations from `<link>` elements in an HTML document.
///
/// This is a tolerant scanner, not an HTML parser: it walks `<link` tags,
/// reads their attributes (quoted or unquoted, any case), and keeps elements
/// carrying both `rel` and `href`. Document order is preserved.
pub fn parse_html_links(html: &str) -> Vec<LinkRelation> {
    let mut links = Vec::new();
    let mut rest = html;

    while let Some(pos) = find_ascii_case_insensitive(rest, "<link") {
        let after_tag = &rest[pos + "<link".len()..];
        // Reject tags that merely start with "link" (e.g. <linkgroup>)
        if !after_tag
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == '>' || c == '/')
        {
            rest = after_tag;
            continue;
        }

        let body_end = tag_end(after_tag);
        let attributes = parse_attributes(&after_tag[..body_end]);
        if let (Some(rel), Some(href)) = (attributes.get("rel"), attributes.get("href")) {
            for token in rel.split_whitespace() {
                links.push(LinkRelation {
                    url: href.clone(),
                    relation: token.to_owned(),
                });
            }
        }

        rest = &after_tag[body_end..];
    }
    links
}

/// Find the closing `>` of a tag body, skipping `>` inside quoted attribute
/// values. Returns the body length when the tag never closes.
fn tag_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return i,
                _ => {}
            },
        }
    }
    s.len()
}

/// Parse `name=value` attributes out of a tag body. Names are lowercased;
/// the first occurrence of a name wins. Values may be single-quoted,
/// double-quoted, or bare.
///
/// The scan only branches on ASCII structural bytes (whitespace, `=`,
/// quotes), so every slice boundary is a char boundary even in multibyte
/// attribute values.
fn parse_attributes(body: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let bytes = body.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() || bytes[i] == b'/' {
            i += 1;
            continue;
        }

        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name = body[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        // A name without '=' is a bare attribute
        if i >= bytes.len() || bytes[i] != b'=' {
            attributes.entry(name).or_default();
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
            let quote = bytes[i];
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            let value = body[value_start..i].to_owned();
            if i < bytes.len() {
                i += 1;
            }
            value
        } else {
            let value_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            body[value_start..i].to_owned()
        };

        attributes.entry(name).or_insert(value);
    }
    attributes
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    let haystack_bytes = haystack.as_bytes();
    let needle_bytes = needle.as_bytes();
    (0..=haystack_bytes.len() - needle_bytes.len()).find(|&i| {
        haystack_bytes[i..i + needle_bytes.len()].eq_ignore_ascii_case(needle_bytes)
    })
}
