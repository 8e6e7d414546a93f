//! URL normalization and domain helpers
//!
//! Normalization is deliberately narrow: duplicate frontier entries must
//! collapse, but the fetched URL must stay exactly what the site serves
//! (an SEO audit of `www.example.com` should not silently audit
//! `example.com` instead).

use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL for frontier deduplication
///
/// Steps:
/// 1. Parse; reject malformed input.
/// 2. Require an http(s) scheme and a host (the `url` crate already
///    lowercases scheme and host on parse).
/// 3. Strip the fragment.
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Extracts the comparison domain from a URL: lowercased host with any
/// leading `www.` stripped. Returns None for host-less URLs.
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Whether two hosts belong to the same site
///
/// Hosts are compared lowercased with `www.` stripped. An empty candidate
/// host means the link was relative and is always internal.
pub fn is_same_site(base_host: &str, candidate_host: &str) -> bool {
    if candidate_host.is_empty() {
        return true;
    }
    strip_www(base_host) == strip_www(candidate_host)
}

fn strip_www(host: &str) -> String {
    let host = host.to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}
