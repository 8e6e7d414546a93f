//! Configuration and input validation
//!
//! Config validation catches nonsensical values at load time. Seed URL and
//! keyword validation guard the `analyze_website` entry point: these are the
//! only errors that fail the whole operation before any crawling starts.

use crate::config::types::Config;
use crate::{AuditError, ConfigError, ConfigResult};
use url::Url;

/// Host substrings rejected unless `allow_private_hosts` is set
const PRIVATE_HOST_PATTERNS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "192.168.", "10."];

/// Validates loaded configuration values
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if config.crawler.max_concurrent_requests == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-concurrent-requests must be at least 1".to_string(),
        ));
    }
    if config.crawler.max_per_host_connections == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-per-host-connections must be at least 1".to_string(),
        ));
    }
    if config.crawler.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawler.request-timeout-secs must be at least 1".to_string(),
        ));
    }
    if config.discovery.max_urls == 0 {
        return Err(ConfigError::Validation(
            "discovery.max-urls must be at least 1".to_string(),
        ));
    }
    if config.cache.max_age_hours <= 0 {
        return Err(ConfigError::Validation(
            "cache.max-age-hours must be positive".to_string(),
        ));
    }
    if config.cache.cleanup_days <= 0 {
        return Err(ConfigError::Validation(
            "cache.cleanup-days must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Validates the seed URL for an audit
///
/// Requires an http(s) URL with a host. Loopback and private-range hosts are
/// rejected unless the config opts in (local audits and the test suite need
/// them).
pub fn validate_seed_url(url: &Url, allow_private_hosts: bool) -> Result<(), AuditError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AuditError::Validation(format!(
            "seed URL must be http or https, got {}",
            url.scheme()
        )));
    }

    let host = match url.host_str() {
        Some(h) => h.to_lowercase(),
        None => {
            return Err(AuditError::Validation(
                "seed URL has no host".to_string(),
            ))
        }
    };

    if !allow_private_hosts {
        for pattern in PRIVATE_HOST_PATTERNS {
            if host.contains(pattern) {
                return Err(AuditError::Validation(format!(
                    "seed URL host {} looks private; set crawler.allow-private-hosts to audit it",
                    host
                )));
            }
        }
    }

    Ok(())
}

/// Validates the target keyword: 2-100 characters of letters, digits,
/// spaces, hyphens, and underscores.
pub fn validate_keyword(keyword: &str) -> Result<(), AuditError> {
    let keyword = keyword.trim();

    if keyword.len() < 2 || keyword.len() > 100 {
        return Err(AuditError::Validation(
            "target keyword must be 2-100 characters".to_string(),
        ));
    }

    if !keyword
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(AuditError::Validation(
            "target keyword may only contain letters, digits, spaces, hyphens, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}
