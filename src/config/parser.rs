//! Configuration file loading

use crate::config::types::Config;
use crate::config::validation::validate_config;
use crate::ConfigResult;
use std::path::Path;

/// Loads and validates a TOML configuration file
///
/// Every table and key is optional; missing values fall back to the
/// documented defaults, so an empty file is a valid configuration.
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from_str(contents: &str) -> ConfigResult<Config> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config.crawler.max_concurrent_requests, 5);
        assert_eq!(config.crawler.max_per_host_connections, 2);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.discovery.max_urls, 500);
        assert_eq!(config.cache.max_age_hours, 24);
        assert_eq!(config.cache.cleanup_days, 7);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = load_from_str(
            r#"
            [crawler]
            max-concurrent-requests = 10
            request-delay-ms = 0

            [cache]
            database-path = "/tmp/audit.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.max_concurrent_requests, 10);
        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.cache.database_path, "/tmp/audit.db");
        // Untouched tables keep defaults
        assert_eq!(config.retry.base_delay_ms, 500);
    }

    #[test]
    fn test_user_agent_header_format() {
        let config = load_from_str(
            r#"
            [user-agent]
            crawler-name = "AuditBot"
            crawler-version = "2.0"
            contact-url = "https://example.com/bot"
            contact-email = "bot@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.user_agent.header_value(),
            "AuditBot/2.0 (+https://example.com/bot; bot@example.com)"
        );
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(load_from_str("[crawler\nbad").is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = load_from_str("[crawler]\nmax-concurrent-requests = 0");
        assert!(result.is_err());
    }
}
