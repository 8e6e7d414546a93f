use serde::Deserialize;

/// Main configuration structure for Sitelens
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent in-flight requests
    #[serde(rename = "max-concurrent-requests", default = "default_concurrency")]
    pub max_concurrent_requests: usize,

    /// Maximum simultaneous connections to a single host
    #[serde(rename = "max-per-host-connections", default = "default_per_host")]
    pub max_per_host_connections: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Politeness delay applied after each fetch (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_delay")]
    pub request_delay_ms: u64,

    /// Allow crawling loopback/private hosts (needed for local audits and tests)
    #[serde(rename = "allow-private-hosts", default)]
    pub allow_private_hosts: bool,
}

/// Retry policy consumed by the fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt, on timeout or transport error
    #[serde(rename = "max-retries", default = "default_retries")]
    pub max_retries: u32,

    /// Backoff base; attempt n sleeps base * 2^n (milliseconds)
    #[serde(rename = "base-delay-ms", default = "default_backoff")]
    pub base_delay_ms: u64,
}

/// URL discovery configuration (whole-site mode)
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Depth bound for link-following fallback
    #[serde(rename = "link-depth", default = "default_link_depth")]
    pub link_depth: u32,

    /// Hard cap on total discovered URLs
    #[serde(rename = "max-urls", default = "default_max_urls")]
    pub max_urls: usize,
}

/// Page cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path to the SQLite cache database file
    #[serde(rename = "database-path", default = "default_db_path")]
    pub database_path: String,

    /// Cached records older than this are treated as misses
    #[serde(rename = "max-age-hours", default = "default_max_age")]
    pub max_age_hours: i64,

    /// Retention window for the periodic cleanup sweep
    #[serde(rename = "cleanup-days", default = "default_cleanup_days")]
    pub cleanup_days: i64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name", default = "default_ua_name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version", default = "default_ua_version")]
    pub crawler_version: String,

    #[serde(rename = "contact-url", default = "default_ua_url")]
    pub contact_url: String,

    #[serde(rename = "contact-email", default = "default_ua_email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_concurrency(),
            max_per_host_connections: default_per_host(),
            request_timeout_secs: default_timeout(),
            request_delay_ms: default_delay(),
            allow_private_hosts: false,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_retries(),
            base_delay_ms: default_backoff(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            link_depth: default_link_depth(),
            max_urls: default_max_urls(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            max_age_hours: default_max_age(),
            cleanup_days: default_cleanup_days(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_ua_name(),
            crawler_version: default_ua_version(),
            contact_url: default_ua_url(),
            contact_email: default_ua_email(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}
fn default_per_host() -> usize {
    2
}
fn default_timeout() -> u64 {
    30
}
fn default_delay() -> u64 {
    500
}
fn default_retries() -> u32 {
    2
}
fn default_backoff() -> u64 {
    500
}
fn default_link_depth() -> u32 {
    3
}
fn default_max_urls() -> usize {
    500
}
fn default_db_path() -> String {
    "./sitelens_cache.db".to_string()
}
fn default_max_age() -> i64 {
    24
}
fn default_cleanup_days() -> i64 {
    7
}
fn default_ua_name() -> String {
    "Sitelens".to_string()
}
fn default_ua_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
fn default_ua_url() -> String {
    "https://github.com/sitelens/sitelens".to_string()
}
fn default_ua_email() -> String {
    "crawler@sitelens.dev".to_string()
}
