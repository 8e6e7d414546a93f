//! Sitelens: an SEO crawl-and-audit engine
//!
//! This crate crawls a target website with a politeness- and robots-aware
//! bounded-concurrency fetcher, analyzes each page with a deterministic
//! rule-based content analyzer, scores pages and the site as a whole, and
//! caches per-URL analysis snapshots for reuse across crawls.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod page;
pub mod robots;
pub mod score;
pub mod serp;
pub mod url;

use thiserror::Error;

/// Main error type for audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("No pages could be crawled from {url} ({failed} fetch failures)")]
    NoPagesCrawled { url: String, failed: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-page fetch failures, retried per the configured retry policy
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::SqliteCache;
pub use config::Config;
pub use crawler::Orchestrator;
pub use page::{AuditOutcome, CrawlStats, Issue, PageRecord, Severity};
pub use crate::url::{extract_domain, is_same_site, normalize_url};
