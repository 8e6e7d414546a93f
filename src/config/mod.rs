//! Configuration loading and validation
//!
//! Configuration is a TOML file with all keys optional; see `types` for the
//! defaults. Input validation for the audit entry point also lives here.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    CacheConfig, Config, CrawlerConfig, DiscoveryConfig, RetryConfig, UserAgentConfig,
};
pub use validation::{validate_config, validate_keyword, validate_seed_url};
