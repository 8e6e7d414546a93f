//! Persistent page cache backed by SQLite
//!
//! Analysis results are keyed by normalized URL and serialized as JSON.
//! Reads within the freshness window skip the fetch and analysis entirely;
//! stale rows stay in place until the cleanup sweep removes them.

mod schema;
mod sqlite;

pub use sqlite::{CacheEntry, SqliteCache};

use thiserror::Error;

/// Cache-specific errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;
