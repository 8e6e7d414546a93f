//! SQLite schema for the page cache

use rusqlite::Connection;

/// One row per analyzed URL; the full analysis snapshot lives in `record`
/// as JSON so schema migrations are not needed when the record grows.
const CREATE_PAGE_CACHE: &str = "
CREATE TABLE IF NOT EXISTS page_cache (
    url           TEXT PRIMARY KEY,
    domain        TEXT NOT NULL,
    content_hash  TEXT NOT NULL,
    record        TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    last_accessed TEXT NOT NULL,
    reuse_count   INTEGER NOT NULL DEFAULT 0
)";

const CREATE_DOMAIN_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_page_cache_domain ON page_cache(domain)";

const CREATE_CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_page_cache_created ON page_cache(created_at)";

/// Creates tables and indexes if they do not already exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(CREATE_PAGE_CACHE, [])?;
    conn.execute(CREATE_DOMAIN_INDEX, [])?;
    conn.execute(CREATE_CREATED_INDEX, [])?;
    Ok(())
}
