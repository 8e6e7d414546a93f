//! SQLite cache implementation

use crate::cache::schema::initialize_schema;
use crate::cache::CacheResult;
use crate::page::PageRecord;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Metadata for one cached URL, without the deserialized record
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub url: String,
    pub domain: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub reuse_count: i64,
}

/// Page cache backed by a SQLite database file
///
/// The connection is guarded by a mutex; cache traffic is a small fraction
/// of crawl time so contention is not a concern.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens (or creates) the cache database at the given path
    pub fn new(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory cache, used by tests
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Looks up a fresh cached record for `url`
    ///
    /// Rows older than `max_age_hours` are treated as misses but left in
    /// place for the cleanup sweep. A fresh hit bumps `last_accessed` and
    /// `reuse_count`.
    pub fn get(&self, url: &str, max_age_hours: i64) -> CacheResult<Option<PageRecord>> {
        let conn = self.lock_conn();

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT record, created_at FROM page_cache WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (record_json, created_at) = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let created_at = match DateTime::parse_from_rfc3339(&created_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            // Unparseable timestamp: treat the row as stale
            Err(_) => return Ok(None),
        };

        if Utc::now() - created_at > Duration::hours(max_age_hours) {
            debug!(url, "cache entry stale");
            return Ok(None);
        }

        conn.execute(
            "UPDATE page_cache
             SET last_accessed = ?1, reuse_count = reuse_count + 1
             WHERE url = ?2",
            params![Utc::now().to_rfc3339(), url],
        )?;

        let record: PageRecord = serde_json::from_str(&record_json)?;
        debug!(url, "cache hit");
        Ok(Some(record))
    }

    /// Stores (or replaces) the analysis snapshot for a URL
    ///
    /// Replacing resets `reuse_count`: the counter tracks reuse of the
    /// current snapshot, not the URL's lifetime.
    pub fn put(&self, record: &PageRecord, content_hash: &str) -> CacheResult<()> {
        let domain = url::Url::parse(&record.url)
            .ok()
            .and_then(|u| crate::url::extract_domain(&u))
            .unwrap_or_default();
        let record_json = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.lock_conn();
        conn.execute(
            "INSERT OR REPLACE INTO page_cache
             (url, domain, content_hash, record, created_at, last_accessed, reuse_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            params![record.url, domain, content_hash, record_json, now, now],
        )?;
        Ok(())
    }

    /// All URLs cached for a domain, regardless of freshness
    pub fn urls_for_domain(&self, domain: &str) -> CacheResult<HashSet<String>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare("SELECT url FROM page_cache WHERE domain = ?1")?;
        let urls = stmt
            .query_map(params![domain], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(urls)
    }

    /// Metadata for one cached URL, if present
    pub fn entry(&self, url: &str) -> CacheResult<Option<CacheEntry>> {
        let conn = self.lock_conn();
        let entry = conn
            .query_row(
                "SELECT url, domain, content_hash, created_at, last_accessed, reuse_count
                 FROM page_cache WHERE url = ?1",
                params![url],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        Ok(entry.and_then(
            |(url, domain, content_hash, created_at, last_accessed, reuse_count)| {
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .ok()?
                    .with_timezone(&Utc);
                let last_accessed = DateTime::parse_from_rfc3339(&last_accessed)
                    .ok()?
                    .with_timezone(&Utc);
                Some(CacheEntry {
                    url,
                    domain,
                    content_hash,
                    created_at,
                    last_accessed,
                    reuse_count,
                })
            },
        ))
    }

    /// Deletes rows not accessed within the retention window
    ///
    /// Returns the number of rows removed.
    pub fn cleanup(&self, retention_days: i64) -> CacheResult<usize> {
        let cutoff = (Utc::now() - Duration::days(retention_days)).to_rfc3339();
        let conn = self.lock_conn();
        let removed = conn.execute(
            "DELETE FROM page_cache WHERE last_accessed < ?1",
            params![cutoff],
        )?;
        if removed > 0 {
            debug!(removed, "cache cleanup removed stale entries");
        }
        Ok(removed)
    }

    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
