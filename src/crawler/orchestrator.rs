//! Crawl orchestration
//!
//! The orchestrator owns the frontier and the stats block. Workers run on a
//! [`JoinSet`] and only ever touch their own URL; every mutation of shared
//! state (results, counters, frontier growth) happens on the dispatch loop,
//! so no page-level locking is needed.

use crate::analyzer::{self, is_html_content_type};
use crate::cache::SqliteCache;
use crate::config::{validate_keyword, validate_seed_url, Config};
use crate::crawler::discovery::discover_site_urls;
use crate::crawler::fetcher::Fetcher;
use crate::page::{AuditOutcome, CrawlStats, PageRecord};
use crate::robots::RobotsGate;
use crate::serp::{self, SerpResult};
use crate::url::normalize_url;
use crate::{score, AuditError, Result};
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

/// Drives a full crawl-and-audit run
pub struct Orchestrator {
    config: Config,
    fetcher: Arc<Fetcher>,
    robots: Arc<RobotsGate>,
    cache: Arc<SqliteCache>,
    cancelled: Arc<AtomicBool>,
}

/// What one worker produced for one URL
enum WorkerOutcome {
    Analyzed {
        record: Box<PageRecord>,
        depth: u32,
    },
    Skipped {
        url: Url,
        reason: String,
    },
    Failed {
        url: Url,
        error: String,
    },
}

impl Orchestrator {
    /// Builds an orchestrator from configuration, opening the cache database
    /// and running its retention sweep
    pub fn new(config: Config) -> Result<Self> {
        let cache = SqliteCache::new(Path::new(&config.cache.database_path))?;
        let removed = cache.cleanup(config.cache.cleanup_days)?;
        if removed > 0 {
            info!(removed, "cache retention sweep");
        }
        Self::with_cache(config, cache)
    }

    /// Builds an orchestrator around an existing cache (used by tests)
    pub fn with_cache(config: Config, cache: SqliteCache) -> Result<Self> {
        let fetcher = Fetcher::new(&config.crawler, config.retry.clone(), &config.user_agent)?;
        let robots = RobotsGate::new(fetcher.client(), config.user_agent.header_value());
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            robots: Arc::new(robots),
            cache: Arc::new(cache),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle that aborts the crawl when set; safe to share across tasks
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Highest number of simultaneous fetches observed so far
    pub fn peak_concurrent_fetches(&self) -> usize {
        self.fetcher.peak_in_flight()
    }

    /// Crawls and audits a site
    ///
    /// # Arguments
    /// * `site_url` - Seed URL; must be http(s) with a host
    /// * `keyword` - Target keyword for the analyzer's placement rules
    /// * `max_pages` - Hard budget of analyzed pages
    /// * `whole_website` - Seed the frontier from sitemaps before crawling
    ///
    /// # Errors
    /// Fails up front on invalid input, and after the crawl when not a
    /// single page could be analyzed. Per-page failures are counted in
    /// `CrawlStats`, not raised.
    pub async fn analyze_website(
        &self,
        site_url: &str,
        keyword: &str,
        max_pages: usize,
        whole_website: bool,
    ) -> Result<AuditOutcome> {
        validate_keyword(keyword)?;
        let seed = normalize_url(site_url)?;
        validate_seed_url(&seed, self.config.crawler.allow_private_hosts)?;
        let budget = max_pages.max(1);

        // Robots policies memoize for one session only; a site may have
        // changed its robots.txt since the last crawl.
        self.robots.reset().await;

        info!(%seed, keyword, budget, whole_website, "starting audit");
        let mut stats = CrawlStats::start();

        // Frontier entries carry their link distance from a seed; sitemap
        // finds count as seeds (distance 0).
        let mut frontier: VecDeque<(Url, u32)> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();

        seen.insert(seed.to_string());
        frontier.push_back((seed.clone(), 0));

        if whole_website {
            for url in
                discover_site_urls(&self.fetcher, &self.robots, &seed, &self.config.discovery)
                    .await
            {
                if seen.insert(url.to_string()) {
                    frontier.push_back((url, 0));
                }
            }
        }

        let mut results: Vec<PageRecord> = Vec::new();
        let mut workers: JoinSet<WorkerOutcome> = JoinSet::new();
        let mut in_flight = 0usize;
        let keyword_owned = keyword.to_string();

        loop {
            // Dispatch until the budget is covered by results plus in-flight
            // work, so the crawl never overshoots max_pages.
            while results.len() + in_flight < budget && !self.cancelled.load(Ordering::SeqCst) {
                let (url, depth) = match frontier.pop_front() {
                    Some(entry) => entry,
                    None => break,
                };

                match self
                    .cache
                    .get(url.as_str(), self.config.cache.max_age_hours)
                {
                    Ok(Some(mut record)) => {
                        debug!(url = %url, "reusing cached analysis");
                        record.page_depth = results.len();
                        stats.total_pages += 1;
                        stats.cached_pages += 1;
                        stats.successful_pages += 1;
                        stats.total_issues += record.seo_issues.len() as u64;
                        self.grow_frontier(&record, depth, &mut frontier, &mut seen);
                        results.push(record);
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(url = %url, error = %e, "cache lookup failed"),
                }

                let fetcher = Arc::clone(&self.fetcher);
                let robots = Arc::clone(&self.robots);
                let cache = Arc::clone(&self.cache);
                let keyword = keyword_owned.clone();
                workers.spawn(async move {
                    crawl_one(url, depth, &fetcher, &robots, &cache, &keyword).await
                });
                in_flight += 1;
            }

            if in_flight == 0 {
                break;
            }

            // Draining: integrate one completed worker, then try to
            // dispatch again with the budget it freed or consumed.
            if let Some(joined) = workers.join_next().await {
                in_flight -= 1;
                let outcome = match joined {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(error = %e, "worker task failed");
                        stats.total_pages += 1;
                        stats.failed_pages += 1;
                        continue;
                    }
                };
                match outcome {
                    WorkerOutcome::Analyzed { mut record, depth } => {
                        record.page_depth = results.len();
                        stats.total_pages += 1;
                        stats.successful_pages += 1;
                        stats.total_issues += record.seo_issues.len() as u64;
                        self.grow_frontier(&record, depth, &mut frontier, &mut seen);
                        results.push(*record);
                        info!(
                            url = %results[results.len() - 1].url,
                            crawled = results.len(),
                            budget,
                            "page analyzed"
                        );
                    }
                    WorkerOutcome::Skipped { url, reason } => {
                        stats.total_pages += 1;
                        stats.skipped_pages += 1;
                        debug!(%url, reason, "page skipped");
                    }
                    WorkerOutcome::Failed { url, error } => {
                        stats.total_pages += 1;
                        stats.failed_pages += 1;
                        warn!(%url, error, "page failed");
                    }
                }
            }
        }

        stats.total_bytes_transferred = self.fetcher.bytes_transferred();
        stats.finish(&results);

        if results.is_empty() {
            return Err(AuditError::NoPagesCrawled {
                url: seed.to_string(),
                failed: stats.failed_pages,
            });
        }

        let site_score = score::site_score(&results);
        info!(
            pages = results.len(),
            cached = stats.cached_pages,
            failed = stats.failed_pages,
            skipped = stats.skipped_pages,
            site_score,
            "audit finished"
        );

        Ok(AuditOutcome {
            pages: results,
            stats,
            site_score,
        })
    }

    /// Takes a one-shot competitor snapshot for the keyword
    ///
    /// Best-effort: a blocked or failed snapshot comes back empty. Only an
    /// invalid keyword is an error.
    pub async fn serp_snapshot(&self, keyword: &str) -> Result<Vec<SerpResult>> {
        validate_keyword(keyword)?;
        Ok(serp::fetch_serp(keyword).await)
    }

    /// Feeds a page's internal links back into the frontier
    ///
    /// Growth stops at the configured link depth and at the discovery cap,
    /// so a heavily interlinked site cannot balloon the frontier past the
    /// configured bounds.
    fn grow_frontier(
        &self,
        record: &PageRecord,
        depth: u32,
        frontier: &mut VecDeque<(Url, u32)>,
        seen: &mut HashSet<String>,
    ) {
        if depth >= self.config.discovery.link_depth {
            return;
        }
        for link in &record.internal_links {
            if seen.len() >= self.config.discovery.max_urls {
                return;
            }
            if let Ok(url) = normalize_url(link) {
                if seen.insert(url.to_string()) {
                    frontier.push_back((url, depth + 1));
                }
            }
        }
    }
}

/// Fetches and analyzes one URL; runs on a worker task
async fn crawl_one(
    url: Url,
    depth: u32,
    fetcher: &Fetcher,
    robots: &RobotsGate,
    cache: &SqliteCache,
    keyword: &str,
) -> WorkerOutcome {
    if !robots.is_allowed(&url).await {
        return WorkerOutcome::Skipped {
            url,
            reason: "disallowed by robots.txt".to_string(),
        };
    }
    let crawl_delay = robots.crawl_delay(&url).await;

    let fetched = match fetcher.fetch(&url, crawl_delay).await {
        Ok(fetched) => fetched,
        Err(e) => {
            return WorkerOutcome::Failed {
                url,
                error: e.to_string(),
            }
        }
    };

    if !(200..300).contains(&fetched.status) {
        return WorkerOutcome::Failed {
            url,
            error: format!("HTTP status {}", fetched.status),
        };
    }
    if !is_html_content_type(fetched.content_type.as_deref()) {
        return WorkerOutcome::Skipped {
            url,
            reason: format!(
                "non-HTML content type: {}",
                fetched.content_type.as_deref().unwrap_or("")
            ),
        };
    }

    let record = match analyzer::analyze(
        &url,
        &fetched.body,
        keyword,
        fetched.status,
        fetched.elapsed,
        fetched.content_type.as_deref(),
    ) {
        Ok(record) => record,
        Err(e) => {
            return WorkerOutcome::Failed {
                url,
                error: e.to_string(),
            }
        }
    };

    let content_hash = hex::encode(Sha256::digest(fetched.body.as_bytes()));
    if let Err(e) = cache.put(&record, &content_hash) {
        // Cache write failures degrade reuse, never the audit itself
        warn!(url = %record.url, error = %e, "failed to cache page record");
    }

    WorkerOutcome::Analyzed {
        record: Box::new(record),
        depth,
    }
}
