//! Whole-site URL discovery via sitemaps
//!
//! Discovery is fail-soft: a site without sitemaps simply yields no
//! candidates, and the orchestrator falls back to link-following from pages
//! it has already analyzed. Sitemap indexes resolve recursively to leaf URLs
//! only; no sitemap URL ever reaches the analyzed set.

use crate::config::DiscoveryConfig;
use crate::crawler::Fetcher;
use crate::robots::RobotsGate;
use crate::url::{extract_domain, is_same_site, normalize_url};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

/// Well-known sitemap locations probed when robots.txt declares none
const SITEMAP_PROBE_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemaps.xml",
    "/sitemap.txt",
];

/// Upper bound on sitemap files resolved per discovery run
const MAX_SITEMAP_FILES: usize = 50;

/// The `<loc>` entries of one sitemap file, split by parent element
#[derive(Debug, Default, PartialEq)]
pub struct SitemapEntries {
    /// `<sitemap><loc>` children of a sitemap index
    pub child_sitemaps: Vec<String>,
    /// `<url><loc>` leaf page URLs
    pub page_urls: Vec<String>,
}

/// Discovers same-site page URLs for `seed` from its sitemaps
///
/// Sitemap sources are tried in order: robots.txt `Sitemap:` directives,
/// then the well-known probe paths. Indexes are resolved recursively. The
/// result is normalized, deduplicated, same-site filtered, and capped at
/// `discovery.max_urls`.
pub async fn discover_site_urls(
    fetcher: &Fetcher,
    robots: &RobotsGate,
    seed: &Url,
    discovery: &DiscoveryConfig,
) -> Vec<Url> {
    let mut queue: Vec<String> = robots.sitemaps(seed).await;
    if queue.is_empty() {
        let origin = seed.origin().ascii_serialization();
        queue = SITEMAP_PROBE_PATHS
            .iter()
            .map(|path| format!("{origin}{path}"))
            .collect();
    }

    let seed_host = extract_domain(seed).unwrap_or_default();
    let mut seen_sitemaps: HashSet<String> = HashSet::new();
    let mut seen_pages: HashSet<String> = HashSet::new();
    let mut pages: Vec<Url> = Vec::new();

    while let Some(sitemap_url) = queue.pop() {
        if pages.len() >= discovery.max_urls || seen_sitemaps.len() >= MAX_SITEMAP_FILES {
            break;
        }
        if !seen_sitemaps.insert(sitemap_url.clone()) {
            continue;
        }

        let parsed = match Url::parse(&sitemap_url) {
            Ok(u) => u,
            Err(_) => continue,
        };
        let body = match fetcher.fetch(&parsed, None).await {
            Ok(page) if (200..300).contains(&page.status) => page.body,
            Ok(page) => {
                debug!(url = %sitemap_url, status = page.status, "sitemap probe missed");
                continue;
            }
            Err(e) => {
                debug!(url = %sitemap_url, error = %e, "sitemap fetch failed");
                continue;
            }
        };

        let entries = if body.trim_start().starts_with('<') {
            parse_xml_sitemap(&body)
        } else {
            SitemapEntries {
                child_sitemaps: Vec::new(),
                page_urls: parse_text_sitemap(&body),
            }
        };

        queue.extend(entries.child_sitemaps);

        for raw in entries.page_urls {
            if pages.len() >= discovery.max_urls {
                break;
            }
            let url = match normalize_url(&raw) {
                Ok(u) => u,
                Err(_) => continue,
            };
            let host = extract_domain(&url).unwrap_or_default();
            if !is_same_site(&seed_host, &host) {
                continue;
            }
            if seen_pages.insert(url.to_string()) {
                pages.push(url);
            }
        }
    }

    info!(
        seed = %seed,
        sitemaps = seen_sitemaps.len(),
        urls = pages.len(),
        "sitemap discovery finished"
    );
    pages
}

/// Parses one XML sitemap or sitemap index into its `<loc>` entries
///
/// A `<loc>` under `<sitemap>` is a child sitemap; under `<url>` (or at the
/// top level, which some generators emit) it is a leaf page URL.
pub fn parse_xml_sitemap(xml: &str) -> SitemapEntries {
    let mut reader = Reader::from_str(xml);
    let mut entries = SitemapEntries::default();
    let mut in_sitemap = false;
    let mut in_loc = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"sitemap" => in_sitemap = true,
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"sitemap" => in_sitemap = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_loc => {
                if let Ok(text) = t.unescape() {
                    let loc = text.trim().to_string();
                    if !loc.is_empty() {
                        if in_sitemap {
                            entries.child_sitemaps.push(loc);
                        } else {
                            entries.page_urls.push(loc);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, "sitemap XML malformed, keeping entries parsed so far");
                break;
            }
            _ => {}
        }
    }

    entries
}

/// Parses a plain-text sitemap: one URL per line
pub fn parse_text_sitemap(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .map(|line| line.to_string())
        .collect()
}
