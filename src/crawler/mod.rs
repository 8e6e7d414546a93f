//! Crawl engine: fetching, discovery, and orchestration

pub mod discovery;
mod fetcher;
mod orchestrator;

pub use discovery::{discover_site_urls, parse_text_sitemap, parse_xml_sitemap, SitemapEntries};
pub use fetcher::{build_http_client, FetchedPage, Fetcher};
pub use orchestrator::Orchestrator;
