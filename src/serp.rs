//! Search-results snapshot for the target keyword
//!
//! Single-shot scrape of a results page, independent of the crawl loop. The
//! markup this parses changes without notice, so parsing is best-effort:
//! selectors are tried in order and unrecognized blocks are skipped.

use crate::Result;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// One organic result on the snapshot page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpResult {
    /// 1-based position on the page
    pub rank: usize,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub snippet: Option<String>,
}

const RESULTS_PER_SNAPSHOT: usize = 10;

/// Fetches and parses a results page for `keyword`
///
/// Uses a desktop browser user agent; the crawler identity string draws an
/// immediate block page here. The snapshot is best-effort: a failed fetch
/// is logged and yields an empty list, never an error.
pub async fn fetch_serp(keyword: &str) -> Vec<SerpResult> {
    fetch_serp_from("https://www.google.com/search", keyword).await
}

async fn fetch_serp_from(endpoint: &str, keyword: &str) -> Vec<SerpResult> {
    match try_fetch(endpoint, keyword).await {
        Ok(results) => {
            info!(keyword, results = results.len(), "serp snapshot parsed");
            results
        }
        Err(e) => {
            warn!(keyword, error = %e, "serp snapshot failed, no results");
            Vec::new()
        }
    }
}

async fn try_fetch(endpoint: &str, keyword: &str) -> Result<Vec<SerpResult>> {
    let client = reqwest::Client::builder()
        .user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
        .timeout(Duration::from_secs(15))
        .gzip(true)
        .build()?;

    let query_url = Url::parse_with_params(endpoint, &[("q", keyword), ("num", "10")])?;

    let body = client.get(query_url).send().await?.text().await?;
    Ok(parse_serp_html(&body))
}

/// Parses the organic results out of a results page body
pub fn parse_serp_html(html: &str) -> Vec<SerpResult> {
    let document = Html::parse_document(html);
    let mut results = Vec::new();

    // Result-block containers, newest markup first
    let block_selectors = ["div.MjjYud", "div.tF2Cxc", "div.g"];

    for selector_str in block_selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for block in document.select(&selector) {
            if results.len() >= RESULTS_PER_SNAPSHOT {
                return results;
            }
            if let Some(result) = parse_result_block(block, results.len() + 1) {
                if !results
                    .iter()
                    .any(|existing: &SerpResult| existing.url == result.url)
                {
                    results.push(result);
                }
            }
        }
        if !results.is_empty() {
            break;
        }
    }

    results
}

fn parse_result_block(block: ElementRef, rank: usize) -> Option<SerpResult> {
    let title_selector = Selector::parse("h3").ok()?;
    let link_selector = Selector::parse("a[href]").ok()?;

    let title = block
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())?;

    let href = block
        .select(&link_selector)
        .next()
        .and_then(|el| el.value().attr("href"))?;
    let url = unwrap_redirect_url(href)?;

    let domain = Url::parse(&url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default();

    let snippet = extract_snippet(block);

    debug!(rank, %url, "parsed serp result");
    Some(SerpResult {
        rank,
        title,
        url,
        domain,
        snippet,
    })
}

/// Unwraps `/url?q=<target>` redirect hrefs; rejects non-http targets
fn unwrap_redirect_url(href: &str) -> Option<String> {
    if href.starts_with("/url?") {
        let parsed = Url::parse(&format!("https://www.google.com{href}")).ok()?;
        let target = parsed
            .query_pairs()
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned())?;
        return target.starts_with("http").then_some(target);
    }
    href.starts_with("http").then(|| href.to_string())
}

fn extract_snippet(block: ElementRef) -> Option<String> {
    let snippet_selectors = ["div.VwiC3b", "span.aCOpRe", "span.st", "div.s"];
    for selector_str in snippet_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(el) = block.select(&selector).next() {
                let text = el.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERP_FIXTURE: &str = r#"<html><body>
<div id="search">
  <div class="g">
    <a href="/url?q=https://shoes.example.com/guide&amp;sa=U"><h3>Best Running Shoes 2024</h3></a>
    <span class="st">Our picks for every budget and terrain.</span>
  </div>
  <div class="g">
    <a href="https://www.reviews.example.org/top-10"><h3>Top 10 Running Shoes</h3></a>
    <div class="VwiC3b">Tested over 400 miles.</div>
  </div>
  <div class="g">
    <a href="/settings"><h3>Ignored: relative non-result link</h3></a>
  </div>
</div>
</body></html>"#;

    #[test]
    fn test_parse_serp_results() {
        let results = parse_serp_html(SERP_FIXTURE);
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].title, "Best Running Shoes 2024");
        assert_eq!(results[0].url, "https://shoes.example.com/guide");
        assert_eq!(results[0].domain, "shoes.example.com");
        assert_eq!(
            results[0].snippet.as_deref(),
            Some("Our picks for every budget and terrain.")
        );

        assert_eq!(results[1].rank, 2);
        assert_eq!(results[1].url, "https://www.reviews.example.org/top-10");
        assert_eq!(results[1].domain, "reviews.example.org");
    }

    #[test]
    fn test_redirect_unwrapping() {
        assert_eq!(
            unwrap_redirect_url("/url?q=https://example.com/page&sa=U&ved=xyz"),
            Some("https://example.com/page".to_string())
        );
        assert_eq!(
            unwrap_redirect_url("https://example.com/direct"),
            Some("https://example.com/direct".to_string())
        );
        assert_eq!(unwrap_redirect_url("/url?sa=U"), None);
        assert_eq!(unwrap_redirect_url("/settings"), None);
    }

    #[test]
    fn test_empty_page_yields_no_results() {
        assert!(parse_serp_html("<html><body>No results</body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty_snapshot() {
        // Nothing listens on this port; the failure must not surface
        let results = fetch_serp_from("http://127.0.0.1:49151/search", "rust").await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_caps_at_ten_results() {
        let mut html = String::from("<html><body>");
        for i in 0..15 {
            html.push_str(&format!(
                r#"<div class="g"><a href="https://site{i}.example.com/"><h3>Result {i}</h3></a></div>"#
            ));
        }
        html.push_str("</body></html>");
        let results = parse_serp_html(&html);
        assert_eq!(results.len(), 10);
        assert_eq!(results[9].rank, 10);
    }
}
