//! Rule-based HTML content analysis
//!
//! The analyzer is a pure function of the fetched document plus the target
//! keyword: no network, no clock beyond the record timestamp, no shared
//! state. Everything the scorer and report layer need is extracted here in
//! one pass over the parsed document.

mod issues;
mod text;

pub use issues::detect_issues;
pub use text::{count_syllables, flesch_reading_ease, keyword_density, visible_text};

use crate::page::{
    FormInfo, ImageInfo, PageRecord, StructuredData, StructuredDataKind,
};
use crate::url::{extract_domain, is_same_site};
use crate::{AuditError, Result};
use chrono::Utc;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Analyzes one fetched HTML document into a [`PageRecord`]
///
/// # Arguments
/// * `url` - The final URL the document was fetched from
/// * `html` - Raw response body
/// * `keyword` - Target keyword for density and placement rules
/// * `status_code` - HTTP status of the response
/// * `load_time` - Wall-clock fetch duration
/// * `content_type` - The response Content-Type header, if present
///
/// # Errors
/// Returns a parse error for an empty body; anything else yields a record,
/// possibly with many issues.
pub fn analyze(
    url: &Url,
    html: &str,
    keyword: &str,
    status_code: u16,
    load_time: Duration,
    content_type: Option<&str>,
) -> Result<PageRecord> {
    if html.trim().is_empty() {
        return Err(AuditError::Parse {
            url: url.to_string(),
            message: "empty response body".to_string(),
        });
    }

    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let meta = extract_meta(&document);
    let (internal_links, external_links) = extract_links(&document, url);
    let images = extract_images(&document);
    let canonical_url = extract_canonical(&document, url);
    let structured_data = extract_structured_data(&document);
    let (js_files, css_files) = extract_assets(&document);
    let forms = extract_forms(&document);
    let content_language = extract_language(&document, &meta.all);

    let body_text = visible_text(&document);
    let word_count = body_text.split_whitespace().count();
    let char_count = body_text.chars().count();

    let has_viewport = meta.all.contains_key("viewport");
    let mobile_friendly = meta
        .all
        .get("viewport")
        .map(|v| v.contains("width=device-width"))
        .unwrap_or(false);

    let text_to_html_ratio = if html.is_empty() {
        0.0
    } else {
        body_text.len() as f64 / html.len() as f64 * 100.0
    };

    let mut record = PageRecord {
        url: url.to_string(),
        title,
        meta_description: meta.description,
        meta_keywords: meta.keywords,
        h1_tags: extract_headings(&document, "h1"),
        h2_tags: extract_headings(&document, "h2"),
        h3_tags: extract_headings(&document, "h3"),
        h4_tags: extract_headings(&document, "h4"),
        h5_tags: extract_headings(&document, "h5"),
        h6_tags: extract_headings(&document, "h6"),
        word_count,
        char_count,
        internal_links,
        external_links,
        images,
        canonical_url,
        meta_robots: meta.robots,
        og_tags: meta.og_tags,
        twitter_tags: meta.twitter_tags,
        structured_data,
        js_files,
        css_files,
        forms,
        meta_tags: meta.all,
        content_language,
        readability_score: flesch_reading_ease(&body_text),
        keyword_density: keyword_density(&body_text, keyword),
        seo_issues: Vec::new(),
        load_time_secs: load_time.as_secs_f64(),
        page_size_bytes: html.len(),
        status_code,
        content_type: content_type.unwrap_or("").to_string(),
        text_to_html_ratio,
        mobile_friendly,
        has_viewport,
        ssl_enabled: url.scheme() == "https",
        page_depth: 0,
        crawl_timestamp: Utc::now(),
    };

    record.seo_issues = detect_issues(&record, keyword);
    Ok(record)
}

/// Returns true when a Content-Type header denotes HTML
///
/// A missing header is treated as HTML: plenty of small sites omit it.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(ct) => {
            let ct = ct.to_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        }
    }
}

struct MetaTags {
    all: BTreeMap<String, String>,
    description: Option<String>,
    keywords: Option<String>,
    robots: Option<String>,
    og_tags: BTreeMap<String, String>,
    twitter_tags: BTreeMap<String, String>,
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_headings(document: &Html, level: &str) -> Vec<String> {
    let selector = match Selector::parse(level) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    document
        .select(&selector)
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|t| !t.is_empty())
        .collect()
}

fn extract_meta(document: &Html) -> MetaTags {
    let mut all = BTreeMap::new();
    let mut og_tags = BTreeMap::new();
    let mut twitter_tags = BTreeMap::new();

    if let Ok(selector) = Selector::parse("meta") {
        for element in document.select(&selector) {
            let content = match element.value().attr("content") {
                Some(c) => c.trim().to_string(),
                None => continue,
            };
            // Open Graph uses property=, most others use name=
            if let Some(property) = element.value().attr("property") {
                if property.starts_with("og:") {
                    og_tags.insert(property.to_string(), content.clone());
                }
                all.insert(property.to_lowercase(), content.clone());
            }
            if let Some(name) = element.value().attr("name") {
                if name.starts_with("twitter:") {
                    twitter_tags.insert(name.to_string(), content.clone());
                }
                all.insert(name.to_lowercase(), content.clone());
            }
            if let Some(http_equiv) = element.value().attr("http-equiv") {
                all.insert(http_equiv.to_lowercase(), content);
            }
        }
    }

    MetaTags {
        description: all.get("description").cloned().filter(|s| !s.is_empty()),
        keywords: all.get("keywords").cloned().filter(|s| !s.is_empty()),
        robots: all.get("robots").cloned().filter(|s| !s.is_empty()),
        og_tags,
        twitter_tags,
        all,
    }
}

/// Resolves and classifies every `<a href>` into internal/external lists
///
/// `javascript:`, `mailto:`, `tel:`, and fragment-only links are dropped.
/// Internal means the same site as the base URL after stripping a leading
/// `www.`; relative links resolve against the base and are internal by
/// construction.
fn extract_links(document: &Html, base_url: &Url) -> (Vec<String>, Vec<String>) {
    let mut internal = Vec::new();
    let mut external = Vec::new();

    let base_host = extract_domain(base_url).unwrap_or_default();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let href = match element.value().attr("href") {
                Some(h) => h.trim(),
                None => continue,
            };
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            let resolved = match base_url.join(href) {
                Ok(u) => u,
                Err(_) => continue,
            };
            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                continue;
            }

            let candidate_host = extract_domain(&resolved).unwrap_or_default();
            if is_same_site(&base_host, &candidate_host) {
                internal.push(resolved.to_string());
            } else {
                external.push(resolved.to_string());
            }
        }
    }

    (internal, external)
}

fn extract_images(document: &Html) -> Vec<ImageInfo> {
    let mut images = Vec::new();
    if let Ok(selector) = Selector::parse("img") {
        for element in document.select(&selector) {
            let lazy_src = element.value().attr("data-src");
            let src = element.value().attr("src").or(lazy_src);
            let src = match src {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => continue,
            };
            let alt = element
                .value()
                .attr("alt")
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());
            let is_lazy_loaded = lazy_src.is_some()
                || element.value().attr("loading").map(str::trim) == Some("lazy");
            images.push(ImageInfo {
                src,
                has_alt: alt.is_some(),
                alt,
                is_lazy_loaded,
            });
        }
    }
    images
}

fn extract_canonical(document: &Html, base_url: &Url) -> Option<String> {
    let selector = Selector::parse(r#"link[rel="canonical"][href]"#).ok()?;
    let href = document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("href"))?;
    base_url.join(href.trim()).ok().map(|u| u.to_string())
}

fn extract_structured_data(document: &Html) -> Vec<StructuredData> {
    let mut blocks = Vec::new();

    if let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for element in document.select(&selector) {
            let raw: String = element.text().collect();
            if let Ok(value) = serde_json::from_str(&raw) {
                blocks.push(StructuredData {
                    kind: StructuredDataKind::JsonLd,
                    value,
                });
            }
            // Malformed JSON-LD is simply not counted as structured data
        }
    }

    if let Ok(selector) = Selector::parse("[itemscope]") {
        for element in document.select(&selector) {
            let itemtype = element.value().attr("itemtype").unwrap_or("");
            blocks.push(StructuredData {
                kind: StructuredDataKind::Microdata,
                value: serde_json::json!({ "itemtype": itemtype }),
            });
        }
    }

    blocks
}

fn extract_assets(document: &Html) -> (Vec<String>, Vec<String>) {
    let mut js = Vec::new();
    let mut css = Vec::new();

    if let Ok(selector) = Selector::parse("script[src]") {
        for element in document.select(&selector) {
            if let Some(src) = element.value().attr("src") {
                js.push(src.trim().to_string());
            }
        }
    }
    if let Ok(selector) = Selector::parse(r#"link[rel="stylesheet"][href]"#) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                css.push(href.trim().to_string());
            }
        }
    }

    (js, css)
}

fn extract_forms(document: &Html) -> Vec<FormInfo> {
    let mut forms = Vec::new();
    let form_selector = match Selector::parse("form") {
        Ok(s) => s,
        Err(_) => return forms,
    };
    let input_selector = match Selector::parse("input, textarea, select") {
        Ok(s) => s,
        Err(_) => return forms,
    };

    for form in document.select(&form_selector) {
        let inputs: Vec<_> = form.select(&input_selector).collect();
        let has_validation = inputs
            .iter()
            .any(|i| i.value().attr("required").is_some());
        forms.push(FormInfo {
            action: form.value().attr("action").unwrap_or("").to_string(),
            method: form
                .value()
                .attr("method")
                .unwrap_or("get")
                .to_lowercase(),
            inputs: inputs.len(),
            has_validation,
        });
    }
    forms
}

fn extract_language(document: &Html, meta: &BTreeMap<String, String>) -> Option<String> {
    if let Ok(selector) = Selector::parse("html") {
        if let Some(lang) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("lang"))
        {
            let lang = lang.trim();
            if !lang.is_empty() {
                return Some(lang.to_string());
            }
        }
    }
    meta.get("content-language").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Severity;

    fn analyze_fixture(url: &str, html: &str, keyword: &str) -> PageRecord {
        analyze(
            &Url::parse(url).unwrap(),
            html,
            keyword,
            200,
            Duration::from_millis(500),
            Some("text/html"),
        )
        .unwrap()
    }

    const FULL_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Running Shoes Buying Guide for Beginners 2024</title>
    <meta name="description" content="Everything a beginner needs to know about choosing running shoes: fit, cushioning, terrain, budget, and how to avoid the most common buying mistakes.">
    <meta name="keywords" content="running shoes, guide">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="index, follow">
    <meta property="og:title" content="Running Shoes Buying Guide">
    <meta name="twitter:card" content="summary">
    <link rel="canonical" href="https://example.com/guide">
    <link rel="stylesheet" href="/main.css">
    <script src="/app.js"></script>
    <script type="application/ld+json">{"@type": "Article", "headline": "Guide"}</script>
</head>
<body>
    <h1>Running Shoes Buying Guide</h1>
    <h2>Fit comes first</h2>
    <p>Choosing running shoes starts with fit. A good pair of running shoes should feel snug.</p>
    <a href="/reviews">Reviews</a>
    <a href="https://www.example.com/about">About</a>
    <a href="https://other.org/external">Elsewhere</a>
    <a href="mailto:hi@example.com">Mail</a>
    <a href="#top">Top</a>
    <img src="/shoe.jpg" alt="A running shoe">
    <img src="/sole.jpg" loading="lazy">
    <form action="/subscribe" method="post">
        <input type="email" required>
    </form>
</body>
</html>"##;

    #[test]
    fn test_full_page_extraction() {
        let record = analyze_fixture("https://example.com/guide", FULL_PAGE, "running shoes");

        assert_eq!(
            record.title.as_deref(),
            Some("Running Shoes Buying Guide for Beginners 2024")
        );
        assert!(record.meta_description.is_some());
        assert_eq!(record.h1_tags, vec!["Running Shoes Buying Guide"]);
        assert_eq!(record.h2_tags, vec!["Fit comes first"]);
        assert_eq!(record.canonical_url.as_deref(), Some("https://example.com/guide"));
        assert_eq!(record.meta_robots.as_deref(), Some("index, follow"));
        assert_eq!(record.content_language.as_deref(), Some("en"));
        assert!(record.has_viewport);
        assert!(record.mobile_friendly);
        assert!(record.ssl_enabled);
        assert_eq!(record.js_files, vec!["/app.js"]);
        assert_eq!(record.css_files, vec!["/main.css"]);
        assert_eq!(record.og_tags.get("og:title").map(String::as_str), Some("Running Shoes Buying Guide"));
        assert_eq!(record.twitter_tags.get("twitter:card").map(String::as_str), Some("summary"));
    }

    #[test]
    fn test_link_classification() {
        let record = analyze_fixture("https://example.com/guide", FULL_PAGE, "running shoes");

        // Relative and www-prefixed same-host links are internal
        assert_eq!(
            record.internal_links,
            vec![
                "https://example.com/reviews",
                "https://www.example.com/about",
            ]
        );
        assert_eq!(record.external_links, vec!["https://other.org/external"]);
        // mailto: and fragment links are dropped entirely
    }

    #[test]
    fn test_image_alt_and_lazy_detection() {
        let record = analyze_fixture("https://example.com/guide", FULL_PAGE, "running shoes");
        assert_eq!(record.images.len(), 2);
        assert!(record.images[0].has_alt);
        assert!(!record.images[0].is_lazy_loaded);
        assert!(!record.images[1].has_alt);
        assert!(record.images[1].is_lazy_loaded);
        assert_eq!(record.images_missing_alt(), 1);
    }

    #[test]
    fn test_structured_data_and_forms() {
        let record = analyze_fixture("https://example.com/guide", FULL_PAGE, "running shoes");
        assert_eq!(record.structured_data.len(), 1);
        assert_eq!(record.structured_data[0].kind, StructuredDataKind::JsonLd);
        assert_eq!(record.forms.len(), 1);
        assert_eq!(record.forms[0].method, "post");
        assert_eq!(record.forms[0].inputs, 1);
        assert!(record.forms[0].has_validation);
    }

    #[test]
    fn test_empty_body_is_a_parse_error() {
        let result = analyze(
            &Url::parse("https://example.com/").unwrap(),
            "   ",
            "shoes",
            200,
            Duration::from_millis(10),
            None,
        );
        assert!(matches!(result, Err(AuditError::Parse { .. })));
    }

    #[test]
    fn test_bare_page_accumulates_issues() {
        // 200 response with a title but no H1, thin content, keyword absent
        let html = "<html><head><title>Home</title></head><body><p>Just a few words here.</p></body></html>";
        let record = analyze_fixture("https://example.com/", html, "shoes");

        let critical: Vec<_> = record
            .seo_issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .collect();
        assert!(critical.iter().any(|i| i.description.contains("Missing H1 tag")));
        assert!(record
            .seo_issues
            .iter()
            .any(|i| i.description.contains("Thin content")));
        assert!(record
            .seo_issues
            .iter()
            .any(|i| i.description == "HIGH: Target keyword not in title"));
        assert_eq!(record.keyword_density, 0.0);
    }

    #[test]
    fn test_keyword_density_flows_from_visible_text() {
        let record = analyze_fixture("https://example.com/guide", FULL_PAGE, "running shoes");
        assert!(record.keyword_density > 0.0);
    }

    #[test]
    fn test_http_page_flags_insecure_transport() {
        let html = "<html><head><title>T</title></head><body><p>words</p></body></html>";
        let record = analyze_fixture("http://example.com/", html, "words");
        assert!(!record.ssl_enabled);
        assert!(record
            .seo_issues
            .iter()
            .any(|i| i.description == "CRITICAL: Not using HTTPS"));
    }

    #[test]
    fn test_is_html_content_type() {
        assert!(is_html_content_type(None));
        assert!(is_html_content_type(Some("text/html; charset=utf-8")));
        assert!(is_html_content_type(Some("application/xhtml+xml")));
        assert!(!is_html_content_type(Some("application/pdf")));
        assert!(!is_html_content_type(Some("image/png")));
    }

    #[test]
    fn test_text_to_html_ratio_bounds() {
        let record = analyze_fixture("https://example.com/guide", FULL_PAGE, "running shoes");
        assert!(record.text_to_html_ratio > 0.0);
        assert!(record.text_to_html_ratio < 100.0);
    }
}
