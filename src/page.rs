//! Data model for crawl results
//!
//! These types are the structured output of the crawl-and-analyze pipeline:
//! per-page facts ([`PageRecord`]), severity-tagged findings ([`Issue`]),
//! crawl-wide counters ([`CrawlStats`]), and the combined [`AuditOutcome`]
//! returned to the caller. Everything here is serde-serializable so the
//! report/export layer (and the cache) can consume it without side tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Issue severity, ordered from most to least urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Uppercase label used inline in issue descriptions
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// Points deducted from a page score per issue of this severity
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Critical => 20.0,
            Severity::High => 10.0,
            Severity::Medium => 5.0,
            Severity::Low => 2.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single SEO finding on a page
///
/// The description carries the severity label inline ("CRITICAL: Missing
/// title tag") so downstream consumers can classify without a side table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Rule family, e.g. "Meta Tags" or "Technical SEO"
    pub category: String,
    pub severity: Severity,
    /// Human-readable description, prefixed with the severity label
    pub description: String,
    pub recommendation: String,
    /// URL of the affected page
    pub page: String,
}

impl Issue {
    pub fn new(
        category: &str,
        severity: Severity,
        description: impl Into<String>,
        recommendation: &str,
        page: &str,
    ) -> Self {
        Self {
            category: category.to_string(),
            severity,
            description: format!("{}: {}", severity.label(), description.into()),
            recommendation: recommendation.to_string(),
            page: page.to_string(),
        }
    }
}

/// One image found on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub src: String,
    pub alt: Option<String>,
    pub has_alt: bool,
    pub is_lazy_loaded: bool,
}

/// One form found on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInfo {
    pub action: String,
    pub method: String,
    pub inputs: usize,
    pub has_validation: bool,
}

/// A structured-data block (JSON-LD or microdata) embedded in a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredData {
    pub kind: StructuredDataKind,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructuredDataKind {
    JsonLd,
    Microdata,
}

/// One page's raw and derived SEO facts
///
/// Created once per successful fetch+analysis and immutable thereafter
/// (except for `page_depth`, which the orchestrator fills with the record's
/// insertion index into the result set). Persisted by the cache store as a
/// JSON blob; the round trip must be lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub h3_tags: Vec<String>,
    pub h4_tags: Vec<String>,
    pub h5_tags: Vec<String>,
    pub h6_tags: Vec<String>,
    pub word_count: usize,
    pub char_count: usize,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub images: Vec<ImageInfo>,
    pub canonical_url: Option<String>,
    pub meta_robots: Option<String>,
    pub og_tags: BTreeMap<String, String>,
    pub twitter_tags: BTreeMap<String, String>,
    pub structured_data: Vec<StructuredData>,
    pub js_files: Vec<String>,
    pub css_files: Vec<String>,
    pub forms: Vec<FormInfo>,
    pub meta_tags: BTreeMap<String, String>,
    pub content_language: Option<String>,
    /// Flesch Reading Ease, clamped to [0, 100]
    pub readability_score: f64,
    /// Target-keyword occurrences per hundred words
    pub keyword_density: f64,
    pub seo_issues: Vec<Issue>,
    pub load_time_secs: f64,
    pub page_size_bytes: usize,
    pub status_code: u16,
    pub content_type: String,
    pub text_to_html_ratio: f64,
    pub mobile_friendly: bool,
    pub has_viewport: bool,
    pub ssl_enabled: bool,
    /// Insertion order into the crawl results (0 = first page analyzed)
    pub page_depth: usize,
    pub crawl_timestamp: DateTime<Utc>,
}

impl PageRecord {
    /// Number of images without alt text
    pub fn images_missing_alt(&self) -> usize {
        self.images.iter().filter(|img| !img.has_alt).count()
    }
}

/// Crawl-wide counters, mutated only by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlStats {
    pub total_pages: u64,
    pub successful_pages: u64,
    pub failed_pages: u64,
    pub cached_pages: u64,
    pub skipped_pages: u64,
    pub total_issues: u64,
    pub total_bytes_transferred: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub crawl_duration_secs: f64,
    pub average_load_time_secs: f64,
}

impl CrawlStats {
    /// Starts a new stats block stamped with the current time
    pub fn start() -> Self {
        Self {
            total_pages: 0,
            successful_pages: 0,
            failed_pages: 0,
            cached_pages: 0,
            skipped_pages: 0,
            total_issues: 0,
            total_bytes_transferred: 0,
            start_time: Utc::now(),
            end_time: None,
            crawl_duration_secs: 0.0,
            average_load_time_secs: 0.0,
        }
    }

    /// Finalizes the stats: end time, duration, and average load time
    /// derived from the accumulated page records.
    pub fn finish(&mut self, pages: &[PageRecord]) {
        let end = Utc::now();
        self.crawl_duration_secs = (end - self.start_time).num_milliseconds() as f64 / 1000.0;
        self.end_time = Some(end);

        if !pages.is_empty() {
            self.average_load_time_secs =
                pages.iter().map(|p| p.load_time_secs).sum::<f64>() / pages.len() as f64;
        }
    }
}

/// The complete result of one `analyze_website` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditOutcome {
    pub pages: Vec<PageRecord>,
    pub stats: CrawlStats,
    /// Depth-weighted site score in [0, 100], one decimal
    pub site_score: f64,
}

/// Minimal record for test fixtures across the crate
#[cfg(test)]
pub(crate) fn sample_record(url: &str) -> PageRecord {
    PageRecord {
        url: url.to_string(),
        title: Some("Sample".to_string()),
        meta_description: None,
        meta_keywords: None,
        h1_tags: vec!["Sample".to_string()],
        h2_tags: vec![],
        h3_tags: vec![],
        h4_tags: vec![],
        h5_tags: vec![],
        h6_tags: vec![],
        word_count: 100,
        char_count: 600,
        internal_links: vec![],
        external_links: vec![],
        images: vec![],
        canonical_url: None,
        meta_robots: None,
        og_tags: BTreeMap::new(),
        twitter_tags: BTreeMap::new(),
        structured_data: vec![],
        js_files: vec![],
        css_files: vec![],
        forms: vec![],
        meta_tags: BTreeMap::new(),
        content_language: None,
        readability_score: 60.0,
        keyword_density: 1.0,
        seo_issues: vec![],
        load_time_secs: 0.5,
        page_size_bytes: 2048,
        status_code: 200,
        content_type: "text/html".to_string(),
        text_to_html_ratio: 30.0,
        mobile_friendly: true,
        has_viewport: true,
        ssl_enabled: true,
        page_depth: 0,
        crawl_timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_description_carries_severity_label() {
        let issue = Issue::new(
            "Meta Tags",
            Severity::Critical,
            "Missing title tag",
            "Add a descriptive title tag (30-60 characters)",
            "https://example.com/",
        );
        assert_eq!(issue.description, "CRITICAL: Missing title tag");
        assert_eq!(issue.severity, Severity::Critical);
    }

    #[test]
    fn test_severity_penalties() {
        assert_eq!(Severity::Critical.penalty(), 20.0);
        assert_eq!(Severity::High.penalty(), 10.0);
        assert_eq!(Severity::Medium.penalty(), 5.0);
        assert_eq!(Severity::Low.penalty(), 2.0);
    }

    #[test]
    fn test_stats_finish_averages_load_time() {
        let mut stats = CrawlStats::start();
        let mut a = sample_record("https://example.com/");
        let mut b = sample_record("https://example.com/about");
        a.load_time_secs = 1.0;
        b.load_time_secs = 3.0;

        stats.finish(&[a, b]);

        assert!(stats.end_time.is_some());
        assert!((stats.average_load_time_secs - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_page_record_json_round_trip_is_lossless() {
        let mut record = sample_record("https://example.com/page");
        record.seo_issues.push(Issue::new(
            "Content",
            Severity::High,
            "Thin content (50 words, recommended: 300+)",
            "Expand the page to at least 300 words of useful content",
            "https://example.com/page",
        ));
        record.images.push(ImageInfo {
            src: "/logo.png".to_string(),
            alt: None,
            has_alt: false,
            is_lazy_loaded: true,
        });
        record.og_tags.insert("og:title".into(), "Page".into());
        record.structured_data.push(StructuredData {
            kind: StructuredDataKind::JsonLd,
            value: serde_json::json!({"@type": "Article"}),
        });

        let bytes = serde_json::to_vec(&record).unwrap();
        let back: PageRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record, back);
    }
}
