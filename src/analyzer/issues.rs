//! Deterministic SEO issue detection
//!
//! Each rule fires at most once per page. Descriptions carry the severity
//! label inline so downstream consumers can classify without a side table.

use crate::page::{Issue, PageRecord, Severity};

/// Runs every rule against an analyzed page
pub fn detect_issues(record: &PageRecord, keyword: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let keyword_lower = keyword.to_lowercase();
    let page = record.url.as_str();

    // Title
    match &record.title {
        None => issues.push(Issue::new(
            "Meta Tags",
            Severity::Critical,
            "Missing title tag",
            "Add a descriptive title tag (30-60 characters)",
            page,
        )),
        Some(title) => {
            let len = title.chars().count();
            if len < 30 {
                issues.push(Issue::new(
                    "Meta Tags",
                    Severity::High,
                    format!("Title too short ({len} chars, recommended: 30-60)"),
                    "Expand the title to 30-60 characters",
                    page,
                ));
            } else if len > 60 {
                issues.push(Issue::new(
                    "Meta Tags",
                    Severity::High,
                    format!("Title too long ({len} chars, recommended: 30-60)"),
                    "Shorten the title to under 60 characters",
                    page,
                ));
            }
            if !title.to_lowercase().contains(&keyword_lower) {
                issues.push(Issue::new(
                    "Keywords",
                    Severity::High,
                    "Target keyword not in title",
                    "Include the target keyword in the title tag",
                    page,
                ));
            }
        }
    }

    // Meta description
    match &record.meta_description {
        None => issues.push(Issue::new(
            "Meta Tags",
            Severity::High,
            "Missing meta description",
            "Add a meta description (120-160 characters)",
            page,
        )),
        Some(desc) => {
            let len = desc.chars().count();
            if len < 120 {
                issues.push(Issue::new(
                    "Meta Tags",
                    Severity::Medium,
                    format!("Meta description too short ({len} chars)"),
                    "Expand the description to 120-160 characters",
                    page,
                ));
            } else if len > 160 {
                issues.push(Issue::new(
                    "Meta Tags",
                    Severity::Medium,
                    format!("Meta description too long ({len} chars)"),
                    "Shorten the description to under 160 characters",
                    page,
                ));
            }
            if !desc.to_lowercase().contains(&keyword_lower) {
                issues.push(Issue::new(
                    "Keywords",
                    Severity::Medium,
                    "Target keyword not in meta description",
                    "Include the target keyword in the meta description",
                    page,
                ));
            }
        }
    }

    // Headings
    match record.h1_tags.len() {
        0 => issues.push(Issue::new(
            "Technical SEO",
            Severity::Critical,
            "Missing H1 tag",
            "Add a descriptive H1 tag",
            page,
        )),
        1 => {
            if !record.h1_tags[0].to_lowercase().contains(&keyword_lower) {
                issues.push(Issue::new(
                    "Keywords",
                    Severity::Medium,
                    "Target keyword not in H1",
                    "Include the target keyword in the main heading",
                    page,
                ));
            }
        }
        n => issues.push(Issue::new(
            "Technical SEO",
            Severity::High,
            format!("Multiple H1 tags ({n}) - should be unique"),
            "Use only one H1 per page",
            page,
        )),
    }

    // Content depth
    if record.word_count < 300 {
        issues.push(Issue::new(
            "Content",
            Severity::High,
            format!(
                "Thin content ({} words, recommended: 300+)",
                record.word_count
            ),
            "Expand the page to at least 300 words of useful content",
            page,
        ));
    } else if record.word_count < 500 {
        issues.push(Issue::new(
            "Content",
            Severity::Medium,
            format!(
                "Short content ({} words, recommended: 500+)",
                record.word_count
            ),
            "Grow the page toward 500+ words",
            page,
        ));
    }

    // Images
    let missing_alt = record.images_missing_alt();
    if missing_alt > 0 {
        issues.push(Issue::new(
            "Media",
            Severity::Medium,
            format!("{missing_alt} images missing alt text"),
            "Add descriptive alt text to all images",
            page,
        ));
    }

    // Technical
    if !record.has_viewport {
        issues.push(Issue::new(
            "Technical SEO",
            Severity::High,
            "Missing viewport meta tag",
            "Add a viewport meta tag with width=device-width",
            page,
        ));
    }
    if !record.ssl_enabled {
        issues.push(Issue::new(
            "Technical SEO",
            Severity::Critical,
            "Not using HTTPS",
            "Serve the page over HTTPS",
            page,
        ));
    }
    if record.canonical_url.is_none() {
        issues.push(Issue::new(
            "Technical SEO",
            Severity::Medium,
            "Missing canonical URL",
            "Add a canonical link element",
            page,
        ));
    }

    // Performance
    if record.js_files.len() > 10 {
        issues.push(Issue::new(
            "Performance",
            Severity::Medium,
            "Too many JavaScript files (consider combining)",
            "Combine or bundle script files",
            page,
        ));
    }
    if record.css_files.len() > 5 {
        issues.push(Issue::new(
            "Performance",
            Severity::Medium,
            "Too many CSS files (consider combining)",
            "Combine or bundle stylesheets",
            page,
        ));
    }

    // Social
    if record.og_tags.is_empty() {
        issues.push(Issue::new(
            "Social",
            Severity::Low,
            "Missing Open Graph tags",
            "Add og:title, og:description, and og:image tags",
            page,
        ));
    }
    if record.twitter_tags.is_empty() {
        issues.push(Issue::new(
            "Social",
            Severity::Low,
            "Missing Twitter Card tags",
            "Add twitter:card and twitter:title tags",
            page,
        ));
    }

    // Structured data
    if record.structured_data.is_empty() {
        issues.push(Issue::new(
            "Structured Data",
            Severity::Low,
            "No structured data (Schema.org) found",
            "Add JSON-LD structured data for the page type",
            page,
        ));
    }

    issues
}
