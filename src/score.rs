//! Page and site scoring
//!
//! Scores are derived values, recomputed on demand from issue lists and page
//! metrics; nothing here is persisted.

use crate::page::PageRecord;

/// Scores one page in [0, 100]
///
/// Starts at 100 and deducts per issue by severity, then adjusts for load
/// time, content depth, transport security, mobile-friendliness, and the
/// presence of structured data.
pub fn page_score(record: &PageRecord) -> f64 {
    let mut score = 100.0;

    for issue in &record.seo_issues {
        score -= issue.severity.penalty();
    }

    if record.load_time_secs < 2.0 {
        score += 5.0;
    } else if record.load_time_secs > 5.0 {
        score -= 15.0;
    }

    if record.word_count > 1000 {
        score += 5.0;
    } else if record.word_count < 300 {
        score -= 10.0;
    }

    if record.ssl_enabled {
        score += 2.0;
    }
    if record.mobile_friendly {
        score += 3.0;
    }
    if !record.structured_data.is_empty() {
        score += 3.0;
    }

    score.clamp(0.0, 100.0)
}

/// Depth-weighted mean of page scores, rounded to one decimal
///
/// The home page (depth 0) weighs 3, shallow pages (depth <= 2) weigh 2,
/// everything deeper weighs 1. Empty input scores 0.
pub fn site_score(records: &[PageRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for record in records {
        let weight = match record.page_depth {
            0 => 3.0,
            1 | 2 => 2.0,
            _ => 1.0,
        };
        weighted_sum += page_score(record) * weight;
        weight_total += weight;
    }

    (weighted_sum / weight_total * 10.0).round() / 10.0
}
