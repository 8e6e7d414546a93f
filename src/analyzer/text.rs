//! Text metrics: visible-text extraction, readability, keyword density

use scraper::{ElementRef, Html, Node};

/// Elements whose text is boilerplate, not page content
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "noscript"];

/// Extracts the visible text of a document, skipping non-content elements
pub fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    collect_visible(document.root_element(), &mut text);
    text
}

fn collect_visible(element: ElementRef, out: &mut String) {
    if NON_CONTENT_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(trimmed);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible(child_element, out);
                }
            }
            _ => {}
        }
    }
}

/// Flesch Reading Ease with length adjustments, clamped to [0, 100]
///
/// Sentences are runs of `.`, `!`, `?` (minimum one). The base formula is
/// penalized by 5 when average word length exceeds 6 characters and by 10
/// when more than 30% of words run past two syllables. Empty text scores 0.
pub fn flesch_reading_ease(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let sentences = count_sentences(text).max(1);
    let word_count = words.len() as f64;

    let total_syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let long_words = words.iter().filter(|w| count_syllables(w) > 2).count();
    let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();

    let mut score = 206.835
        - 1.015 * (word_count / sentences as f64)
        - 84.6 * (total_syllables as f64 / word_count);

    if total_chars as f64 / word_count > 6.0 {
        score -= 5.0;
    }
    if long_words as f64 / word_count > 0.3 {
        score -= 10.0;
    }

    score.clamp(0.0, 100.0)
}

fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut in_terminator = false;
    for c in text.chars() {
        if c == '.' || c == '!' || c == '?' {
            if !in_terminator {
                count += 1;
            }
            in_terminator = true;
        } else {
            in_terminator = false;
        }
    }
    count
}

/// Counts syllables as vowel-group transitions, with a silent-e subtraction
/// and a minimum of one per word. Trailing punctuation is stripped so a
/// sentence-final word counts like its bare form.
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let word = word.trim_end_matches(['.', ',', '!', '?', '"', ';', ':']);
    let mut count: usize = 0;
    let mut prev_was_vowel = false;

    for c in word.chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !prev_was_vowel {
            count += 1;
        }
        prev_was_vowel = is_vowel;
    }

    if word.ends_with('e') {
        count = count.saturating_sub(1);
    }

    count.max(1)
}

/// Keyword occurrences per hundred words of visible text
///
/// Matches case-insensitively on the raw text, so multi-word keywords count
/// phrase occurrences rather than per-token hits.
pub fn keyword_density(text: &str, keyword: &str) -> f64 {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return 0.0;
    }

    let word_count = text.split_whitespace().count();
    if word_count == 0 {
        return 0.0;
    }

    let haystack = text.to_lowercase();
    let occurrences = haystack.matches(&keyword).count();
    occurrences as f64 / word_count as f64 * 100.0
}
