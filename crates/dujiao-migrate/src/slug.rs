//! Slug generation and uniqueness bookkeeping.
//!
//! Display names from the legacy store are frequently Chinese; the new API
//! wants URL-safe ASCII slugs. CJK input is romanized to tone-less pinyin
//! before the usual slug normalization.

use std::collections::HashSet;

use pinyin::ToPinyin;

/// Maximum slug length accepted by the new API.
const MAX_SLUG_LEN: usize = 50;

/// Converts an arbitrary display name into a URL-safe slug.
///
/// CJK characters are romanized with syllables joined by hyphens, runs of
/// non-alphanumeric characters collapse to a single hyphen, and the result
/// is lower-cased, trimmed of edge hyphens and capped at 50 characters.
/// An input that slugifies to nothing yields `item-<timestamp>` so the
/// output is never empty.
#[must_use]
pub fn slugify(text: &str) -> String {
    let romanized = if contains_cjk(text) {
        let syllables: Vec<&str> = text
            .to_pinyin()
            .flatten()
            .map(|p| p.plain())
            .collect();
        if syllables.is_empty() {
            text.to_string()
        } else {
            syllables.join("-")
        }
    } else {
        text.to_string()
    };

    let mut slug = String::with_capacity(romanized.len());
    let mut prev_hyphen = false;
    for ch in romanized.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    let mut slug = slug.trim_matches('-').to_string();

    if slug.is_empty() {
        slug = format!("item-{}", chrono::Local::now().format("%Y%m%d%H%M%S"));
    }

    if slug.len() > MAX_SLUG_LEN {
        // Post-normalization slugs are pure ASCII, so byte truncation is safe.
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}

/// Resolves `slug` against the set of slugs already in use.
///
/// Appends `-1`, `-2`, ... until the candidate is free. The returned slug is
/// inserted into `used` before returning; callers rely on that side effect
/// to prevent repeat collisions within the same run.
pub fn ensure_unique_slug(slug: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = slug.to_string();
    let mut counter = 1;
    while used.contains(&candidate) {
        candidate = format!("{slug}-{counter}");
        counter += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Returns true if `text` contains any CJK Unified Ideograph.
#[must_use]
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}
