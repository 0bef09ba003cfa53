//! Small pure helpers every adapter funnels its upstream shapes through
//! before results leave the core.

use crate::models::Chapter;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Extract the first decimal number from a chapter slug or label
/// ("chapter-12", "Ch. 45.5 - The End" -> 12.0, 45.5).
pub fn extract_chapter_number(s: &str) -> Option<f32> {
    let re = regex::Regex::new(r"(\d+(?:\.\d+)?)").ok()?;
    re.captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
}

/// Sort chapters into canonical reading order (ascending chapter number)
/// and drop duplicate ids, keeping the first occurrence.
pub fn canonical_order(chapters: &mut Vec<Chapter>) {
    chapters.sort_by(|a, b| {
        a.chapter_number
            .partial_cmp(&b.chapter_number)
            .unwrap_or(Ordering::Equal)
    });
    let mut seen: HashSet<String> = HashSet::new();
    chapters.retain(|c| seen.insert(c.id.clone()));
}

/// Strip the trailing "(Novel)" qualifier metadata databases append to
/// light-novel entries ("Shadow Slave (Novel)" -> "Shadow Slave").
pub fn strip_title_qualifier(title: &str) -> String {
    let re = regex::Regex::new(r"(?i)\s*\(novel\)\s*$").unwrap();
    re.replace(title, "").trim().to_string()
}

/// Parse a stat counter like "1,234" or "12.5K hits" down to its digits.
/// Returns None when the string carries no digits at all.
pub fn parse_count(s: &str) -> Option<u64> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok()
}
