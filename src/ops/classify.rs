use std::sync::LazyLock;

use regex::Regex;

use crate::model::task::Priority;

/// Keywords that make a task urgent. Checked before the medium set.
pub const HIGH_KEYWORDS: &[&str] = &["pay", "submit", "exam"];
/// Housekeeping keywords.
pub const MEDIUM_KEYWORDS: &[&str] = &["clean", "organize"];

static HIGH_RE: LazyLock<Regex> = LazyLock::new(|| keyword_regex(HIGH_KEYWORDS));
static MEDIUM_RE: LazyLock<Regex> = LazyLock::new(|| keyword_regex(MEDIUM_KEYWORDS));

/// Case-insensitive alternation matching any keyword as a plain substring.
fn keyword_regex(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){}", alternation)).expect("keyword pattern is valid")
}

/// Predict a priority from task text.
///
/// Plain substring matching, so "repay" and "examine" count as High too.
pub fn classify(text: &str) -> Priority {
    if HIGH_RE.is_match(text) {
        Priority::High
    } else if MEDIUM_RE.is_match(text) {
        Priority::Medium
    } else {
        Priority::Low
    }
}
