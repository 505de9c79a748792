use unicode_segmentation::UnicodeSegmentation;

use crate::model::config::SearchConfig;
use crate::model::task::Task;
use crate::model::view::StatusFilter;

/// A task that matched a search, with its score (0.0 = exact match at the start)
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub task: &'a Task,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Fuzzy scoring
// ---------------------------------------------------------------------------

/// Score how well `query` approximately occurs somewhere in `text`.
///
/// Both strings are lowercased and compared grapheme by grapheme. Every
/// window of `text` whose length is within the error budget of the query
/// length is compared with optimal-string-alignment distance (insertions,
/// deletions, substitutions, adjacent transpositions). A window starting at
/// grapheme `i` with `e` errors scores `e / query_len + i / distance`.
/// Returns the best score, or `None` when no window is within `threshold`.
pub fn fuzzy_score(text: &str, query: &str, config: &SearchConfig) -> Option<f64> {
    let query = query.trim().to_lowercase();
    let pattern_len = query.graphemes(true).count();
    if pattern_len == 0 {
        return Some(0.0);
    }

    let text = text.to_lowercase();
    let mut bounds: Vec<usize> = text.grapheme_indices(true).map(|(i, _)| i).collect();
    let text_len = bounds.len();
    bounds.push(text.len());

    // More errors than query graphemes can never be needed
    let max_errors = (config.threshold * pattern_len as f64)
        .floor()
        .clamp(0.0, pattern_len as f64) as usize;
    let min_window = pattern_len.saturating_sub(max_errors).max(1);
    let max_window = pattern_len.saturating_add(max_errors).min(text_len);

    let mut best: Option<f64> = None;
    for start in 0..text_len {
        let proximity = proximity_penalty(start, config.distance);
        if proximity > config.threshold {
            break;
        }
        for len in min_window..=max_window {
            let end = start + len;
            if end > text_len {
                break;
            }
            let window = &text[bounds[start]..bounds[end]];
            let errors = strsim::osa_distance(window, &query);
            if errors > max_errors {
                continue;
            }
            let score = errors as f64 / pattern_len as f64 + proximity;
            if score <= config.threshold && best.is_none_or(|b| score < b) {
                best = Some(score);
            }
        }
    }
    best
}

fn proximity_penalty(start: usize, distance: usize) -> f64 {
    if distance == 0 {
        if start == 0 { 0.0 } else { 1.0 }
    } else {
        start as f64 / distance as f64
    }
}

// ---------------------------------------------------------------------------
// Search and filter
// ---------------------------------------------------------------------------

/// Fuzzy search over task text, best matches first (ties keep list order).
///
/// An empty query returns every task in list order with score 0.
pub fn search<'a>(tasks: &'a [Task], query: &str, config: &SearchConfig) -> Vec<SearchHit<'a>> {
    if query.trim().is_empty() {
        return tasks
            .iter()
            .map(|task| SearchHit { task, score: 0.0 })
            .collect();
    }

    let mut hits: Vec<SearchHit<'a>> = tasks
        .iter()
        .filter_map(|task| {
            fuzzy_score(&task.text, query, config).map(|score| SearchHit { task, score })
        })
        .collect();
    hits.sort_by(|a, b| a.score.total_cmp(&b.score));
    hits
}

/// Keep only the tasks admitted by `filter`, preserving order.
pub fn filter_by_status<'a>(tasks: Vec<&'a Task>, filter: StatusFilter) -> Vec<&'a Task> {
    tasks.into_iter().filter(|t| filter.admits(t.done)).collect()
}

/// Search, then apply the status filter to the result set.
pub fn visible_tasks<'a>(
    tasks: &'a [Task],
    query: &str,
    filter: StatusFilter,
    config: &SearchConfig,
) -> Vec<&'a Task> {
    let found = search(tasks, query, config)
        .into_iter()
        .map(|hit| hit.task)
        .collect();
    filter_by_status(found, filter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Priority, TaskId};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Task> {
        let items = [
            ("Buy milk", false),
            ("Pay electricity bill", true),
            ("Clean the garage", false),
            ("Study Physics Practical for exam", true),
            ("Walk the dog", false),
        ];
        items
            .iter()
            .enumerate()
            .map(|(i, (text, done))| Task {
                id: TaskId(i as u64 + 1),
                text: text.to_string(),
                done: *done,
                priority: Priority::Low,
            })
            .collect()
    }

    fn hit_texts<'a>(hits: &[SearchHit<'a>]) -> Vec<&'a str> {
        hits.iter().map(|h| h.task.text.as_str()).collect()
    }

    #[test]
    fn exact_prefix_scores_zero() {
        let config = SearchConfig::default();
        assert_eq!(fuzzy_score("Buy milk", "buy", &config), Some(0.0));
    }

    #[test]
    fn tolerates_transposition() {
        let config = SearchConfig::default();
        let score = fuzzy_score("Buy milk", "mlik", &config).unwrap();
        assert!(score > 0.0 && score <= 0.3, "score was {}", score);
    }

    #[test]
    fn tolerates_single_typo() {
        let config = SearchConfig::default();
        assert!(fuzzy_score("Clean the garage", "garbge", &config).is_some());
    }

    #[test]
    fn rejects_unrelated_text() {
        let config = SearchConfig::default();
        assert_eq!(fuzzy_score("Walk the dog", "milk", &config), None);
        assert_eq!(fuzzy_score("Buy milk", "zzzz", &config), None);
    }

    #[test]
    fn far_matches_are_penalized() {
        let config = SearchConfig::default();
        let near = fuzzy_score("exam tomorrow", "exam", &config).unwrap();
        let far = fuzzy_score("Study Physics Practical for exam", "exam", &config).unwrap();
        assert!(near < far);
    }

    #[test]
    fn match_beyond_distance_is_rejected() {
        let config = SearchConfig::default();
        let text = format!("{}milk", "x".repeat(40));
        assert_eq!(fuzzy_score(&text, "milk", &config), None);
    }

    #[test]
    fn zero_distance_only_accepts_start() {
        let config = SearchConfig {
            threshold: 0.3,
            distance: 0,
        };
        assert!(fuzzy_score("milk run", "milk", &config).is_some());
        assert_eq!(fuzzy_score("buy milk", "milk", &config), None);
    }

    #[test]
    fn out_of_range_threshold_does_not_overflow() {
        let huge = SearchConfig {
            threshold: 1e30,
            distance: 100,
        };
        assert_eq!(fuzzy_score("Buy milk", "buy", &huge), Some(0.0));
        assert!(fuzzy_score("Pay rent", "xyz", &huge).is_some());

        for threshold in [-1.0, f64::NAN] {
            let bad = SearchConfig {
                threshold,
                distance: 100,
            };
            assert_eq!(fuzzy_score("Buy milk", "milk", &bad), None);
        }
    }

    #[test]
    fn empty_query_returns_all_in_order() {
        let tasks = sample();
        let hits = search(&tasks, "  ", &SearchConfig::default());
        assert_eq!(hits.len(), tasks.len());
        assert_eq!(hit_texts(&hits)[0], "Buy milk");
    }

    #[test]
    fn search_ranks_by_score() {
        let mut tasks = sample();
        tasks.push(Task {
            id: TaskId(6),
            text: "Exam prep".into(),
            done: false,
            priority: Priority::High,
        });
        let hits = search(&tasks, "exam", &SearchConfig::default());
        assert_eq!(
            hit_texts(&hits),
            vec!["Exam prep", "Study Physics Practical for exam"]
        );
    }

    #[test]
    fn search_is_case_insensitive() {
        let tasks = sample();
        let hits = search(&tasks, "PAY", &SearchConfig::default());
        assert_eq!(hit_texts(&hits), vec!["Pay electricity bill"]);
    }

    #[test]
    fn filter_after_empty_search_equals_plain_filter() {
        let tasks = sample();
        let config = SearchConfig::default();
        for filter in [StatusFilter::All, StatusFilter::Completed, StatusFilter::Pending] {
            let visible = visible_tasks(&tasks, "", filter, &config);
            let expected: Vec<&Task> = tasks.iter().filter(|t| filter.admits(t.done)).collect();
            assert_eq!(visible, expected);
        }
    }

    #[test]
    fn filter_applies_to_search_results() {
        let tasks = sample();
        let config = SearchConfig::default();
        let visible = visible_tasks(&tasks, "exam", StatusFilter::Pending, &config);
        assert!(visible.is_empty());
        let visible = visible_tasks(&tasks, "exam", StatusFilter::Completed, &config);
        assert_eq!(visible.len(), 1);
    }
}
