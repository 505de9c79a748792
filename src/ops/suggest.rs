/// Trigger word and the fixed suggestions it produces. First match wins.
const RULES: &[(&str, [&str; 3])] = &[
    ("buy", ["Buy milk", "Buy bread", "Buy eggs"]),
    ("study", ["Study 1 hour", "Revise notes", "Attempt past papers"]),
    (
        "project",
        ["Complete module", "Fix UI bugs", "Write documentation"],
    ),
];

/// Tasks appended by the smart generator, in order.
pub const SMART_TASKS: &[&str] = &[
    "Study React for 1 hour",
    "Revise System Analysis notes",
    "Practice JavaScript array methods",
    "Upload AI images to Adobe Stock",
    "Work on Gemini clone UI fixes",
    "Prepare ARICT exhibition documents",
    "Study Physics Practical for exam",
];

/// Suggest up to three tasks for partially typed input.
pub fn suggest(partial: &str) -> Vec<&'static str> {
    let lower = partial.to_lowercase();
    RULES
        .iter()
        .find(|(trigger, _)| lower.contains(trigger))
        .map(|(_, items)| items.to_vec())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_trigger() {
        assert_eq!(suggest("I need to BUY"), vec!["Buy milk", "Buy bread", "Buy eggs"]);
    }

    #[test]
    fn study_trigger() {
        assert_eq!(
            suggest("study"),
            vec!["Study 1 hour", "Revise notes", "Attempt past papers"]
        );
    }

    #[test]
    fn project_trigger() {
        assert_eq!(
            suggest("side project"),
            vec!["Complete module", "Fix UI bugs", "Write documentation"]
        );
    }

    #[test]
    fn first_rule_wins() {
        assert_eq!(suggest("buy books to study")[0], "Buy milk");
        assert_eq!(suggest("study for the project")[0], "Study 1 hour");
    }

    #[test]
    fn no_trigger_no_suggestions() {
        assert!(suggest("walk the dog").is_empty());
        assert!(suggest("").is_empty());
    }

    #[test]
    fn smart_tasks_are_fixed() {
        assert_eq!(SMART_TASKS.len(), 7);
        assert_eq!(SMART_TASKS[0], "Study React for 1 hour");
    }
}
