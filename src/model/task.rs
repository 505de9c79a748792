use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Priority tag on a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Sort rank: High sorts first
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Parse the exact stored label (`"High"`, `"Medium"`, `"Low"`)
    pub fn from_label(s: &str) -> Option<Priority> {
        match s {
            "High" => Some(Priority::High),
            "Medium" => Some(Priority::Medium),
            "Low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Case-insensitive; also accepts the single-letter forms `h`, `m`, `l`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            other => Err(format!(
                "invalid priority '{}' (expected high, medium or low)",
                other
            )),
        }
    }
}

/// Stable task identifier, assigned at creation and never derived from position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Largest id ever stored: the biggest integer a JSON number carries
    /// exactly in every reader. Stored ids above it are treated as missing.
    pub const MAX: TaskId = TaskId((1 << 53) - 1);
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    /// Accepts `3` or `#3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        match digits.parse::<u64>() {
            Ok(n) if n > 0 && n <= TaskId::MAX.0 => Ok(TaskId(n)),
            _ => Err(format!("invalid task id '{}'", s)),
        }
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    /// Create a pending task
    pub fn new(id: TaskId, text: impl Into<String>, priority: Priority) -> Self {
        Task {
            id,
            text: text.into(),
            done: false,
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rank_order() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("l".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_labels_are_exact() {
        assert_eq!(Priority::from_label("High"), Some(Priority::High));
        assert_eq!(Priority::from_label("high"), None);
        for p in Priority::ALL {
            assert_eq!(Priority::from_label(p.as_str()), Some(p));
        }
    }

    #[test]
    fn task_id_parse_and_display() {
        assert_eq!("#12".parse::<TaskId>().unwrap(), TaskId(12));
        assert_eq!("7".parse::<TaskId>().unwrap(), TaskId(7));
        assert!("0".parse::<TaskId>().is_err());
        assert!("abc".parse::<TaskId>().is_err());
        assert!("9007199254740992".parse::<TaskId>().is_err());
        assert_eq!(TaskId(4).to_string(), "#4");
    }

    #[test]
    fn task_serializes_with_priority_label() {
        let task = Task::new(TaskId(1), "Pay rent", Priority::High);
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"text":"Pay rent","done":false,"priority":"High"}"#
        );
    }
}
