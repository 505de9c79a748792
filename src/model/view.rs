use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::task::{Priority, TaskId};

/// Which tasks the list view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    /// Whether a task with the given `done` flag passes this filter
    pub fn admits(self, done: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => done,
            StatusFilter::Pending => !done,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Completed => write!(f, "completed"),
            StatusFilter::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" | "done" => Ok(StatusFilter::Completed),
            "pending" | "todo" => Ok(StatusFilter::Pending),
            other => Err(format!(
                "invalid filter '{}' (expected all, completed or pending)",
                other
            )),
        }
    }
}

/// An in-progress edit of one task. Exists only while an edit target is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: TaskId,
    pub text: String,
    pub priority: Priority,
}
