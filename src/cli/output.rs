use serde::Serialize;

use crate::io::persist::LoadIssue;
use crate::model::task::{Priority, Task, TaskId};
use crate::util::unicode::{pad_to_width, truncate_to_width};

/// Width of the id column in task listings ("#123").
const ID_COLUMN: usize = 5;
/// Longest priority label ("Medium").
const PRIORITY_COLUMN: usize = 6;
/// Task text is cut to this many cells in listings.
const MAX_TEXT_CELLS: usize = 72;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: TaskId,
    pub text: String,
    pub done: bool,
    pub priority: Priority,
}

#[derive(Serialize)]
pub struct AddedJson {
    pub added: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct SuggestJson {
    pub input: String,
    pub predicted: Priority,
    pub suggestions: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct ClassifyJson {
    pub text: String,
    pub priority: Priority,
}

#[derive(Serialize)]
pub struct VoiceJson {
    pub transcript: String,
    pub predicted: Priority,
    pub suggestions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<TaskJson>,
}

#[derive(Serialize)]
pub struct SummaryJson {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
    pub message: String,
}

#[derive(Serialize)]
pub struct ThemeJson {
    #[serde(rename = "darkMode")]
    pub dark_mode: bool,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id,
        text: task.text.clone(),
        done: task.done,
        priority: task.priority,
    }
}

pub fn summary_to_json(tasks: &[Task], message: &str) -> SummaryJson {
    let done = tasks.iter().filter(|t| t.done).count();
    SummaryJson {
        total: tasks.len(),
        done,
        pending: tasks.len() - done,
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn checkbox(done: bool) -> char {
    if done { 'x' } else { ' ' }
}

/// One listing row: `[x] #3    High   Pay rent`
pub fn format_task_line(task: &Task) -> String {
    format!(
        "[{}] {} {} {}",
        checkbox(task.done),
        pad_to_width(&task.id.to_string(), ID_COLUMN),
        pad_to_width(task.priority.as_str(), PRIORITY_COLUMN),
        truncate_to_width(&task.text, MAX_TEXT_CELLS)
    )
}

/// Numbered suggestion lines, 1-based to match `sd suggest --add <n>`.
pub fn format_suggestions(suggestions: &[&str]) -> Vec<String> {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  {}. {}", i + 1, s))
        .collect()
}

/// Short description of a load problem for stderr.
pub fn describe_load_issue(issue: &LoadIssue) -> String {
    match issue {
        LoadIssue::Blob { key, reason, .. } => format!("'{}' could not be loaded: {}", key, reason),
        LoadIssue::Record { index, reason, .. } => {
            format!("task record {} was dropped: {}", index, reason)
        }
    }
}
