use std::collections::HashSet;
use std::io;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::io::blob_store::BlobStore;
use crate::model::task::{Priority, Task, TaskId};

/// Key holding the JSON task array.
pub const TASKS_KEY: &str = "todos";
/// Key holding the JSON dark-mode boolean.
pub const THEME_KEY: &str = "darkMode";

/// Something in the store that could not be loaded as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadIssue {
    /// The whole blob was unreadable or undecodable and was replaced by its default.
    Blob {
        key: &'static str,
        reason: String,
        raw: String,
    },
    /// One task record failed validation and was dropped.
    Record {
        index: usize,
        reason: String,
        raw: String,
    },
}

/// Result of loading the store. Never fails: bad data falls back to defaults.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub tasks: Vec<Task>,
    pub dark_mode: bool,
    pub issues: Vec<LoadIssue>,
}

/// A stored record before validation. `id` is optional so lists written
/// without identifiers still load; an unusable id is treated as missing.
#[derive(Deserialize)]
struct StoredTask {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<u64>,
    text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    done: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    priority: Priority,
}

/// Any positive integer up to `TaskId::MAX`; everything else is `None`.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().filter(|&n| n > 0 && n <= TaskId::MAX.0))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A record that passed validation and still needs its final id.
struct Pending {
    index: usize,
    raw: Value,
    id: Option<u64>,
    task: Task,
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

pub fn load(store: &dyn BlobStore) -> Loaded {
    let mut issues = Vec::new();
    let tasks = match read_blob(store, TASKS_KEY, &mut issues) {
        Some(raw) => decode_tasks(&raw, &mut issues),
        None => Vec::new(),
    };
    let dark_mode = match read_blob(store, THEME_KEY, &mut issues) {
        Some(raw) => decode_dark_mode(&raw, &mut issues),
        None => false,
    };
    Loaded {
        tasks,
        dark_mode,
        issues,
    }
}

fn read_blob(store: &dyn BlobStore, key: &'static str, issues: &mut Vec<LoadIssue>) -> Option<String> {
    let bytes = match store.get(key) {
        Ok(bytes) => bytes?,
        Err(e) => {
            issues.push(LoadIssue::Blob {
                key,
                reason: e.to_string(),
                raw: String::new(),
            });
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            issues.push(LoadIssue::Blob {
                key,
                reason: format!("{} (invalid bytes shown as \\xNN)", e.utf8_error()),
                raw: escape_invalid_utf8(e.as_bytes()),
            });
            None
        }
    }
}

/// Valid UTF-8 runs verbatim, every other byte as `\xNN`.
fn escape_invalid_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
        for b in chunk.invalid() {
            out.push_str(&format!("\\x{:02x}", b));
        }
    }
    out
}

/// Decode the task array, dropping records that fail validation and
/// assigning fresh ids to records with a missing or duplicate id.
pub fn decode_tasks(raw: &str, issues: &mut Vec<LoadIssue>) -> Vec<Task> {
    let records = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(records)) => records,
        Ok(Value::Null) => return Vec::new(),
        Ok(other) => {
            issues.push(LoadIssue::Blob {
                key: TASKS_KEY,
                reason: format!("expected an array, found {}", json_kind(&other)),
                raw: raw.to_string(),
            });
            return Vec::new();
        }
        Err(e) => {
            issues.push(LoadIssue::Blob {
                key: TASKS_KEY,
                reason: e.to_string(),
                raw: raw.to_string(),
            });
            return Vec::new();
        }
    };

    let mut valid = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match validate_record(&record) {
            Ok(stored) => valid.push(Pending {
                index,
                id: stored.id,
                task: Task {
                    id: TaskId(0),
                    text: stored.text,
                    done: stored.done,
                    priority: stored.priority,
                },
                raw: record,
            }),
            Err(reason) => issues.push(LoadIssue::Record {
                index,
                reason,
                raw: record.to_string(),
            }),
        }
    }

    assign_ids(valid, issues)
}

fn validate_record(record: &Value) -> Result<StoredTask, String> {
    let stored = StoredTask::deserialize(record).map_err(|e| e.to_string())?;
    if stored.text.trim().is_empty() {
        return Err("task text is empty".to_string());
    }
    Ok(stored)
}

/// Keep the first occurrence of each stored id; everything else gets
/// a fresh id above the highest kept one, in list order. A record that
/// would need an id beyond `TaskId::MAX` is dropped.
fn assign_ids(records: Vec<Pending>, issues: &mut Vec<LoadIssue>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let kept: Vec<Option<u64>> = records
        .iter()
        .map(|r| r.id.filter(|n| seen.insert(*n)))
        .collect();
    let highest = kept.iter().flatten().max().copied().unwrap_or(0);
    let mut next = next_free(highest);

    let mut tasks = Vec::with_capacity(records.len());
    for (record, id) in records.into_iter().zip(kept) {
        let id = match (id, next) {
            (Some(id), _) => id,
            (None, Some(fresh)) => {
                next = next_free(fresh);
                fresh
            }
            (None, None) => {
                issues.push(LoadIssue::Record {
                    index: record.index,
                    reason: "no task id left to assign".to_string(),
                    raw: record.raw.to_string(),
                });
                continue;
            }
        };
        tasks.push(Task {
            id: TaskId(id),
            ..record.task
        });
    }
    tasks
}

fn next_free(after: u64) -> Option<u64> {
    after.checked_add(1).filter(|&n| n <= TaskId::MAX.0)
}

fn decode_dark_mode(raw: &str, issues: &mut Vec<LoadIssue>) -> bool {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Bool(flag)) => flag,
        Ok(Value::Null) => false,
        Ok(other) => {
            issues.push(LoadIssue::Blob {
                key: THEME_KEY,
                reason: format!("expected a boolean, found {}", json_kind(&other)),
                raw: raw.to_string(),
            });
            false
        }
        Err(e) => {
            issues.push(LoadIssue::Blob {
                key: THEME_KEY,
                reason: e.to_string(),
                raw: raw.to_string(),
            });
            false
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

pub fn save_tasks(store: &mut dyn BlobStore, tasks: &[Task]) -> io::Result<()> {
    let json = serde_json::to_string(tasks)?;
    store.put(TASKS_KEY, &json)
}

pub fn save_dark_mode(store: &mut dyn BlobStore, dark_mode: bool) -> io::Result<()> {
    let json = serde_json::to_string(&dark_mode)?;
    store.put(THEME_KEY, &json)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
