use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::io::lock::FileLock;
use crate::model::task::Task;

/// Log size above which entries older than `PRUNE_AGE_DAYS` are dropped on write (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- smartdo recovery log: data that could not be loaded or saved normally.
     View with: sd recovery
     Prune old entries: sd recovery prune
     Safe to delete if empty or stale. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A stored blob or record could not be decoded and was replaced by a default
    Decode,
    /// A blob write failed; the body holds the content that was not saved
    Write,
    /// A task was deleted
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Decode => write!(f, "decode"),
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Delete => write!(f, "delete"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "decode" => Some(RecoveryCategory::Decode),
            "write" => Some(RecoveryCategory::Write),
            "delete" => Some(RecoveryCategory::Delete),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

pub fn recovery_log_path(store_dir: &Path) -> PathBuf {
    store_dir.join(".recovery.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry formatting
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    /// Markdown block as stored in the log.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} | {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            let fence = body_fence(&self.body);
            out.push_str(&format!("\n{}text\n", fence));
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }

        out.push_str("\n---\n");
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

/// A backtick fence longer than any backtick run opening a body line, so
/// the body can never close its own block.
fn body_fence(body: &str) -> String {
    let longest = body
        .lines()
        .map(|line| line.len() - line.trim_start_matches('`').len())
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append an entry to the log. Errors are swallowed and printed to stderr.
pub fn log_recovery(store_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = log_recovery_inner(store_dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn log_recovery_inner(store_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(store_dir);

    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > MAX_LOG_SIZE
    {
        let content = std::fs::read_to_string(&path)?;
        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        let (trimmed, _) = prune_entries_before(&content, &cutoff);
        atomic_write(&path, trimmed.as_bytes())?;
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Record a deleted task so it can be restored by hand.
pub fn log_task_deletion(store_dir: &Path, task: &Task) {
    let body = serde_json::to_string_pretty(task).unwrap_or_else(|_| task.text.clone());
    log_recovery(
        store_dir,
        RecoveryEntry::new(RecoveryCategory::Delete, format!("task {} deleted", task.id))
            .field("Task", task.id.to_string())
            .body(body),
    );
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read entries, most recent first.
pub fn read_recovery_entries(store_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let content = match std::fs::read_to_string(recovery_log_path(store_dir)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    split_log(content).1.into_iter().map(|b| b.entry).collect()
}

/// One entry and the exact log text it was parsed from.
struct LogBlock {
    entry: RecoveryEntry,
    text: String,
}

/// Split a log into the text before the first entry and the entries
/// themselves. Fenced bodies are opaque: a body line never starts or ends
/// an entry.
fn split_log(content: &str) -> (String, Vec<LogBlock>) {
    let mut preamble = String::new();
    let mut blocks: Vec<LogBlock> = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some((timestamp, category, description)) =
            line.strip_prefix("## ").and_then(parse_entry_header)
        else {
            let text = match blocks.last_mut() {
                Some(block) => &mut block.text,
                None => &mut preamble,
            };
            text.push_str(line);
            text.push('\n');
            continue;
        };

        let mut text = format!("{}\n", line);
        let mut fields = Vec::new();
        let mut body = String::new();
        let mut fence: Option<&str> = None;

        for line in lines.by_ref() {
            text.push_str(line);
            text.push('\n');
            if let Some(close) = fence {
                if line == close {
                    fence = None;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                fence = Some(line.trim_end_matches(|c: char| c != '`'));
                continue;
            }
            if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        blocks.push(LogBlock {
            entry: RecoveryEntry {
                timestamp,
                category,
                description,
                fields,
                body,
            },
            text,
        });
    }

    (preamble, blocks)
}

/// Parse `<timestamp> | <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp_str, rest) = header.split_once(" | ")?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);
    let (category_str, description) = rest.split_once(": ")?;
    let category = RecoveryCategory::parse_category(category_str)?;
    Some((timestamp, category, description.to_string()))
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Prune entries older than `PRUNE_AGE_DAYS` (or every entry when `all`).
/// Returns the number of entries removed.
pub fn prune_recovery(store_dir: &Path, all: bool) -> io::Result<usize> {
    let path = recovery_log_path(store_dir);
    if !path.exists() {
        return Ok(0);
    }

    let _lock = FileLock::acquire_default(store_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::WouldBlock, e.to_string()))?;

    let content = std::fs::read_to_string(&path)?;
    if all {
        let count = parse_entries(&content).len();
        atomic_write(&path, FILE_HEADER.as_bytes())?;
        return Ok(count);
    }

    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let (trimmed, removed) = prune_entries_before(&content, &cutoff);
    atomic_write(&path, trimmed.as_bytes())?;
    Ok(removed)
}

/// Drop entries stamped before `cutoff`, keeping the file header and the
/// text of every kept entry as written. Returns the new log and how many
/// entries were dropped.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> (String, usize) {
    let (mut result, blocks) = split_log(content);
    let mut removed = 0;
    for block in blocks {
        if block.entry.timestamp >= *cutoff {
            result.push_str(&block.text);
        } else {
            removed += 1;
        }
    }
    (result, removed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
