use crate::model::task::{Priority, Task, TaskId};
use crate::ops::classify::classify;

/// Error type for task operations
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("task text cannot be empty")]
    EmptyText,
    #[error("every task id is in use")]
    IdsExhausted,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Append a pending task. Nothing changes when the trimmed text is empty or
/// no id is left.
pub fn add_task(tasks: &mut Vec<Task>, text: &str, priority: Priority) -> Result<TaskId, TaskError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::EmptyText);
    }
    let id = next_id(tasks).ok_or(TaskError::IdsExhausted)?;
    tasks.push(Task::new(id, text, priority));
    Ok(id)
}

/// Replace a task's text and priority. `done` is left alone.
pub fn update_task(
    tasks: &mut [Task],
    id: TaskId,
    text: &str,
    priority: Priority,
) -> Result<(), TaskError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::EmptyText);
    }
    let task = find_task_mut(tasks, id).ok_or(TaskError::NotFound(id))?;
    task.text = text.to_string();
    task.priority = priority;
    Ok(())
}

/// Flip a task's done flag. Returns the new value.
pub fn toggle_done(tasks: &mut [Task], id: TaskId) -> Result<bool, TaskError> {
    let task = find_task_mut(tasks, id).ok_or(TaskError::NotFound(id))?;
    task.done = !task.done;
    Ok(task.done)
}

/// Remove a task, keeping the relative order of the rest.
pub fn remove_task(tasks: &mut Vec<Task>, id: TaskId) -> Result<Task, TaskError> {
    let idx = position(tasks, id).ok_or(TaskError::NotFound(id))?;
    Ok(tasks.remove(idx))
}

/// Reorder the whole list High → Medium → Low. Stable within a priority.
pub fn sort_by_priority(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.priority.rank());
}

/// Append a batch, classifying each text independently. Texts that cannot be
/// added (empty, or no id left) are skipped.
pub fn bulk_append<S: AsRef<str>>(tasks: &mut Vec<Task>, texts: &[S]) -> Vec<TaskId> {
    texts
        .iter()
        .filter_map(|text| {
            let text = text.as_ref();
            add_task(tasks, text, classify(text)).ok()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_task(tasks: &[Task], id: TaskId) -> Option<&Task> {
    tasks.iter().find(|t| t.id == id)
}

pub fn find_task_mut(tasks: &mut [Task], id: TaskId) -> Option<&mut Task> {
    tasks.iter_mut().find(|t| t.id == id)
}

fn position(tasks: &[Task], id: TaskId) -> Option<usize> {
    tasks.iter().position(|t| t.id == id)
}

/// Next free id: one past the highest id in the list, or `None` once that
/// would pass `TaskId::MAX`.
pub fn next_id(tasks: &[Task]) -> Option<TaskId> {
    tasks
        .iter()
        .map(|t| t.id.0)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .filter(|&n| n <= TaskId::MAX.0)
        .map(TaskId)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
