//! Session state for one to-do list and the actions a front end can invoke.
//!
//! Every action that changes the task list writes the full list back to the
//! blob store before returning. Invalid input and ids that no longer resolve
//! are no-ops, not errors. The errors are a failed write and running out of
//! task ids.

use std::time::Duration;

use crate::io::blob_store::BlobStore;
use crate::io::persist::{self, LoadIssue, TASKS_KEY, THEME_KEY};
use crate::model::config::SearchConfig;
use crate::model::task::{Priority, Task, TaskId};
use crate::model::view::{EditDraft, StatusFilter};
use crate::ops::classify::classify;
use crate::ops::search::visible_tasks;
use crate::ops::suggest::{SMART_TASKS, suggest};
use crate::ops::summary::summarize;
use crate::ops::task_ops::{self, TaskError};
use crate::voice::{self, PendingTranscript, SpeechRecognizer, VoiceError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("could not save {key}: {source}")]
    Persist {
        key: &'static str,
        source: std::io::Error,
    },
    #[error("cannot add more tasks: every task id is in use")]
    IdsExhausted,
}

pub struct App<S: BlobStore> {
    store: S,
    search_config: SearchConfig,
    tasks: Vec<Task>,
    draft: String,
    draft_priority: Priority,
    suggestions: Vec<&'static str>,
    search_query: String,
    filter: StatusFilter,
    edit: Option<EditDraft>,
    dark_mode: bool,
    summary: Option<String>,
    pending_voice: Option<PendingTranscript>,
    load_issues: Vec<LoadIssue>,
}

impl<S: BlobStore> App<S> {
    /// Load persisted tasks and theme. Missing or corrupt data falls back to
    /// an empty list and light theme; see `load_issues` for what was dropped.
    pub fn load(store: S, search_config: SearchConfig) -> Self {
        let loaded = persist::load(&store);
        App {
            store,
            search_config,
            tasks: loaded.tasks,
            draft: String::new(),
            draft_priority: Priority::Low,
            suggestions: Vec::new(),
            search_query: String::new(),
            filter: StatusFilter::All,
            edit: None,
            dark_mode: loaded.dark_mode,
            summary: None,
            pending_voice: None,
            load_issues: loaded.issues,
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        task_ops::find_task(&self.tasks, id)
    }

    /// Tasks matching the current search query, then the status filter.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        visible_tasks(
            &self.tasks,
            &self.search_query,
            self.filter,
            &self.search_config,
        )
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_priority(&self) -> Priority {
        self.draft_priority
    }

    pub fn suggestions(&self) -> &[&'static str] {
        &self.suggestions
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn edit(&self) -> Option<&EditDraft> {
        self.edit.as_ref()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Last summary produced by `generate_summary`.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn voice_pending(&self) -> bool {
        self.pending_voice.is_some()
    }

    pub fn load_issues(&self) -> &[LoadIssue] {
        &self.load_issues
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // New-task entry
    // -----------------------------------------------------------------------

    /// Replace the entry draft and recompute suggestions for it.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.suggestions = suggest(&self.draft);
    }

    pub fn set_draft_priority(&mut self, priority: Priority) {
        self.draft_priority = priority;
    }

    /// Add the draft as a task. On success the draft, its priority and the
    /// suggestions are reset; an empty draft changes nothing.
    pub fn add_task(&mut self) -> Result<Option<TaskId>, AppError> {
        let draft = self.draft.clone();
        let Some(id) = self.add(&draft, self.draft_priority)? else {
            return Ok(None);
        };
        self.draft.clear();
        self.draft_priority = Priority::Low;
        self.suggestions.clear();
        Ok(Some(id))
    }

    /// Add a task directly, bypassing the draft. Empty text is a no-op.
    pub fn add(&mut self, text: &str, priority: Priority) -> Result<Option<TaskId>, AppError> {
        match task_ops::add_task(&mut self.tasks, text, priority) {
            Ok(id) => {
                self.persist_tasks()?;
                Ok(Some(id))
            }
            Err(TaskError::IdsExhausted) => Err(AppError::IdsExhausted),
            Err(_) => Ok(None),
        }
    }

    /// Add the suggestion at `index` with a predicted priority.
    pub fn accept_suggestion(&mut self, index: usize) -> Result<Option<TaskId>, AppError> {
        let Some(text) = self.suggestions.get(index).copied() else {
            return Ok(None);
        };
        self.add(text, classify(text))
    }

    /// Append the fixed study-task list, each with a predicted priority.
    pub fn generate_smart_tasks(&mut self) -> Result<Vec<TaskId>, AppError> {
        let ids = task_ops::bulk_append(&mut self.tasks, SMART_TASKS);
        self.persist_tasks()?;
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Open an edit session seeded from the task. Returns false if the id
    /// does not resolve.
    pub fn start_edit(&mut self, id: TaskId) -> bool {
        match task_ops::find_task(&self.tasks, id) {
            Some(task) => {
                self.edit = Some(EditDraft {
                    id,
                    text: task.text.clone(),
                    priority: task.priority,
                });
                true
            }
            None => false,
        }
    }

    pub fn set_edit_text(&mut self, text: impl Into<String>) {
        if let Some(edit) = &mut self.edit {
            edit.text = text.into();
        }
    }

    pub fn set_edit_priority(&mut self, priority: Priority) {
        if let Some(edit) = &mut self.edit {
            edit.priority = priority;
        }
    }

    /// Apply and close the edit session. The session is closed even when the
    /// edit is rejected (empty text, task gone); returns whether it applied.
    pub fn commit_edit(&mut self) -> Result<bool, AppError> {
        let Some(edit) = self.edit.take() else {
            return Ok(false);
        };
        match task_ops::update_task(&mut self.tasks, edit.id, &edit.text, edit.priority) {
            Ok(()) => {
                self.persist_tasks()?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    // -----------------------------------------------------------------------
    // List mutations
    // -----------------------------------------------------------------------

    /// Flip done. Returns the new value, or `None` if the id does not resolve.
    pub fn toggle_done(&mut self, id: TaskId) -> Result<Option<bool>, AppError> {
        match task_ops::toggle_done(&mut self.tasks, id) {
            Ok(done) => {
                self.persist_tasks()?;
                Ok(Some(done))
            }
            Err(_) => Ok(None),
        }
    }

    /// Delete a task, closing any edit session that targets it.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Ok(removed) = task_ops::remove_task(&mut self.tasks, id) else {
            return Ok(None);
        };
        if self.edit.as_ref().is_some_and(|e| e.id == id) {
            self.edit = None;
        }
        self.persist_tasks()?;
        Ok(Some(removed))
    }

    /// Reorder the stored list High → Medium → Low.
    pub fn sort_by_priority(&mut self) -> Result<(), AppError> {
        task_ops::sort_by_priority(&mut self.tasks);
        self.persist_tasks()
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn generate_summary(&mut self) -> &str {
        self.summary.insert(summarize(&self.tasks))
    }

    pub fn toggle_theme(&mut self) -> Result<bool, AppError> {
        self.dark_mode = !self.dark_mode;
        persist::save_dark_mode(&mut self.store, self.dark_mode).map_err(|source| {
            AppError::Persist {
                key: THEME_KEY,
                source,
            }
        })?;
        Ok(self.dark_mode)
    }

    // -----------------------------------------------------------------------
    // Voice
    // -----------------------------------------------------------------------

    /// Start capturing speech. Fails with `Unsupported` when the recognizer
    /// cannot run; the transcript is applied later by `poll_voice` or
    /// `wait_voice`. A new capture replaces any pending one.
    pub fn start_voice_capture(
        &mut self,
        recognizer: &mut dyn SpeechRecognizer,
    ) -> Result<(), VoiceError> {
        self.pending_voice = Some(voice::begin_capture(recognizer)?);
        Ok(())
    }

    /// Apply a delivered transcript, if any: it becomes the draft and drives
    /// the suggestions.
    pub fn poll_voice(&mut self) -> Option<Result<String, VoiceError>> {
        let result = self.pending_voice.as_ref()?.poll()?;
        self.pending_voice = None;
        Some(self.apply_transcript(result))
    }

    /// Block until the pending capture delivers or `timeout` passes.
    pub fn wait_voice(&mut self, timeout: Duration) -> Result<String, VoiceError> {
        let pending = self.pending_voice.take().ok_or(VoiceError::Disconnected)?;
        let result = pending.wait(timeout);
        self.apply_transcript(result)
    }

    fn apply_transcript(
        &mut self,
        result: Result<String, VoiceError>,
    ) -> Result<String, VoiceError> {
        let transcript = result?;
        self.set_draft(transcript.clone());
        Ok(transcript)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn persist_tasks(&mut self) -> Result<(), AppError> {
        persist::save_tasks(&mut self.store, &self.tasks).map_err(|source| AppError::Persist {
            key: TASKS_KEY,
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
