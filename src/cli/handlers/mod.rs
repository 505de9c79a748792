mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Global override for the start directory (set by -C flag)
static START_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::app::{App, AppError};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::blob_store::DirBlobStore;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::io::persist::{LoadIssue, TASKS_KEY, THEME_KEY};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::store_io;
use crate::model::config::Config;
use crate::model::task::TaskId;
use crate::ops::classify::classify;
use crate::ops::suggest::suggest;
use crate::voice::CommandRecognizer;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    // Store -C override for start_dir()
    if let Some(ref dir) = cli.dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        START_DIR_OVERRIDE.lock().unwrap().replace(abs);
    }

    match cli.command {
        Commands::Init(args) => cmd_init(args),

        // Read commands
        Commands::List(args) => cmd_list(args, json),
        Commands::Summary => cmd_summary(json),
        Commands::Suggest(args) => cmd_suggest(args, json),
        Commands::Classify(args) => cmd_classify(args, json),

        // Write commands
        Commands::Add(args) => cmd_add(args, json),
        Commands::Edit(args) => cmd_edit(args, json),
        Commands::Toggle(args) => cmd_toggle(args, json),
        Commands::Rm(args) => cmd_rm(args, json),
        Commands::Sort => cmd_sort(json),
        Commands::Smart => cmd_smart(json),
        Commands::Voice(args) => cmd_voice(args, json),
        Commands::Theme(args) => cmd_theme(args, json),

        // Maintenance
        Commands::Config(args) => cmd_config(args, json),
        Commands::Recovery(args) => cmd_recovery(args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir() -> std::io::Result<PathBuf> {
    match START_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir(),
    }
}

fn find_store_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(store_io::discover_store(&start_dir()?)?)
}

/// A loaded store. Write sessions hold the store lock until dropped.
struct Session {
    store_dir: PathBuf,
    config: Config,
    app: App<DirBlobStore>,
    _lock: Option<FileLock>,
}

impl Session {
    fn open(write: bool) -> Result<Session, Box<dyn std::error::Error>> {
        let store_dir = find_store_dir()?;
        let lock = if write {
            Some(FileLock::acquire_default(&store_dir)?)
        } else {
            None
        };
        let config = store_io::load_config(&store_dir)?;
        let app = App::load(DirBlobStore::new(&store_dir), config.search.clone());
        for issue in app.load_issues() {
            eprintln!("warning: {}", describe_load_issue(issue));
        }
        Ok(Session {
            store_dir,
            config,
            app,
            _lock: lock,
        })
    }

    /// Copy the undecodable data a successful write to `key` just replaced
    /// into the recovery log. Called only after the write, so failed
    /// commands leave the log untouched.
    fn preserve_issues(&self, key: &str) {
        for issue in self.app.load_issues() {
            let entry = match issue {
                LoadIssue::Blob {
                    key: issue_key,
                    reason,
                    raw,
                } if *issue_key == key => {
                    RecoveryEntry::new(RecoveryCategory::Decode, format!("{} unreadable", key))
                        .field("Key", key)
                        .field("Reason", reason.as_str())
                        .body(raw.as_str())
                }
                LoadIssue::Record { index, reason, raw } if key == TASKS_KEY => {
                    RecoveryEntry::new(RecoveryCategory::Decode, "task record dropped")
                        .field("Key", key)
                        .field("Index", index.to_string())
                        .field("Reason", reason.as_str())
                        .body(raw.as_str())
                }
                _ => continue,
            };
            recovery::log_recovery(&self.store_dir, entry);
        }
    }

    /// Pass a write result through, logging the unsaved content on failure.
    fn saved<T>(&self, result: Result<T, AppError>) -> Result<T, Box<dyn std::error::Error>> {
        result.map_err(|err| {
            if let AppError::Persist { key, ref source } = err {
                let body = if key == THEME_KEY {
                    self.app.dark_mode().to_string()
                } else {
                    serde_json::to_string_pretty(self.app.tasks()).unwrap_or_default()
                };
                recovery::log_recovery(
                    &self.store_dir,
                    RecoveryEntry::new(RecoveryCategory::Write, format!("could not save {}", key))
                        .field("Key", key)
                        .field("Error", source.to_string())
                        .body(body),
                );
            }
            err.into()
        })
    }
}

fn not_found(id: TaskId) -> Box<dyn std::error::Error> {
    format!("task not found: {}", id).into()
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_task_ids(session: &Session, ids: &[TaskId], json: bool) -> CmdResult {
    let added: Vec<_> = ids.iter().filter_map(|id| session.app.task(*id)).collect();
    if json {
        return print_json(&AddedJson {
            added: added.into_iter().map(task_to_json).collect(),
        });
    }
    for task in added {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool) -> CmdResult {
    let mut session = Session::open(false)?;
    session.app.set_filter(args.filter);
    if let Some(query) = args.search {
        session.app.set_search_query(query);
    }
    let visible = session.app.visible_tasks();

    if json {
        let tasks: Vec<TaskJson> = visible.into_iter().map(task_to_json).collect();
        return print_json(&tasks);
    }
    for task in visible {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

fn cmd_summary(json: bool) -> CmdResult {
    let mut session = Session::open(false)?;
    let message = session.app.generate_summary().to_string();
    if json {
        return print_json(&summary_to_json(session.app.tasks(), &message));
    }
    println!("{}", message);
    Ok(())
}

fn cmd_suggest(args: SuggestArgs, json: bool) -> CmdResult {
    if let Some(n) = args.add {
        return cmd_suggest_add(&args.text, n, json);
    }

    let suggestions = suggest(&args.text);
    let predicted = classify(&args.text);
    if json {
        return print_json(&SuggestJson {
            input: args.text,
            predicted,
            suggestions,
        });
    }
    println!("predicted priority: {}", predicted);
    if suggestions.is_empty() {
        println!("no suggestions");
    }
    for line in format_suggestions(&suggestions) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_suggest_add(text: &str, n: usize, json: bool) -> CmdResult {
    let mut session = Session::open(true)?;
    session.app.set_draft(text);
    let count = session.app.suggestions().len();
    if n == 0 || n > count {
        return Err(format!("no suggestion {} for '{}' ({} available)", n, text, count).into());
    }
    let result = session.app.accept_suggestion(n - 1);
    let id = session
        .saved(result)?
        .ok_or_else(|| format!("no suggestion {} for '{}'", n, text))?;
    session.preserve_issues(TASKS_KEY);
    print_task_ids(&session, &[id], json)
}

fn cmd_classify(args: ClassifyArgs, json: bool) -> CmdResult {
    let priority = classify(&args.text);
    if json {
        return print_json(&ClassifyJson {
            text: args.text,
            priority,
        });
    }
    println!("{}", priority);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, json: bool) -> CmdResult {
    let mut session = Session::open(true)?;
    let priority = if args.auto {
        classify(&args.text)
    } else {
        args.priority.unwrap_or_default()
    };

    let result = session.app.add(&args.text, priority);
    let id = session.saved(result)?.ok_or("nothing to add")?;
    session.preserve_issues(TASKS_KEY);
    if json {
        return print_task_ids(&session, &[id], true);
    }
    println!("{}", id);
    Ok(())
}

fn cmd_edit(args: EditArgs, json: bool) -> CmdResult {
    if args.text.is_none() && args.priority.is_none() {
        return Err("nothing to change (use --text and/or --priority)".into());
    }
    let mut session = Session::open(true)?;
    if !session.app.start_edit(args.id) {
        return Err(not_found(args.id));
    }
    if let Some(text) = args.text {
        session.app.set_edit_text(text);
    }
    if let Some(priority) = args.priority {
        session.app.set_edit_priority(priority);
    }

    let result = session.app.commit_edit();
    if !session.saved(result)? {
        return Err("nothing to save: task text is empty".into());
    }
    session.preserve_issues(TASKS_KEY);
    print_task_ids(&session, &[args.id], json)
}

fn cmd_toggle(args: IdArg, json: bool) -> CmdResult {
    let mut session = Session::open(true)?;
    let result = session.app.toggle_done(args.id);
    let done = session.saved(result)?.ok_or_else(|| not_found(args.id))?;
    session.preserve_issues(TASKS_KEY);
    if json {
        return print_task_ids(&session, &[args.id], true);
    }
    println!("{} → {}", args.id, if done { "done" } else { "pending" });
    Ok(())
}

fn cmd_rm(args: IdArg, json: bool) -> CmdResult {
    let mut session = Session::open(true)?;
    let result = session.app.delete_task(args.id);
    let removed = session.saved(result)?.ok_or_else(|| not_found(args.id))?;
    session.preserve_issues(TASKS_KEY);
    recovery::log_task_deletion(&session.store_dir, &removed);
    if json {
        return print_json(&task_to_json(&removed));
    }
    println!("removed {} {}", removed.id, removed.text);
    Ok(())
}

fn cmd_sort(json: bool) -> CmdResult {
    let mut session = Session::open(true)?;
    let result = session.app.sort_by_priority();
    session.saved(result)?;
    session.preserve_issues(TASKS_KEY);
    if json {
        let tasks: Vec<TaskJson> = session.app.tasks().iter().map(task_to_json).collect();
        return print_json(&tasks);
    }
    for task in session.app.tasks() {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

fn cmd_smart(json: bool) -> CmdResult {
    let mut session = Session::open(true)?;
    let result = session.app.generate_smart_tasks();
    let ids = session.saved(result)?;
    session.preserve_issues(TASKS_KEY);
    print_task_ids(&session, &ids, json)
}

fn cmd_voice(args: VoiceArgs, json: bool) -> CmdResult {
    let mut session = Session::open(false)?;
    let timeout = args.timeout.unwrap_or(session.config.voice.timeout_secs);
    let mut recognizer = CommandRecognizer::from_config(&session.config.voice);

    session.app.start_voice_capture(recognizer.as_mut())?;
    let transcript = session.app.wait_voice(Duration::from_secs(timeout))?;
    let suggestions = session.app.suggestions().to_vec();
    let predicted = classify(&transcript);

    let added = if args.add {
        // Reload under the lock so the add lands on the latest list
        let mut writer = Session::open(true)?;
        let result = writer.app.add(&transcript, predicted);
        let id = writer.saved(result)?.ok_or("nothing to add")?;
        writer.preserve_issues(TASKS_KEY);
        writer.app.task(id).map(task_to_json)
    } else {
        None
    };

    if json {
        return print_json(&VoiceJson {
            transcript,
            predicted,
            suggestions,
            added,
        });
    }
    println!("{}", transcript);
    for line in format_suggestions(&suggestions) {
        println!("{}", line);
    }
    if let Some(task) = added {
        println!("added {} ({})", task.id, task.priority);
    }
    Ok(())
}

fn cmd_theme(args: ThemeArgs, json: bool) -> CmdResult {
    let mut session = Session::open(args.toggle)?;
    if args.toggle {
        let result = session.app.toggle_theme();
        session.saved(result)?;
        session.preserve_issues(THEME_KEY);
    }
    let dark_mode = session.app.dark_mode();
    if json {
        return print_json(&ThemeJson { dark_mode });
    }
    println!("{}", if dark_mode { "dark" } else { "light" });
    Ok(())
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

fn cmd_config(args: ConfigArgs, json: bool) -> CmdResult {
    let store_dir = find_store_dir()?;
    match (args.key, args.value) {
        (None, _) => {
            if json {
                return print_json(&store_io::load_config(&store_dir)?);
            }
            let doc = config_io::read_config_doc(&store_dir)?;
            print!("{}", doc);
        }
        (Some(key), None) => {
            let doc = config_io::read_config_doc(&store_dir)?;
            let value =
                config_io::get_value(&doc, &key).ok_or_else(|| format!("config key not set: {}", key))?;
            println!("{}", value);
        }
        (Some(key), Some(value)) => {
            let _lock = FileLock::acquire_default(&store_dir)?;
            let mut doc = config_io::read_config_doc(&store_dir)?;
            config_io::set_value(&mut doc, &key, &value)?;
            config_io::write_config_doc(&store_dir, &doc)?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryCmd, json: bool) -> CmdResult {
    let store_dir = find_store_dir()?;
    match args.action {
        None => show_recovery(&store_dir, args.limit, json),
        Some(RecoveryAction::Prune(prune)) => {
            let removed = recovery::prune_recovery(&store_dir, prune.all)?;
            println!("pruned {} recovery entries", removed);
            Ok(())
        }
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&store_dir).display());
            Ok(())
        }
    }
}

fn show_recovery(store_dir: &Path, limit: usize, json: bool) -> CmdResult {
    let entries = recovery::read_recovery_entries(store_dir, Some(limit));
    if json {
        let values: Vec<_> = entries.iter().map(RecoveryEntry::to_json).collect();
        return print_json(&values);
    }
    if entries.is_empty() {
        println!("recovery log is empty");
    }
    for entry in &entries {
        print!("{}", entry.to_markdown());
    }
    Ok(())
}
