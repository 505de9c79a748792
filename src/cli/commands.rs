use clap::{Args, Parser, Subcommand};

use crate::model::task::{Priority, TaskId};
use crate::model::view::StatusFilter;

#[derive(Parser)]
#[command(name = "sd", about = concat!("smartdo v", env!("CARGO_PKG_VERSION"), " - a to-do list that guesses what matters"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .smartdo store in the current directory
    Init(InitArgs),
    /// Add a task
    Add(AddArgs),
    /// List tasks, optionally searched and filtered
    List(ListArgs),
    /// Change a task's text and/or priority
    Edit(EditArgs),
    /// Mark a task done, or pending again
    Toggle(IdArg),
    /// Delete a task
    Rm(IdArg),
    /// Reorder the list High → Medium → Low
    Sort,
    /// Append a batch of generated study tasks
    Smart,
    /// Print a progress summary
    Summary,
    /// Show suggestions for partial input
    Suggest(SuggestArgs),
    /// Show the predicted priority for some text
    Classify(ClassifyArgs),
    /// Capture a task by voice with the configured recognizer
    Voice(VoiceArgs),
    /// Show or toggle the dark-mode flag
    Theme(ThemeArgs),
    /// Show or change configuration
    Config(ConfigArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Rewrite the config even if a store already exists (tasks are kept)
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// Priority (high, medium, low)
    #[arg(short, long, conflicts_with = "auto")]
    pub priority: Option<Priority>,
    /// Predict the priority from the text
    #[arg(long)]
    pub auto: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Status filter (all, completed, pending)
    #[arg(short, long, default_value = "all")]
    pub filter: StatusFilter,
    /// Fuzzy search query
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (e.g. 3 or #3)
    pub id: TaskId,
    /// New text
    #[arg(short, long)]
    pub text: Option<String>,
    /// New priority
    #[arg(short, long)]
    pub priority: Option<Priority>,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID (e.g. 3 or #3)
    pub id: TaskId,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Partial task text
    pub text: String,
    /// Add the suggestion with this number (1-based)
    #[arg(long)]
    pub add: Option<usize>,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Task text
    pub text: String,
}

#[derive(Args)]
pub struct VoiceArgs {
    /// Add the transcript as a task with a predicted priority
    #[arg(long)]
    pub add: bool,
    /// Seconds to wait for a transcript (default: voice.timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// Flip the flag instead of showing it
    #[arg(long)]
    pub toggle: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Dotted key, e.g. search.threshold
    pub key: Option<String>,
    /// New value
    pub value: Option<String>,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Number of entries to show
    #[arg(long, default_value = "10")]
    pub limit: usize,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove entries older than 30 days
    Prune(PruneArgs),
    /// Print the log file path
    Path,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Remove every entry
    #[arg(long)]
    pub all: bool,
}
