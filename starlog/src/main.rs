//! starlog - task and focus-session tracker
//!
//! Command-line front end over the starlog-core application state.

mod commands;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use starlog_core::{AppState, Config, Database, SystemClock, TemplateStore};

#[derive(Parser)]
#[command(name = "starlog")]
#[command(about = "Track tasks and focus sessions, earn stars, spend them on rewards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Run and review focus sessions
    #[command(subcommand)]
    Session(SessionCommand),

    /// Browse and buy rewards
    #[command(subcommand)]
    Reward(RewardCommand),

    /// Show statistics over all completed sessions
    Stats {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the star balance
    Balance,

    /// Manage evaluation templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// First-run walkthrough
    #[command(subcommand)]
    Tutorial(TutorialCommand),
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Create a task
    Add {
        name: String,
        #[arg(short, long)]
        goal: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List tasks, newest first
    List,
    /// Change a task's fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        goal: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Mark a task complete
    Complete {
        id: String,
        /// Free-form outcome to record
        #[arg(short, long)]
        result: Option<String>,
    },
    /// Mark a completed task as open again
    Reopen { id: String },
    /// Delete a task and its sessions
    Remove { id: String },
    /// Delete every task and their sessions
    Clear,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Start a session (replaces any active one)
    Start {
        /// Template id; defaults to the first template
        #[arg(short, long)]
        template: Option<String>,
        /// Planned length in minutes
        #[arg(short, long)]
        minutes: Option<u32>,
        /// Attach the session to a task
        #[arg(long)]
        task: Option<String>,
    },
    /// Finish the active session
    End(EndArgs),
    /// Discard the active session
    Cancel,
    /// Show the active session
    Status,
    /// List completed sessions
    List {
        /// Only sessions attached to this task
        #[arg(long)]
        task: Option<String>,
    },
    /// Edit name, notes or group of a completed session
    Note {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
    /// Delete all session history
    Clear,
}

#[derive(Args)]
struct EndArgs {
    /// Text answer, as QUESTION_ID=TEXT (repeatable)
    #[arg(long = "answer", value_name = "QID=TEXT")]
    answers: Vec<String>,

    /// Rating, as QUESTION_ID=N (repeatable)
    #[arg(long = "rating", value_name = "QID=N")]
    ratings: Vec<String>,
}

#[derive(Subcommand)]
enum RewardCommand {
    /// List rewards with their state for the current balance
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Add a custom reward
    Add {
        name: String,
        /// Star cost (whole number)
        #[arg(short, long, allow_negative_numbers = true)]
        cost: Option<f64>,
        #[arg(short, long)]
        emoji: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Buy a reward
    Buy { id: String },
    /// Show purchase history, newest first
    History,
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List templates
    List,
    /// Show a template's questions
    Show { id: String },
    /// Add or replace a template from a JSON file
    Add { file: std::path::PathBuf },
    /// Delete a template (the last one is kept)
    Delete { id: String },
}

#[derive(Subcommand)]
enum TutorialCommand {
    /// Show walkthrough progress
    Status,
    /// Start the walkthrough from the first step
    Start,
    /// Complete the current step
    Next,
    /// Dismiss the walkthrough
    Skip,
    /// Forget all progress
    Reset,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, stdout is for command output)
    let _log_guard =
        starlog_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = config.resolved_database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let templates = TemplateStore::new(config.resolved_templates_path());
    templates
        .ensure_default()
        .context("failed to write default templates")?;

    let mut app = AppState::load(Arc::new(db), Arc::new(SystemClock), config.rewards);

    match cli.command {
        Command::Task(cmd) => commands::task(&mut app, cmd),
        Command::Session(cmd) => commands::session(&mut app, &templates, cmd),
        Command::Reward(cmd) => commands::reward(&mut app, cmd),
        Command::Stats { format } => commands::stats(&app, format),
        Command::Balance => commands::balance(&app),
        Command::Template(cmd) => commands::template(&templates, cmd),
        Command::Tutorial(cmd) => commands::tutorial(&mut app, cmd),
    }
}
