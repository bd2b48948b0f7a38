//! # todo - personal task list with a trash bin
//!
//! Tasks carry a text, an optional due date, a completed flag and a trashed
//! flag. Derived status (pending, completed, overdue) is computed on demand
//! from the due date and the current time; the interactive UI re-evaluates it
//! on a fixed interval so tasks turn overdue without user action.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive UI
//! todo
//!
//! # Add a task from the shell
//! todo add "Submit assignment" --due "2025-05-01 23:00"
//!
//! # List the trash
//! todo list --tab trash
//!
//! # Empty the trash without prompting
//! todo empty-trash --yes
//! ```
//!
//! Data is stored in `~/.todo/todo-tasks.json` (override with `--data-dir`).
//! The UI writes its log to `todo.log` in the same directory.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

pub mod cli;
pub mod cmd;
pub mod confirm;
pub mod db;
pub mod due;
pub mod error;
pub mod fields;
pub mod notify;
pub mod store;
pub mod task;
pub mod ticker;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::{init_tracing, Cli};
use cmd::*;
use db::{FileStore, KeyValueStore, MemoryStore};
use store::TaskStore;

const LOG_FILE: &str = "todo.log";

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".todo")
}

fn run<S: KeyValueStore>(mut store: TaskStore<S>, command: Commands, refresh: Duration) {
    match command {
        Commands::Ui => {
            cmd_ui(store, refresh);
            return;
        }
        Commands::Add { text, due } => cmd_add(&mut store, text, due),
        Commands::Edit { id, text, due, clear_due } => cmd_edit(&mut store, id, text, due, clear_due),
        Commands::Toggle { id } => cmd_toggle(&mut store, id),
        Commands::Trash { id } => cmd_trash(&mut store, id),
        Commands::Restore { id } => cmd_restore(&mut store, id),
        Commands::Delete { id, yes } => cmd_delete(&mut store, id, yes),
        Commands::EmptyTrash { yes } => cmd_empty_trash(&mut store, yes),
        Commands::List { tab } => cmd_list(&store, tab),
        Commands::Completions { shell } => cmd_completions(shell),
    }
    finish(&mut store);
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Ui);

    // Completions need neither logging nor the task file.
    if let Commands::Completions { shell } = command {
        cmd_completions(shell);
        return;
    }

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    // The UI owns the terminal, so its log goes to a file.
    let log_file = match command {
        Commands::Ui if cli.in_memory => Some(std::env::temp_dir().join(LOG_FILE)),
        Commands::Ui => Some(data_dir.join(LOG_FILE)),
        _ => None,
    };
    if let Err(e) = init_tracing(cli.verbose, log_file.as_deref()) {
        eprintln!("Failed to initialise logging: {e}");
        std::process::exit(1);
    }

    let refresh = Duration::from_secs(cli.refresh_secs);
    if cli.in_memory {
        info!("using in-memory task store");
        run(TaskStore::open(MemoryStore::new()), command, refresh);
    } else {
        let store = TaskStore::open(FileStore::new(data_dir));
        info!(dir = %store.backend().dir().display(), "using file task store");
        run(store, command, refresh);
    }
}
