//! Command implementations for the CLI interface.
//!
//! Each handler drives the same `TaskStore` the TUI uses, prints the
//! notifications the store emits, and exits non-zero on failure.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::confirm::{ConfirmOutcome, Confirmation, PendingAction};
use crate::db::KeyValueStore;
use crate::due::{format_due, format_due_relative, parse_due_input};
use crate::fields::*;
use crate::store::TaskStore;
use crate::task::{display_status, Task, TaskId};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface (the default).
    Ui,

    /// Add a new task.
    Add {
        /// What needs doing.
        text: String,
        /// Due date: YYYY-MM-DD[ HH:MM], "today", "tomorrow", or "in 3h" / "in 2d".
        #[arg(long)]
        due: Option<String>,
    },

    /// Change the text or due date of a task.
    Edit {
        /// Task ID.
        id: TaskId,
        /// New task text.
        #[arg(long)]
        text: Option<String>,
        /// New due date.
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Mark a task completed, or pending again.
    Toggle {
        /// Task ID.
        id: TaskId,
    },

    /// Move a task to the trash.
    Trash {
        /// Task ID.
        id: TaskId,
    },

    /// Bring a task back from the trash.
    Restore {
        /// Task ID.
        id: TaskId,
    },

    /// Permanently delete a task from the trash.
    Delete {
        /// Task ID.
        id: TaskId,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Permanently delete every task in the trash.
    EmptyTrash {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// List tasks, earliest due first.
    List {
        /// Which view to show.
        #[arg(long, value_enum, default_value_t = Tab::Active)]
        tab: Tab,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn fail(e: impl Display) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}

/// Print and drain the store's notifications. Errors go to stderr.
fn print_notifications<S: KeyValueStore>(store: &mut TaskStore<S>) {
    for n in store.take_notifications() {
        match n.kind {
            NotificationKind::Error => eprintln!("{}", n.message),
            _ => println!("{}", n.message),
        }
    }
}

fn parse_due(due: Option<&str>) -> Option<DateTime<Utc>> {
    let input = due?;
    parse_due_input(input, Utc::now()).unwrap_or_else(|e| fail(e))
}

/// Ask a y/N question for a destructive action. Anything but y/yes declines.
pub fn prompt_confirm<R: BufRead, W: Write>(
    action: PendingAction,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    writeln!(output, "{}", action.title())?;
    writeln!(output, "{}", action.message())?;
    write!(output, "Continue? [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Resolve a pending confirmation: confirmed up front with `--yes`, else ask.
fn run_confirmation<S: KeyValueStore, R: BufRead, W: Write>(
    store: &mut TaskStore<S>,
    action: PendingAction,
    yes: bool,
    input: &mut R,
    output: &mut W,
) -> Option<ConfirmOutcome> {
    let mut confirmation = Confirmation::new();
    confirmation.request(action);
    if !yes {
        match prompt_confirm(action, input, output) {
            Ok(true) => {}
            Ok(false) => {
                confirmation.cancel();
                println!("Cancelled.");
                return None;
            }
            Err(e) => fail(e),
        }
    }
    confirmation.confirm(store).unwrap_or_else(|e| fail(e))
}

/// Launch the TUI over `store`.
pub fn cmd_ui<S: KeyValueStore>(store: TaskStore<S>, refresh: Duration) {
    if let Err(e) = run_tui(store, refresh) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Add a new task.
pub fn cmd_add<S: KeyValueStore>(store: &mut TaskStore<S>, text: String, due: Option<String>) {
    let due = parse_due(due.as_deref());
    let task = store.add(&text, due).unwrap_or_else(|e| fail(e));
    print_notifications(store);
    println!("{}  {}", task.id, task.text);
}

/// Edit text and/or due date; unspecified parts keep their current value.
pub fn cmd_edit<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    id: TaskId,
    text: Option<String>,
    due: Option<String>,
    clear_due: bool,
) {
    let Some(task) = store.get(id) else {
        fail(format!("task {id} not found"));
    };
    if task.completed {
        fail(format!("task {id} is completed; toggle it first to edit"));
    }

    let text = text.unwrap_or_else(|| task.text.clone());
    let due = if clear_due {
        None
    } else if due.is_some() {
        parse_due(due.as_deref())
    } else {
        task.due_date
    };

    store.edit(id, &text, due).unwrap_or_else(|e| fail(e));
    print_notifications(store);
}

/// Flip the completed flag.
pub fn cmd_toggle<S: KeyValueStore>(store: &mut TaskStore<S>, id: TaskId) {
    let task = store.toggle_complete(id).unwrap_or_else(|e| fail(e));
    print_notifications(store);
    if task.completed {
        println!("Completed {id}");
    } else {
        println!("Reopened {id}");
    }
}

/// Move a task to the trash.
pub fn cmd_trash<S: KeyValueStore>(store: &mut TaskStore<S>, id: TaskId) {
    store.trash(id).unwrap_or_else(|e| fail(e));
    print_notifications(store);
}

/// Restore a task from the trash.
pub fn cmd_restore<S: KeyValueStore>(store: &mut TaskStore<S>, id: TaskId) {
    store.restore(id).unwrap_or_else(|e| fail(e));
    print_notifications(store);
}

/// Permanently delete a trashed task after confirmation.
pub fn cmd_delete<S: KeyValueStore>(store: &mut TaskStore<S>, id: TaskId, yes: bool) {
    let stdin = io::stdin();
    delete_task(store, id, yes, &mut stdin.lock(), &mut io::stdout());
}

fn delete_task<S: KeyValueStore, R: BufRead, W: Write>(
    store: &mut TaskStore<S>,
    id: TaskId,
    yes: bool,
    input: &mut R,
    output: &mut W,
) {
    match store.get(id) {
        None => {
            println!("Task {id} not found; nothing to delete.");
            return;
        }
        Some(task) if !task.is_deleted => {
            fail(format!("task {id} is not in the trash; run `todo trash {id}` first"));
        }
        Some(_) => {}
    }

    match run_confirmation(store, PendingAction::DeleteForever { id }, yes, input, output) {
        Some(ConfirmOutcome::Deleted(false)) => println!("Task {id} was already deleted."),
        Some(_) => print_notifications(store),
        None => {}
    }
}

/// Permanently delete everything in the trash after confirmation.
pub fn cmd_empty_trash<S: KeyValueStore>(store: &mut TaskStore<S>, yes: bool) {
    let stdin = io::stdin();
    empty_trash(store, yes, &mut stdin.lock(), &mut io::stdout());
}

fn empty_trash<S: KeyValueStore, R: BufRead, W: Write>(
    store: &mut TaskStore<S>,
    yes: bool,
    input: &mut R,
    output: &mut W,
) {
    if store.trash_count() == 0 {
        println!("Trash is empty.");
        return;
    }

    if let Some(ConfirmOutcome::TrashEmptied(n)) =
        run_confirmation(store, PendingAction::EmptyTrash, yes, input, output)
    {
        print_notifications(store);
        println!("Removed {n} task(s).");
    }
}

/// List one tab of the collection.
pub fn cmd_list<S: KeyValueStore>(store: &TaskStore<S>, tab: Tab) {
    let now = Utc::now();
    let view = store.list_view(tab);

    println!("{}", format_heading(tab, store.pending_count()));
    if view.is_empty() {
        match tab {
            Tab::Active => println!("No tasks available."),
            Tab::Trash => println!("Trash is empty."),
        }
        return;
    }
    print_table(&view, tab, now);
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

/// Write collection to disk if the last write failed; exits non-zero if it still fails.
pub fn finish<S: KeyValueStore>(store: &mut TaskStore<S>) {
    if store.is_dirty() {
        if let Err(e) = store.flush() {
            fail(format!("changes could not be saved: {e}"));
        }
    }
}

fn table_line(task: &Task, tab: Tab, now: DateTime<Utc>) -> String {
    let status = format_status(display_status(task, tab, now));
    let relative = if task.completed {
        String::new()
    } else {
        format_due_relative(task.due_date, now)
    };
    format!(
        "{:<14} {:<8} {:<17} {:<9} {}",
        task.id,
        status,
        format_due(task.due_date),
        relative,
        task.text
    )
}

/// Print tasks as a fixed-width table.
pub fn print_table(tasks: &[&Task], tab: Tab, now: DateTime<Utc>) {
    println!(
        "{:<14} {:<8} {:<17} {:<9} {}",
        "ID", "STATUS", "DUE", "", "TASK"
    );
    for t in tasks {
        println!("{}", table_line(t, tab, now));
    }
}
