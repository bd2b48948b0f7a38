use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd::Commands;

/// Personal to-do list with a trash bin.
/// Tasks live in `<data-dir>/todo-tasks.json`; the data dir defaults to ~/.todo.
#[derive(Parser)]
#[command(name = "todo", version, about = "Personal to-do list with trash and due dates")]
pub struct Cli {
    /// Directory holding the task file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep tasks in memory only; nothing is written to disk.
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// Seconds between overdue re-evaluations in the UI.
    #[arg(long, global = true, default_value_t = 60)]
    pub refresh_secs: u64,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the `-v` level. With `log_file` set, output is
/// appended there instead of stderr so it stays off the terminal UI.
pub fn init_tracing(verbose: u8, log_file: Option<&Path>) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level(verbose)))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid RUST_LOG: {e}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true);

    let init_result = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .try_init(),
    };

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }
    Ok(())
}
