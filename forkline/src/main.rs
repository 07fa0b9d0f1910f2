//! forkline - inspect and navigate branched chat conversation logs
//!
//! Reads a flat message log (JSON array or JSON Lines), rebuilds its branch
//! tree and lets you walk between branches and alternate responses.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/forkline/forkline.<date>.log (~/.local/state/forkline/)
//! - Config: $XDG_CONFIG_HOME/forkline/config.toml (~/.config/forkline/config.toml)

mod render;
mod watch;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use forkline_core::ingest::{self, LoadedLog, ParseOptions};
use forkline_core::{plan_retry, Config, ConversationView, Message};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "forkline")]
#[command(about = "Inspect and navigate branched chat conversation logs")]
#[command(version)]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/forkline/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail on invalid records instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the branches of a conversation
    Tree {
        /// Message log file
        log: PathBuf,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the messages of the active (or a given) branch
    Active {
        /// Message log file
        log: PathBuf,
        /// Branch to show instead of the auto-selected one
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the alternate responses of an assistant message
    Variants {
        /// Message log file
        log: PathBuf,
        /// Assistant message id
        message: String,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Switch to the n-th alternate of an assistant message (0-based)
    Select {
        /// Message log file
        log: PathBuf,
        /// Assistant message id
        message: String,
        /// Variant index
        index: usize,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Append a retry of an assistant message in a new branch
    Retry {
        /// Message log file
        log: PathBuf,
        /// Assistant message to retry
        message: String,
        /// Body of the new response
        #[arg(short, long)]
        content: Option<String>,
        /// Id of the new response (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Follow a log file and report new branches as they appear
    Watch {
        /// Message log file
        log: PathBuf,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        poll: u64,
        /// Stop after this many polls (0 = run until Ctrl+C)
        #[arg(long, default_value = "0")]
        iterations: u64,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let _log_guard =
        forkline_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("forkline starting");

    let options = ParseOptions {
        strict: args.strict,
    };

    match args.command {
        Command::Tree { log, format } => {
            let view = open_view(&config, &log, options)?;
            render::tree(&view, format)
        }
        Command::Active {
            log,
            branch,
            format,
        } => {
            let mut view = open_view(&config, &log, options)?;
            if let Some(branch) = branch {
                view.switch_to(branch);
            }
            render::active(&view, &config, format)
        }
        Command::Variants {
            log,
            message,
            format,
        } => {
            let view = open_view(&config, &log, options)?;
            render::variants(&view, &message, format)
        }
        Command::Select {
            log,
            message,
            index,
            format,
        } => {
            let mut view = open_view(&config, &log, options)?;
            if !view.select_variant(&message, index) {
                bail!("message '{}' has no variant at index {}", message, index);
            }
            render::active(&view, &config, format)
        }
        Command::Retry {
            log,
            message,
            content,
            id,
        } => run_retry(&config, &log, options, &message, content, id),
        Command::Watch {
            log,
            poll,
            iterations,
        } => watch::run(&config, &log, options, poll, iterations),
    }
}

/// Load a log and build a view over it.
fn open_view(config: &Config, path: &Path, options: ParseOptions) -> Result<ConversationView> {
    let messages = load_messages(path, options)?;
    let mut view = ConversationView::new(&config.navigation);
    view.update(messages);
    Ok(view)
}

/// Load a log, reporting skipped records on stderr.
fn load_messages(path: &Path, options: ParseOptions) -> Result<Vec<Message>> {
    let LoadedLog { messages, warnings } = ingest::load_log(path, options)
        .with_context(|| format!("failed to load message log {}", path.display()))?;

    for warning in &warnings {
        eprintln!("Warning: {}", warning);
    }
    Ok(messages)
}

fn run_retry(
    config: &Config,
    path: &Path,
    options: ParseOptions,
    target: &str,
    content: Option<String>,
    id: Option<String>,
) -> Result<()> {
    let messages = load_messages(path, options)?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let message_id = id.unwrap_or_else(|| format!("retry-{}", now_ms));

    if messages.iter().any(|m| m.id == message_id) {
        bail!("message id '{}' already exists in the log", message_id);
    }

    let Some(plan) = plan_retry(
        &messages,
        target,
        message_id,
        &config.navigation.branch_prefix,
        now_ms,
    ) else {
        bail!(
            "cannot retry '{}': not an assistant message with a known prompt",
            target
        );
    };

    let mut message = plan.message;
    message.content = content;
    ingest::append_message(path, &message).context("failed to append retry")?;

    println!(
        "Created {} in branch {} (retrying prompt {})",
        message.id, plan.branch_id, plan.origin_id
    );
    Ok(())
}
