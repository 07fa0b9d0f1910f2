//! Watch mode: poll a log file and report tree changes.

use crate::load_messages;
use anyhow::{Context, Result};
use forkline_core::ingest::ParseOptions;
use forkline_core::{Config, ConversationView};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Run continuous watch mode
pub fn run(
    config: &Config,
    path: &Path,
    options: ParseOptions,
    poll_ms: u64,
    iterations: u64,
) -> Result<()> {
    // Set up signal handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let poll_duration = Duration::from_millis(poll_ms);
    let mut view = ConversationView::new(&config.navigation);

    println!(
        "Watching {} (poll every {}ms). Press Ctrl+C to stop.",
        path.display(),
        poll_ms
    );

    let mut iteration = 0u64;

    while running.load(Ordering::SeqCst) {
        iteration += 1;

        match load_messages(path, options) {
            Ok(messages) => {
                let update = view.update(messages);
                if update.rebuilt {
                    let timestamp = chrono::Local::now().format("%H:%M:%S");
                    println!(
                        "[{}] {} message(s), {} branch(es), showing {} ({} message(s))",
                        timestamp,
                        view.messages().len(),
                        view.tree().branch_count(),
                        view.current_branch_id(),
                        view.active_messages().len()
                    );
                    if let Some(branch_id) = &update.auto_switched_to {
                        println!("  Switched to new branch {}", branch_id);
                    }

                    tracing::info!(
                        iteration,
                        messages = view.messages().len(),
                        branches = view.tree().branch_count(),
                        "watch rebuild"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read log in watch mode");
                eprintln!("Warning: {:#}", e);
            }
        }

        if iterations > 0 && iteration >= iterations {
            break;
        }

        thread::sleep(poll_duration);
    }

    println!("Watch mode stopped.");
    tracing::info!("forkline watch mode stopped");

    Ok(())
}
