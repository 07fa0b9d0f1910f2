//! Ingestion boundary for flat message logs
//!
//! Message logs arrive as either a JSON array of records or JSON Lines (one
//! record per line). Every record is validated before it becomes a
//! [`Message`]; the branch machinery never sees unchecked data.
//!
//! ## Design Principles
//!
//! 1. **Resilience**: a bad record produces a warning and is skipped, unless
//!    strict mode is requested
//! 2. **Order preserving**: records keep their file order, which the tree
//!    builder relies on to break timestamp ties
//! 3. **Unique ids**: the first record with a given id wins
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forkline_core::ingest::{load_log, ParseOptions};
//!
//! let log = load_log(Path::new("chat.jsonl"), ParseOptions::default())?;
//! for warning in &log.warnings {
//!     eprintln!("{}", warning);
//! }
//! let tree = forkline_core::build_tree(&log.messages);
//! ```

mod record;

use crate::error::{Error, Result};
use crate::types::Message;
use record::RawMessage;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// How the records of a log are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// A single JSON array
    JsonArray,
    /// One JSON object per line
    JsonLines,
}

impl LogFormat {
    /// Detect the format from the first non-whitespace character.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('[') {
            LogFormat::JsonArray
        } else {
            LogFormat::JsonLines
        }
    }
}

/// Parse behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Fail on the first invalid record instead of skipping it
    pub strict: bool,
}

/// Messages read from a log, plus what had to be skipped.
#[derive(Debug, Default)]
pub struct LoadedLog {
    /// Valid messages in file order
    pub messages: Vec<Message>,
    /// Non-fatal problems, one per skipped record
    pub warnings: Vec<String>,
}

/// Read and validate a message log file.
pub fn load_log(path: &Path, options: ParseOptions) -> Result<LoadedLog> {
    let content = std::fs::read_to_string(path)?;
    let log = parse_log(&content, options)?;

    tracing::debug!(
        path = %path.display(),
        messages = log.messages.len(),
        warnings = log.warnings.len(),
        "Loaded message log"
    );

    Ok(log)
}

/// Parse and validate a message log held in memory.
pub fn parse_log(content: &str, options: ParseOptions) -> Result<LoadedLog> {
    let mut collector = Collector::new(options);

    match LogFormat::detect(content) {
        LogFormat::JsonArray => {
            let records: Vec<serde_json::Value> =
                serde_json::from_str(content).map_err(|e| Error::Parse {
                    line: e.line(),
                    message: e.to_string(),
                })?;

            for (index, value) in records.into_iter().enumerate() {
                let raw = serde_json::from_value::<RawMessage>(value).map_err(|e| e.to_string());
                collector.accept(index + 1, "record", raw)?;
            }
        }
        LogFormat::JsonLines => {
            for (index, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let raw = serde_json::from_str::<RawMessage>(line).map_err(|e| e.to_string());
                collector.accept(index + 1, "line", raw)?;
            }
        }
    }

    Ok(collector.finish())
}

/// Append one message to a log file, creating it if needed.
///
/// JSON Lines files get a new line. JSON array files are rewritten with the
/// message added at the end, through a temp file in the same directory that
/// replaces the original only once fully written.
pub fn append_message(path: &Path, message: &Message) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if LogFormat::detect(&existing) == LogFormat::JsonArray {
        let mut records: Vec<serde_json::Value> = serde_json::from_str(&existing)?;
        records.push(serde_json::to_value(message)?);
        rewrite_atomically(path, &records)?;
    } else {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        let line = serde_json::to_string(message)?;
        writeln!(file, "{}", line)?;
    }

    tracing::info!(
        path = %path.display(),
        message_id = %message.id,
        branch_id = %message.branch_key(),
        "Appended message"
    );
    Ok(())
}

fn rewrite_atomically(path: &Path, records: &[serde_json::Value]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&tmp, records)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Accumulates validated messages, enforcing id uniqueness.
struct Collector {
    options: ParseOptions,
    seen: HashSet<String>,
    log: LoadedLog,
}

impl Collector {
    fn new(options: ParseOptions) -> Self {
        Self {
            options,
            seen: HashSet::new(),
            log: LoadedLog::default(),
        }
    }

    /// Validate one record; `position` is the 1-based line or record number.
    fn accept(
        &mut self,
        position: usize,
        unit: &str,
        raw: std::result::Result<RawMessage, String>,
    ) -> Result<()> {
        let checked = raw.and_then(RawMessage::into_message).and_then(|msg| {
            if self.seen.contains(&msg.id) {
                Err(format!("duplicate id {:?}", msg.id))
            } else {
                Ok(msg)
            }
        });

        match checked {
            Ok(msg) => {
                self.seen.insert(msg.id.clone());
                self.log.messages.push(msg);
                Ok(())
            }
            Err(message) if self.options.strict => Err(Error::InvalidMessage {
                index: position,
                message,
            }),
            Err(message) => {
                tracing::warn!(position, unit, error = %message, "Skipping invalid message record");
                self.log
                    .warnings
                    .push(format!("{} {}: {}", unit, position, message));
                Ok(())
            }
        }
    }

    fn finish(self) -> LoadedLog {
        self.log
    }
}
