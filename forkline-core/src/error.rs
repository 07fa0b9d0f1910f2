//! Error types for forkline-core
//!
//! Branch reconstruction and variant lookup never fail. Errors only come from
//! the edges: reading message logs, loading configuration, setting up logging.

use thiserror::Error;

/// Main error type for the forkline-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A message log could not be parsed at all
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A message record failed validation at the ingest boundary
    #[error("invalid message record #{index}: {message}")]
    InvalidMessage { index: usize, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Logging setup error
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type alias for forkline-core
pub type Result<T> = std::result::Result<T, Error>;
