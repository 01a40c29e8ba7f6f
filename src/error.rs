//! Error types for the Colloquy library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`ColloquyError`] enum. Configuration and readiness problems are surfaced
//! to the caller; failures of host-supplied actions never reach this type,
//! they are folded into the turn's response instead.
//!
//! # Examples
//!
//! ```
//! use colloquy::error::{ColloquyError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ColloquyError::configuration("hidden layer has zero units"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Colloquy operations.
#[derive(Error, Debug)]
pub enum ColloquyError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed corpus, invalid layer specification or trainer settings,
    /// mismatched model artifacts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A named resource (corpus file, model artifact) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inference or persistence requested before a successful fit or load.
    #[error("Engine not ready: {0}")]
    NotReady(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Binary (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ColloquyError.
pub type Result<T> = std::result::Result<T, ColloquyError>;

impl ColloquyError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Configuration(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        ColloquyError::NotFound(msg.into())
    }

    /// Create a new not ready error.
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        ColloquyError::NotReady(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Analysis(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Storage(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ColloquyError::Other(msg.into())
    }

    /// Whether this error reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ColloquyError::NotFound(_))
    }

    /// Whether this error reports an engine used before fit or load.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ColloquyError::NotReady(_))
    }

    /// Whether this error reports a configuration problem.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ColloquyError::Configuration(_))
    }
}

impl From<bincode::Error> for ColloquyError {
    fn from(err: bincode::Error) -> Self {
        ColloquyError::Serialization(err.to_string())
    }
}
