//! Error types for the orderjoin pipeline.
//!
//! Each stage has its own error type:
//!
//! - [`MissingSourceError`] / [`MalformedSourceError`] - reading inputs
//! - [`SchemaError`] - required columns absent or unusable
//! - [`WriteError`] - SQLite destination failures
//! - [`ConfigError`] - invalid configuration values
//! - [`PipelineError`] - top-level orchestration error
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// An input location does not exist or cannot be read.
#[derive(Debug, Error)]
#[error("Cannot read source '{}': {source}", .path.display())]
pub struct MissingSourceError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// An input exists but is not well-formed delimited text with a header.
#[derive(Debug, Error)]
pub struct MalformedSourceError {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for MalformedSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "Malformed source '{}', line {}: {}",
                self.path.display(),
                line,
                self.message
            ),
            None => write!(f, "Malformed source '{}': {}", self.path.display(), self.message),
        }
    }
}

impl MalformedSourceError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Errors returned by the reader.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Missing(#[from] MissingSourceError),

    #[error(transparent)]
    Malformed(#[from] MalformedSourceError),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// A parsed input does not carry the columns the transform needs.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// Required column absent from an input.
    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    /// Amount cell that cannot be read as a number.
    #[error("Non-numeric value '{value}' in column '{column}' (orders row {row})")]
    NonNumericAmount {
        row: usize,
        column: String,
        value: String,
    },

    /// Disambiguating a shared column produced a name that already exists.
    #[error("Column '{column}' would appear twice in the joined table")]
    ColumnConflict { column: String },

    /// Input already carries a column the transform derives.
    #[error("Column '{column}' in {table} is reserved for the derived category")]
    ReservedColumn { table: String, column: String },
}

// =============================================================================
// Write Errors
// =============================================================================

/// Errors persisting the joined table.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Destination directory could not be created.
    #[error("Cannot create directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Database file could not be opened.
    #[error("Cannot open database '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Statement execution or commit failed.
    #[error("Database write failed: {0}")]
    Database(#[from] rusqlite::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline error returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    MissingSource(#[from] MissingSourceError),

    #[error(transparent)]
    MalformedSource(#[from] MalformedSourceError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

impl From<ReadError> for PipelineError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Missing(e) => PipelineError::MissingSource(e),
            ReadError::Malformed(e) => PipelineError::MalformedSource(e),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type ReadResult<T> = Result<T, ReadError>;

pub type SchemaResult<T> = Result<T, SchemaError>;

pub type WriteResult<T> = Result<T, WriteError>;

pub type PipelineResult<T> = Result<T, PipelineError>;
