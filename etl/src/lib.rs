//! # orderjoin - users x orders batch ETL
//!
//! Reads a users CSV and an orders CSV, inner-joins them on `user_id`,
//! labels every order "High" (amount >= 100) or "Low", and replaces a
//! SQLite table with the result.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ users.csv   │────▶│   Parser    │────▶│  Transform  │────▶│   SQLite    │
//! │ orders.csv  │     │ (auto-enc)  │     │ (join+label)│     │ user_orders │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orderjoin::{run, PipelineConfig};
//!
//! let report = run(&PipelineConfig::default()).unwrap();
//! println!("{}", report.summary());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`config`] - Paths and column settings
//! - [`models`] - Tables, join keys, categories
//! - [`parser`] - Delimited text reading with auto-detection
//! - [`transform`] - Join, category derivation, pipeline driver
//! - [`store`] - SQLite replace-on-write
//! - [`logging`] - Tracing subscriber setup

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Extract
pub mod parser;

// Transform
pub mod transform;

// Load
pub mod store;

pub mod logging;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    MalformedSourceError,
    MissingSourceError,
    PipelineError,
    PipelineResult,
    ReadError,
    SchemaError,
    WriteError,
};

// =============================================================================
// Re-exports - Config & Models
// =============================================================================

pub use config::PipelineConfig;

pub use models::{
    JoinedRow,
    JoinedTable,
    OrderCategory,
    OrdersTable,
    Table,
    UsersTable,
    CATEGORY_COLUMN,
    KEY_COLUMN,
};

// =============================================================================
// Re-exports - Reader
// =============================================================================

pub use parser::{
    detect_delimiter,
    detect_encoding,
    read,
    read_table,
    ParseResult,
    ReadOptions,
};

// =============================================================================
// Re-exports - Transform & Pipeline
// =============================================================================

pub use transform::{
    transform,
    run,
    PipelineReport,
};

// =============================================================================
// Re-exports - Writer
// =============================================================================

pub use store::{write, SqliteStore};
