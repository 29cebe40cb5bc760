//! Pipeline driver: read -> transform -> write.
//!
//! # Example
//!
//! ```rust,no_run
//! use orderjoin::{run, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = run(&PipelineConfig::default())?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use super::transform;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::models::OrderCategory;
use crate::parser::read;
use crate::store::SqliteStore;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Rows written to the destination table
    pub row_count: usize,

    /// SQLite file written
    pub destination: PathBuf,

    /// Table replaced in the destination
    pub table_name: String,

    /// Rows read from the users source
    pub users_rows: usize,

    /// Rows read from the orders source
    pub orders_rows: usize,

    /// Joined rows labelled "High"
    pub high_count: usize,

    /// Joined rows labelled "Low"
    pub low_count: usize,

    /// RFC 3339 completion timestamp
    pub completed_at: String,
}

impl PipelineReport {
    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "Merged {} rows and wrote to {}",
            self.row_count,
            self.destination.display()
        )
    }
}

/// Run the pipeline once with `config`.
///
/// Errors from any stage are returned unchanged. Nothing is written unless
/// reading and transforming both succeed.
pub fn run(config: &PipelineConfig) -> PipelineResult<PipelineReport> {
    let started = Instant::now();
    info!(
        users = %config.users_path.display(),
        orders = %config.orders_path.display(),
        "reading sources"
    );

    // Extract
    let (users, orders) = read(&config.users_path, &config.orders_path, config.read_options())?;
    let users_rows = users.len();
    let orders_rows = orders.len();

    // Transform
    let joined = transform(users, orders, &config.amount_column)?;

    // Load
    let store = SqliteStore::new(&config.destination).with_table(config.table_name.clone());
    let row_count = store.replace(&joined)?;

    info!(
        destination = %store.path().display(),
        table = store.table_name(),
        rows = row_count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "pipeline finished"
    );

    Ok(PipelineReport {
        row_count,
        destination: store.path().to_path_buf(),
        table_name: store.table_name().to_string(),
        users_rows,
        orders_rows,
        high_count: joined.count(OrderCategory::High),
        low_count: joined.count(OrderCategory::Low),
        completed_at: chrono::Utc::now().to_rfc3339(),
    })
}
