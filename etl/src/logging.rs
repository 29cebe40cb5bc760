//! Tracing setup for the CLI.
//!
//! Events go to stderr so stdout stays reserved for the run summary and
//! JSON output. `RUST_LOG` overrides the default filter.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(verbose: bool) {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("orderjoin=debug,info")
            } else {
                EnvFilter::new(DEFAULT_FILTER)
            }
        });
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .ok();
    });
}
