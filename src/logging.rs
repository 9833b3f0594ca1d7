//! Opt-in log output.
//!
//! The library only emits `tracing` events. Nothing is installed on load;
//! binaries and test harnesses that want to see sampling rates and baseline
//! ratios call [`init`] once.

use tracing_subscriber::EnvFilter;

use crate::errors::{PerfBaselineError, Result};

/// Filter used by the bundled binary when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "perf_baseline=info";

/// Install a fmt subscriber writing to stderr. `RUST_LOG` takes precedence
/// over `default_filter`. Fails if a global subscriber is already set.
pub fn init(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| PerfBaselineError::logging(e.to_string()))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| PerfBaselineError::logging(e.to_string()))
}
