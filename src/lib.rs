//! Micro-benchmark sampling with set-once performance baselines.
//!
//! [`Sampler`] turns a repeatable operation into a stable seconds-per-call
//! estimate. [`BaselineStore`] keeps the first estimate seen for each name in
//! a JSON file and fails later runs that are slower than `threshold` times
//! that fixed reference.
//!
//! ```rust,no_run
//! use perf_baseline::{BaselineStore, PerfBaselineError};
//!
//! let store = BaselineStore::open_with_threshold("target/perf.baseline", 2.0)?;
//! store.record_or_compare("sum_1k", || (0..1_000u64).sum::<u64>())?;
//! # Ok::<(), PerfBaselineError>(())
//! ```
//!
//! Log output is opt-in through [`logging::init`].

pub mod baseline;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod sampler;

pub use crate::baseline::{BaselineComparison, BaselineOutcome, BaselineRecord, BaselineStore};
pub use crate::config::{BaselineConfig, SamplerConfig};
pub use crate::errors::{PerfBaselineError, RegressionError, Result};
pub use crate::sampler::{SampleReport, Sampler, timeit, try_timeit};
