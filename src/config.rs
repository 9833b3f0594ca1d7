//! Run-time policy for sampling and baseline comparison.
//!
//! Nothing in here is persisted: the threshold and the sampling constants
//! are chosen by whoever opens the store, while the baseline file only holds
//! measurements.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{PerfBaselineError, Result};

/// Baseline file used when `PERF_BASELINE_FILE` is not set.
pub const DEFAULT_BASELINE_FILE: &str = "perf_baseline.json";
/// Ratio of new/baseline time above which a run counts as a regression.
pub const DEFAULT_THRESHOLD: f64 = 1.5;
/// Minimum wall-clock length of one calibrated timing block.
pub const DEFAULT_MIN_BLOCK: Duration = Duration::from_millis(200);
/// Number of timed blocks whose minimum becomes the measurement.
pub const DEFAULT_REPEAT: usize = 10;

pub const ENV_FILE: &str = "PERF_BASELINE_FILE";
pub const ENV_THRESHOLD: &str = "PERF_BASELINE_THRESHOLD";
pub const ENV_REPEAT: &str = "PERF_BASELINE_REPEAT";
pub const ENV_MIN_BLOCK_MS: &str = "PERF_BASELINE_MIN_BLOCK_MS";

/// Sampling policy for [`Sampler`](crate::sampler::Sampler).
///
/// # Default Configuration
///
/// ```rust
/// use perf_baseline::SamplerConfig;
/// use std::time::Duration;
///
/// let config = SamplerConfig::default();
/// assert_eq!(config.min_block, Duration::from_millis(200));
/// assert_eq!(config.repeat, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Auto-ranging stops at the first repetition count whose block takes at
    /// least this long.
    ///
    /// **Default:** 200ms
    pub min_block: Duration,

    /// How many calibrated blocks are timed after auto-ranging.
    ///
    /// **Default:** 10
    pub repeat: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_block: DEFAULT_MIN_BLOCK,
            repeat: DEFAULT_REPEAT,
        }
    }
}

impl SamplerConfig {
    pub fn new(min_block: Duration, repeat: usize) -> Self {
        Self { min_block, repeat }
    }

    pub fn validate(&self) -> Result<()> {
        if self.repeat == 0 {
            return Err(PerfBaselineError::invalid_input("repeat must be at least 1"));
        }
        if self.min_block.is_zero() {
            return Err(PerfBaselineError::invalid_input(
                "min_block must be longer than zero",
            ));
        }
        Ok(())
    }
}

/// Everything a [`BaselineStore`](crate::baseline::BaselineStore) needs.
///
/// Baselines are only meaningful on the machine that recorded them, so the
/// file path is the one piece callers almost always set explicitly.
///
/// # Examples
///
/// ```rust
/// use perf_baseline::BaselineConfig;
///
/// let config = BaselineConfig::new("target/bench.baseline").with_threshold(2.0);
/// assert_eq!(config.threshold, 2.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BaselineConfig {
    pub path: PathBuf,
    /// Upper bound of `new / baseline`; 1.5 means "up to 50% slower is fine".
    pub threshold: f64,
    pub sampler: SamplerConfig,
}

impl BaselineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            threshold: DEFAULT_THRESHOLD,
            sampler: SamplerConfig::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;
        self.sampler.validate()
    }

    /// Build a configuration from `PERF_BASELINE_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(ENV_FILE).unwrap_or_else(|| DEFAULT_BASELINE_FILE.to_string());
        let mut config = Self::new(path);
        if let Some(raw) = lookup(ENV_THRESHOLD) {
            config.threshold = parse_var(ENV_THRESHOLD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REPEAT) {
            config.sampler.repeat = parse_var(ENV_REPEAT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MIN_BLOCK_MS) {
            config.sampler.min_block = Duration::from_millis(parse_var(ENV_MIN_BLOCK_MS, &raw)?);
        }
        config.validate()?;
        Ok(config)
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(PerfBaselineError::invalid_input(format!(
            "threshold must be a positive number, got {threshold}"
        )));
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PerfBaselineError::invalid_input(format!("{key}: cannot parse {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_must_be_positive() {
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(0.0).is_err());
        assert!(validate_threshold(-2.0).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
        assert!(validate_threshold(f64::INFINITY).is_err());
    }

    #[test]
    fn test_sampler_config_rejects_zero_repeat() {
        let config = SamplerConfig::new(Duration::from_millis(5), 0);
        assert!(matches!(
            config.validate(),
            Err(PerfBaselineError::InvalidInput(_))
        ));
    }
}
