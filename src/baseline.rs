//! Set-once performance baselines.
//!
//! The first measurement recorded under a name is kept forever. Every later
//! run is compared against that same value instead of the previous run, so a
//! slow drift across many commits still trips the threshold eventually.
//!
//! A baseline only means something on the machine that recorded it. To
//! recalibrate, delete the file (or call [`BaselineStore::reset`]) and rerun.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{self, BaselineConfig, SamplerConfig};
use crate::errors::{PerfBaselineError, RegressionError, Result};
use crate::sampler::Sampler;

const CREATED_AT_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// One persisted baseline. Only `elapsed` is required when reading; any
/// other keys an entry carries stay in the file untouched.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BaselineRecord {
    #[serde(default)]
    pub created_at: String,
    pub elapsed: f64,
}

impl BaselineRecord {
    pub fn new(elapsed: f64) -> Self {
        Self {
            created_at: Local::now().format(CREATED_AT_FORMAT).to_string(),
            elapsed,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BaselineComparison {
    pub name: String,
    pub actual: f64,
    pub baseline: f64,
    pub ratio: f64,
    pub threshold: f64,
}

impl BaselineComparison {
    pub fn regressed(&self) -> bool {
        self.ratio > self.threshold
    }

    pub fn summary(&self) -> String {
        self.clone().into_regression().to_string()
    }

    fn into_regression(self) -> RegressionError {
        RegressionError {
            name: self.name,
            actual: self.actual,
            baseline: self.baseline,
            ratio: self.ratio,
            threshold: self.threshold,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BaselineOutcome {
    /// No baseline existed; this measurement became it.
    Recorded(BaselineRecord),
    /// Compared against the stored baseline and stayed within threshold.
    Compared(BaselineComparison),
}

/// File-backed map of name to [`BaselineRecord`].
///
/// Every call reads the whole file; a new name rewrites the whole file.
/// There is no locking, so concurrent writers to one path must be
/// serialized by the caller.
#[derive(Clone, Debug)]
pub struct BaselineStore {
    path: PathBuf,
    threshold: f64,
    sampler: Sampler,
}

impl BaselineStore {
    /// Bind to `path` with the default threshold of 1.5. The file does not
    /// need to exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "baseline file");
        Self {
            path,
            threshold: config::DEFAULT_THRESHOLD,
            sampler: Sampler::default(),
        }
    }

    pub fn open_with_threshold(path: impl Into<PathBuf>, threshold: f64) -> Result<Self> {
        Self::from_config(BaselineConfig::new(path).with_threshold(threshold))
    }

    pub fn from_config(config: BaselineConfig) -> Result<Self> {
        config.validate()?;
        let sampler = Sampler::new(config.sampler)?;
        info!(
            path = %config.path.display(),
            threshold = config.threshold,
            "baseline file"
        );
        Ok(Self {
            path: config.path,
            threshold: config.threshold,
            sampler,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn sampler_config(&self) -> &SamplerConfig {
        self.sampler.config()
    }

    /// Record `elapsed` as the baseline for `name` if there is none yet,
    /// otherwise compare against the stored one. A ratio strictly above the
    /// threshold is a [`RegressionError`]. The stored record never changes
    /// once written.
    pub fn record_or_compare_elapsed(&self, name: &str, elapsed: f64) -> Result<BaselineOutcome> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(PerfBaselineError::invalid_input(format!(
                "{name}: elapsed must be a non-negative number, got {elapsed}"
            )));
        }
        let mut entries = self.load()?;
        let Some(existing) = entries.get(name) else {
            let record = BaselineRecord::new(elapsed);
            entries.insert(name.to_string(), serde_json::to_value(&record)?);
            self.write(&entries)?;
            info!(bench = name, elapsed, "baseline recorded");
            return Ok(BaselineOutcome::Recorded(record));
        };
        let baseline = BaselineRecord::deserialize(existing)?.elapsed;
        let comparison = BaselineComparison {
            name: name.to_string(),
            actual: elapsed,
            baseline,
            ratio: elapsed / baseline,
            threshold: self.threshold,
        };
        info!(
            bench = name,
            ratio = comparison.ratio,
            threshold = comparison.threshold,
            "{}",
            comparison.summary()
        );
        if comparison.regressed() {
            warn!(bench = name, ratio = comparison.ratio, "performance regression");
            return Err(comparison.into_regression().into());
        }
        Ok(BaselineOutcome::Compared(comparison))
    }

    /// Sample `op` and feed the result to
    /// [`record_or_compare_elapsed`](Self::record_or_compare_elapsed).
    pub fn record_or_compare<T, F>(&self, name: &str, op: F) -> Result<BaselineOutcome>
    where
        F: FnMut() -> T,
    {
        let elapsed = self.sampler.measure(name, op);
        self.record_or_compare_elapsed(name, elapsed)
    }

    /// Fallible variant of [`record_or_compare`](Self::record_or_compare).
    /// An operation failure aborts before the file is read.
    pub fn try_record_or_compare<T, E, F>(&self, name: &str, op: F) -> Result<BaselineOutcome>
    where
        F: FnMut() -> std::result::Result<T, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let elapsed = self
            .sampler
            .try_measure(name, op)
            .map_err(PerfBaselineError::operation)?;
        self.record_or_compare_elapsed(name, elapsed)
    }

    pub fn try_record_or_compare_with_setup<C, T, E, S, F>(
        &self,
        name: &str,
        setup: S,
        op: F,
    ) -> Result<BaselineOutcome>
    where
        S: FnMut() -> std::result::Result<C, E>,
        F: FnMut(&mut C) -> std::result::Result<T, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let elapsed = self
            .sampler
            .try_measure_with_setup(name, setup, op)
            .map_err(PerfBaselineError::operation)?;
        self.record_or_compare_elapsed(name, elapsed)
    }

    pub fn records(&self) -> Result<BTreeMap<String, BaselineRecord>> {
        self.load()?
            .into_iter()
            .map(|(name, entry)| Ok((name, serde_json::from_value(entry)?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<Option<BaselineRecord>> {
        match self.load()?.remove(name) {
            Some(entry) => Ok(Some(serde_json::from_value(entry)?)),
            None => Ok(None),
        }
    }

    /// Forget every baseline by deleting the backing file.
    pub fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "baseline file removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Raw entries keyed by name. Entries stay as JSON values so a rewrite
    /// keeps whatever else they hold.
    fn load(&self) -> Result<BTreeMap<String, Value>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    fn write(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let data = serde_json::to_vec_pretty(entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
