//! Adaptive timing of a repeatable operation.
//!
//! A measurement happens in two phases. Auto-ranging walks the repetition
//! ladder 1, 2, 5, 10, 20, 50, ... until one timed block of back-to-back calls
//! lasts at least [`SamplerConfig::min_block`]. That count is then reused for
//! [`SamplerConfig::repeat`] independent blocks, and the fastest block divided
//! by the count is the reported cost of a single call. Noise only ever adds
//! time, so the minimum is the closest observable estimate of the true cost.
//!
//! ```rust,no_run
//! use perf_baseline::sampler::timeit;
//!
//! let seconds = timeit("sum_1k", || (0..1_000u64).sum::<u64>());
//! assert!(seconds > 0.0);
//! ```

use std::convert::Infallible;
use std::hint::black_box;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::SamplerConfig;
use crate::errors::Result;

/// Outcome of one full sampling pass.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleReport {
    /// Calibrated number of calls per timed block.
    pub number: u64,
    /// Duration of the block that ended auto-ranging.
    pub calibration: Duration,
    /// Total duration of every measured block, in execution order.
    pub blocks: Vec<Duration>,
}

impl SampleReport {
    pub fn repeat(&self) -> usize {
        self.blocks.len()
    }

    /// Fastest measured block.
    pub fn best(&self) -> Duration {
        self.blocks.iter().copied().min().unwrap_or(self.calibration)
    }

    pub fn seconds_per_op(&self) -> f64 {
        self.best().as_secs_f64() / self.number as f64
    }

    pub fn ops_per_sec(&self) -> f64 {
        self.number as f64 / self.best().as_secs_f64()
    }

    pub fn summary(&self, name: &str) -> String {
        format!(
            "{name}: {:.9} sec/op = {:.3} ops/sec ({}x{} runs sampled)",
            self.seconds_per_op(),
            self.ops_per_sec(),
            self.number,
            self.repeat()
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct Sampler {
    config: SamplerConfig,
}

impl Sampler {
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Seconds per call of an infallible operation.
    pub fn measure<T, F>(&self, name: &str, mut op: F) -> f64
    where
        F: FnMut() -> T,
    {
        let result: std::result::Result<f64, Infallible> =
            self.try_measure(name, || Ok(op()));
        match result {
            Ok(seconds) => seconds,
            Err(never) => match never {},
        }
    }

    /// Seconds per call of a fallible operation. The first error the
    /// operation returns aborts sampling and is handed back unchanged.
    pub fn try_measure<T, E, F>(&self, name: &str, op: F) -> std::result::Result<f64, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        self.sample(name, op).map(|report| report.seconds_per_op())
    }

    /// Like [`try_measure`](Self::try_measure), with `setup` building a fresh
    /// context before every timed block. Setup time is never measured.
    pub fn try_measure_with_setup<C, T, E, S, F>(
        &self,
        name: &str,
        setup: S,
        op: F,
    ) -> std::result::Result<f64, E>
    where
        S: FnMut() -> std::result::Result<C, E>,
        F: FnMut(&mut C) -> std::result::Result<T, E>,
    {
        self.sample_with_setup(name, setup, op)
            .map(|report| report.seconds_per_op())
    }

    pub fn sample<T, E, F>(&self, name: &str, mut op: F) -> std::result::Result<SampleReport, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        self.sample_with_setup(name, || Ok(()), |_: &mut ()| op())
    }

    pub fn sample_with_setup<C, T, E, S, F>(
        &self,
        name: &str,
        mut setup: S,
        mut op: F,
    ) -> std::result::Result<SampleReport, E>
    where
        S: FnMut() -> std::result::Result<C, E>,
        F: FnMut(&mut C) -> std::result::Result<T, E>,
    {
        let begin = Instant::now();
        let (number, calibration) = self.autorange_with_setup(&mut setup, &mut op)?;
        debug!(
            bench = name,
            number,
            calibration_secs = calibration.as_secs_f64(),
            "auto-ranging finished"
        );
        let blocks = self.repeat_with_setup(&mut setup, &mut op, number)?;
        let report = SampleReport {
            number,
            calibration,
            blocks,
        };
        debug!(
            bench = name,
            total_secs = begin.elapsed().as_secs_f64(),
            "sampling finished"
        );
        info!(
            bench = name,
            sec_per_op = report.seconds_per_op(),
            ops_per_sec = report.ops_per_sec(),
            number,
            repeat = report.repeat(),
            "{}",
            report.summary(name)
        );
        Ok(report)
    }

    /// Smallest ladder count whose block reaches `min_block`, with that
    /// block's duration.
    pub fn autorange<T, E, F>(&self, mut op: F) -> std::result::Result<(u64, Duration), E>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        self.autorange_with_setup(&mut || Ok(()), &mut |_: &mut ()| op())
    }

    /// Time `repeat` blocks of `number` calls each.
    pub fn repeat<T, E, F>(&self, mut op: F, number: u64) -> std::result::Result<Vec<Duration>, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        self.repeat_with_setup(&mut || Ok(()), &mut |_: &mut ()| op(), number)
    }

    fn autorange_with_setup<C, T, E, S, F>(
        &self,
        setup: &mut S,
        op: &mut F,
    ) -> std::result::Result<(u64, Duration), E>
    where
        S: FnMut() -> std::result::Result<C, E>,
        F: FnMut(&mut C) -> std::result::Result<T, E>,
    {
        let mut last = (1, Duration::ZERO);
        for number in repetition_ladder() {
            let elapsed = time_block(setup, op, number)?;
            if elapsed >= self.config.min_block {
                return Ok((number, elapsed));
            }
            last = (number, elapsed);
        }
        Ok(last)
    }

    fn repeat_with_setup<C, T, E, S, F>(
        &self,
        setup: &mut S,
        op: &mut F,
        number: u64,
    ) -> std::result::Result<Vec<Duration>, E>
    where
        S: FnMut() -> std::result::Result<C, E>,
        F: FnMut(&mut C) -> std::result::Result<T, E>,
    {
        (0..self.config.repeat)
            .map(|_| time_block(setup, op, number))
            .collect()
    }
}

/// Seconds per call of `op`, sampled with the default policy.
pub fn timeit<T, F>(name: &str, op: F) -> f64
where
    F: FnMut() -> T,
{
    Sampler::default().measure(name, op)
}

/// Convenience wrapper returning the crate error type.
pub fn try_timeit<T, E, F>(name: &str, op: F) -> Result<f64>
where
    F: FnMut() -> std::result::Result<T, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Sampler::default()
        .try_measure(name, op)
        .map_err(crate::errors::PerfBaselineError::operation)
}

fn time_block<C, T, E, S, F>(
    setup: &mut S,
    op: &mut F,
    number: u64,
) -> std::result::Result<Duration, E>
where
    S: FnMut() -> std::result::Result<C, E>,
    F: FnMut(&mut C) -> std::result::Result<T, E>,
{
    let mut ctx = setup()?;
    let start = Instant::now();
    for _ in 0..number {
        black_box(op(&mut ctx)?);
    }
    Ok(start.elapsed())
}

/// 1, 2, 5, 10, 20, 50, ... until `u64` runs out.
fn repetition_ladder() -> impl Iterator<Item = u64> {
    std::iter::successors(Some(1u64), |decade| decade.checked_mul(10))
        .flat_map(|decade| [1u64, 2, 5].into_iter().filter_map(move |m| decade.checked_mul(m)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> Sampler {
        Sampler::new(SamplerConfig::new(Duration::from_millis(5), 3)).expect("sampler")
    }

    #[test]
    fn test_ladder_follows_one_two_five() {
        let ladder: Vec<u64> = repetition_ladder().take(7).collect();
        assert_eq!(ladder, vec![1, 2, 5, 10, 20, 50, 100]);
    }

    #[test]
    fn test_autorange_stops_at_first_block_over_minimum() {
        let sampler = quick();
        let (number, elapsed) = sampler
            .autorange(|| {
                std::thread::sleep(Duration::from_millis(2));
                Ok::<_, Infallible>(())
            })
            .expect("autorange");
        assert!(elapsed >= Duration::from_millis(5));
        // 1 call takes ~2ms, 2 calls ~4ms, so 5 is the first count over 5ms
        // unless the scheduler stretched an earlier block.
        assert!(number <= 5, "number={number}");
    }

    #[test]
    fn test_sample_report_uses_fastest_block() {
        let report = SampleReport {
            number: 4,
            calibration: Duration::from_millis(9),
            blocks: vec![
                Duration::from_millis(12),
                Duration::from_millis(8),
                Duration::from_millis(10),
            ],
        };
        assert_eq!(report.best(), Duration::from_millis(8));
        assert!((report.seconds_per_op() - 0.002).abs() < 1e-12);
        assert!((report.ops_per_sec() - 500.0).abs() < 1e-9);
        assert_eq!(report.repeat(), 3);
    }

    #[test]
    fn test_setup_runs_once_per_block() {
        let sampler = quick();
        let mut setups = 0u32;
        let report = sampler
            .sample_with_setup(
                "setup_count",
                || {
                    setups += 1;
                    Ok::<_, Infallible>(vec![3u64, 1, 2])
                },
                |v: &mut Vec<u64>| {
                    v.sort_unstable();
                    Ok(v.len())
                },
            )
            .expect("sample");
        let calibration_blocks = repetition_ladder()
            .position(|n| n == report.number)
            .expect("ladder count") as u32
            + 1;
        assert_eq!(setups, calibration_blocks + 3);
    }
}
