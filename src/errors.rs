use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PerfBaselineError>;

#[derive(Debug, Error)]
pub enum PerfBaselineError {
    #[error(transparent)]
    Regression(#[from] RegressionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("operation failed: {0}")]
    Operation(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("logging error: {0}")]
    Logging(String),
}

impl PerfBaselineError {
    pub fn operation<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        PerfBaselineError::Operation(err.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        PerfBaselineError::InvalidInput(msg.into())
    }

    pub fn logging<T: Into<String>>(msg: T) -> Self {
        PerfBaselineError::Logging(msg.into())
    }

    pub fn is_regression(&self) -> bool {
        matches!(self, PerfBaselineError::Regression(_))
    }
}

/// A fresh measurement exceeded `threshold` times its recorded baseline.
#[derive(Clone, Debug, PartialEq, Error)]
pub struct RegressionError {
    pub name: String,
    pub actual: f64,
    pub baseline: f64,
    pub ratio: f64,
    pub threshold: f64,
}

impl fmt::Display for RegressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Actual/Baseline = {:.9}/{:.9} = {:.3} (VS threshold {:.2})",
            self.name, self.actual, self.baseline, self.ratio, self.threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_message_carries_both_durations() {
        let err = RegressionError {
            name: "parse".into(),
            actual: 0.003,
            baseline: 0.001,
            ratio: 3.0,
            threshold: 2.0,
        };
        assert_eq!(
            err.to_string(),
            "parse: Actual/Baseline = 0.003000000/0.001000000 = 3.000 (VS threshold 2.00)"
        );
    }

    #[test]
    fn test_operation_error_keeps_source() {
        let err = PerfBaselineError::operation(std::io::Error::other("boom"));
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "boom");
        assert!(!err.is_regression());
    }
}
