//! Streaming mean, minimum and maximum.

use parking_lot::Mutex;

use super::{StatSummary, Statistic, NUMERICAL};
use crate::error::{Result, StatError};

/// Running aggregates, updated one value at a time.
///
/// Values are never retained. Before the first value `min` and `max` hold
/// the sentinels `f64::MAX` and `f64::MIN`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RunningAggregate {
    count: u64,
    mean: f64,
    min: f64,
    max: f64,
}

impl Default for RunningAggregate {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            min: f64::MAX,
            max: f64::MIN,
        }
    }
}

impl RunningAggregate {
    fn push(&mut self, value: f64) {
        let n = self.count as f64;
        self.mean = if self.count == 0 {
            value
        } else {
            // The running sum is never materialized.
            n / (n + 1.0) * self.mean + value / (n + 1.0)
        };
        self.count += 1;

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

/// Statistic for numeric columns.
///
/// Tracks count, mean, minimum and maximum of every value fed to it. A field
/// that does not parse as a finite floating-point number is rejected with
/// [`StatError::Parse`] and leaves the aggregates untouched. `nan`, `inf` and
/// overflowing literals such as `1e999` are rejected too.
///
/// # Example
///
/// ```
/// use colstat::{NumericalStat, Statistic};
///
/// let stat = NumericalStat::new("age");
/// for field in ["30", "40", "50"] {
///     stat.compute(field).unwrap();
/// }
/// assert_eq!(stat.render(), "mean: 40\nmin: 30\nmax: 50\n");
/// ```
#[derive(Debug)]
pub struct NumericalStat {
    name: String,
    state: Mutex<RunningAggregate>,
}

impl NumericalStat {
    /// Create an empty statistic for the named column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(RunningAggregate::default()),
        }
    }

    /// Number of values counted so far.
    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// Mean of the values counted so far (0.0 before the first value).
    pub fn mean(&self) -> f64 {
        self.state.lock().mean
    }

    /// Smallest value counted so far.
    pub fn min(&self) -> f64 {
        self.state.lock().min
    }

    /// Largest value counted so far.
    pub fn max(&self) -> f64 {
        self.state.lock().max
    }

    fn parse(&self, field: &str) -> Result<f64> {
        match field.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(StatError::Parse {
                column: self.name.clone(),
                value: field.to_string(),
            }),
        }
    }
}

impl Statistic for NumericalStat {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        NUMERICAL
    }

    fn compute(&self, field: &str) -> Result<()> {
        // Parse before locking so a bad field never holds up other workers.
        let value = self.parse(field)?;
        self.state.lock().push(value);
        Ok(())
    }

    fn check(&self, field: &str) -> Result<()> {
        self.parse(field).map(|_| ())
    }

    fn render(&self) -> String {
        self.summary().to_string()
    }

    fn summary(&self) -> StatSummary {
        let state = *self.state.lock();
        StatSummary::Numerical {
            count: state.count,
            mean: state.mean,
            min: state.min,
            max: state.max,
        }
    }
}
