//! Per-column statistics.
//!
//! A [`Statistic`] is the unit of aggregate state bound to one column. It
//! consumes raw field strings one at a time and renders a textual summary on
//! demand. Two implementations ship with the library:
//!
//! - [`NumericalStat`]: streaming mean, minimum and maximum
//! - [`CounterStat`]: frequency tables, optionally over several levels of
//!   tokenization
//!
//! # Thread Safety
//!
//! Every statistic owns a lock around its mutable state. `compute`, `render`
//! and `summary` all take that lock, so one instance can be fed from many
//! worker threads at once and a render never observes a half-applied update.
//! Different instances share nothing and never contend.

mod counter;
mod numerical;

pub use counter::{split_compressed, CounterStat};
pub use numerical::NumericalStat;

use std::fmt;

use serde::Serialize;

use crate::error::Result;

/// Type tag of the built-in numerical statistic.
pub const NUMERICAL: &str = "numerical";

/// Type tag of the built-in categorical statistic.
pub const CATEGORICAL: &str = "categorical";

/// Aggregate state for one column.
///
/// Implementors must be shareable across threads: all methods take `&self`
/// and synchronize internally.
pub trait Statistic: Send + Sync + fmt::Debug {
    /// Column name this statistic was created for.
    fn name(&self) -> &str;

    /// Type tag this statistic was registered under.
    fn kind(&self) -> &str;

    /// Consume one raw field value.
    ///
    /// On error the state is left exactly as it was before the call.
    fn compute(&self, field: &str) -> Result<()>;

    /// Check whether `compute` would accept `field`, without updating state.
    fn check(&self, _field: &str) -> Result<()> {
        Ok(())
    }

    /// Human-readable summary of the current state.
    fn render(&self) -> String;

    /// Structured snapshot of the current state.
    fn summary(&self) -> StatSummary;
}

/// Serializable snapshot of a statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatSummary {
    /// Running aggregates of a numerical column.
    Numerical {
        /// Number of values counted
        count: u64,
        /// Arithmetic mean of the values counted
        mean: f64,
        /// Smallest value, or `f64::MAX` if nothing was counted
        min: f64,
        /// Largest value, or `f64::MIN` if nothing was counted
        max: f64,
    },
    /// Frequency tables of a categorical column, one per kept level.
    ///
    /// Each level is sorted by descending count.
    Categorical {
        /// `(token, count)` entries per level
        levels: Vec<Vec<(String, u64)>>,
    },
}

impl fmt::Display for StatSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatSummary::Numerical {
                mean, min, max, ..
            } => {
                writeln!(f, "mean: {}", mean)?;
                writeln!(f, "min: {}", min)?;
                writeln!(f, "max: {}", max)
            }
            StatSummary::Categorical { levels } => {
                for (token, count) in levels.iter().flatten() {
                    writeln!(f, "{}\t{}", token, count)?;
                }
                Ok(())
            }
        }
    }
}
