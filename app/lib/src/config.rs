//! Configuration types for the colstat library.
//!
//! This module provides configuration structs for controlling how input files
//! are split into rows and fields, how row-level errors are handled, how much
//! parallelism is used, and how categorical frequency tables are ordered.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatError};

/// What to do when a row cannot be fully counted.
///
/// Applies to fields that fail numeric parsing and to rows whose field count
/// does not match the number of configured columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Stop at the first bad row and return the error.
    #[default]
    Abort,
    /// Log and drop the offending field; the rest of the row is counted.
    ///
    /// A row-shape error has no single offending field, so it drops the row.
    SkipField,
    /// Log and drop the whole row; nothing from it is counted.
    SkipRow,
}

/// Configuration for scanning input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Discard the first row of every file.
    ///
    /// Default: false
    pub skip_header: bool,

    /// Discard the first field of every row.
    ///
    /// Default: false
    pub skip_index_column: bool,

    /// Set of characters that separate fields.
    ///
    /// Every character in the string is a separator on its own. Adjacent
    /// separators produce empty fields.
    ///
    /// Default: ","
    pub delimiter: String,

    /// Parse rows as quoted CSV instead of splitting on the delimiter set.
    ///
    /// Requires a single-byte delimiter.
    ///
    /// Default: false
    pub quoted: bool,

    /// Policy for parse and row-shape errors.
    ///
    /// Default: [`ErrorPolicy::Abort`]
    pub error_policy: ErrorPolicy,

    /// Number of worker threads.
    ///
    /// - 0: Auto-detect based on available CPU cores
    /// - 1: Single-threaded processing (no parallelism)
    /// - N: Use N threads for parallel processing
    ///
    /// Default: 0 (auto)
    pub parallelism: usize,

    /// Treat whitespace-only lines as absent rather than as rows.
    ///
    /// Default: true
    pub skip_blank_lines: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_header: false,
            skip_index_column: false,
            delimiter: ",".to_string(),
            quoted: false,
            error_policy: ErrorPolicy::Abort,
            parallelism: 0, // auto-detect
            skip_blank_lines: true,
        }
    }
}

impl ScanConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON text.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ScanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set whether the first row of every file is discarded.
    pub fn with_skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    /// Set whether the first field of every row is discarded.
    pub fn with_skip_index_column(mut self, skip: bool) -> Self {
        self.skip_index_column = skip;
        self
    }

    /// Set the field delimiter character set.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set quoted CSV parsing.
    pub fn with_quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Set the parallelism level.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set whether blank lines are skipped.
    pub fn with_skip_blank_lines(mut self, skip: bool) -> Self {
        self.skip_blank_lines = skip;
        self
    }

    /// Check that the settings can be used together.
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(StatError::InvalidConfig {
                message: "delimiter must not be empty".to_string(),
            });
        }
        if self.quoted && self.delimiter.len() != 1 {
            return Err(StatError::InvalidConfig {
                message: format!(
                    "quoted mode needs a single-byte delimiter, got '{}'",
                    self.delimiter.escape_default()
                ),
            });
        }
        Ok(())
    }
}

/// Ordering applied to tokens with equal counts in a frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Equal counts are listed in ascending token order.
    #[default]
    Ascending,
    /// Equal counts are listed in descending token order.
    Descending,
}

/// Options for categorical (counter) statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterOptions {
    /// Tie-break for tokens with equal counts.
    ///
    /// Default: [`TieBreak::Ascending`]
    pub tie_break: TieBreak,

    /// Keep the depth-0 table of whole, untokenized values.
    ///
    /// When false only the split levels are kept. A counter with no
    /// delimiters always keeps its single whole-value table.
    ///
    /// Default: true
    pub include_root: bool,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::Ascending,
            include_root: true,
        }
    }
}

impl CounterOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tie-break order.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set whether the whole-value table is kept.
    pub fn with_include_root(mut self, include: bool) -> Self {
        self.include_root = include;
        self
    }
}
