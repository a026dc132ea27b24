//! Error types for the colstat library.
//!
//! This module defines all error types that can occur while parsing a column
//! specification, configuring a scan, and feeding field values into the
//! per-column statistics.

use thiserror::Error;

/// Main error type for the colstat library.
///
/// All operations that can fail return `Result<T, StatError>`.
#[derive(Debug, Error)]
pub enum StatError {
    /// A column specification entry is not of the form `type-name`.
    ///
    /// Every comma-separated entry must contain exactly one `-`.
    #[error("Malformed column spec entry '{entry}': expected exactly one '-' separating type and name")]
    MalformedSpec {
        /// The offending entry, as written
        entry: String,
    },

    /// A column specification names a statistic type that is not registered.
    #[error("Unknown statistic type '{tag}' (not registered)")]
    UnknownType {
        /// The unregistered type tag
        tag: String,
    },

    /// A field could not be converted to a number.
    ///
    /// Raised by a numerical statistic, without knowledge of where the field
    /// came from.
    #[error("Cannot parse '{value}' as a number for column '{column}'")]
    Parse {
        /// Name of the column the value was fed to
        column: String,
        /// The raw field value
        value: String,
    },

    /// A field could not be converted to a number, located in its input.
    ///
    /// The scanner wraps [`StatError::Parse`] into this variant so the caller
    /// can report file and line.
    #[error("{source_name}:{line}: cannot parse '{value}' as a number for column '{column}'")]
    FieldParse {
        /// File (or stream label) the row was read from
        source_name: String,
        /// Line number where the error occurred (1-indexed)
        line: usize,
        /// Name of the column
        column: String,
        /// The raw field value
        value: String,
    },

    /// A row does not have one field per configured column.
    #[error("{source_name}:{line}: row has {found} fields, expected {expected}")]
    RowShape {
        /// File (or stream label) the row was read from
        source_name: String,
        /// Line number where the error occurred (1-indexed)
        line: usize,
        /// Number of configured columns
        expected: usize,
        /// Number of fields found in the row
        found: usize,
    },

    /// Reading an input failed partway through.
    ///
    /// Rows before `line` have already been applied, so the run cannot be
    /// reported as if the file had been skipped.
    #[error("{source_name}:{line}: read failed: {error}")]
    Read {
        /// File (or stream label) being read
        source_name: String,
        /// Line that could not be read (1-indexed)
        line: usize,
        /// Underlying I/O error
        #[source]
        error: std::io::Error,
    },

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },

    /// Error reading quoted CSV input.
    ///
    /// Wraps errors from the `csv` crate.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error serializing a report or deserializing a configuration.
    ///
    /// Wraps errors from the `serde_json` crate.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    ///
    /// Wraps errors from standard I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatError {
    /// Attach a source location to a bare [`StatError::Parse`].
    ///
    /// Other variants are returned unchanged.
    pub fn at(self, source_name: &str, line: usize) -> Self {
        match self {
            StatError::Parse { column, value } => StatError::FieldParse {
                source_name: source_name.to_string(),
                line,
                column,
                value,
            },
            other => other,
        }
    }

    /// Whether this error concerns a single row and may be skipped under a
    /// lenient [`ErrorPolicy`](crate::config::ErrorPolicy).
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            StatError::Parse { .. } | StatError::FieldParse { .. } | StatError::RowShape { .. }
        )
    }
}

/// Type alias for Results using `StatError`.
pub type Result<T> = std::result::Result<T, StatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_spec_display() {
        let error = StatError::MalformedSpec {
            entry: "numerical-a-b".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'numerical-a-b'"));
        assert!(display.contains("exactly one '-'"));
    }

    #[test]
    fn test_unknown_type_display() {
        let error = StatError::UnknownType {
            tag: "string".to_string(),
        };
        assert!(format!("{}", error).contains("'string'"));
    }

    #[test]
    fn test_row_shape_display() {
        let error = StatError::RowShape {
            source_name: "data.csv".to_string(),
            line: 7,
            expected: 3,
            found: 5,
        };
        let display = format!("{}", error);
        assert!(display.starts_with("data.csv:7:"));
        assert!(display.contains("5 fields"));
        assert!(display.contains("expected 3"));
    }

    #[test]
    fn test_read_error_is_fatal() {
        let error = StatError::Read {
            source_name: "data.csv".to_string(),
            line: 3,
            error: std::io::Error::new(std::io::ErrorKind::Other, "device gone"),
        };
        assert!(format!("{}", error).starts_with("data.csv:3: read failed"));
        assert!(std::error::Error::source(&error).is_some());
        assert!(!error.is_row_error());
    }

    #[test]
    fn test_parse_error_located() {
        let error = StatError::Parse {
            column: "age".to_string(),
            value: "abc".to_string(),
        }
        .at("people.csv", 12);

        match &error {
            StatError::FieldParse {
                source_name,
                line,
                column,
                value,
            } => {
                assert_eq!(source_name, "people.csv");
                assert_eq!(*line, 12);
                assert_eq!(column, "age");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        assert!(error.is_row_error());
    }

    #[test]
    fn test_at_leaves_other_variants() {
        let error = StatError::UnknownType {
            tag: "x".to_string(),
        }
        .at("f", 1);
        assert!(matches!(error, StatError::UnknownType { .. }));
        assert!(!error.is_row_error());
    }

    #[test]
    fn test_json_error_from() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: StatError = json_error.into();
        assert!(matches!(error, StatError::Json(_)));
    }

    #[test]
    fn test_io_error_from() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: StatError = io_error.into();
        assert!(matches!(error, StatError::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StatError>();
    }
}
