//! # colstat
//!
//! Per-column descriptive statistics over delimited text files.
//!
//! Every column of the input is bound to a statistic. Numerical columns get a
//! streaming mean, minimum and maximum; categorical columns get frequency
//! tables, optionally over several levels of tokenization.
//!
//! ## Features
//!
//! - **Streaming**: values are never retained; the mean is updated
//!   incrementally without keeping a running sum
//! - **Hierarchical counting**: a categorical column can split each value on
//!   a chain of delimiter sets and count the tokens at every level
//! - **Parallel scanning**: files are processed concurrently, all feeding the
//!   same per-column statistics
//! - **Configurable error handling**: bad rows abort the run, or are logged
//!   and skipped field-wise or row-wise
//! - **Pluggable statistics**: new types are added to a [`StatRegistry`]
//!
//! ## Quick Start
//!
//! ```
//! use colstat::{render_text, ColumnSchema, ScanConfig, Scanner, StatRegistry};
//! use std::io::Cursor;
//!
//! let registry = StatRegistry::with_builtins();
//! let schema = ColumnSchema::parse("numerical-age,categorical-country", &registry)?;
//!
//! let scanner = Scanner::new(ScanConfig::new().with_skip_header(true))?;
//! let csv = "age,country\n31,NO\n45,IT\n20,NO\n";
//! scanner.scan_reader(Cursor::new(csv), "people.csv", &schema)?;
//!
//! let report = render_text(&schema);
//! assert!(report.contains("NO\t2\n"));
//! # Ok::<(), colstat::StatError>(())
//! ```
//!
//! ### Scanning a Directory
//!
//! ```rust,ignore
//! use colstat::{discover_files, ColumnSchema, ErrorPolicy, ScanConfig, Scanner, StatRegistry};
//! use std::path::Path;
//!
//! let registry = StatRegistry::with_builtins();
//! let schema = ColumnSchema::parse("numerical-price,categorical-tags", &registry)?;
//!
//! let config = ScanConfig::new()
//!     .with_delimiter("\t")
//!     .with_error_policy(ErrorPolicy::SkipRow)
//!     .with_parallelism(4);
//! let scanner = Scanner::new(config)?;
//!
//! let files = discover_files(Path::new("data/"))?;
//! let summary = scanner.scan_paths(&files, &schema)?;
//! println!("{}", summary);
//! ```
//!
//! ### Tokenized Counting
//!
//! ```
//! use colstat::{CounterStat, Statistic};
//!
//! // Level 1 splits on '|', level 2 splits every level-1 token on ' '.
//! let stat = CounterStat::new("tags", vec!["|".to_string(), " ".to_string()]);
//! stat.compute("big dog||small dog").unwrap();
//!
//! assert_eq!(stat.count(1, "big dog"), 1);
//! assert_eq!(stat.count(2, "dog"), 2);
//! ```
//!
//! ### Custom Statistics
//!
//! ```
//! use colstat::{ColumnSchema, Result, StatRegistry, StatSummary, Statistic};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct NonEmpty {
//!     name: String,
//!     count: AtomicU64,
//! }
//!
//! impl Statistic for NonEmpty {
//!     fn name(&self) -> &str { &self.name }
//!     fn kind(&self) -> &str { "nonempty" }
//!     fn compute(&self, field: &str) -> Result<()> {
//!         if !field.is_empty() {
//!             self.count.fetch_add(1, Ordering::Relaxed);
//!         }
//!         Ok(())
//!     }
//!     fn render(&self) -> String {
//!         format!("non-empty: {}\n", self.count.load(Ordering::Relaxed))
//!     }
//!     fn summary(&self) -> StatSummary {
//!         StatSummary::Categorical { levels: Vec::new() }
//!     }
//! }
//!
//! let mut registry = StatRegistry::with_builtins();
//! registry.register("nonempty", |name, _| {
//!     Arc::new(NonEmpty { name: name.to_string(), count: AtomicU64::new(0) })
//! });
//!
//! let schema = ColumnSchema::parse("nonempty-comment", &registry)?;
//! schema.statistics()[0].compute("hello")?;
//! schema.statistics()[0].compute("")?;
//! assert_eq!(schema.statistics()[0].render(), "non-empty: 1\n");
//! # Ok::<(), colstat::StatError>(())
//! ```
//!
//! ## Thread Safety
//!
//! All public types are `Send + Sync`. A [`ColumnSchema`] can be shared by
//! reference across worker threads; each [`Statistic`] serializes its own
//! updates behind a lock, and different columns never contend. The
//! [`StatRegistry`] is read-only once built.
//!
//! ## Error Handling
//!
//! ```
//! use colstat::{ColumnSchema, StatError, StatRegistry};
//!
//! let registry = StatRegistry::with_builtins();
//! match ColumnSchema::parse("numerical-age,string-title", &registry) {
//!     Err(StatError::UnknownType { tag }) => assert_eq!(tag, "string"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod config;
pub mod error;
pub mod registry;
pub mod report;
pub mod scan;
pub mod schema;
pub mod stats;

// Re-exports for convenience
pub use config::{CounterOptions, ErrorPolicy, ScanConfig, TieBreak};
pub use error::{Result, StatError};
pub use registry::{StatConstructor, StatRegistry};
pub use report::{collect_reports, render_json, render_text, ColumnReport};
pub use scan::{discover_files, split_fields, ScanSnapshot, ScanStats, Scanner};
pub use schema::{ColumnInfo, ColumnSchema};
pub use stats::{
    split_compressed, CounterStat, NumericalStat, StatSummary, Statistic, CATEGORICAL, NUMERICAL,
};

/// Compile-time assertions that all public types are `Send + Sync`.
#[cfg(test)]
mod thread_safety {
    use super::*;

    /// Compile-time assertion that a type is Send + Sync.
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn statistic_types_are_send_sync() {
        assert_send_sync::<NumericalStat>();
        assert_send_sync::<CounterStat>();
        assert_send_sync::<std::sync::Arc<dyn Statistic>>();
        assert_send_sync::<StatSummary>();
    }

    #[test]
    fn engine_types_are_send_sync() {
        assert_send_sync::<StatRegistry>();
        assert_send_sync::<ColumnSchema>();
        assert_send_sync::<ColumnInfo>();
        assert_send_sync::<ColumnReport>();
    }

    #[test]
    fn scan_types_are_send_sync() {
        assert_send_sync::<Scanner>();
        assert_send_sync::<ScanStats>();
        assert_send_sync::<ScanSnapshot>();
        assert_send_sync::<ScanConfig>();
        assert_send_sync::<CounterOptions>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send_sync::<StatError>();
    }

    /// One schema shared by several threads, each feeding every column.
    #[test]
    fn test_concurrent_schema_updates() {
        use std::thread;

        let registry = StatRegistry::with_builtins();
        let schema = ColumnSchema::parse("numerical-n,categorical-c", &registry).unwrap();
        let num_threads = 4;
        let iterations = 250;

        thread::scope(|scope| {
            for t in 0..num_threads {
                let schema = &schema;
                scope.spawn(move || {
                    for i in 0..iterations {
                        schema.statistics()[0]
                            .compute(&(t * iterations + i).to_string())
                            .unwrap();
                        schema.statistics()[1].compute("same").unwrap();
                    }
                });
            }
        });

        match schema.statistics()[0].summary() {
            StatSummary::Numerical { count, min, max, .. } => {
                assert_eq!(count, (num_threads * iterations) as u64);
                assert_eq!(min, 0.0);
                assert_eq!(max, (num_threads * iterations - 1) as f64);
            }
            other => panic!("unexpected summary: {:?}", other),
        }
        assert_eq!(schema.statistics()[1].render(), "same\t1000\n");
    }
}
