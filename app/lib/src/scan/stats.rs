//! Scan progress counters.
//!
//! [`ScanStats`] is shared by all file workers of a scan. Every counter is an
//! independent atomic updated with `Ordering::Relaxed`; a consistent view of
//! all counters together is taken with [`ScanStats::snapshot`].
//!
//! # Example
//!
//! ```
//! use colstat::ScanStats;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let stats = Arc::new(ScanStats::new());
//!
//! let handles: Vec<_> = (0..4).map(|_| {
//!     let stats = Arc::clone(&stats);
//!     thread::spawn(move || {
//!         for _ in 0..100 {
//!             stats.record_row();
//!         }
//!     })
//! }).collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(stats.snapshot().rows_processed, 400);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Thread-safe scan statistics.
#[derive(Debug, Default)]
pub struct ScanStats {
    files_processed: AtomicU64,
    files_skipped: AtomicU64,
    rows_processed: AtomicU64,
    rows_skipped: AtomicU64,
    fields_skipped: AtomicU64,
}

impl ScanStats {
    /// Create a new tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file read to the end.
    pub fn record_file(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file that could not be opened.
    pub fn record_skipped_file(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row that was counted, fully or in part.
    pub fn record_row(&self) {
        self.rows_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row that was dropped entirely.
    pub fn record_skipped_row(&self) {
        self.rows_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a single field dropped from an otherwise counted row.
    pub fn record_skipped_field(&self) {
        self.fields_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Create a snapshot of the current counters.
    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            rows_processed: self.rows_processed.load(Ordering::Relaxed),
            rows_skipped: self.rows_skipped.load(Ordering::Relaxed),
            fields_skipped: self.fields_skipped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`ScanStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSnapshot {
    /// Files read to the end.
    pub files_processed: u64,
    /// Files that could not be opened.
    pub files_skipped: u64,
    /// Rows counted, fully or in part.
    pub rows_processed: u64,
    /// Rows dropped entirely.
    pub rows_skipped: u64,
    /// Fields dropped from otherwise counted rows.
    pub fields_skipped: u64,
}

impl ScanSnapshot {
    /// Whether any input was left out of the aggregates.
    pub fn is_lossy(&self) -> bool {
        self.files_skipped > 0 || self.rows_skipped > 0 || self.fields_skipped > 0
    }
}

impl fmt::Display for ScanSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files ({} skipped), {} rows ({} skipped), {} fields skipped",
            self.files_processed,
            self.files_skipped,
            self.rows_processed,
            self.rows_skipped,
            self.fields_skipped
        )
    }
}
