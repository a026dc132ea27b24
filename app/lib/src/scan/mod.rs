//! Feeding delimited files into a [`ColumnSchema`].
//!
//! This module is the boundary between raw input and the statistics engine:
//! it finds the files to read, splits them into rows and fields, applies the
//! configured [`ErrorPolicy`], and calls [`Statistic::compute`] for every
//! field.
//!
//! # Concurrency
//!
//! [`Scanner::scan_paths`] runs one task per file on a Rayon pool. All tasks
//! feed the same statistics; each statistic serializes its own updates, and
//! since every aggregate is order-independent the result does not depend on
//! how the tasks interleave.
//!
//! [`Statistic::compute`]: crate::Statistic::compute

mod stats;

pub use stats::{ScanSnapshot, ScanStats};

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use log::{debug, info, trace, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{ErrorPolicy, ScanConfig};
use crate::error::{Result, StatError};
use crate::schema::ColumnSchema;

/// List the files to scan under `path`.
///
/// A regular file yields itself. A directory yields its immediate entries
/// that are not directories, sorted by path. Subdirectories are not entered.
pub fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !fs::metadata(path)?.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_dir() {
            debug!("Skipping directory {}", entry_path.display());
            continue;
        }
        files.push(entry_path);
    }
    files.sort();
    Ok(files)
}

/// Split a row on any character of `delimiter`.
///
/// Adjacent delimiters produce empty fields, so the field count always equals
/// the number of delimiter characters plus one.
///
/// # Examples
///
/// ```
/// use colstat::split_fields;
///
/// assert_eq!(split_fields("a,,b", ","), vec!["a", "", "b"]);
/// assert_eq!(split_fields("a\tb;c", "\t;"), vec!["a", "b", "c"]);
/// ```
pub fn split_fields<'a>(line: &'a str, delimiter: &str) -> Vec<&'a str> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(single), None) => line.split(single).collect(),
        _ => line.split(|c: char| delimiter.contains(c)).collect(),
    }
}

/// Reads rows from files and feeds them into a schema's statistics.
///
/// # Example
///
/// ```
/// use colstat::{ColumnSchema, ScanConfig, Scanner, StatRegistry};
/// use std::io::Cursor;
///
/// let registry = StatRegistry::with_builtins();
/// let schema = ColumnSchema::parse("numerical-age,categorical-city", &registry).unwrap();
/// let scanner = Scanner::new(ScanConfig::new().with_skip_header(true)).unwrap();
///
/// let input = "age,city\n30,Oslo\n40,Rome\n";
/// scanner.scan_reader(Cursor::new(input), "inline", &schema).unwrap();
///
/// assert_eq!(schema.statistics()[0].render(), "mean: 35\nmin: 30\nmax: 40\n");
/// assert_eq!(scanner.stats().rows_processed, 2);
/// ```
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
    stats: ScanStats,
}

impl Scanner {
    /// Create a scanner, validating the configuration.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: ScanStats::new(),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Counters accumulated over every scan made with this scanner.
    pub fn stats(&self) -> ScanSnapshot {
        self.stats.snapshot()
    }

    /// Scan every file in `paths`.
    ///
    /// Files that cannot be opened are logged and skipped. Under
    /// [`ErrorPolicy::Abort`] the first bad row stops the scan and its error
    /// is returned.
    pub fn scan_paths(&self, paths: &[PathBuf], schema: &ColumnSchema) -> Result<ScanSnapshot> {
        self.scan_paths_with_progress(paths, schema, |_| {})
    }

    /// Like [`scan_paths`](Self::scan_paths), calling `on_file` after each
    /// file has been processed or skipped.
    pub fn scan_paths_with_progress<F>(
        &self,
        paths: &[PathBuf],
        schema: &ColumnSchema,
        on_file: F,
    ) -> Result<ScanSnapshot>
    where
        F: Fn(&Path) + Sync,
    {
        let scan_one = |path: &PathBuf| -> Result<()> {
            let result = self.scan_file(path, schema);
            on_file(path.as_path());
            result
        };

        #[cfg(feature = "parallel")]
        {
            if self.config.parallelism != 1 && paths.len() > 1 {
                self.run_parallel(paths, &scan_one)?;
                return Ok(self.stats.snapshot());
            }
        }

        paths.iter().try_for_each(scan_one)?;
        Ok(self.stats.snapshot())
    }

    /// Run one task per file on a Rayon pool.
    #[cfg(feature = "parallel")]
    fn run_parallel<F>(&self, paths: &[PathBuf], scan_one: &F) -> Result<()>
    where
        F: Fn(&PathBuf) -> Result<()> + Sync,
    {
        if self.config.parallelism > 1 {
            // Use a dedicated pool with the requested number of threads
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.parallelism)
                .build()
                .map_err(|e| {
                    StatError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to create thread pool: {}", e),
                    ))
                })?;
            pool.install(|| paths.par_iter().try_for_each(scan_one))
        } else {
            // Use default Rayon thread pool (auto-detect cores)
            paths.par_iter().try_for_each(scan_one)
        }
    }

    /// Scan a single file.
    ///
    /// A file that cannot be opened is logged and counted as skipped. Once
    /// reading has started, any failure is returned: rows already applied
    /// cannot be taken back out of the statistics.
    pub fn scan_file(&self, path: &Path, schema: &ColumnSchema) -> Result<()> {
        let source = path.display().to_string();
        info!("Processing {}", source);

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping {}: cannot open: {}", source, e);
                self.stats.record_skipped_file();
                return Ok(());
            }
        };

        self.scan_reader(file, &source, schema)?;
        self.stats.record_file();
        info!("Processing {} done", source);
        Ok(())
    }

    /// Scan rows from any reader. `source` labels the input in errors and logs.
    pub fn scan_reader<R: Read>(
        &self,
        reader: R,
        source: &str,
        schema: &ColumnSchema,
    ) -> Result<()> {
        if self.config.quoted {
            self.scan_quoted(reader, source, schema)
        } else {
            self.scan_lines(reader, source, schema)
        }
    }

    fn scan_lines<R: Read>(&self, reader: R, source: &str, schema: &ColumnSchema) -> Result<()> {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            line_no += 1;
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|error| StatError::Read {
                    source_name: source.to_string(),
                    line: line_no,
                    error,
                })?;
            if read == 0 {
                break;
            }
            if line_no == 1 && self.config.skip_header {
                trace!("{}: skipping header", source);
                continue;
            }

            let bytes = buf.strip_suffix(b"\n").unwrap_or(buf.as_slice());
            let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
            let line = String::from_utf8_lossy(bytes);
            if matches!(line, Cow::Owned(_)) {
                debug!("{}:{}: invalid UTF-8 replaced", source, line_no);
            }
            if self.config.skip_blank_lines && line.trim().is_empty() {
                continue;
            }
            let fields = split_fields(&line, &self.config.delimiter);
            self.process_row(&fields, source, line_no, schema)?;
        }
        Ok(())
    }

    fn scan_quoted<R: Read>(&self, reader: R, source: &str, schema: &ColumnSchema) -> Result<()> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(self.config.skip_header)
            .flexible(true) // Row shape is checked against the schema instead
            .delimiter(self.config.delimiter.as_bytes()[0])
            .from_reader(reader);

        // Non-UTF-8 bytes decode to U+FFFD
        let mut record = csv::ByteRecord::new();
        while csv_reader.read_byte_record(&mut record)? {
            let line_no = record
                .position()
                .map_or(0, |position| position.line() as usize);
            let decoded: Vec<Cow<'_, str>> = record.iter().map(String::from_utf8_lossy).collect();
            let fields: Vec<&str> = decoded.iter().map(|field| field.as_ref()).collect();
            if self.config.skip_blank_lines && fields.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            self.process_row(&fields, source, line_no, schema)?;
        }
        Ok(())
    }

    /// Apply one row of fields to the schema, honoring the error policy.
    fn process_row(
        &self,
        fields: &[&str],
        source: &str,
        line: usize,
        schema: &ColumnSchema,
    ) -> Result<()> {
        let fields = if self.config.skip_index_column {
            fields.get(1..).unwrap_or_default()
        } else {
            fields
        };

        if fields.len() != schema.len() {
            return self.reject_row(StatError::RowShape {
                source_name: source.to_string(),
                line,
                expected: schema.len(),
                found: fields.len(),
            });
        }

        let stats = schema.statistics();
        match self.config.error_policy {
            ErrorPolicy::Abort => {
                for (stat, field) in stats.iter().zip(fields) {
                    stat.compute(field).map_err(|e| e.at(source, line))?;
                }
            }
            ErrorPolicy::SkipRow => {
                for (stat, field) in stats.iter().zip(fields) {
                    if let Err(e) = stat.check(field) {
                        return self.reject_row(e.at(source, line));
                    }
                }
                for (stat, field) in stats.iter().zip(fields) {
                    stat.compute(field).map_err(|e| e.at(source, line))?;
                }
            }
            ErrorPolicy::SkipField => {
                for (stat, field) in stats.iter().zip(fields) {
                    match stat.compute(field) {
                        Ok(()) => {}
                        Err(e) if e.is_row_error() => {
                            warn!("Skipping field: {}", e.at(source, line));
                            self.stats.record_skipped_field();
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        self.stats.record_row();
        Ok(())
    }

    fn reject_row(&self, error: StatError) -> Result<()> {
        if self.config.error_policy == ErrorPolicy::Abort {
            return Err(error);
        }
        warn!("Skipping row: {}", error);
        self.stats.record_skipped_row();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StatRegistry;
    use crate::stats::StatSummary;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn schema(spec: &str) -> ColumnSchema {
        ColumnSchema::parse(spec, &StatRegistry::with_builtins()).unwrap()
    }

    fn scan(config: ScanConfig, spec: &str, input: &str) -> (Scanner, ColumnSchema, Result<()>) {
        let scanner = Scanner::new(config).unwrap();
        let schema = schema(spec);
        let result = scanner.scan_reader(Cursor::new(input.to_string()), "test", &schema);
        (scanner, schema, result)
    }

    #[test]
    fn test_split_fields_keeps_empty() {
        assert_eq!(split_fields("a,,b,", ","), vec!["a", "", "b", ""]);
        assert_eq!(split_fields("", ","), vec![""]);
        assert_eq!(split_fields("a b\tc", " \t"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_scan_basic() {
        let (scanner, schema, result) = scan(
            ScanConfig::new(),
            "numerical-n,categorical-c",
            "1,x\n2,y\n3,x\n",
        );
        result.unwrap();
        assert_eq!(schema.statistics()[0].render(), "mean: 2\nmin: 1\nmax: 3\n");
        assert_eq!(schema.statistics()[1].render(), "x\t2\ny\t1\n");
        assert_eq!(scanner.stats().rows_processed, 3);
    }

    #[test]
    fn test_skip_header_and_index_column() {
        let config = ScanConfig::new()
            .with_skip_header(true)
            .with_skip_index_column(true);
        let (_, schema, result) = scan(config, "numerical-v", "id,v\n0,10\n1,20\r\n");
        result.unwrap();
        assert_eq!(schema.statistics()[0].render(), "mean: 15\nmin: 10\nmax: 20\n");
    }

    #[test]
    fn test_blank_lines() {
        let (scanner, _, result) = scan(ScanConfig::new(), "categorical-c", "a\n\n  \nb\n");
        result.unwrap();
        assert_eq!(scanner.stats().rows_processed, 2);

        let config = ScanConfig::new().with_skip_blank_lines(false);
        let (scanner, schema, result) = scan(config, "categorical-c", "a\n\nb\n");
        result.unwrap();
        assert_eq!(scanner.stats().rows_processed, 3);
        assert!(schema.statistics()[0].render().contains("\t1\n"));
    }

    #[test]
    fn test_abort_on_parse_error() {
        let (_, _, result) = scan(ScanConfig::new(), "numerical-n", "1\nabc\n3\n");
        match result {
            Err(StatError::FieldParse {
                source_name,
                line,
                column,
                value,
            }) => {
                assert_eq!(source_name, "test");
                assert_eq!(line, 2);
                assert_eq!(column, "n");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_abort_on_row_shape() {
        let (_, _, result) = scan(ScanConfig::new(), "numerical-a,numerical-b", "1,2\n3\n");
        match result {
            Err(StatError::RowShape {
                line,
                expected,
                found,
                ..
            }) => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_skip_field_policy() {
        let config = ScanConfig::new().with_error_policy(ErrorPolicy::SkipField);
        let (scanner, schema, result) = scan(
            config,
            "numerical-n,categorical-c",
            "1,a\nbad,b\n3,c\n4\n",
        );
        result.unwrap();

        assert_eq!(schema.statistics()[0].render(), "mean: 2\nmin: 1\nmax: 3\n");
        assert_eq!(schema.statistics()[1].render(), "a\t1\nb\t1\nc\t1\n");

        let stats = scanner.stats();
        assert_eq!(stats.rows_processed, 3);
        assert_eq!(stats.fields_skipped, 1);
        assert_eq!(stats.rows_skipped, 1);
    }

    #[test]
    fn test_skip_row_policy() {
        let config = ScanConfig::new().with_error_policy(ErrorPolicy::SkipRow);
        let (scanner, schema, result) = scan(
            config,
            "categorical-c,numerical-n",
            "a,1\nb,bad\nc,3\n",
        );
        result.unwrap();

        assert_eq!(schema.statistics()[0].render(), "a\t1\nc\t1\n");
        assert_eq!(schema.statistics()[1].render(), "mean: 2\nmin: 1\nmax: 3\n");

        let stats = scanner.stats();
        assert_eq!(stats.rows_processed, 2);
        assert_eq!(stats.rows_skipped, 1);
        assert_eq!(stats.fields_skipped, 0);
    }

    #[test]
    fn test_quoted_mode() {
        let config = ScanConfig::new().with_quoted(true).with_skip_header(true);
        let (_, schema, result) = scan(
            config,
            "categorical-name,numerical-n",
            "name,n\n\"Smith, J\",1\n\"Doe, A\",2\n",
        );
        result.unwrap();
        assert_eq!(
            schema.statistics()[0].render(),
            "Doe, A\t1\nSmith, J\t1\n"
        );
    }

    #[test]
    fn test_quoted_mode_row_shape_line() {
        let config = ScanConfig::new().with_quoted(true);
        let (_, _, result) = scan(config, "numerical-a,numerical-b", "1,2\n3,4,5\n");
        assert!(matches!(result, Err(StatError::RowShape { line: 2, found: 3, .. })));
    }

    /// Yields `data`, then fails every further read.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(std::io::Error::new(std::io::ErrorKind::Other, "device gone")),
                n => Ok(n),
            }
        }
    }

    const LATIN1_ROWS: &[u8] = b"1,a\n2,caf\xe9\n3,b\n4,c\n";

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let scanner = Scanner::new(ScanConfig::new()).unwrap();
        let schema = schema("numerical-n,categorical-c");
        scanner
            .scan_reader(Cursor::new(LATIN1_ROWS), "latin1", &schema)
            .unwrap();

        assert_eq!(scanner.stats().rows_processed, 4);
        assert_eq!(schema.statistics()[0].render(), "mean: 2.5\nmin: 1\nmax: 4\n");
        assert!(schema.statistics()[1]
            .render()
            .contains("caf\u{FFFD}\t1\n"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced_quoted() {
        let scanner = Scanner::new(ScanConfig::new().with_quoted(true)).unwrap();
        let schema = schema("numerical-n,categorical-c");
        scanner
            .scan_reader(Cursor::new(LATIN1_ROWS), "latin1", &schema)
            .unwrap();

        assert_eq!(scanner.stats().rows_processed, 4);
        assert!(schema.statistics()[1]
            .render()
            .contains("caf\u{FFFD}\t1\n"));
    }

    #[test]
    fn test_read_failure_mid_input_is_an_error() {
        let scanner = Scanner::new(ScanConfig::new()).unwrap();
        let schema = schema("numerical-n");
        let reader = FailingReader {
            data: Cursor::new(b"1\n2\n".to_vec()),
        };

        match scanner.scan_reader(reader, "flaky", &schema) {
            Err(StatError::Read {
                source_name, line, ..
            }) => {
                assert_eq!(source_name, "flaky");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(scanner.stats().rows_processed, 2);
        assert_eq!(scanner.stats().files_skipped, 0);
    }

    #[test]
    fn test_read_failure_is_not_skipped_by_lenient_policy() {
        let config = ScanConfig::new().with_error_policy(ErrorPolicy::SkipRow);
        let scanner = Scanner::new(config).unwrap();
        let schema = schema("numerical-n");
        let reader = FailingReader {
            data: Cursor::new(b"1\n".to_vec()),
        };
        assert!(matches!(
            scanner.scan_reader(reader, "flaky", &schema),
            Err(StatError::Read { line: 2, .. })
        ));
    }

    #[test]
    fn test_scanner_rejects_invalid_config() {
        assert!(Scanner::new(ScanConfig::new().with_delimiter("")).is_err());
    }

    #[test]
    fn test_discover_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.csv"), "1\n").unwrap();
        fs::write(dir.path().join("a.csv"), "2\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.csv"), "3\n").unwrap();

        let files = discover_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.csv"), dir.path().join("b.csv")]
        );

        let single = discover_files(&dir.path().join("a.csv")).unwrap();
        assert_eq!(single, vec![dir.path().join("a.csv")]);

        assert!(discover_files(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.csv");
        fs::write(&good, "5\n").unwrap();
        let paths = vec![dir.path().join("missing.csv"), good];

        let scanner = Scanner::new(ScanConfig::new().with_parallelism(1)).unwrap();
        let schema = schema("numerical-n");
        let snapshot = scanner.scan_paths(&paths, &schema).unwrap();

        assert_eq!(snapshot.files_processed, 1);
        assert_eq!(snapshot.files_skipped, 1);
        assert_eq!(schema.statistics()[0].render(), "mean: 5\nmin: 5\nmax: 5\n");
    }

    #[test]
    fn test_scan_paths_reports_progress() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..4 {
            let path = dir.path().join(format!("{}.csv", i));
            fs::write(&path, format!("{}\n", i)).unwrap();
            paths.push(path);
        }

        let seen = std::sync::atomic::AtomicUsize::new(0);
        let scanner = Scanner::new(ScanConfig::new()).unwrap();
        let schema = schema("numerical-n");
        scanner
            .scan_paths_with_progress(&paths, &schema, |_| {
                seen.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(seen.into_inner(), 4);
        match schema.statistics()[0].summary() {
            StatSummary::Numerical {
                count,
                mean,
                min,
                max,
            } => {
                assert_eq!(count, 4);
                assert!((mean - 1.5).abs() < 1e-12);
                assert_eq!(min, 0.0);
                assert_eq!(max, 3.0);
            }
            other => panic!("unexpected summary: {:?}", other),
        }
    }
}
