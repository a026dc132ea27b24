use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colstat::{
    discover_files, render_json, render_text, ColumnSchema, CounterOptions, ErrorPolicy,
    ScanConfig, Scanner, StatError, StatRegistry, TieBreak,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Per-column statistics over delimited text files
#[derive(Parser, Debug)]
#[command(name = "colstat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Discard the first row of every file (1) or keep it (0)
    #[arg(value_name = "REMOVE_FIRST_ROW", action = ArgAction::Set, value_parser = parse_flag)]
    remove_first_row: bool,

    /// Discard the first field of every row (1) or keep it (0)
    #[arg(value_name = "REMOVE_FIRST_COL", action = ArgAction::Set, value_parser = parse_flag)]
    remove_first_col: bool,

    /// Field delimiter character set ("\t" or "tab" for a tab)
    #[arg(value_name = "DELIMITER", allow_hyphen_values = true)]
    delimiter: String,

    /// Column spec: type-name,type-name,... (types: numerical, categorical)
    #[arg(value_name = "COLUMNS")]
    columns: String,

    /// File, or directory whose files are all processed
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Scan configuration file (JSON); positional arguments take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// What to do with rows that fail to parse or have the wrong field count
    #[arg(long, value_enum)]
    on_error: Option<OnError>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Worker threads (0 = one per CPU core, 1 = sequential)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Parse rows as quoted CSV (single-byte delimiter only)
    #[arg(long)]
    quoted: bool,

    /// Add a tokenization level to a categorical column: NAME=DELIMS (repeatable)
    #[arg(long = "split", value_name = "NAME=DELIMS", value_parser = parse_split)]
    splits: Vec<(String, String)>,

    /// Ordering of tokens with equal counts
    #[arg(long, value_enum, default_value = "asc")]
    ties: Ties,

    /// Only report tokenized levels, not whole values
    #[arg(long)]
    leaf_only: bool,
}

/// Row error handling
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnError {
    /// Stop at the first bad row
    Abort,
    /// Drop only the offending field
    SkipField,
    /// Drop the whole row
    SkipRow,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => ErrorPolicy::Abort,
            OnError::SkipField => ErrorPolicy::SkipField,
            OnError::SkipRow => ErrorPolicy::SkipRow,
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One block of lines per column
    Text,
    /// JSON array of column summaries
    Json,
}

/// Tie-break order
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Ties {
    /// Ascending token order
    Asc,
    /// Descending token order
    Desc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity flags
    setup_logging(cli.verbose, cli.quiet);

    let start_time = Instant::now();

    let config = build_config(&cli)?;
    debug!("Scan configuration: {:?}", config);

    let registry = StatRegistry::with_counter_options(counter_options(&cli));
    let levels = split_levels(&cli.splits);
    let schema = ColumnSchema::parse_with_levels(&cli.columns, &registry, &levels)
        .map_err(|e| map_stat_error(e, "Column spec"))?;
    info!("Configured {} columns", schema.len());

    let files = discover_files(&cli.path)
        .with_context(|| format!("Failed to list input path: {}", cli.path.display()))?;
    if files.is_empty() {
        warn!("No files found under {}", cli.path.display());
    }

    let scanner = Scanner::new(config).map_err(|e| map_stat_error(e, "Configuration"))?;
    let progress = create_progress_bar(cli.quiet, files.len() as u64);
    let summary = scanner
        .scan_paths_with_progress(&files, &schema, |path: &Path| {
            progress.set_message(file_label(path));
            progress.inc(1);
        })
        .map_err(|e| map_stat_error(e, "Scan"))?;
    progress.finish_and_clear();

    let report = match cli.format {
        OutputFormat::Text => render_text(&schema),
        OutputFormat::Json => {
            let mut json = render_json(&schema).map_err(|e| map_stat_error(e, "Report"))?;
            json.push('\n');
            json
        }
    };
    write_output(&report)?;

    let total_duration = start_time.elapsed();
    if !cli.quiet {
        eprintln!("✓ {}", summary);
        eprintln!("  Time: {:.3}s", total_duration.as_secs_f64());
    }
    if summary.is_lossy() {
        warn!("Some input was skipped; see warnings above");
    }

    info!("Completed in {:.3}s", total_duration.as_secs_f64());
    Ok(())
}

/// Set up logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let log_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logging initialized at {} level", log_level);
}

/// Combine the optional config file with command-line arguments
fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ScanConfig::default(),
    };

    config.skip_header = cli.remove_first_row;
    config.skip_index_column = cli.remove_first_col;
    config.delimiter = unescape_delimiter(&cli.delimiter);
    if cli.quoted {
        config.quoted = true;
    }
    if let Some(policy) = cli.on_error {
        config.error_policy = policy.into();
    }
    if let Some(jobs) = cli.jobs {
        config.parallelism = jobs;
    }

    Ok(config)
}

/// Load a scan configuration from a JSON file
fn load_config(path: &Path) -> Result<ScanConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = ScanConfig::from_json(&text)
        .map_err(|e| map_stat_error(e, &format!("Config file {}", path.display())))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn counter_options(cli: &Cli) -> CounterOptions {
    let tie_break = match cli.ties {
        Ties::Asc => TieBreak::Ascending,
        Ties::Desc => TieBreak::Descending,
    };
    CounterOptions::new()
        .with_tie_break(tie_break)
        .with_include_root(!cli.leaf_only)
}

/// Group `--split` occurrences into per-column delimiter levels, in order
fn split_levels(splits: &[(String, String)]) -> HashMap<String, Vec<String>> {
    let mut levels: HashMap<String, Vec<String>> = HashMap::new();
    for (name, delims) in splits {
        levels
            .entry(name.clone())
            .or_default()
            .push(unescape_delimiter(delims));
    }
    levels
}

/// Parse a 0/1 positional flag
fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(format!("expected 0 or 1, got '{}'", other)),
    }
}

/// Parse a `NAME=DELIMS` split level
fn parse_split(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, delims)) if !name.is_empty() => Ok((name.to_string(), delims.to_string())),
        _ => Err(format!("expected NAME=DELIMS, got '{}'", value)),
    }
}

/// Expand the escapes a shell makes awkward to type
fn unescape_delimiter(raw: &str) -> String {
    match raw {
        "tab" | "\\t" => "\t".to_string(),
        "space" => " ".to_string(),
        _ => raw.replace("\\t", "\t"),
    }
}

/// Write the report to stdout
fn write_output(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Create a progress bar over the input files
fn create_progress_bar(quiet: bool, files: u64) -> ProgressBar {
    if quiet {
        // Return a hidden progress bar in quiet mode
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(files);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Map StatError to anyhow::Error with context
fn map_stat_error(error: StatError, context: &str) -> anyhow::Error {
    match error {
        StatError::MalformedSpec { entry } => anyhow::anyhow!(
            "{}: malformed entry '{}' (expected type-name, e.g. numerical-age)",
            context,
            entry
        ),
        StatError::UnknownType { tag } => anyhow::anyhow!(
            "{}: unknown statistic type '{}' (expected numerical or categorical)",
            context,
            tag
        ),
        other => anyhow::Error::new(other).context(context.to_string()),
    }
}
