//! minsync - Minimal-write file sync
//!
//! Make a destination file identical to a source file, rewriting only the
//! blocks that differ. Powered by the minsync library.

use clap::Parser;
use minsync::{
    DEFAULT_BLOCK_SIZE, Error as SyncError, ErrorCode, NoProgress, SyncOptions, SyncStats,
    TerminalRender, Tracker, sync_files,
};
use serde_json::{Value, json};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const EXIT_USAGE: i32 = 1;
const EXIT_RUNTIME: i32 = 2;
const EXIT_INTERNAL: i32 = 3;

/// minsync - Sync a file in place with minimal writes
///
/// Compares SOURCE and DESTINATION block by block and rewrites only the
/// blocks that differ. All-zero blocks become holes where the filesystem
/// supports it. DESTINATION must exist and ends up with the length and
/// content of SOURCE.
///
/// On success prints: bytes read, bytes written, write ratio, elapsed time
/// (tab separated).
#[derive(Parser, Debug)]
#[command(name = "minsync", version, about, long_about = None)]
struct Args {
    /// File to read from
    source: PathBuf,

    /// File to bring in line with SOURCE
    destination: PathBuf,

    /// Size of the unit of comparison in bytes
    #[arg(short = 'b', long, default_value_t = DEFAULT_BLOCK_SIZE, value_name = "BYTES")]
    block_size: usize,

    /// Capacity of each internal queue in blocks (default: 128 MiB worth)
    #[arg(long, value_name = "BLOCKS")]
    queue_depth: Option<usize>,

    /// Write zero blocks instead of punching holes
    #[arg(long)]
    no_holes: bool,

    /// Do not advise the kernel about sequential access
    #[arg(long)]
    no_read_ahead: bool,

    /// Do not fsync the destination at the end (faster but less safe)
    #[arg(long)]
    no_sync: bool,

    /// Show a live report instead of the summary line
    #[arg(short = 'p', long, conflicts_with = "quiet")]
    progress: bool,

    /// Print nothing on success
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Write a JSON runtime profile to FILE
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Verbose output (debug logging to stderr)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> SyncOptions {
        let mut options = SyncOptions::default().with_block_size(self.block_size);
        if let Some(depth) = self.queue_depth {
            options = options.with_queue_depth(depth);
        }
        if self.no_holes {
            options = options.without_hole_punching();
        }
        if self.no_read_ahead {
            options = options.without_read_ahead();
        }
        if self.no_sync {
            options = options.without_fsync();
        }
        options
    }
}

type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Failed to write profile: {path}: {source}")]
    WriteProfile { path: PathBuf, source: io::Error },

    #[error("Failed to serialize profile: {source}")]
    JsonSerialize { source: serde_json::Error },
}

impl CliError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Sync(source) => source.code(),
            Self::WriteProfile { source, .. } => ErrorCode::from_io(source),
            Self::JsonSerialize { .. } => ErrorCode::Internal,
        }
    }
}

fn exit_code_for(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::Internal => EXIT_INTERNAL,
        _ => EXIT_RUNTIME,
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            // --help and --version land here too, and are not failures.
            let code = if error.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = error.print();
            process::exit(code);
        }
    };

    init_logging(args.verbose);

    if let Err(error) = run(&args) {
        eprintln!("error[{}]: {}", error.code(), error);
        process::exit(exit_code_for(error.code()));
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("minsync=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: &Args) -> CliResult<()> {
    let options = args.options();
    let started = Instant::now();

    let stats = if args.progress {
        let tracker = Tracker::new(TerminalRender::new());
        sync_files(&args.source, &args.destination, &options, &tracker)?
    } else {
        sync_files(&args.source, &args.destination, &options, &NoProgress)?
    };
    let elapsed = started.elapsed();

    if let Some(path) = &args.profile {
        write_profile(path, args, &options, &stats, elapsed)?;
    }

    if !args.quiet && !args.progress {
        println!("{}", summary_line(&stats, elapsed));
    }

    Ok(())
}

fn summary_line(stats: &SyncStats, elapsed: Duration) -> String {
    format!(
        "{}\t{}\t{:.2}%\t{:.3?}",
        stats.bytes_read,
        stats.bytes_written,
        stats.write_ratio(),
        elapsed
    )
}

fn write_profile(
    path: &Path,
    args: &Args,
    options: &SyncOptions,
    stats: &SyncStats,
    elapsed: Duration,
) -> CliResult<()> {
    let profile = profile_json(args, options, stats, elapsed)?;
    let text = serde_json::to_string_pretty(&profile)
        .map_err(|source| CliError::JsonSerialize { source })?;
    fs::write(path, text + "\n").map_err(|source| CliError::WriteProfile {
        path: path.to_path_buf(),
        source,
    })
}

fn profile_json(
    args: &Args,
    options: &SyncOptions,
    stats: &SyncStats,
    elapsed: Duration,
) -> CliResult<Value> {
    let options_json =
        serde_json::to_value(options).map_err(|source| CliError::JsonSerialize { source })?;
    let stats_json =
        serde_json::to_value(stats).map_err(|source| CliError::JsonSerialize { source })?;
    Ok(json!({
        "schema_version": "1.0",
        "source": display_path(&args.source),
        "destination": display_path(&args.destination),
        "options": options_json,
        "queue_depth": options.effective_queue_depth(),
        "stats": stats_json,
        "write_ratio": stats.write_ratio(),
        "timings_ms": {
            "setup": millis(stats.phases.setup),
            "transfer": millis(stats.phases.transfer),
            "flush": millis(stats.phases.flush),
            "total": millis(elapsed),
        },
    }))
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
