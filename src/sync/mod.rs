//! The block-diff-and-patch engine.
//!
//! [`sync_files`] makes a destination file byte-for-byte equal to a source
//! file while touching as little of the destination as possible:
//!
//! - Blocks that already match are left alone.
//! - All-zero blocks become holes where the filesystem supports it.
//! - Every other differing block is rewritten in place.
//!
//! # How it works
//!
//! 1. Both files are opened and advised for sequential access.
//! 2. The destination is truncated or extended to the source length.
//! 3. One worker thread per file streams blocks over a bounded queue.
//! 4. The coordinator pairs blocks by position and sends each differing
//!    source block back to the destination worker.
//! 5. The destination is synced to disk.
//!
//! Queues are bounded, so memory stays at roughly three queues worth of
//! blocks no matter how large the files are.

mod coordinator;
mod finalize;
mod op;
mod punch;
mod session;
mod store;
mod worker;

use crate::error::{Error, Result, is_unsupported_error};
use crate::options::SyncOptions;
use crate::progress::Progress;
use coordinator::Endpoint;
use session::Session;
use store::BlockStore;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

/// Wall time spent in each phase of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Phases {
    /// Opening, read-ahead and resizing
    pub setup: Duration,
    /// Comparing and patching blocks
    pub transfer: Duration,
    /// Final sync to disk
    pub flush: Duration,
}

/// Statistics from a sync session.
///
/// Returned by [`sync_files`] on success.
///
/// # Example
///
/// ```no_run
/// use minsync::{NoProgress, SyncOptions, sync_files};
/// use std::path::Path;
///
/// let stats = sync_files(
///     Path::new("disk.img"),
///     Path::new("backup.img"),
///     &SyncOptions::default(),
///     &NoProgress,
/// )?;
/// println!("Wrote {} of {} bytes", stats.bytes_written, stats.bytes_read);
/// # Ok::<(), minsync::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SyncStats {
    /// Length of the source, and of the destination afterwards
    pub size: u64,
    /// Block size used for the session
    pub block_size: usize,
    /// Number of blocks compared
    pub blocks: u64,
    /// Bytes read and compared (per file)
    pub bytes_read: u64,
    /// Bytes written explicitly to the destination
    pub bytes_written: u64,
    /// Bytes turned into holes in the destination
    pub bytes_zeroed: u64,
    /// Number of blocks written
    pub blocks_written: u64,
    /// Number of blocks turned into holes
    pub blocks_zeroed: u64,
    /// Whether hole punching was still enabled when the session ended
    pub sparse: bool,
    /// Duration of the whole session
    pub duration: Duration,
    /// Per-phase breakdown of `duration`
    pub phases: Phases,
}

impl SyncStats {
    /// Bytes written as a percentage of bytes read (0 for empty files).
    pub fn write_ratio(&self) -> f64 {
        if self.bytes_read == 0 {
            0.0
        } else {
            self.bytes_written as f64 * 100.0 / self.bytes_read as f64
        }
    }
}

/// Synchronize `destination` to be identical to `source`.
///
/// The destination must already exist; it is modified in place. Byte counts
/// are fed to `progress` as the session runs, and `progress.end()` is called
/// once the transfer is over, whether it succeeded or not.
///
/// # Errors
///
/// Returns an error if:
/// - The block size is zero ([`Error::InvalidBlockSize`])
/// - Either path is a directory ([`Error::IsADirectory`])
/// - Either file cannot be opened ([`Error::OpenSource`], [`Error::OpenDestination`])
/// - The read-ahead hint fails for a reason other than "unsupported" ([`Error::ReadAhead`])
/// - The destination cannot be resized ([`Error::Resize`])
/// - A block read, write or hole punch fails ([`Error::Read`], [`Error::Write`], [`Error::PunchHole`])
/// - A file got shorter while being synced ([`Error::UnexpectedEof`])
/// - The final sync fails ([`Error::Sync`])
///
/// Setup errors are returned before the destination is modified. Errors
/// during the transfer are returned only after both workers have stopped.
pub fn sync_files(
    source: &Path,
    destination: &Path,
    options: &SyncOptions,
    progress: &dyn Progress,
) -> Result<SyncStats> {
    let start = Instant::now();

    if options.block_size == 0 {
        return Err(Error::InvalidBlockSize(options.block_size));
    }

    let (source_file, size) = open_source(source)?;
    let destination_file = open_destination(destination)?;

    let source = Endpoint {
        store: &source_file,
        path: source,
    };
    let destination = Endpoint {
        store: &destination_file,
        path: destination,
    };
    prepare(&source, &destination, size, options)?;

    info!(
        source = %source.path.display(),
        destination = %destination.path.display(),
        size,
        block_size = options.block_size,
        "sync started"
    );

    let setup = start.elapsed();
    let session = Session::new(progress);
    progress.start(size);
    let result = coordinator::run(&source, &destination, size, options, &session);
    progress.end();
    let report = result?;
    let transfer = start.elapsed() - setup;

    if options.fsync {
        finalize::flush(&destination_file, destination.path)?;
    }
    let duration = start.elapsed();

    let counters = session.counters();
    let stats = SyncStats {
        size,
        block_size: options.block_size,
        blocks: size.div_ceil(options.block_size as u64),
        bytes_read: counters.bytes_read,
        bytes_written: counters.bytes_written,
        bytes_zeroed: counters.bytes_zeroed,
        blocks_written: counters.blocks_written,
        blocks_zeroed: counters.blocks_zeroed,
        sparse: report.sparse,
        duration,
        phases: Phases {
            setup,
            transfer,
            flush: duration - setup - transfer,
        },
    };

    info!(
        bytes_read = stats.bytes_read,
        bytes_written = stats.bytes_written,
        bytes_zeroed = stats.bytes_zeroed,
        sparse = stats.sparse,
        duration_ms = stats.duration.as_millis() as u64,
        "sync finished"
    );

    Ok(stats)
}

fn open_source(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).map_err(|source| Error::OpenSource {
        path: path.to_path_buf(),
        source,
    })?;
    let meta = file.metadata().map_err(|source| Error::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.is_dir() {
        return Err(Error::IsADirectory(path.to_path_buf()));
    }
    Ok((file, meta.len()))
}

fn open_destination(path: &Path) -> Result<File> {
    // Opening a directory for writing fails with a less helpful error.
    if fs::metadata(path).is_ok_and(|meta| meta.is_dir()) {
        return Err(Error::IsADirectory(path.to_path_buf()));
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| Error::OpenDestination {
            path: path.to_path_buf(),
            source,
        })
}

/// Hint both files and bring the destination to `size` bytes.
///
/// A failed hint aborts before the resize, so the destination is untouched.
fn prepare<S: BlockStore, D: BlockStore>(
    source: &Endpoint<'_, S>,
    destination: &Endpoint<'_, D>,
    size: u64,
    options: &SyncOptions,
) -> Result<()> {
    if options.read_ahead {
        advise(source.store, source.path, size, options)?;
        advise(destination.store, destination.path, size, options)?;
    }
    finalize::resize(destination.store, destination.path, size)
}

fn advise<S: BlockStore>(
    store: &S,
    path: &Path,
    size: u64,
    options: &SyncOptions,
) -> Result<()> {
    match store.read_ahead(0, size) {
        Ok(()) => Ok(()),
        Err(e) if is_unsupported_error(&e) => {
            options.warn(&format!(
                "Read-ahead not supported on {}, continuing without it",
                path.display()
            ));
            Ok(())
        }
        Err(source) => Err(Error::ReadAhead {
            path: path.to_path_buf(),
            source,
        }),
    }
}
