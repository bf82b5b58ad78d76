//! Builder API for ergonomic sync sessions.
//!
//! The builder pattern provides a fluent interface for configuring and running
//! a sync. This is often more convenient than manually constructing
//! [`SyncOptions`] and calling [`sync_files`].
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use minsync::SyncBuilder;
//!
//! let stats = SyncBuilder::new("disk.img", "backup.img").run()?;
//! println!("Wrote {} bytes", stats.bytes_written);
//! # Ok::<(), minsync::Error>(())
//! ```
//!
//! ## With Options
//!
//! ```no_run
//! use minsync::SyncBuilder;
//!
//! let stats = SyncBuilder::new("disk.img", "backup.img")
//!     .block_size(64 * 1024)  // Compare 64 KiB at a time
//!     .no_hole_punching()     // Keep the destination fully allocated
//!     .no_fsync()             // Leave flushing to the OS
//!     .run()?;
//! # Ok::<(), minsync::Error>(())
//! ```

use crate::error::Result;
use crate::options::SyncOptions;
use crate::progress::{NoProgress, Progress};
use crate::sync::{SyncStats, sync_files};
use std::fmt;
use std::path::{Path, PathBuf};

/// A builder for configuring and running a sync session.
///
/// # Example
///
/// ```no_run
/// use minsync::SyncBuilder;
///
/// let stats = SyncBuilder::new("/images/vm.qcow2", "/backup/vm.qcow2")
///     .queue_depth(1024)
///     .run()?;
/// # Ok::<(), minsync::Error>(())
/// ```
pub struct SyncBuilder<'a> {
    source: PathBuf,
    destination: PathBuf,
    options: SyncOptions,
    progress: &'a dyn Progress,
}

impl fmt::Debug for SyncBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncBuilder")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SyncBuilder<'static> {
    /// Create a new `SyncBuilder` with the given source and destination paths.
    ///
    /// Uses default options (4 KiB blocks, hole punching, read-ahead, fsync)
    /// and no progress observer.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
            options: SyncOptions::default(),
            progress: &NoProgress,
        }
    }
}

impl<'a> SyncBuilder<'a> {
    /// Set the block size in bytes.
    ///
    /// Smaller blocks find smaller differences but cost more per byte.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use minsync::SyncBuilder;
    ///
    /// let stats = SyncBuilder::new("a.img", "b.img")
    ///     .block_size(1024 * 1024)
    ///     .run()?;
    /// # Ok::<(), minsync::Error>(())
    /// ```
    #[must_use]
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.options = self.options.with_block_size(block_size);
        self
    }

    /// Set the capacity of each queue in blocks.
    #[must_use]
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.options = self.options.with_queue_depth(depth);
        self
    }

    /// Write all-zero blocks instead of punching holes.
    #[must_use]
    pub fn no_hole_punching(mut self) -> Self {
        self.options = self.options.without_hole_punching();
        self
    }

    /// Skip the sequential read-ahead hint.
    #[must_use]
    pub fn no_read_ahead(mut self) -> Self {
        self.options = self.options.without_read_ahead();
        self
    }

    /// Disable the final fsync of the destination.
    ///
    /// This improves performance but reduces durability guarantees.
    /// Changes may be lost if the system crashes before the OS flushes buffers.
    #[must_use]
    pub fn no_fsync(mut self) -> Self {
        self.options = self.options.without_fsync();
        self
    }

    /// Receive warnings about degraded capabilities.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use minsync::SyncBuilder;
    ///
    /// let stats = SyncBuilder::new("a.img", "b.img")
    ///     .on_warning(|msg| eprintln!("warning: {msg}"))
    ///     .run()?;
    /// # Ok::<(), minsync::Error>(())
    /// ```
    #[must_use]
    pub fn on_warning(mut self, handler: fn(&str)) -> Self {
        self.options = self.options.with_warn_handler(handler);
        self
    }

    /// Feed byte counts to `progress` while the session runs.
    #[must_use]
    pub fn progress<'b>(self, progress: &'b dyn Progress) -> SyncBuilder<'b> {
        SyncBuilder {
            source: self.source,
            destination: self.destination,
            options: self.options,
            progress,
        }
    }

    /// Replace all options at once.
    #[must_use]
    pub fn options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the sync session.
    ///
    /// See [`sync_files`] for the error conditions.
    pub fn run(self) -> Result<SyncStats> {
        sync_files(&self.source, &self.destination, &self.options, self.progress)
    }
}
