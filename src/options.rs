//! Configuration options for sync sessions.
//!
//! This module provides [`SyncOptions`], the explicit per-session
//! configuration passed into the engine.
//!
//! # Example
//!
//! ```
//! use minsync::SyncOptions;
//!
//! let options = SyncOptions::default()
//!     .with_block_size(64 * 1024)
//!     .with_queue_depth(1024)
//!     .without_hole_punching();
//! ```

/// Default size of one block: 4 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024;

/// Memory budget of one queue when the depth is derived from the block size.
pub const DEFAULT_QUEUE_BYTES: usize = 128 * 1024 * 1024;

/// Upper bound on a derived queue depth. Queue slots are allocated up
/// front, so tiny blocks must not turn the byte budget into millions of slots.
const MAX_DERIVED_QUEUE_DEPTH: usize = 64 * 1024;

/// Options for a sync session.
///
/// Use [`Default::default()`] to get sensible defaults, then customize
/// using the builder methods.
///
/// # Default Values
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `block_size` | 4 KiB | Unit of comparison and transfer |
/// | `queue_depth` | `None` | 128 MiB worth of blocks per queue |
/// | `punch_holes` | `true` | Turn all-zero blocks into holes |
/// | `read_ahead` | `true` | Advise sequential access on both files |
/// | `fsync` | `true` | Sync the destination to disk at the end |
///
/// Memory use is bounded by roughly three queues of `queue_depth` blocks.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncOptions {
    /// Size of a block in bytes (default: 4096)
    pub block_size: usize,

    /// Capacity of each queue in blocks (default: derived from block size)
    pub queue_depth: Option<usize>,

    /// Whether to punch holes for all-zero blocks (default: true)
    ///
    /// This is only the starting value of the session's sparse flag. The
    /// first "unsupported" answer from the filesystem turns it off.
    pub punch_holes: bool,

    /// Whether to issue the sequential read-ahead hint (default: true)
    pub read_ahead: bool,

    /// Whether to sync the destination to disk after writing (default: true)
    pub fsync: bool,

    /// Callback for warnings (optional)
    ///
    /// If not set and `tracing` feature is enabled, warnings are logged via tracing.
    /// Otherwise, warnings are silently ignored.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub warn_handler: Option<fn(&str)>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            queue_depth: None,
            punch_holes: true,
            read_ahead: true,
            fsync: true,
            warn_handler: None,
        }
    }
}

impl SyncOptions {
    /// Create options with a warning handler
    #[must_use]
    pub fn with_warn_handler(mut self, handler: fn(&str)) -> Self {
        self.warn_handler = Some(handler);
        self
    }

    /// Set the block size in bytes
    ///
    /// A block size of zero is rejected when the session starts.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the queue capacity in blocks
    ///
    /// Value is clamped to at least 1.
    #[must_use]
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = Some(depth.max(1));
        self
    }

    /// Never attempt to punch holes; zero blocks are written like any other
    #[must_use]
    pub fn without_hole_punching(mut self) -> Self {
        self.punch_holes = false;
        self
    }

    /// Skip the read-ahead hint
    #[must_use]
    pub fn without_read_ahead(mut self) -> Self {
        self.read_ahead = false;
        self
    }

    /// Disable the final fsync for faster (but less durable) syncs
    #[must_use]
    pub fn without_fsync(mut self) -> Self {
        self.fsync = false;
        self
    }

    /// Effective queue capacity in blocks.
    pub fn effective_queue_depth(&self) -> usize {
        match self.queue_depth {
            Some(depth) => depth.max(1),
            None => (DEFAULT_QUEUE_BYTES / self.block_size.max(1)).clamp(1, MAX_DERIVED_QUEUE_DEPTH),
        }
    }

    pub(crate) fn warn(&self, msg: &str) {
        if let Some(handler) = self.warn_handler {
            handler(msg);
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("{}", msg);
        }
    }
}
