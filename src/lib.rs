//! # minsync
//!
//! Make one file identical to another while writing as little as possible.
//!
//! ## Core Features
//!
//! - **Minimal writes**: Blocks that already match are never rewritten
//! - **Sparse aware**: All-zero blocks become holes where the filesystem supports it
//! - **Bounded memory**: Fixed-capacity queues between the two file workers and the coordinator
//! - **Always joins**: Both workers are stopped and joined before any error is returned
//! - **Durable**: The destination is synced to disk at the end (optional)
//!
//! Typical targets are disk images, VM snapshots and backups, where most of a
//! large file is unchanged between runs.
//!
//! ## Quick Start with Builder API
//!
//! ```no_run
//! use minsync::SyncBuilder;
//!
//! let stats = SyncBuilder::new("vm.img", "/backup/vm.img").run()?;
//! println!(
//!     "Wrote {} bytes, zeroed {} bytes ({:.1}% changed)",
//!     stats.bytes_written,
//!     stats.bytes_zeroed,
//!     stats.write_ratio()
//! );
//! # Ok::<(), minsync::Error>(())
//! ```
//!
//! ## Function API
//!
//! ```no_run
//! use minsync::{NoProgress, SyncOptions, sync_files};
//! use std::path::Path;
//!
//! let options = SyncOptions::default()
//!     .with_block_size(64 * 1024)   // Larger blocks for fast disks
//!     .with_queue_depth(256)        // 16 MiB per queue
//!     .without_fsync();             // Faster but less durable
//!
//! let stats = sync_files(Path::new("a.img"), Path::new("b.img"), &options, &NoProgress)?;
//! # Ok::<(), minsync::Error>(())
//! ```
//!
//! ## Semantics
//!
//! The destination must exist. It is truncated or extended to the source
//! length before any block is compared, so afterwards both length and content
//! match the source. The source is only read. Its length is taken once at
//! the start; if either file gets shorter during the session the sync fails
//! with [`Error::UnexpectedEof`].
//!
//! Hole punching is tried on the first all-zero block. If the filesystem
//! answers "not supported" the session falls back to writing zeros for the
//! rest of the run and [`SyncStats::sparse`] reports `false`.
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `progress` | Live terminal report with indicatif |
//! | `tracing` | Structured logging with tracing crate |
//! | `serde` | Serialize/Deserialize for [`SyncOptions`], Serialize for [`SyncStats`] |
//! | `full` | Enable all optional features |

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod macros;

mod builder;
mod error;
mod options;
mod progress;
mod sync;

pub use builder::SyncBuilder;
pub use error::{Error, ErrorCode, Result, Side, is_no_space_error, is_unsupported_error};
pub use options::{DEFAULT_BLOCK_SIZE, DEFAULT_QUEUE_BYTES, SyncOptions};
pub use progress::{
    NoProgress, Occupancy, Progress, QueueLoad, Render, Snapshot, Tracker, format_bytes,
    format_duration,
};
pub use sync::{Phases, SyncStats, sync_files};

#[cfg(feature = "progress")]
#[cfg_attr(docsrs, doc(cfg(feature = "progress")))]
pub use progress::TerminalRender;
