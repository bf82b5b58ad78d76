//! Error types for minsync.
//!
//! This module provides the [`Error`] enum containing all possible errors
//! that can occur during a sync session, the [`ErrorCode`] categories used
//! for machine-readable reporting, and the [`Result`] type alias.
//!
//! # Error Categories
//!
//! | Category | Errors |
//! |----------|--------|
//! | Setup | [`Error::OpenSource`], [`Error::OpenDestination`], [`Error::IsADirectory`], [`Error::Metadata`], [`Error::Resize`], [`Error::ReadAhead`], [`Error::InvalidBlockSize`] |
//! | Mid-sync | [`Error::Read`], [`Error::Write`], [`Error::PunchHole`], [`Error::UnexpectedEof`], [`Error::Sync`] |
//! | Internal | [`Error::WorkerPanicked`] |
//!
//! Setup errors are raised before the destination has been touched (except
//! [`Error::Resize`], which is the first mutation). Mid-sync errors are only
//! returned after both workers have shut down.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for minsync operations.
///
/// This is a type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Check if an IO error indicates "no space left on device".
///
/// # Platform Support
///
/// | Platform | Error Detection |
/// |----------|-----------------|
/// | Unix | `ENOSPC` (errno 28) |
/// | Windows | `ERROR_DISK_FULL` (0x70) |
pub fn is_no_space_error(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::StorageFull {
        return true;
    }

    #[cfg(unix)]
    {
        if let Some(raw_error) = error.raw_os_error() {
            const ENOSPC: i32 = 28;
            return raw_error == ENOSPC;
        }
    }

    #[cfg(windows)]
    {
        if let Some(raw_error) = error.raw_os_error() {
            const ERROR_DISK_FULL: i32 = 112;
            return raw_error == ERROR_DISK_FULL;
        }
    }

    false
}

/// Check if an IO error means the filesystem does not implement an operation.
///
/// This is the only error class the engine recovers from: a hole punch that
/// fails this way disables hole punching for the rest of the session, and a
/// read-ahead hint that fails this way is ignored.
///
/// Matches [`io::ErrorKind::Unsupported`] and, on Linux, `EOPNOTSUPP`
/// (which is also `ENOTSUP`) and `ENOSYS`.
///
/// # Example
///
/// ```
/// use std::io;
/// use minsync::is_unsupported_error;
///
/// let error = io::Error::new(io::ErrorKind::Unsupported, "no holes here");
/// assert!(is_unsupported_error(&error));
/// ```
pub fn is_unsupported_error(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::Unsupported {
        return true;
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(raw_error) = error.raw_os_error() {
            return raw_error == libc::EOPNOTSUPP || raw_error == libc::ENOSYS;
        }
    }

    false
}

/// Which side of the session a worker was serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The file being read from.
    Source,
    /// The file being brought up to date.
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// Stable, machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad configuration or arguments.
    InvalidInput,
    /// The source file does not exist.
    SourceNotFound,
    /// The destination file does not exist.
    DestinationNotFound,
    /// Access to one of the files was denied.
    PermissionDenied,
    /// The destination ran out of space.
    NoSpace,
    /// Any other I/O failure.
    IoError,
    /// A bug or a panicked worker.
    Internal,
}

impl ErrorCode {
    /// The snake_case name used in messages and structured output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::SourceNotFound => "source_not_found",
            Self::DestinationNotFound => "destination_not_found",
            Self::PermissionDenied => "permission_denied",
            Self::NoSpace => "no_space",
            Self::IoError => "io_error",
            Self::Internal => "internal",
        }
    }

    /// Classify a bare I/O error.
    pub fn from_io(error: &io::Error) -> Self {
        if is_no_space_error(error) {
            return Self::NoSpace;
        }
        if error.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied;
        }
        Self::IoError
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a sync session.
///
/// All errors include relevant path information to aid debugging.
/// Use the [`std::error::Error`] trait methods to access underlying
/// causes where applicable.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to open the source file for reading
    #[error("Failed to open source {path}: {source}")]
    OpenSource {
        /// Source path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to open the destination file for reading and writing
    #[error("Failed to open destination {path}: {source}")]
    OpenDestination {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// One of the paths is a directory
    #[error("Path is a directory, expected a regular file: {0}")]
    IsADirectory(PathBuf),

    /// Failed to stat a file
    #[error("Failed to read metadata of {path}: {source}")]
    Metadata {
        /// Path being inspected
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to truncate or extend the destination to the source length
    #[error("Failed to resize {path} to {size} bytes: {source}")]
    Resize {
        /// Destination path
        path: PathBuf,
        /// Requested length
        size: u64,
        /// Underlying error
        source: std::io::Error,
    },

    /// The read-ahead hint failed for a reason other than "unsupported"
    #[error("Failed to set read-ahead on {path}: {source}")]
    ReadAhead {
        /// Path being advised
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Block size of zero was configured
    #[error("Invalid block size: {0} (must be at least 1 byte)")]
    InvalidBlockSize(usize),

    /// Reading a block failed
    #[error("Failed to read {path} at offset {offset}: {source}")]
    Read {
        /// File being read
        path: PathBuf,
        /// Offset of the block
        offset: u64,
        /// Underlying error
        source: std::io::Error,
    },

    /// Writing a block to the destination failed
    #[error("Failed to write {path} at offset {offset}: {source}")]
    Write {
        /// File being written
        path: PathBuf,
        /// Offset of the block
        offset: u64,
        /// Underlying error
        source: std::io::Error,
    },

    /// Punching a hole failed for a reason other than "unsupported"
    #[error("Failed to punch hole in {path} at offset {offset} ({len} bytes): {source}")]
    PunchHole {
        /// File being written
        path: PathBuf,
        /// Start of the range
        offset: u64,
        /// Length of the range
        len: u64,
        /// Underlying error
        source: std::io::Error,
    },

    /// A file ended before the length recorded at session start
    ///
    /// This happens when a file is truncated by someone else while the
    /// session is running.
    #[error("Unexpected end of file in {path} at offset {offset}")]
    UnexpectedEof {
        /// File that got shorter
        path: PathBuf,
        /// Offset at which data ran out
        offset: u64,
    },

    /// The final durability sync of the destination failed
    #[error("Failed to sync {path} to disk: {source}")]
    Sync {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A worker thread panicked
    #[error("The {side} worker panicked")]
    WorkerPanicked {
        /// Which worker
        side: Side,
    },
}

impl Error {
    /// Classify the error into a stable [`ErrorCode`].
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidBlockSize(_) | Self::IsADirectory(_) => ErrorCode::InvalidInput,
            Self::OpenSource { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::SourceNotFound
            }
            Self::OpenDestination { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ErrorCode::DestinationNotFound
            }
            Self::OpenSource { source, .. }
            | Self::OpenDestination { source, .. }
            | Self::Metadata { source, .. }
            | Self::Resize { source, .. }
            | Self::ReadAhead { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::PunchHole { source, .. }
            | Self::Sync { source, .. } => ErrorCode::from_io(source),
            Self::UnexpectedEof { .. } => ErrorCode::IoError,
            Self::WorkerPanicked { .. } => ErrorCode::Internal,
        }
    }
}
