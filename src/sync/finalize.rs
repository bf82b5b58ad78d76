//! Destination length before the session, durability after it.

use super::store::BlockStore;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;

/// Truncate or extend `file` to exactly `size` bytes.
///
/// Extension adds implicit zeros, so a short destination compares against
/// the tail of the source like any other zero region.
pub(crate) fn resize<S: BlockStore>(store: &S, path: &Path, size: u64) -> Result<()> {
    store.set_len(size).map_err(|source| Error::Resize {
        path: path.to_path_buf(),
        size,
        source,
    })
}

/// Flush data, holes and length of `file` to stable storage.
pub(crate) fn flush(file: &File, path: &Path) -> Result<()> {
    file.sync_all().map_err(|source| Error::Sync {
        path: path.to_path_buf(),
        source,
    })
}
