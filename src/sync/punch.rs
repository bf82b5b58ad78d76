//! Hole-punch policy for the destination write path.
//!
//! An all-zero block is deallocated instead of written while the session
//! still believes the filesystem supports holes. The first "unsupported"
//! answer flips that belief for good and the block is written instead.
//! Any other punch failure is fatal.

use super::op::Op;
use super::store::BlockStore;
use crate::error::{Error, Result, is_unsupported_error};
use std::path::Path;

/// What happened to a block handed to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The range became a hole.
    Punched,
    /// The bytes were written.
    Written,
    /// Punching was refused as unsupported; the bytes were written and
    /// hole punching is now off.
    Fallback,
}

/// Owner of the sparse-capability flag. Lives inside the destination worker.
#[derive(Debug)]
pub(crate) struct HolePunch {
    supported: bool,
}

impl HolePunch {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { supported: enabled }
    }

    pub(crate) fn is_supported(&self) -> bool {
        self.supported
    }

    /// Apply one write command to `store`.
    pub(crate) fn apply<S: BlockStore>(
        &mut self,
        store: &S,
        path: &Path,
        op: &Op,
    ) -> Result<Outcome> {
        if self.supported && op.is_zero() {
            match store.punch_hole(op.offset(), op.len()) {
                Ok(()) => return Ok(Outcome::Punched),
                Err(e) if is_unsupported_error(&e) => {
                    self.supported = false;
                    write_block(store, path, op)?;
                    return Ok(Outcome::Fallback);
                }
                Err(source) => {
                    return Err(Error::PunchHole {
                        path: path.to_path_buf(),
                        offset: op.offset(),
                        len: op.len(),
                        source,
                    });
                }
            }
        }

        write_block(store, path, op)?;
        Ok(Outcome::Written)
    }
}

/// Write a block's bytes at its offset.
pub(crate) fn write_block<S: BlockStore>(store: &S, path: &Path, op: &Op) -> Result<()> {
    store
        .write_all_at(op.data(), op.offset())
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            offset: op.offset(),
            source,
        })
}
