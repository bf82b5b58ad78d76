//! Per-file block worker.
//!
//! A worker owns the read cursor of one file. It streams the file as
//! consecutive blocks into its read queue and applies write commands from
//! its write queue to the same file. Pending writes always go first: the
//! worker checks its write queue before every read, and keeps accepting
//! writes while it waits for room in a full read queue. The latter is what
//! keeps a full write queue and a full read queue from waiting on each
//! other.
//!
//! Lifecycle:
//! - At the end of its range the worker closes its read queue and from then
//!   on only applies writes.
//! - Once the write queue is closed and empty the worker returns, closing
//!   its read queue if still open.
//! - On an I/O error the worker returns the error immediately; dropping its
//!   queue ends tell the coordinator to stop.

use super::op::Op;
use super::punch::{HolePunch, Outcome, write_block};
use super::session::Session;
use super::store::BlockStore;
use crate::error::{Error, Result, Side};
use crate::options::SyncOptions;
use crossbeam_channel::{Receiver, Select, Sender, TryRecvError, TrySendError};
use std::path::Path;

/// What a worker reports back when it exits cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkerReport {
    /// Bytes streamed into the read queue
    pub bytes_read: u64,
    /// Final state of the sparse flag (always false without a policy)
    pub sparse: bool,
}

enum Delivery {
    Sent,
    /// The coordinator stopped listening.
    Dropped,
    /// The write queue closed while waiting.
    Shutdown,
}

pub(crate) struct Worker<'a, S: BlockStore> {
    side: Side,
    store: &'a S,
    path: &'a Path,
    options: &'a SyncOptions,
    offset: u64,
    end: u64,
    reads: Option<Sender<Op>>,
    writes: Receiver<Op>,
    holes: Option<HolePunch>,
    session: &'a Session<'a>,
}

impl<'a, S: BlockStore> Worker<'a, S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        side: Side,
        store: &'a S,
        path: &'a Path,
        options: &'a SyncOptions,
        end: u64,
        reads: Sender<Op>,
        writes: Receiver<Op>,
        session: &'a Session<'a>,
    ) -> Self {
        Self {
            side,
            store,
            path,
            options,
            offset: 0,
            end,
            reads: Some(reads),
            writes,
            holes: None,
            session,
        }
    }

    /// Route all-zero writes through a hole-punch policy.
    pub(crate) fn with_holes(mut self, holes: HolePunch) -> Self {
        self.holes = Some(holes);
        self
    }

    pub(crate) fn run(mut self) -> Result<WorkerReport> {
        debug!(side = %self.side, path = %self.path.display(), "worker started");
        let result = self.serve();
        if let Err(ref e) = result {
            debug!(side = %self.side, offset = self.offset, error = %e, "worker aborted");
        } else {
            debug!(side = %self.side, offset = self.offset, "worker finished");
        }
        result.map(|()| WorkerReport {
            bytes_read: self.offset,
            sparse: self.holes.as_ref().is_some_and(HolePunch::is_supported),
        })
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            match self.writes.try_recv() {
                Ok(op) => {
                    self.apply(op)?;
                    continue;
                }
                Err(TryRecvError::Disconnected) => return Ok(()),
                Err(TryRecvError::Empty) => {}
            }

            let Some(reads) = self.reads.take() else {
                // Past the end: nothing left but writes.
                match self.writes.recv() {
                    Ok(op) => self.apply(op)?,
                    Err(_) => return Ok(()),
                }
                continue;
            };

            let Some(op) = self.read_next()? else {
                trace!(side = %self.side, offset = self.offset, "end of range");
                // `reads` dropped here: the queue closes behind the last block.
                continue;
            };

            match self.push(&reads, op)? {
                Delivery::Sent => self.reads = Some(reads),
                Delivery::Dropped => {}
                Delivery::Shutdown => return Ok(()),
            }
        }
    }

    fn read_next(&mut self) -> Result<Option<Op>> {
        let want = self
            .end
            .saturating_sub(self.offset)
            .min(self.options.block_size as u64) as usize;
        if want == 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; want];
        let n = self
            .store
            .read_block(&mut buf, self.offset)
            .map_err(|source| Error::Read {
                path: self.path.to_path_buf(),
                offset: self.offset,
                source,
            })?;
        if n == 0 {
            return Ok(None);
        }

        buf.truncate(n);
        let op = Op::new(self.offset, buf);
        self.offset = op.end();
        Ok(Some(op))
    }

    /// Hand `op` to the coordinator, applying writes while the queue is full.
    fn push(&mut self, reads: &Sender<Op>, mut op: Op) -> Result<Delivery> {
        loop {
            match self.writes.try_recv() {
                Ok(write) => {
                    self.apply(write)?;
                    continue;
                }
                Err(TryRecvError::Disconnected) => return Ok(Delivery::Shutdown),
                Err(TryRecvError::Empty) => {}
            }

            match reads.try_send(op) {
                Ok(()) => return Ok(Delivery::Sent),
                Err(TrySendError::Disconnected(_)) => return Ok(Delivery::Dropped),
                Err(TrySendError::Full(back)) => op = back,
            }

            // Backpressure: sleep until there is room or a write arrives.
            let mut select = Select::new();
            select.send(reads);
            select.recv(&self.writes);
            select.ready();
        }
    }

    fn apply(&mut self, op: Op) -> Result<()> {
        let outcome = match self.holes.as_mut() {
            Some(holes) => holes.apply(self.store, self.path, &op)?,
            None => {
                write_block(self.store, self.path, &op)?;
                Outcome::Written
            }
        };

        match outcome {
            Outcome::Punched => {
                trace!(side = %self.side, offset = op.offset(), len = op.len(), "punched hole");
                self.session.record_zeroed(op.len());
            }
            Outcome::Written => {
                trace!(side = %self.side, offset = op.offset(), len = op.len(), "wrote block");
                self.session.record_written(op.len());
            }
            Outcome::Fallback => {
                self.options.warn(&format!(
                    "Hole punching not supported on {}, writing zero blocks instead",
                    self.path.display()
                ));
                self.session.record_written(op.len());
            }
        }
        Ok(())
    }
}
