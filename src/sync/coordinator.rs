//! The coordinator: the only part of the engine that sees both files.
//!
//! It starts one worker per file, pairs their blocks by position, sends
//! every differing source block to the destination worker, and always runs
//! the same shutdown whether the loop finished or stopped early:
//!
//! 1. Close both write queues.
//! 2. Drain both read queues until each worker has hung up.
//! 3. Join both workers.
//!
//! Only then is an error returned, so no worker outlives the session.

use super::op::Op;
use super::punch::HolePunch;
use super::session::Session;
use super::store::BlockStore;
use super::worker::{Worker, WorkerReport};
use crate::error::{Error, Result, Side};
use crate::options::SyncOptions;
use crate::progress::{Occupancy, QueueLoad};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::Path;
use std::thread::{self, ScopedJoinHandle};

/// One side of the session: a store and the path used in error messages.
pub(crate) struct Endpoint<'a, S> {
    pub store: &'a S,
    pub path: &'a Path,
}

/// A worker hung up before delivering all of its blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stopped {
    side: Side,
    offset: u64,
}

struct Queues<'q> {
    source_reads: &'q Receiver<Op>,
    destination_reads: &'q Receiver<Op>,
    destination_writes: &'q Sender<Op>,
}

impl Queues<'_> {
    fn load(&self) -> QueueLoad {
        QueueLoad {
            source_reads: Occupancy {
                len: self.source_reads.len(),
                capacity: self.source_reads.capacity().unwrap_or(0),
            },
            destination_reads: Occupancy {
                len: self.destination_reads.len(),
                capacity: self.destination_reads.capacity().unwrap_or(0),
            },
            destination_writes: Occupancy {
                len: self.destination_writes.len(),
                capacity: self.destination_writes.capacity().unwrap_or(0),
            },
        }
    }
}

/// Bring `destination` in line with the first `size` bytes of `source`.
///
/// Both stores must already be `size` bytes long. Returns the destination
/// worker's report.
pub(crate) fn run<S: BlockStore, D: BlockStore>(
    source: &Endpoint<'_, S>,
    destination: &Endpoint<'_, D>,
    size: u64,
    options: &SyncOptions,
    session: &Session<'_>,
) -> Result<WorkerReport> {
    let depth = options.effective_queue_depth();

    let (source_reads_tx, source_reads) = bounded(depth);
    // Never carries a write; closing it is how the source worker is stopped.
    let (source_writes, source_writes_rx) = bounded::<Op>(1);
    let (destination_reads_tx, destination_reads) = bounded(depth);
    let (destination_writes, destination_writes_rx) = bounded(depth);

    debug!(size, block_size = options.block_size, depth, "starting workers");

    thread::scope(|scope| {
        let source_worker = Worker::new(
            Side::Source,
            source.store,
            source.path,
            options,
            size,
            source_reads_tx,
            source_writes_rx,
            session,
        );
        let destination_worker = Worker::new(
            Side::Destination,
            destination.store,
            destination.path,
            options,
            size,
            destination_reads_tx,
            destination_writes_rx,
            session,
        )
        .with_holes(HolePunch::new(options.punch_holes));

        let source_handle = scope.spawn(move || source_worker.run());
        let destination_handle = scope.spawn(move || destination_worker.run());

        let compared = compare(
            size,
            options.block_size as u64,
            &Queues {
                source_reads: &source_reads,
                destination_reads: &destination_reads,
                destination_writes: &destination_writes,
            },
            session,
        );

        drop(source_writes);
        drop(destination_writes);
        source_reads.iter().for_each(drop);
        destination_reads.iter().for_each(drop);

        let source_result = join(source_handle, Side::Source);
        let destination_result = join(destination_handle, Side::Destination);

        settle(
            compared,
            source_result,
            destination_result,
            source.path,
            destination.path,
        )
    })
}

fn compare(
    size: u64,
    block_size: u64,
    queues: &Queues<'_>,
    session: &Session<'_>,
) -> std::result::Result<(), Stopped> {
    let mut offset = 0;
    while offset < size {
        let expected = block_size.min(size - offset);
        let source = queues.source_reads.recv().map_err(|_| Stopped {
            side: Side::Source,
            offset,
        })?;
        check(&source, offset, expected, Side::Source)?;
        let destination = queues.destination_reads.recv().map_err(|_| Stopped {
            side: Side::Destination,
            offset,
        })?;
        check(&destination, offset, expected, Side::Destination)?;

        offset = source.end();
        session.record_read(source.len(), queues.load());

        if source.data() != destination.data() {
            trace!(offset = source.offset(), len = source.len(), "block differs");
            queues
                .destination_writes
                .send(source)
                .map_err(|rejected| Stopped {
                    side: Side::Destination,
                    offset: rejected.into_inner().offset(),
                })?;
        }
    }
    Ok(())
}

/// A short block means the file ended early, even inside the last block.
fn check(
    op: &Op,
    offset: u64,
    expected: u64,
    side: Side,
) -> std::result::Result<(), Stopped> {
    if op.offset() != offset || op.len() != expected {
        return Err(Stopped {
            side,
            offset: op.end(),
        });
    }
    Ok(())
}

fn join(
    handle: ScopedJoinHandle<'_, Result<WorkerReport>>,
    side: Side,
) -> Result<WorkerReport> {
    handle
        .join()
        .unwrap_or_else(|_| Err(Error::WorkerPanicked { side }))
}

/// Pick the error to report. A worker's own failure explains any early
/// stop, so it wins; a clean hang-up means the file got shorter.
fn settle(
    compared: std::result::Result<(), Stopped>,
    source: Result<WorkerReport>,
    destination: Result<WorkerReport>,
    source_path: &Path,
    destination_path: &Path,
) -> Result<WorkerReport> {
    let destination = match (source, destination) {
        (Err(e), _) | (_, Err(e)) => return Err(e),
        (Ok(_), Ok(destination)) => destination,
    };

    if let Err(Stopped { side, offset }) = compared {
        debug!(%side, offset, "worker hung up early");
        let path = match side {
            Side::Source => source_path,
            Side::Destination => destination_path,
        };
        return Err(Error::UnexpectedEof {
            path: path.to_path_buf(),
            offset,
        });
    }

    Ok(destination)
}
