//! Session-wide counters.
//!
//! The coordinator records bytes read and the destination worker records
//! bytes written or zeroed. Both go through one lock, and every update is
//! forwarded to the session's [`Progress`] observer.

use crate::progress::{Progress, QueueLoad};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub bytes_zeroed: u64,
    pub blocks_written: u64,
    pub blocks_zeroed: u64,
}

pub(crate) struct Session<'a> {
    counters: Mutex<Counters>,
    progress: &'a dyn Progress,
}

impl<'a> Session<'a> {
    pub(crate) fn new(progress: &'a dyn Progress) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            progress,
        }
    }

    fn update(&self, f: impl FnOnce(&mut Counters)) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut counters);
    }

    pub(crate) fn record_read(&self, n: u64, load: QueueLoad) {
        self.update(|c| c.bytes_read += n);
        self.progress.queues(load);
        self.progress.read(n);
    }

    pub(crate) fn record_written(&self, n: u64) {
        self.update(|c| {
            c.bytes_written += n;
            c.blocks_written += 1;
        });
        self.progress.written(n);
    }

    pub(crate) fn record_zeroed(&self, n: u64) {
        self.update(|c| {
            c.bytes_zeroed += n;
            c.blocks_zeroed += 1;
        });
        self.progress.zeroed(n);
    }

    pub(crate) fn counters(&self) -> Counters {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
