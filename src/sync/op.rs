//! The unit of work passed between workers and the coordinator.

/// A block at a given offset.
///
/// Coming out of a worker it means "this is what I read at `offset`";
/// going into a worker it means "write this at `offset`". The payload is
/// at most one block long and is moved, never shared, across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Op {
    offset: u64,
    data: Vec<u8>,
}

impl Op {
    pub(crate) fn new(offset: u64, data: Vec<u8>) -> Self {
        Self { offset, data }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Offset one past the last byte of this block.
    pub(crate) fn end(&self) -> u64 {
        self.offset + self.len()
    }

    /// True when every byte of the payload is zero.
    pub(crate) fn is_zero(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}
