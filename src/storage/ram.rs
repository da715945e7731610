//! Fixed-capacity RAM implementation of the event storage transaction.

use crate::error::StorageError;
use crate::storage::EventStorage;

/// Event storage over a fixed internal RAM buffer of `N` bytes.
///
/// Committed bytes accumulate at the front of the buffer until the upload
/// path drains them with [`RamEventStorage::clear`]. Bytes staged by an open
/// transaction sit after the committed region and become durable only on a
/// non-rollback finish.
///
/// The usable capacity can be lowered below `N` at runtime, which is useful
/// when experimenting with how small the sink can be before heartbeats stop
/// fitting (see the worst-case size readout on the manager).
pub struct RamEventStorage<const N: usize> {
    buf: [u8; N],
    /// Bytes durably committed by finished transactions.
    committed: usize,
    /// Bytes staged by the open transaction.
    staged: usize,
    /// Usable capacity, at most `N`.
    limit: usize,
    active: bool,
    /// Set when an append overflowed; the transaction stages nothing more.
    failed: bool,
}

impl<const N: usize> RamEventStorage<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            committed: 0,
            staged: 0,
            limit: N,
            active: false,
            failed: false,
        }
    }

    /// The committed event bytes, in commit order.
    pub fn committed(&self) -> &[u8] {
        &self.buf[..self.committed]
    }

    /// Discards all committed bytes and any open transaction.
    pub fn clear(&mut self) {
        self.committed = 0;
        self.staged = 0;
        self.active = false;
        self.failed = false;
    }

    /// Lowers the usable capacity to `limit` bytes (clamped to `N`).
    pub fn set_capacity_limit(&mut self, limit: usize) {
        self.limit = limit.min(N);
    }

    /// Bytes still available to future transactions.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.committed)
    }
}

impl<const N: usize> Default for RamEventStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventStorage for RamEventStorage<N> {
    fn begin_write(&mut self) -> Result<(), StorageError> {
        if self.active {
            return Err(StorageError::Busy);
        }
        self.active = true;
        self.staged = 0;
        self.failed = false;
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if !self.active {
            return Err(StorageError::NoTransaction);
        }
        if self.failed {
            return Err(StorageError::OutOfSpace);
        }
        let end = self.committed + self.staged + bytes.len();
        if end > self.limit {
            // A failed transaction retains nothing it staged.
            self.staged = 0;
            self.failed = true;
            return Err(StorageError::OutOfSpace);
        }
        self.buf[self.committed + self.staged..end].copy_from_slice(bytes);
        self.staged += bytes.len();
        Ok(())
    }

    fn finish_write(&mut self, rollback: bool) -> Result<(), StorageError> {
        if !self.active {
            return Err(StorageError::NoTransaction);
        }
        self.active = false;
        if !rollback {
            self.committed += self.staged;
        }
        self.staged = 0;
        Ok(())
    }
}
