//! Event storage sink behind a begin/append/finish transaction protocol.
//!
//! The protocol guarantees a serialized event is either fully committed or
//! fully discarded: bytes staged with [`EventStorage::append`] become
//! durable only when the transaction finishes without rollback. The
//! heartbeat serializer drives exactly one transaction per collection
//! attempt and rolls back whenever the event does not fit.

mod ram;

pub use ram::RamEventStorage;

use crate::error::StorageError;

/// A constrained storage sink accepting one exclusive write transaction at
/// a time.
pub trait EventStorage {
    /// Reserves the sink for one transaction.
    fn begin_write(&mut self) -> Result<(), StorageError>;

    /// Stages bytes into the open transaction. On [`StorageError::OutOfSpace`]
    /// nothing from this or any prior append of the same transaction is
    /// retained.
    fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Ends the open transaction: commits all staged bytes atomically when
    /// `rollback` is false, discards them when it is true. Exactly one call
    /// per `begin_write`.
    fn finish_write(&mut self, rollback: bool) -> Result<(), StorageError>;
}
