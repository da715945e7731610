//! Error types for the heartbeat subsystem.
//!
//! Nothing in this crate is fatal: every operation returns a `Result` and
//! out-of-space is an ordinary, recoverable outcome given the fixed small
//! buffers typical of embedded targets.

use thiserror_no_std::Error;

/// Failures reported by an [`EventStorage`](crate::storage::EventStorage)
/// sink.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// A transaction is already in progress on the sink.
    #[error("storage sink is busy")]
    Busy,
    /// The operation requires an open transaction.
    #[error("no storage transaction in progress")]
    NoTransaction,
    /// The sink's remaining space cannot hold the staged bytes.
    #[error("insufficient space in storage sink")]
    OutOfSpace,
    /// The staged bytes could not be committed.
    #[error("storage sink commit failed")]
    CommitFailed,
}

/// Failures reported by the metrics store and the heartbeat serializer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    /// The operation does not match the metric's declared type.
    #[error("operation does not match the metric's declared type")]
    InvalidType,
    /// `timer_start` was called while a start is already pending.
    #[error("timer metric is already running")]
    AlreadyRunning,
    /// `timer_stop` was called with no start pending.
    #[error("timer metric is not running")]
    NotRunning,
    /// The metric id or name is not declared in the registry.
    #[error("metric is not declared in the registry")]
    UnknownMetric,
    /// The storage transaction could not be opened.
    #[error("storage transaction could not begin: {0}")]
    StorageBegin(StorageError),
    /// The encoded event does not fit in the sink's remaining space. The
    /// value store is left unchanged so the next attempt retries with the
    /// accumulated data intact.
    #[error("heartbeat event does not fit in remaining storage")]
    StorageCapacity,
    /// The sink accepted every append but failed to commit.
    #[error("storage commit failed: {0}")]
    StorageCommit(StorageError),
}
