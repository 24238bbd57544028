//! Transactional key/value engine interface
//!
//! The backlog only needs ordered tables keyed by [`SpoolKey`] and
//! transactions that either commit every write or none of them. Dropping a
//! [`Transaction`] without committing it aborts it.

use std::fmt;

use thiserror::Error;

use crate::types::SpoolKey;

/// Handle to an opened queue table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(usize);

impl QueueId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// How hard a commit tries to reach stable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Durability {
    /// Flush to disk before the commit returns
    Sync,
    /// Commit is durable once the engine's log is next flushed
    NoSync,
}

impl Durability {
    #[must_use]
    pub fn from_sync(sync: bool) -> Self {
        if sync { Self::Sync } else { Self::NoSync }
    }
}

/// Errors reported by a storage engine
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("key not found")]
    NotFound,

    #[error("unknown queue {0:?}")]
    UnknownQueue(QueueId),

    #[error("cannot open queue {name}: {reason}")]
    Open { name: String, reason: String },

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("corrupt entry: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// A transactional store of ordered queue tables
pub trait BacklogEngine: Send + Sync + fmt::Debug {
    /// Open (creating if needed) the queue table called `name`
    ///
    /// Opening the same name twice returns the same handle.
    fn open_queue(&self, name: &str) -> Result<QueueId, StoreError>;

    /// Start a transaction
    fn begin(&self, durability: Durability) -> Result<Box<dyn Transaction + '_>, StoreError>;
}

/// One open transaction
pub trait Transaction: Send {
    fn put(&mut self, queue: QueueId, key: SpoolKey, value: &[u8]) -> Result<(), StoreError>;

    fn get(&self, queue: QueueId, key: &SpoolKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete `key`; [`StoreError::NotFound`] if it is not there
    fn delete(&mut self, queue: QueueId, key: &SpoolKey) -> Result<(), StoreError>;

    /// Up to `limit` entries in key order, starting after `after`
    fn scan(
        &self,
        queue: QueueId,
        after: Option<&SpoolKey>,
        limit: usize,
    ) -> Result<Vec<(SpoolKey, Vec<u8>)>, StoreError>;

    /// Number of entries in a queue
    fn count(&self, queue: QueueId) -> Result<usize, StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
