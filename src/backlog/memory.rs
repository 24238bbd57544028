//! In-memory backlog engine
//!
//! Keeps every queue in a `BTreeMap` ordered by spool position. Writes made
//! inside a transaction are buffered and applied in one step on commit, so
//! other readers never see part of a transaction. Nothing survives a
//! restart; this engine backs tests and the stand-alone binary.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::engine::{BacklogEngine, Durability, QueueId, StoreError, Transaction};
use crate::types::SpoolKey;

type Table = BTreeMap<SpoolKey, Vec<u8>>;

#[derive(Debug, Default)]
struct Tables {
    names: Vec<String>,
    tables: Vec<Table>,
}

/// Engine holding every queue in memory
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: Mutex<Tables>,
    sync_commits: AtomicU64,
    nosync_commits: AtomicU64,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed transactions of the given durability
    #[must_use]
    pub fn commits(&self, durability: Durability) -> u64 {
        match durability {
            Durability::Sync => self.sync_commits.load(Ordering::Relaxed),
            Durability::NoSync => self.nosync_commits.load(Ordering::Relaxed),
        }
    }

    /// Names of every opened queue, in opening order
    #[must_use]
    pub fn queue_names(&self) -> Vec<String> {
        self.state().names.clone()
    }

    fn state(&self) -> MutexGuard<'_, Tables> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BacklogEngine for MemoryEngine {
    fn open_queue(&self, name: &str) -> Result<QueueId, StoreError> {
        let mut state = self.state();
        if let Some(i) = state.names.iter().position(|n| n == name) {
            return Ok(QueueId::new(i));
        }
        state.names.push(name.to_string());
        state.tables.push(Table::new());
        Ok(QueueId::new(state.tables.len() - 1))
    }

    fn begin(&self, durability: Durability) -> Result<Box<dyn Transaction + '_>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            engine: self,
            durability,
            writes: BTreeMap::new(),
        }))
    }
}

/// Buffered writes; `None` marks a delete
struct MemoryTransaction<'a> {
    engine: &'a MemoryEngine,
    durability: Durability,
    writes: BTreeMap<(QueueId, SpoolKey), Option<Vec<u8>>>,
}

impl MemoryTransaction<'_> {
    fn with_table<T>(
        &self,
        queue: QueueId,
        f: impl FnOnce(&Table) -> T,
    ) -> Result<T, StoreError> {
        let state = self.engine.state();
        let table = state
            .tables
            .get(queue.index())
            .ok_or(StoreError::UnknownQueue(queue))?;
        Ok(f(table))
    }

    /// Committed contents of `queue` with this transaction's writes applied
    fn view(&self, queue: QueueId) -> Result<Table, StoreError> {
        let mut table = self.with_table(queue, Table::clone)?;
        for ((q, key), value) in &self.writes {
            if *q != queue {
                continue;
            }
            match value {
                Some(v) => table.insert(*key, v.clone()),
                None => table.remove(key),
            };
        }
        Ok(table)
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn put(&mut self, queue: QueueId, key: SpoolKey, value: &[u8]) -> Result<(), StoreError> {
        self.with_table(queue, |_| ())?;
        self.writes.insert((queue, key), Some(value.to_vec()));
        Ok(())
    }

    fn get(&self, queue: QueueId, key: &SpoolKey) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(buffered) = self.writes.get(&(queue, *key)) {
            return Ok(buffered.clone());
        }
        self.with_table(queue, |t| t.get(key).cloned())
    }

    fn delete(&mut self, queue: QueueId, key: &SpoolKey) -> Result<(), StoreError> {
        if self.get(queue, key)?.is_none() {
            return Err(StoreError::NotFound);
        }
        self.writes.insert((queue, *key), None);
        Ok(())
    }

    fn scan(
        &self,
        queue: QueueId,
        after: Option<&SpoolKey>,
        limit: usize,
    ) -> Result<Vec<(SpoolKey, Vec<u8>)>, StoreError> {
        let table = self.view(queue)?;
        let start = match after {
            Some(key) => Bound::Excluded(*key),
            None => Bound::Unbounded,
        };
        Ok(table
            .range((start, Bound::Unbounded))
            .take(limit)
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn count(&self, queue: QueueId) -> Result<usize, StoreError> {
        Ok(self.view(queue)?.len())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self {
            engine,
            durability,
            writes,
        } = *self;

        let mut state = engine.state();
        for ((queue, key), value) in writes {
            let table = state
                .tables
                .get_mut(queue.index())
                .ok_or(StoreError::UnknownQueue(queue))?;
            match value {
                Some(v) => table.insert(key, v),
                None => table.remove(&key),
            };
        }
        drop(state);

        let counter = match durability {
            Durability::Sync => &engine.sync_commits,
            Durability::NoSync => &engine.nosync_commits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
