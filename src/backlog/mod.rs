//! Durable per-peer delivery queues
//!
//! Every peer owns two ordered queues in the backlog engine: the active
//! queue (`queue.<peer>.db`) that routing appends to and the deferred queue
//! (`defer.<peer>.db`) holding articles the peer asked us to retry later.
//! Entries map a spool position to the article's message-id, so a queue
//! drains in spool order.

mod engine;
mod memory;

pub use engine::{BacklogEngine, Durability, QueueId, StoreError, Transaction};
pub use memory::MemoryEngine;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::article::Article;
use crate::constants::backlog::{ACTIVE_PREFIX, DEFERRED_PREFIX, SUFFIX};
use crate::peer::PeerRegistry;
use crate::types::{MessageId, PeerName, SpoolPosition};

/// Which of a peer's two queues an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Active,
    Deferred,
}

impl QueueKind {
    /// Store table name for `peer`'s queue of this kind
    #[must_use]
    pub fn table_name(self, peer: &str) -> String {
        let prefix = match self {
            Self::Active => ACTIVE_PREFIX,
            Self::Deferred => DEFERRED_PREFIX,
        };
        format!("{prefix}.{peer}.{SUFFIX}")
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Deferred => f.write_str("deferred"),
        }
    }
}

/// One queued article for one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    position: SpoolPosition,
    message_id: MessageId,
    kind: QueueKind,
}

impl QueueEntry {
    #[must_use]
    pub fn new(position: SpoolPosition, message_id: MessageId, kind: QueueKind) -> Self {
        Self {
            position,
            message_id,
            kind,
        }
    }

    #[must_use]
    pub fn position(&self) -> SpoolPosition {
        self.position
    }

    #[must_use]
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    #[must_use]
    pub fn kind(&self) -> QueueKind {
        self.kind
    }
}

/// Backlog failures
///
/// `Open` and `Fatal` mean the backlog can no longer be trusted; callers are
/// expected to stop the service.
#[derive(Debug, Error)]
pub enum BacklogError {
    #[error("no backlog queues for peer \"{0}\"")]
    UnknownPeer(String),

    #[error("cannot open backlog queue {queue}: {source}")]
    Open { queue: String, source: StoreError },

    #[error("{context}: {source}")]
    Fatal { context: String, source: StoreError },
}

impl BacklogError {
    fn fatal(context: impl Into<String>) -> impl FnOnce(StoreError) -> Self {
        let context = context.into();
        move |source| Self::Fatal { context, source }
    }
}

#[derive(Debug, Clone, Copy)]
struct PeerQueues {
    active: QueueId,
    deferred: QueueId,
}

impl PeerQueues {
    fn get(&self, kind: QueueKind) -> QueueId {
        match kind {
            QueueKind::Active => self.active,
            QueueKind::Deferred => self.deferred,
        }
    }
}

/// Transactional enqueue, defer and remove over every peer's queues
#[derive(Debug)]
pub struct BacklogStore {
    engine: Arc<dyn BacklogEngine>,
    queues: HashMap<PeerName, PeerQueues>,
    durability: Durability,
}

impl BacklogStore {
    /// Open (creating if needed) both queues of every configured peer
    ///
    /// `sync` selects the durability of routing transactions. Any open
    /// failure is returned and should abort startup.
    pub fn open(
        engine: Arc<dyn BacklogEngine>,
        registry: &PeerRegistry,
        sync: bool,
    ) -> Result<Self, BacklogError> {
        let mut queues = HashMap::with_capacity(registry.len());
        for peer in registry.iter() {
            let open = |kind: QueueKind| {
                let queue = kind.table_name(peer.name());
                engine
                    .open_queue(&queue)
                    .map_err(|source| BacklogError::Open { queue, source })
            };
            let handles = PeerQueues {
                active: open(QueueKind::Active)?,
                deferred: open(QueueKind::Deferred)?,
            };
            queues.insert(peer.name().clone(), handles);
        }

        info!(
            "Opened backlog queues for {} peer(s){}",
            queues.len(),
            if sync { "" } else { " (no sync on commit)" }
        );

        Ok(Self {
            engine,
            queues,
            durability: Durability::from_sync(sync),
        })
    }

    /// Durability used for routing transactions
    #[must_use]
    pub fn durability(&self) -> Durability {
        self.durability
    }

    /// Start a routing transaction
    pub fn begin(&self) -> Result<Box<dyn Transaction + '_>, BacklogError> {
        self.engine
            .begin(self.durability)
            .map_err(BacklogError::fatal("cannot begin backlog transaction"))
    }

    fn queues(&self, peer: &PeerName) -> Result<PeerQueues, BacklogError> {
        self.queues
            .get(peer)
            .copied()
            .ok_or_else(|| BacklogError::UnknownPeer(peer.to_string()))
    }

    /// Append `article` to `peer`'s active queue inside `txn`
    ///
    /// Nothing is visible until the caller commits `txn`.
    pub fn enqueue(
        &self,
        peer: &PeerName,
        article: &Article,
        txn: &mut dyn Transaction,
    ) -> Result<QueueEntry, BacklogError> {
        let queue = self.queues(peer)?.active;
        let position = article.position();
        txn.put(queue, position.to_key(), article.message_id().as_bytes())
            .map_err(BacklogError::fatal(format!(
                "cannot write to active queue of {peer}"
            )))?;

        debug!(
            "Queued {} at {} for {}",
            article.message_id(),
            position,
            peer
        );
        Ok(QueueEntry::new(
            position,
            article.message_id().clone(),
            QueueKind::Active,
        ))
    }

    /// Move an entry from the active queue to the deferred queue
    ///
    /// An entry already gone from the active queue is logged and still
    /// written to the deferred queue.
    pub fn defer(&self, peer: &PeerName, entry: QueueEntry) -> Result<(), BacklogError> {
        let queues = self.queues(peer)?;
        let key = entry.position.to_key();

        let mut txn = self
            .engine
            .begin(Durability::NoSync)
            .map_err(BacklogError::fatal("cannot begin defer transaction"))?;

        match txn.delete(queues.active, &key) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => warn!(
                "Deferring {} for {}: entry {} not in active queue",
                entry.message_id, peer, entry.position
            ),
            Err(source) => {
                return Err(BacklogError::Fatal {
                    context: format!("cannot delete from active queue of {peer}"),
                    source,
                });
            }
        }

        txn.put(queues.deferred, key, entry.message_id.as_bytes())
            .map_err(BacklogError::fatal(format!(
                "cannot write to deferred queue of {peer}"
            )))?;
        txn.commit()
            .map_err(BacklogError::fatal("cannot commit defer transaction"))?;

        debug!("Deferred {} at {} for {}", entry.message_id, entry.position, peer);
        Ok(())
    }

    /// Delete an entry from the queue it lives in
    ///
    /// A failed delete is logged and the transaction still committed; only
    /// a failed commit is an error.
    pub fn remove(&self, peer: &PeerName, entry: QueueEntry) -> Result<(), BacklogError> {
        let queue = self.queues(peer)?.get(entry.kind);

        let mut txn = self
            .engine
            .begin(Durability::NoSync)
            .map_err(BacklogError::fatal("cannot begin remove transaction"))?;

        if let Err(e) = txn.delete(queue, &entry.position.to_key()) {
            warn!(
                "Cannot remove backlog entry {} ({}) from {} queue of {}: {}",
                entry.position, entry.message_id, entry.kind, peer, e
            );
        }

        txn.commit()
            .map_err(BacklogError::fatal("cannot commit remove transaction"))
    }

    /// Up to `limit` entries of one queue in spool order, after `after`
    pub fn pending(
        &self,
        peer: &PeerName,
        kind: QueueKind,
        after: Option<SpoolPosition>,
        limit: usize,
    ) -> Result<Vec<QueueEntry>, BacklogError> {
        let queue = self.queues(peer)?.get(kind);
        let txn = self
            .engine
            .begin(Durability::NoSync)
            .map_err(BacklogError::fatal("cannot begin scan transaction"))?;
        let after = after.map(SpoolPosition::to_key);

        let rows = txn
            .scan(queue, after.as_ref(), limit)
            .map_err(BacklogError::fatal(format!("cannot scan {kind} queue of {peer}")))?;

        rows.into_iter()
            .map(|(key, value)| {
                let message_id = MessageId::from_stored(value).map_err(|e| BacklogError::Fatal {
                    context: format!("bad entry at {} in {kind} queue of {peer}", key.position()),
                    source: StoreError::Corrupt(e.to_string()),
                })?;
                Ok(QueueEntry::new(key.position(), message_id, kind))
            })
            .collect()
    }

    /// Number of entries in one queue
    pub fn len(&self, peer: &PeerName, kind: QueueKind) -> Result<usize, BacklogError> {
        let queue = self.queues(peer)?.get(kind);
        let txn = self
            .engine
            .begin(Durability::NoSync)
            .map_err(BacklogError::fatal("cannot begin count transaction"))?;
        txn.count(queue)
            .map_err(BacklogError::fatal(format!("cannot count {kind} queue of {peer}")))
    }

    /// True if `position` is queued in `peer`'s queue of `kind`
    pub fn contains(
        &self,
        peer: &PeerName,
        kind: QueueKind,
        position: SpoolPosition,
    ) -> Result<bool, BacklogError> {
        let queue = self.queues(peer)?.get(kind);
        let txn = self
            .engine
            .begin(Durability::NoSync)
            .map_err(BacklogError::fatal("cannot begin lookup transaction"))?;
        let found = txn
            .get(queue, &position.to_key())
            .map_err(BacklogError::fatal(format!("cannot read {kind} queue of {peer}")))?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(QueueKind::Active.table_name("alpha"), "queue.alpha.db");
        assert_eq!(QueueKind::Deferred.table_name("alpha"), "defer.alpha.db");
    }
}
