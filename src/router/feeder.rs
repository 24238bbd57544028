//! Wake-ups for the per-peer feeders
//!
//! Feeders drain a peer's backlog queue over the network and sleep while it
//! is empty. The router pokes them through [`FeederNotify`] once new entries
//! have been committed.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;

use crate::types::PeerName;

/// Something that can be told a peer's queue has new entries
pub trait FeederNotify: Send + Sync {
    fn notify(&self, peer: &PeerName);
}

/// One [`Notify`] per peer, created on first use
///
/// A notification sent before the feeder starts waiting is kept as a
/// permit, so a feeder never sleeps through an enqueue.
#[derive(Debug, Clone, Default)]
pub struct FeederSignals {
    signals: Arc<DashMap<PeerName, Arc<Notify>>>,
}

impl FeederSignals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wake-up handle a feeder for `peer` waits on
    #[must_use]
    pub fn subscribe(&self, peer: &PeerName) -> Arc<Notify> {
        if let Some(existing) = self.signals.get(peer) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.signals
                .entry(peer.clone())
                .or_insert_with(|| Arc::new(Notify::new()))
                .value(),
        )
    }
}

impl FeederNotify for FeederSignals {
    fn notify(&self, peer: &PeerName) {
        self.subscribe(peer).notify_one();
    }
}
