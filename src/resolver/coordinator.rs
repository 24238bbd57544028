//! Resolution cycles and the task that applies their results
//!
//! [`AddressResolver::refresh`] starts one lookup task per accept-from host.
//! Each task reports back over a channel to the single
//! [`ResolutionCoordinator`], which is the only place a peer's resolved
//! address set is replaced and the address map rebuilt.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tracing::{debug, error, info};

use super::{HostResolver, ResolveError};
use crate::address_map::AddressMap;
use crate::peer::{Peer, PeerRegistry, ResolutionStep};
use crate::types::HostName;

/// Result of one host lookup, tagged with the cycle it belongs to
#[derive(Debug)]
pub(crate) struct Completion {
    peer: Arc<Peer>,
    generation: u64,
    host: HostName,
    result: Result<Vec<IpAddr>, ResolveError>,
}

/// Starts resolution cycles
#[derive(Debug, Clone)]
pub struct AddressResolver {
    registry: Arc<PeerRegistry>,
    resolver: Arc<dyn HostResolver>,
    tx: mpsc::UnboundedSender<Completion>,
    settled: Arc<Notify>,
}

impl AddressResolver {
    /// Create the resolver and the coordinator that must be run alongside it
    #[must_use]
    pub fn new(
        registry: Arc<PeerRegistry>,
        map: Arc<AddressMap>,
        resolver: Arc<dyn HostResolver>,
    ) -> (Self, ResolutionCoordinator) {
        let (tx, rx) = mpsc::unbounded_channel();
        let settled = Arc::new(Notify::new());
        let coordinator = ResolutionCoordinator {
            rx,
            registry: Arc::clone(&registry),
            map,
            settled: Arc::clone(&settled),
        };
        let resolver = Self {
            registry,
            resolver,
            tx,
            settled,
        };
        (resolver, coordinator)
    }

    /// Start a resolution cycle for every peer with accept-from hosts
    ///
    /// A peer whose previous cycle is still outstanding is skipped. Returns
    /// the number of lookups started. Must be called inside a tokio runtime.
    pub fn refresh(&self) -> usize {
        let mut started = 0;

        for peer in self.registry.iter() {
            let hosts = &peer.config().accept_from;
            if hosts.is_empty() {
                continue;
            }

            // The full count is in place before the first lookup can finish
            let begun = peer.resolution().begin(hosts.len());
            let Some(generation) = begun else {
                info!(
                    "Skipping address refresh for {}: {} lookup(s) still outstanding",
                    peer.name(),
                    peer.resolving_count()
                );
                continue;
            };

            for host in hosts {
                let peer = Arc::clone(peer);
                let host = host.clone();
                let resolver = Arc::clone(&self.resolver);
                let tx = self.tx.clone();

                tokio::spawn(async move {
                    let result = resolver.resolve(host.as_str()).await;
                    let completion = Completion {
                        peer,
                        generation,
                        host,
                        result,
                    };
                    if tx.send(completion).is_err() {
                        debug!("Resolution coordinator gone; dropping lookup result");
                    }
                });
                started += 1;
            }
        }

        debug!("Started {} accept-from lookup(s)", started);
        started
    }

    /// Lookups outstanding across all peers
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.registry.iter().map(|p| p.resolving_count()).sum()
    }

    /// Wait until no peer has an unfinished resolution cycle
    pub async fn wait_settled(&self) {
        loop {
            let notified = self.settled.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Applies lookup results; the only writer of resolved address sets
#[derive(Debug)]
pub struct ResolutionCoordinator {
    rx: mpsc::UnboundedReceiver<Completion>,
    registry: Arc<PeerRegistry>,
    map: Arc<AddressMap>,
    settled: Arc<Notify>,
}

impl ResolutionCoordinator {
    /// Process completions until every [`AddressResolver`] handle is gone
    pub async fn run(mut self) {
        while let Some(completion) = self.rx.recv().await {
            self.apply(completion);
        }
        debug!("Resolution coordinator stopped");
    }

    fn apply(&self, completion: Completion) -> ResolutionStep {
        let Completion {
            peer,
            generation,
            host,
            result,
        } = completion;

        let addresses = match result {
            Ok(addrs) => {
                debug!("{} ({}) resolved to {:?}", host, peer.name(), addrs);
                Some(addrs.into_iter().map(|a| a.to_canonical()).collect())
            }
            Err(e) => {
                error!("Cannot resolve {} for peer {}: {}", host, peer.name(), e);
                None
            }
        };

        let step = peer.resolution().complete(generation, addresses);
        match step {
            ResolutionStep::Pending | ResolutionStep::Stale => {}
            ResolutionStep::Published => {
                info!(
                    "Peer {} accepts from {} address(es)",
                    peer.name(),
                    peer.resolved_addresses().len()
                );
                self.map.rebuild(&self.registry);
                self.settled.notify_waiters();
            }
            ResolutionStep::Discarded => {
                info!(
                    "Keeping previous addresses for {} after failed lookups",
                    peer.name()
                );
                self.settled.notify_waiters();
            }
        }
        step
    }
}
