//! Inbound address to peer lookup
//!
//! The table is rebuilt from scratch every time a peer's resolved address
//! set changes and swapped in as a whole. Readers take a reference-counted
//! snapshot, so a lookup never sees a half-built table and an old table
//! stays alive until its last reader drops it.

use std::cmp::Ordering;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::peer::{Peer, PeerRegistry};

/// Order addresses by family (IPv4 first), then by raw address bytes
#[must_use]
pub fn compare_addresses(a: &IpAddr, b: &IpAddr) -> Ordering {
    match (a, b) {
        (IpAddr::V4(a), IpAddr::V4(b)) => a.octets().cmp(&b.octets()),
        (IpAddr::V6(a), IpAddr::V6(b)) => a.octets().cmp(&b.octets()),
        (IpAddr::V4(_), IpAddr::V6(_)) => Ordering::Less,
        (IpAddr::V6(_), IpAddr::V4(_)) => Ordering::Greater,
    }
}

/// An immutable, sorted `(address, peer)` table
#[derive(Debug, Default)]
pub struct AddressTable {
    entries: Vec<(IpAddr, Arc<Peer>)>,
}

impl AddressTable {
    /// Build from `(address, peer)` pairs given in registry order
    ///
    /// When two peers claim the same address the first one keeps it.
    #[must_use]
    pub fn from_entries(mut entries: Vec<(IpAddr, Arc<Peer>)>) -> Self {
        // Stable sort keeps registry order among equal addresses
        entries.sort_by(|a, b| compare_addresses(&a.0, &b.0));
        entries.dedup_by(|later, kept| {
            if later.0 != kept.0 {
                return false;
            }
            if !Arc::ptr_eq(&later.1, &kept.1) {
                warn!(
                    "Address {} is claimed by peers {} and {}; using {}",
                    kept.0,
                    kept.1.name(),
                    later.1.name(),
                    kept.1.name()
                );
            }
            true
        });
        Self { entries }
    }

    /// Collect every peer's resolved addresses
    #[must_use]
    pub fn build(registry: &PeerRegistry) -> Self {
        let entries = registry
            .iter()
            .flat_map(|peer| {
                peer.resolved_addresses()
                    .into_iter()
                    .map(move |addr| (addr, Arc::clone(peer)))
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Binary search for the peer owning `addr`
    #[must_use]
    pub fn lookup(&self, addr: IpAddr) -> Option<&Arc<Peer>> {
        let addr = addr.to_canonical();
        self.entries
            .binary_search_by(|(probe, _)| compare_addresses(probe, &addr))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IpAddr, &Arc<Peer>)> {
        self.entries.iter().map(|(addr, peer)| (addr, peer))
    }
}

/// The live address table
#[derive(Debug, Default)]
pub struct AddressMap {
    current: RwLock<Arc<AddressTable>>,
}

impl AddressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the registry and install the new table
    pub fn rebuild(&self, registry: &PeerRegistry) {
        let table = Arc::new(AddressTable::build(registry));
        debug!("Address map rebuilt with {} entries", table.len());
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = table;
    }

    /// The table in use right now
    #[must_use]
    pub fn snapshot(&self) -> Arc<AddressTable> {
        Arc::clone(&*self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Which peer, if any, an inbound connection from `addr` belongs to
    ///
    /// IPv4-mapped IPv6 addresses are looked up as plain IPv4.
    #[must_use]
    pub fn lookup(&self, addr: IpAddr) -> Option<Arc<Peer>> {
        self.snapshot().lookup(addr).cloned()
    }

    /// Same as [`lookup`](Self::lookup), ignoring the port
    #[must_use]
    pub fn lookup_socket(&self, addr: SocketAddr) -> Option<Arc<Peer>> {
        self.lookup(addr.ip())
    }
}
