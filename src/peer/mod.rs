//! Configured feed peers
//!
//! A [`Peer`] is built once from its configuration stanza (after
//! inheritance from the default peer) and lives for the whole process. The
//! only state that changes afterwards is the set of addresses its
//! accept-from hosts resolve to, and its counters.

mod registry;
mod resolution;
mod settings;

pub use registry::{PeerRegistry, RegistryBuilder};
pub use resolution::ResolutionStep;
pub use settings::{AdaptiveFeed, ConfigDiagnostic, PeerSettings};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::PortSpec;
use crate::filter::FilterChain;
use crate::metrics::PeerCounters;
use crate::types::{ByteSize, HostName, MaxConnections, PeerName};
use crate::wildmat::Wildmat;
use resolution::ResolutionState;

/// Fully resolved configuration of one peer
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub name: PeerName,
    pub port: PortSpec,
    pub bind_v4: Option<Ipv4Addr>,
    pub bind_v6: Option<Ipv6Addr>,
    pub username_in: Option<String>,
    pub username_out: Option<String>,
    /// Hosts whose addresses identify inbound connections from this peer
    pub accept_from: Vec<HostName>,
    /// Destination for outbound feeding; `None` makes the peer inbound-only
    pub send_to: Option<HostName>,
    /// Path components never forwarded to this peer
    pub exclude: Vec<String>,
    pub max_size: ByteSize,
    /// Message-id patterns that are never offered
    pub offer_filters: Vec<Wildmat>,
    pub filters_in: FilterChain,
    pub filters_out: FilterChain,
    pub max_conns_in: MaxConnections,
    pub max_conns_out: MaxConnections,
    pub adaptive: Option<AdaptiveFeed>,
}

impl PeerConfig {
    /// A peer with every option at its built-in default
    ///
    /// Note that no default exclude is added here; that happens when a
    /// stanza is finalized.
    #[must_use]
    pub fn named(name: PeerName) -> Self {
        Self {
            name,
            port: PortSpec::default(),
            bind_v4: None,
            bind_v6: None,
            username_in: None,
            username_out: None,
            accept_from: Vec::new(),
            send_to: None,
            exclude: Vec::new(),
            max_size: ByteSize::UNLIMITED,
            offer_filters: Vec::new(),
            filters_in: FilterChain::new(),
            filters_out: FilterChain::new(),
            max_conns_in: MaxConnections::DEFAULT,
            max_conns_out: MaxConnections::DEFAULT,
            adaptive: None,
        }
    }
}

/// A configured peer and its runtime state
#[derive(Debug)]
pub struct Peer {
    config: PeerConfig,
    resolution: Mutex<ResolutionState>,
    counters: PeerCounters,
}

impl Peer {
    #[must_use]
    pub fn new(config: PeerConfig) -> Self {
        Self {
            config,
            resolution: Mutex::new(ResolutionState::default()),
            counters: PeerCounters::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &PeerName {
        &self.config.name
    }

    #[must_use]
    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    #[must_use]
    pub fn counters(&self) -> &PeerCounters {
        &self.counters
    }

    /// True if articles are fed to this peer
    #[must_use]
    pub fn is_outbound(&self) -> bool {
        self.config.send_to.is_some()
    }

    /// Addresses published by the last complete resolution cycle, sorted
    #[must_use]
    pub fn resolved_addresses(&self) -> Vec<IpAddr> {
        self.resolution().resolved().to_vec()
    }

    /// Lookups still outstanding in the current resolution cycle
    #[must_use]
    pub fn resolving_count(&self) -> usize {
        self.resolution().outstanding()
    }

    pub(crate) fn resolution(&self) -> MutexGuard<'_, ResolutionState> {
        self.resolution
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.config.name.as_str())
    }
}
