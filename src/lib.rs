//! Peer-feed management core for a news transit server
//!
//! The crate keeps track of the configured feed peers, maps inbound
//! connections back to the peer they come from, decides which peers each
//! new article should be fed to, and records those decisions in durable
//! per-peer backlog queues that feeders drain.
//!
//! The main entry point is [`TransitServiceBuilder`], which assembles the
//! [`PeerRegistry`], [`AddressMap`], [`BacklogStore`], [`ArticleRouter`] and
//! [`StatsAggregator`] from a [`Config`].

pub mod address_map;
pub mod article;
pub mod backlog;
pub mod config;
pub mod constants;
pub mod filter;
pub mod gate;
pub mod logging;
pub mod metrics;
pub mod peer;
pub mod resolver;
pub mod router;
pub mod runtime;
pub mod service;
pub mod types;
pub mod wildmat;

pub use address_map::AddressMap;
pub use article::Article;
pub use backlog::{BacklogEngine, BacklogError, BacklogStore, MemoryEngine, QueueEntry, QueueKind};
pub use config::{Config, ConfigError, load_config};
pub use filter::{ArticleFilter, FilterCatalog, FilterVerdict};
pub use metrics::StatsAggregator;
pub use peer::{Peer, PeerRegistry};
pub use resolver::{AddressResolver, HostResolver, SystemResolver};
pub use router::{ArticleRouter, FeederNotify, FeederSignals, RouteError, RouteOutcome};
pub use service::{TransitService, TransitServiceBuilder};
