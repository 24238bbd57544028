//! Builder pattern for constructing `TransitService` instances

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::address_map::AddressMap;
use crate::backlog::{BacklogEngine, BacklogStore, MemoryEngine};
use crate::config::Config;
use crate::filter::FilterCatalog;
use crate::metrics::StatsAggregator;
use crate::peer::PeerRegistry;
use crate::resolver::{AddressResolver, HostResolver, SystemResolver};
use crate::router::{ArticleRouter, FeederNotify, FeederSignals};

use super::TransitService;

/// Builder for a [`TransitService`] with optional collaborator overrides
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use nntp_transit::TransitServiceBuilder;
/// use nntp_transit::config::load_config;
///
/// let config = load_config("transit.toml")?;
/// let service = TransitServiceBuilder::new(config).build()?;
/// # Ok(())
/// # }
/// ```
pub struct TransitServiceBuilder {
    config: Config,
    engine: Option<Arc<dyn BacklogEngine>>,
    resolver: Option<Arc<dyn HostResolver>>,
    feeders: Option<Arc<dyn FeederNotify>>,
    filters: FilterCatalog,
}

impl TransitServiceBuilder {
    /// Create a new builder with the given configuration
    ///
    /// Without overrides the service uses an in-memory backlog, the
    /// system resolver and [`FeederSignals`] for feeder wake-ups.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            engine: None,
            resolver: None,
            feeders: None,
            filters: FilterCatalog::new(),
        }
    }

    /// Use `engine` for the backlog queues
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn BacklogEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use `resolver` for accept-from lookups
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Deliver feeder wake-ups to `feeders`
    #[must_use]
    pub fn with_feeders(mut self, feeders: Arc<dyn FeederNotify>) -> Self {
        self.feeders = Some(feeders);
        self
    }

    /// Filters that peer stanzas may refer to by name
    #[must_use]
    pub fn with_filters(mut self, filters: FilterCatalog) -> Self {
        self.filters = filters;
        self
    }

    /// Validate the configuration, build the peer registry and open every
    /// backlog queue
    ///
    /// Nothing is spawned until [`TransitService::start`].
    pub fn build(self) -> Result<TransitService> {
        self.config.validate().context("Invalid configuration")?;

        let registry = Arc::new(
            PeerRegistry::from_config(&self.config, &self.filters)
                .context("Invalid peer configuration")?,
        );

        for name in self.filters.unused() {
            warn!("Filter \"{}\" is defined but not used by any peer", name);
        }

        let engine = self.engine.unwrap_or_else(|| {
            warn!("No backlog engine configured; queues are kept in memory only");
            Arc::new(MemoryEngine::new())
        });
        let store = Arc::new(
            BacklogStore::open(engine, &registry, self.config.backlog.sync)
                .context("Cannot open backlog queues")?,
        );

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(SystemResolver::new(self.config.dns.timeout)));
        let feeders = self
            .feeders
            .unwrap_or_else(|| Arc::new(FeederSignals::new()));

        let map = Arc::new(AddressMap::new());
        map.rebuild(&registry);
        let (resolver, coordinator) =
            AddressResolver::new(Arc::clone(&registry), Arc::clone(&map), resolver);
        let router = ArticleRouter::new(Arc::clone(&registry), Arc::clone(&store), feeders);
        let stats = StatsAggregator::new(Arc::clone(&registry), self.config.stats.interval);

        info!(
            "Transit service ready: {} peer(s), {} outbound",
            registry.len(),
            registry.outbound().count()
        );

        Ok(TransitService {
            refresh_interval: self.config.dns.refresh_interval,
            registry,
            map,
            store,
            router,
            resolver,
            stats,
            coordinator: Some(coordinator),
            tasks: Vec::new(),
        })
    }
}
