//! The running transit core
//!
//! [`TransitService`] ties the components together and owns the background
//! tasks: the resolution coordinator, the periodic accept-from refresh and
//! the statistics timer.

mod builder;

pub use builder::TransitServiceBuilder;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::address_map::AddressMap;
use crate::backlog::BacklogStore;
use crate::metrics::StatsAggregator;
use crate::peer::PeerRegistry;
use crate::resolver::{AddressResolver, ResolutionCoordinator};
use crate::router::ArticleRouter;

/// Assembled components plus their background tasks
#[derive(Debug)]
pub struct TransitService {
    refresh_interval: Duration,
    registry: Arc<PeerRegistry>,
    map: Arc<AddressMap>,
    store: Arc<BacklogStore>,
    router: ArticleRouter,
    resolver: AddressResolver,
    stats: StatsAggregator,
    coordinator: Option<ResolutionCoordinator>,
    tasks: Vec<JoinHandle<()>>,
}

impl TransitService {
    /// Spawn the background tasks and start the first resolution cycle
    ///
    /// Must be called from inside a tokio runtime. Calling it twice has no
    /// further effect.
    pub fn start(&mut self) {
        let Some(coordinator) = self.coordinator.take() else {
            debug!("Transit service already started");
            return;
        };
        self.tasks.push(tokio::spawn(coordinator.run()));

        let lookups = self.resolver.refresh();
        info!("Resolving accept-from hosts ({} lookup(s))", lookups);

        let resolver = self.resolver.clone();
        let period = self.refresh_interval;
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                resolver.refresh();
            }
        }));

        let stats = self.stats.clone();
        let period = stats.interval();
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                stats.tick();
            }
        }));
    }

    /// Stop every background task
    pub fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Transit service stopped");
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn address_map(&self) -> &Arc<AddressMap> {
        &self.map
    }

    #[must_use]
    pub fn store(&self) -> &Arc<BacklogStore> {
        &self.store
    }

    #[must_use]
    pub fn router(&self) -> &ArticleRouter {
        &self.router
    }

    #[must_use]
    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    #[must_use]
    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }
}

impl Drop for TransitService {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
