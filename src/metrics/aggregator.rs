//! Periodic rate computation over every peer's counters

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::counters::CounterSnapshot;
use super::{Counter, Direction, Outcome};
use crate::peer::PeerRegistry;
use crate::types::PeerName;

/// Counters of one peer at the time of a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct PeerStats {
    pub name: PeerName,
    pub counters: CounterSnapshot,
}

/// Turns cumulative counters into per-second rates on a fixed interval
///
/// The aggregator does not own a timer; the service drives [`tick`] from a
/// tokio interval so that tests can call it directly.
///
/// [`tick`]: StatsAggregator::tick
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    registry: Arc<PeerRegistry>,
    interval: Duration,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(registry: Arc<PeerRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Roll every peer's snapshot window forward by one interval
    pub fn tick(&self) {
        let secs = self.interval.as_secs_f64();
        for peer in self.registry.iter() {
            let counters = peer.counters();
            counters.roll(secs);
            debug!(
                "Stats for {}: in {:.2}/s accepted, out {:.2}/s accepted, {:.2}/s deferred",
                peer.name(),
                counters.rate(Counter::new(Direction::Incoming, Outcome::Accepted)),
                counters.rate(Counter::new(Direction::Outgoing, Outcome::Accepted)),
                counters.rate(Counter::new(Direction::Outgoing, Outcome::Deferred)),
            );
        }
    }

    /// Read-only view of every peer's totals and last computed rates
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerStats> {
        self.registry
            .iter()
            .map(|peer| PeerStats {
                name: peer.name().clone(),
                counters: peer.counters().snapshot(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerStanza;
    use crate::filter::FilterCatalog;
    use crate::peer::RegistryBuilder;

    fn registry(names: &[&str]) -> Arc<PeerRegistry> {
        let catalog = FilterCatalog::new();
        let mut builder = RegistryBuilder::new(&catalog);
        for name in names {
            builder.register(&PeerStanza::named(name)).unwrap();
        }
        Arc::new(builder.build())
    }

    #[test]
    fn test_tick_computes_rates_per_peer() {
        let registry = registry(&["alpha", "beta"]);
        let stats = StatsAggregator::new(registry.clone(), Duration::from_secs(10));
        let out_accepted = Counter::new(Direction::Outgoing, Outcome::Accepted);

        let alpha = registry.find("alpha").unwrap();
        alpha.counters().add(out_accepted, 50);
        stats.tick();
        alpha.counters().add(out_accepted, 100);
        stats.tick();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].name.as_str(), "alpha");
        assert_eq!(snapshot[0].counters.total(out_accepted), 150);
        assert!((snapshot[0].counters.rate(out_accepted) - 10.0).abs() < f64::EPSILON);
        assert_eq!(snapshot[1].counters.rate(out_accepted), 0.0);
    }

    #[test]
    fn test_idle_interval_reports_zero() {
        let registry = registry(&["alpha"]);
        let stats = StatsAggregator::new(registry.clone(), Duration::from_secs(60));
        let in_refused = Counter::new(Direction::Incoming, Outcome::Refused);

        registry.find("alpha").unwrap().counters().add(in_refused, 120);
        stats.tick();
        assert!((stats.snapshot()[0].counters.rate(in_refused) - 2.0).abs() < f64::EPSILON);

        stats.tick();
        assert_eq!(stats.snapshot()[0].counters.rate(in_refused), 0.0);
    }
}
