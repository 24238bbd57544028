//! Per-peer feed statistics
//!
//! Every peer carries eight cumulative counters, one per combination of
//! feed direction and article outcome. The acceptor and the feeders bump
//! them with lock-free atomic adds; [`StatsAggregator`] turns them into
//! per-second rates on a fixed interval.

mod aggregator;
mod counters;

pub use aggregator::{PeerStats, StatsAggregator};
pub use counters::{CounterSnapshot, PeerCounters};

/// Which way articles flow relative to this server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Articles offered to us by the peer
    Incoming,
    /// Articles we offer to the peer
    Outgoing,
}

/// What happened to an offered article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    Rejected,
    /// Declined at offer time (already have it, or filtered before transfer)
    Refused,
    Deferred,
}

/// One of the eight per-peer counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Counter {
    pub direction: Direction,
    pub outcome: Outcome,
}

impl Counter {
    /// Every counter, incoming first
    pub const ALL: [Counter; 8] = [
        Counter::new(Direction::Incoming, Outcome::Accepted),
        Counter::new(Direction::Incoming, Outcome::Rejected),
        Counter::new(Direction::Incoming, Outcome::Refused),
        Counter::new(Direction::Incoming, Outcome::Deferred),
        Counter::new(Direction::Outgoing, Outcome::Accepted),
        Counter::new(Direction::Outgoing, Outcome::Rejected),
        Counter::new(Direction::Outgoing, Outcome::Refused),
        Counter::new(Direction::Outgoing, Outcome::Deferred),
    ];

    #[must_use]
    pub const fn new(direction: Direction, outcome: Outcome) -> Self {
        Self { direction, outcome }
    }

    /// Slot in the per-peer counter arrays
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        let base = match self.direction {
            Direction::Incoming => 0,
            Direction::Outgoing => 4,
        };
        base + match self.outcome {
            Outcome::Accepted => 0,
            Outcome::Rejected => 1,
            Outcome::Refused => 2,
            Outcome::Deferred => 3,
        }
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction = match self.direction {
            Direction::Incoming => "in",
            Direction::Outgoing => "out",
        };
        let outcome = match self.outcome {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
            Outcome::Refused => "refused",
            Outcome::Deferred => "deferred",
        };
        write!(f, "{direction}_{outcome}")
    }
}
