//! Lock-free per-peer counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::Counter;

/// Rates computed at the last snapshot
#[derive(Debug, Default)]
struct Window {
    last: [u64; 8],
    rates: [f64; 8],
}

/// Cumulative counters plus the last snapshot and rates derived from it
#[derive(Debug, Default)]
pub struct PeerCounters {
    totals: [AtomicU64; 8],
    window: Mutex<Window>,
}

impl PeerCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one article
    #[inline]
    pub fn record(&self, counter: Counter) {
        self.add(counter, 1);
    }

    #[inline]
    pub fn add(&self, counter: Counter, n: u64) {
        self.totals[counter.index()].fetch_add(n, Ordering::Relaxed);
    }

    #[must_use]
    pub fn total(&self, counter: Counter) -> u64 {
        self.totals[counter.index()].load(Ordering::Relaxed)
    }

    /// Total as of the last snapshot
    #[must_use]
    pub fn last(&self, counter: Counter) -> u64 {
        self.window().last[counter.index()]
    }

    /// Per-second rate computed at the last snapshot
    #[must_use]
    pub fn rate(&self, counter: Counter) -> f64 {
        self.window().rates[counter.index()]
    }

    /// Compute `(total - last) / interval` for every counter, then move `last` up
    pub fn roll(&self, interval_secs: f64) {
        let mut window = self.window();
        for (i, total) in self.totals.iter().enumerate() {
            let total = total.load(Ordering::Relaxed);
            window.rates[i] = total.saturating_sub(window.last[i]) as f64 / interval_secs;
            window.last[i] = total;
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        let window = self.window();
        CounterSnapshot {
            totals: std::array::from_fn(|i| self.totals[i].load(Ordering::Relaxed)),
            rates: window.rates,
        }
    }

    fn window(&self) -> std::sync::MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Immutable copy of a peer's counters for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CounterSnapshot {
    totals: [u64; 8],
    rates: [f64; 8],
}

impl CounterSnapshot {
    #[must_use]
    pub fn total(&self, counter: Counter) -> u64 {
        self.totals[counter.index()]
    }

    #[must_use]
    pub fn rate(&self, counter: Counter) -> f64 {
        self.rates[counter.index()]
    }
}
