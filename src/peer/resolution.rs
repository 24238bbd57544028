//! Per-peer bookkeeping for accept-from resolution cycles
//!
//! A cycle starts with one outstanding lookup per accept-from host. Results
//! are staged until the last lookup reports back; only then is the staged
//! set published, replacing the previous one. A cycle in which any lookup
//! failed publishes nothing, so the last known-good addresses stay in use.

use std::net::IpAddr;

/// What a single lookup completion did to its peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    /// Other lookups of this cycle are still outstanding
    Pending,
    /// The cycle finished and a new address set was published
    Published,
    /// The cycle finished with at least one failure; previous addresses kept
    Discarded,
    /// The completion belongs to an older cycle and was ignored
    Stale,
}

#[derive(Debug, Default)]
pub(crate) struct ResolutionState {
    resolved: Vec<IpAddr>,
    staged: Vec<IpAddr>,
    outstanding: usize,
    generation: u64,
    failed: bool,
}

impl ResolutionState {
    pub(crate) fn resolved(&self) -> &[IpAddr] {
        &self.resolved
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Start a cycle of `lookups` requests
    ///
    /// The outstanding count is set in full before any request is issued.
    /// Returns the cycle's generation, or `None` if there is nothing to
    /// look up or the previous cycle has not finished yet.
    pub(crate) fn begin(&mut self, lookups: usize) -> Option<u64> {
        if lookups == 0 || self.outstanding > 0 {
            return None;
        }
        self.generation += 1;
        self.outstanding = lookups;
        self.staged.clear();
        self.failed = false;
        Some(self.generation)
    }

    /// Record one lookup result for cycle `generation`
    pub(crate) fn complete(
        &mut self,
        generation: u64,
        addresses: Option<Vec<IpAddr>>,
    ) -> ResolutionStep {
        if generation != self.generation || self.outstanding == 0 {
            return ResolutionStep::Stale;
        }

        match addresses {
            Some(addrs) => self.staged.extend(addrs),
            None => self.failed = true,
        }

        self.outstanding -= 1;
        if self.outstanding > 0 {
            return ResolutionStep::Pending;
        }

        let mut staged = std::mem::take(&mut self.staged);
        if self.failed {
            return ResolutionStep::Discarded;
        }

        staged.sort_unstable();
        staged.dedup();
        self.resolved = staged;
        ResolutionStep::Published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_publishes_only_after_last_lookup() {
        let mut state = ResolutionState::default();
        let generation = state.begin(2).unwrap();

        assert_eq!(
            state.complete(generation, Some(vec![ip("10.0.0.2")])),
            ResolutionStep::Pending
        );
        assert!(state.resolved().is_empty());

        assert_eq!(
            state.complete(generation, Some(vec![ip("10.0.0.1"), ip("10.0.0.2")])),
            ResolutionStep::Published
        );
        assert_eq!(state.resolved(), [ip("10.0.0.1"), ip("10.0.0.2")]);
        assert_eq!(state.outstanding(), 0);
    }

    #[test]
    fn test_new_cycle_replaces_not_merges() {
        let mut state = ResolutionState::default();
        let first = state.begin(1).unwrap();
        state.complete(first, Some(vec![ip("10.0.0.1")]));

        let second = state.begin(1).unwrap();
        state.complete(second, Some(vec![ip("192.0.2.7")]));
        assert_eq!(state.resolved(), [ip("192.0.2.7")]);
    }

    #[test]
    fn test_failure_keeps_previous_set() {
        let mut state = ResolutionState::default();
        let first = state.begin(1).unwrap();
        state.complete(first, Some(vec![ip("10.0.0.1")]));

        let second = state.begin(2).unwrap();
        assert_eq!(state.complete(second, None), ResolutionStep::Pending);
        assert_eq!(
            state.complete(second, Some(vec![ip("10.9.9.9")])),
            ResolutionStep::Discarded
        );
        assert_eq!(state.resolved(), [ip("10.0.0.1")]);

        // A failed cycle does not block the next one
        assert!(state.begin(1).is_some());
    }

    #[test]
    fn test_overlapping_cycle_refused() {
        let mut state = ResolutionState::default();
        assert!(state.begin(2).is_some());
        assert!(state.begin(2).is_none());
    }

    #[test]
    fn test_nothing_to_resolve() {
        let mut state = ResolutionState::default();
        assert!(state.begin(0).is_none());
    }

    #[test]
    fn test_stale_generation_ignored() {
        let mut state = ResolutionState::default();
        let generation = state.begin(1).unwrap();
        assert_eq!(
            state.complete(generation + 1, Some(vec![ip("10.0.0.1")])),
            ResolutionStep::Stale
        );
        assert_eq!(state.outstanding(), 1);
    }
}
