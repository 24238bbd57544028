//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde deserialization.

use crate::constants;
use std::time::Duration;

/// Default for syncing routing transactions (true = durable on commit)
#[inline]
pub fn backlog_sync() -> bool {
    constants::backlog::SYNC_DEFAULT
}

/// Default accept-from re-resolution interval (1 hour)
#[inline]
pub fn dns_refresh_interval() -> Duration {
    Duration::from_secs(constants::dns::REFRESH_INTERVAL_SECS)
}

/// Default upper bound on a single host lookup
#[inline]
pub fn dns_timeout() -> Duration {
    Duration::from_secs(constants::dns::LOOKUP_TIMEOUT_SECS)
}

/// Default statistics snapshot interval
#[inline]
pub fn stats_interval() -> Duration {
    Duration::from_secs(constants::stats::INTERVAL_SECS)
}
