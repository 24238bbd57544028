//! Constants used throughout the transit core
//!
//! This module centralizes magic numbers and configuration values
//! to improve maintainability and reduce duplication.

/// Peer configuration constants
pub mod peer {
    /// Port used when neither the peer nor the default peer sets one
    pub const DEFAULT_PORT: u16 = 119;

    /// Incoming/outgoing connection cap applied when nothing else sets one
    pub const MAX_CONNECTIONS_DEFAULT: u32 = 10;

    /// Separator between components of an article's Path header
    pub const PATH_SEPARATOR: char = '!';
}

/// Backlog queue constants
pub mod backlog {
    /// File-name prefix of a peer's active queue (`queue.<peer>.db`)
    pub const ACTIVE_PREFIX: &str = "queue";

    /// File-name prefix of a peer's deferred queue (`defer.<peer>.db`)
    pub const DEFERRED_PREFIX: &str = "defer";

    /// File-name suffix shared by both queues
    pub const SUFFIX: &str = "db";

    /// Size of an encoded spool position: u32 spool id + u64 offset
    pub const KEY_LEN: usize = 4 + 8;

    /// Whether routing transactions are synced to disk on commit
    pub const SYNC_DEFAULT: bool = true;
}

/// Address resolution constants
pub mod dns {
    /// Interval between re-resolutions of every peer's accept-from list (1 hour)
    pub const REFRESH_INTERVAL_SECS: u64 = 3600;

    /// Upper bound on a single host lookup
    pub const LOOKUP_TIMEOUT_SECS: u64 = 30;
}

/// Statistics constants
pub mod stats {
    /// Interval between counter snapshots
    pub const INTERVAL_SECS: u64 = 60;
}
