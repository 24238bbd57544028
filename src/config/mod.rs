//! Configuration module
//!
//! This module handles all configuration types and loading
//! for the transit core.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{load_config, parse_config};
pub use types::{
    BacklogConfig, Config, DnsConfig, PeerStanza, PortSpec, StanzaOrigin, StatsConfig,
};
pub use validation::ConfigError;

// Re-export default functions for use in tests and other modules
pub use defaults::{backlog_sync, dns_refresh_interval, dns_timeout, stats_interval};
