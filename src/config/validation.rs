//! Configuration validation
//!
//! Service-wide settings are checked here before anything starts. Problems
//! inside individual peer stanzas are handled while the peer registry is
//! built: most are logged and the offending option ignored, and only the
//! ones that make a peer impossible to identify are returned as
//! [`ConfigError`].

use anyhow::Result;
use thiserror::Error;

use super::types::{Config, StanzaOrigin};
use crate::types::ValidationError;

/// Configuration errors that stop the peer registry from being built
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{origin}: peer \"{name}\" is already defined")]
    DuplicatePeer { name: String, origin: StanzaOrigin },

    #[error("{origin}: {source}")]
    InvalidPeerName {
        origin: StanzaOrigin,
        source: ValidationError,
    },
}

impl Config {
    /// Validate service-wide settings
    ///
    /// Checks:
    /// - Timer intervals are non-zero
    /// - The lookup timeout is shorter than the refresh interval (warning only)
    pub fn validate(&self) -> Result<()> {
        if self.dns.refresh_interval.is_zero() {
            return Err(anyhow::anyhow!("dns.refresh-interval must be at least 1 second"));
        }

        if self.stats.interval.is_zero() {
            return Err(anyhow::anyhow!("stats.interval must be at least 1 second"));
        }

        if self.dns.timeout.is_zero() {
            return Err(anyhow::anyhow!("dns.timeout must be at least 1 second"));
        }

        if self.dns.timeout >= self.dns.refresh_interval {
            tracing::warn!(
                "dns.timeout ({:?}) is not shorter than dns.refresh-interval ({:?}); \
                 slow lookups will make refresh cycles overlap and be skipped",
                self.dns.timeout,
                self.dns.refresh_interval
            );
        }

        if self.peers.iter().all(|p| p.is_default()) {
            tracing::warn!("Configuration defines no named peers");
        }

        Ok(())
    }
}
