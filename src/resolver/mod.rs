//! Accept-from host name resolution
//!
//! [`HostResolver`] is the seam to whatever does the actual lookups.
//! [`AddressResolver`] runs resolution cycles over every peer and keeps the
//! [`AddressMap`](crate::address_map::AddressMap) in step with the results.

mod coordinator;

pub use coordinator::{AddressResolver, ResolutionCoordinator};

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Host lookup failures
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("lookup failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Asynchronous host name to address lookup
#[async_trait]
pub trait HostResolver: Send + Sync + std::fmt::Debug {
    /// Every address `host` currently resolves to
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Resolver backed by the operating system's `getaddrinfo`
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let lookup = tokio::net::lookup_host((host, 0));
        let addrs = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| ResolveError::Timeout(self.timeout))??;

        let mut ips: Vec<IpAddr> = addrs.map(|sa| sa.ip().to_canonical()).collect();
        ips.sort_unstable();
        ips.dedup();
        Ok(ips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_resolver_literal() {
        let resolver = SystemResolver::new(Duration::from_secs(5));
        let addrs = resolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(addrs, ["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}
