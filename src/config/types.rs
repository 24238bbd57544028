//! Configuration type definitions
//!
//! A configuration file holds any number of `[[peer]]` stanzas plus a few
//! service-wide tables. A peer stanza without a `name` is the default peer:
//! it supplies inherited values for every named peer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{ByteSize, MaxConnections, duration_serde};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Peer stanzas, in file order
    #[serde(default, rename = "peer")]
    pub peers: Vec<PeerStanza>,
    /// Backlog queue settings
    #[serde(default)]
    pub backlog: BacklogConfig,
    /// Accept-from address resolution settings
    #[serde(default)]
    pub dns: DnsConfig,
    /// Statistics settings
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Where a peer stanza came from, for error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StanzaOrigin {
    pub file: Arc<str>,
    pub line: usize,
}

impl StanzaOrigin {
    pub fn new(file: &str, line: usize) -> Self {
        Self {
            file: Arc::from(file),
            line,
        }
    }
}

impl Default for StanzaOrigin {
    fn default() -> Self {
        Self::new("<config>", 0)
    }
}

impl fmt::Display for StanzaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\", line {}", self.file, self.line)
    }
}

/// Port given either as a number or as a service name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Number(u16),
    Service(String),
}

impl Default for PortSpec {
    fn default() -> Self {
        Self::Number(crate::constants::peer::DEFAULT_PORT)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Service(s) => f.write_str(s),
        }
    }
}

/// One `[[peer]]` stanza, exactly as written
///
/// List-valued options accept either a single string or an array. An empty
/// list means the option was not given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PeerStanza {
    /// Peer name; absent for the default peer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSpec>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub accept_from: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_to: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub incoming_filters: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub outgoing_filters: Vec<String>,
    #[serde(
        rename = "max-incoming-connections",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_conns_in: Option<MaxConnections>,
    #[serde(
        rename = "max-outgoing-connections",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_conns_out: Option<MaxConnections>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<ByteSize>,
    /// Shorthand seeding accept-from, send-to and exclude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(
        rename = "offer-filter",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub offer_filters: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub bind_address: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address_v4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address_v6: Option<String>,
    /// `high` or `[high, low]`
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub adaptive: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_username: Option<String>,
    /// Filled in by the loader
    #[serde(skip)]
    pub origin: StanzaOrigin,
}

impl PeerStanza {
    /// Start a named stanza
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// True for the anonymous default-peer stanza
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.name.is_none()
    }
}

/// Accept either a single value or a list of values
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::<T>::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Backlog queue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BacklogConfig {
    /// Sync routing transactions to disk on commit
    #[serde(default = "super::defaults::backlog_sync")]
    pub sync: bool,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            sync: super::defaults::backlog_sync(),
        }
    }
}

/// Accept-from resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DnsConfig {
    /// Interval between re-resolutions of every accept-from list
    #[serde(
        with = "duration_serde",
        default = "super::defaults::dns_refresh_interval"
    )]
    pub refresh_interval: Duration,
    /// Upper bound on a single host lookup
    #[serde(with = "duration_serde", default = "super::defaults::dns_timeout")]
    pub timeout: Duration,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            refresh_interval: super::defaults::dns_refresh_interval(),
            timeout: super::defaults::dns_timeout(),
        }
    }
}

/// Statistics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StatsConfig {
    /// Interval between counter snapshots
    #[serde(with = "duration_serde", default = "super::defaults::stats_interval")]
    pub interval: Duration,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            interval: super::defaults::stats_interval(),
        }
    }
}
