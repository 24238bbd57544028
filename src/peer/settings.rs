//! Per-stanza peer settings and inheritance from the default peer
//!
//! A stanza is first turned into [`PeerSettings`]: every option that was
//! given and valid, nothing more. Invalid options are reported as
//! [`ConfigDiagnostic`]s and dropped, so one bad line never takes the whole
//! peer down. [`PeerSettings::finalize`] then fills the gaps from the
//! default peer and the built-in defaults.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

use tracing::error;

use crate::config::{PeerStanza, PortSpec, StanzaOrigin};
use crate::filter::{FilterCatalog, FilterChain};
use crate::types::{ByteSize, HostName, MaxConnections, PeerName};
use crate::wildmat::Wildmat;

use super::PeerConfig;

/// Adaptive feed thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveFeed {
    pub high: u32,
    pub low: u32,
}

/// A configuration problem that was logged and tolerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiagnostic {
    pub origin: StanzaOrigin,
    pub message: String,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}

/// Collects diagnostics for one stanza, logging each as it is found
pub(crate) struct Diagnostics<'a> {
    origin: &'a StanzaOrigin,
    sink: &'a mut Vec<ConfigDiagnostic>,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(origin: &'a StanzaOrigin, sink: &'a mut Vec<ConfigDiagnostic>) -> Self {
        Self { origin, sink }
    }

    pub(crate) fn report(&mut self, message: impl Into<String>) {
        let diagnostic = ConfigDiagnostic {
            origin: self.origin.clone(),
            message: message.into(),
        };
        error!("{}", diagnostic);
        self.sink.push(diagnostic);
    }
}

/// Options given explicitly in one peer stanza
#[derive(Debug, Clone, Default)]
pub struct PeerSettings {
    pub origin: StanzaOrigin,
    pub port: Option<PortSpec>,
    pub host: Option<HostName>,
    pub accept_from: Vec<HostName>,
    pub send_to: Option<HostName>,
    pub exclude: Vec<String>,
    pub max_size: Option<ByteSize>,
    pub offer_filters: Vec<Wildmat>,
    pub filters_in: FilterChain,
    pub filters_out: FilterChain,
    pub max_conns_in: Option<MaxConnections>,
    pub max_conns_out: Option<MaxConnections>,
    pub bind_v4: Option<Ipv4Addr>,
    pub bind_v6: Option<Ipv6Addr>,
    pub adaptive: Option<AdaptiveFeed>,
    pub username_in: Option<String>,
    pub username_out: Option<String>,
}

impl PeerSettings {
    /// Validate a stanza, reporting and dropping options that are unusable
    pub(crate) fn from_stanza(
        stanza: &PeerStanza,
        is_default: bool,
        catalog: &FilterCatalog,
        diag: &mut Diagnostics<'_>,
    ) -> Self {
        let mut settings = Self {
            origin: stanza.origin.clone(),
            port: stanza.port.clone(),
            max_size: stanza.max_size,
            max_conns_in: stanza.max_conns_in,
            max_conns_out: stanza.max_conns_out,
            username_in: stanza.incoming_username.clone(),
            username_out: stanza.outgoing_username.clone(),
            ..Self::default()
        };

        // Options that only make sense for a concrete peer
        let peer_only = [
            ("host", stanza.host.is_some()),
            ("accept-from", !stanza.accept_from.is_empty()),
            ("send-to", stanza.send_to.is_some()),
            ("exclude", !stanza.exclude.is_empty()),
        ];
        if is_default {
            for (option, _) in peer_only.iter().filter(|(_, given)| *given) {
                diag.report(format!(
                    "\"{option}\" cannot be specified for the default peer"
                ));
            }
        } else {
            settings.host = host_option(stanza.host.as_deref(), "host", diag);
            settings.send_to = host_option(stanza.send_to.as_deref(), "send-to", diag);
            settings.accept_from = stanza
                .accept_from
                .iter()
                .filter_map(|h| host_option(Some(h), "accept-from", diag))
                .collect();
            settings.exclude = stanza
                .exclude
                .iter()
                .map(|e| e.trim())
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }

        settings.offer_filters = stanza.offer_filters.iter().map(|p| Wildmat::new(p)).collect();
        settings.filters_in = resolve_filters(&stanza.incoming_filters, catalog, diag);
        settings.filters_out = resolve_filters(&stanza.outgoing_filters, catalog, diag);

        for value in &stanza.bind_address {
            if let Some(addrs) = bind_option(value, "bind-address", diag) {
                if let Some(v4) = addrs.iter().find_map(ipv4) {
                    settings.bind_v4 = Some(v4);
                }
                if let Some(v6) = addrs.iter().find_map(ipv6) {
                    settings.bind_v6 = Some(v6);
                }
            }
        }
        if let Some(value) = &stanza.bind_address_v4 {
            if let Some(addrs) = bind_option(value, "bind-address-v4", diag) {
                match addrs.iter().find_map(ipv4) {
                    Some(v4) => settings.bind_v4 = Some(v4),
                    None => diag.report(format!(
                        "bind-address-v4 \"{value}\" is not an IPv4 address"
                    )),
                }
            }
        }
        if let Some(value) = &stanza.bind_address_v6 {
            if let Some(addrs) = bind_option(value, "bind-address-v6", diag) {
                match addrs.iter().find_map(ipv6) {
                    Some(v6) => settings.bind_v6 = Some(v6),
                    None => diag.report(format!(
                        "bind-address-v6 \"{value}\" is not an IPv6 address"
                    )),
                }
            }
        }

        settings.adaptive = adaptive_option(&stanza.adaptive, diag);
        settings
    }

    /// Build the final peer configuration
    ///
    /// Unset options are inherited from `default`, then from the built-in
    /// defaults. `host` then seeds accept-from, send-to and exclude where
    /// those are still empty, and a peer with no excludes at all excludes
    /// its own name.
    #[must_use]
    pub fn finalize(self, name: PeerName, default: Option<&PeerSettings>) -> PeerConfig {
        let mut config = PeerConfig::named(name);

        config.port = self
            .port
            .or_else(|| default.and_then(|d| d.port.clone()))
            .unwrap_or_default();

        config.max_conns_in = self
            .max_conns_in
            .or_else(|| default.and_then(|d| d.max_conns_in))
            .unwrap_or_default();
        config.max_conns_out = self
            .max_conns_out
            .or_else(|| default.and_then(|d| d.max_conns_out))
            .unwrap_or_default();
        config.max_size = self
            .max_size
            .or_else(|| default.and_then(|d| d.max_size))
            .unwrap_or(ByteSize::UNLIMITED);

        config.filters_in = match default {
            Some(d) if self.filters_in.is_empty() => d.filters_in.clone(),
            _ => self.filters_in,
        };
        config.filters_out = match default {
            Some(d) if self.filters_out.is_empty() => d.filters_out.clone(),
            _ => self.filters_out,
        };

        config.bind_v4 = self.bind_v4.or_else(|| default.and_then(|d| d.bind_v4));
        config.bind_v6 = self.bind_v6.or_else(|| default.and_then(|d| d.bind_v6));
        config.adaptive = self.adaptive.or_else(|| default.and_then(|d| d.adaptive));

        config.username_in = self.username_in;
        config.username_out = self.username_out;
        config.offer_filters = self.offer_filters;
        config.accept_from = self.accept_from;
        config.send_to = self.send_to;
        config.exclude = self.exclude;

        if let Some(host) = self.host {
            if config.accept_from.is_empty() {
                config.accept_from.push(host.clone());
            }
            if config.send_to.is_none() {
                config.send_to = Some(host.clone());
            }
            if config.exclude.is_empty() {
                config.exclude.push(host.to_string());
            }
        }

        if config.exclude.is_empty() {
            config.exclude.push(config.name.to_string());
        }

        config
    }
}

fn host_option(value: Option<&str>, option: &str, diag: &mut Diagnostics<'_>) -> Option<HostName> {
    let value = value?;
    match HostName::new(value.trim().to_string()) {
        Ok(host) => Some(host),
        Err(e) => {
            diag.report(format!("{option}: {e}"));
            None
        }
    }
}

/// Addresses for a bind option: an IP literal as is, a host name resolved
/// once with the system resolver
fn bind_option(value: &str, option: &str, diag: &mut Diagnostics<'_>) -> Option<Vec<IpAddr>> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<IpAddr>() {
        return Some(vec![addr]);
    }
    match (value, 0).to_socket_addrs() {
        Ok(addrs) => Some(addrs.map(|a| a.ip()).collect()),
        Err(e) => {
            diag.report(format!("{option} \"{value}\": cannot resolve: {e}"));
            None
        }
    }
}

fn ipv4(addr: &IpAddr) -> Option<Ipv4Addr> {
    match addr {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(_) => None,
    }
}

fn ipv6(addr: &IpAddr) -> Option<Ipv6Addr> {
    match addr {
        IpAddr::V6(v6) => Some(*v6),
        IpAddr::V4(_) => None,
    }
}

fn resolve_filters(
    names: &[String],
    catalog: &FilterCatalog,
    diag: &mut Diagnostics<'_>,
) -> FilterChain {
    let mut chain = FilterChain::new();
    for name in names {
        match catalog.resolve(name) {
            Some(filters) => chain.extend(filters),
            None => diag.report(format!("filter \"{name}\" is not defined")),
        }
    }
    chain
}

/// `adaptive = high` or `adaptive = [high, low]`; a negative high disables it
fn adaptive_option(values: &[i64], diag: &mut Diagnostics<'_>) -> Option<AdaptiveFeed> {
    let (&high, rest) = values.split_first()?;
    if rest.len() > 1 {
        diag.report("adaptive takes at most two values");
        return None;
    }
    if high < 0 {
        return None;
    }
    let low = rest.first().copied().unwrap_or(0);
    match (u32::try_from(high), u32::try_from(low)) {
        (Ok(high), Ok(low)) => Some(AdaptiveFeed { high, low }),
        _ => {
            diag.report(format!("adaptive thresholds {high}/{low} are out of range"));
            None
        }
    }
}
