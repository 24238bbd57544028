//! The set of configured peers

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, ConfigError, PeerStanza};
use crate::filter::FilterCatalog;
use crate::gate;
use crate::types::PeerName;

use super::settings::{ConfigDiagnostic, Diagnostics, PeerSettings};
use super::Peer;

/// Collects peer stanzas and turns them into a [`PeerRegistry`]
///
/// The default peer may appear anywhere in the file; inheritance is only
/// applied in [`build`](Self::build), once every stanza has been seen.
pub struct RegistryBuilder<'a> {
    catalog: &'a FilterCatalog,
    default: Option<PeerSettings>,
    peers: Vec<(PeerName, PeerSettings)>,
    names: HashSet<PeerName>,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl<'a> RegistryBuilder<'a> {
    #[must_use]
    pub fn new(catalog: &'a FilterCatalog) -> Self {
        Self {
            catalog,
            default: None,
            peers: Vec::new(),
            names: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Add one stanza
    ///
    /// Problems with individual options are logged and recorded as
    /// diagnostics. Only a peer that cannot be identified (bad or duplicate
    /// name) is an error.
    pub fn register(&mut self, stanza: &PeerStanza) -> Result<(), ConfigError> {
        let origin = &stanza.origin;

        let Some(raw_name) = &stanza.name else {
            let mut diag = Diagnostics::new(origin, &mut self.diagnostics);
            if self.default.is_some() {
                diag.report("default peer already specified");
                return Ok(());
            }
            self.default = Some(PeerSettings::from_stanza(
                stanza,
                true,
                self.catalog,
                &mut diag,
            ));
            return Ok(());
        };

        let name = PeerName::new(raw_name.clone()).map_err(|source| ConfigError::InvalidPeerName {
            origin: origin.clone(),
            source,
        })?;
        if self.names.contains(&name) {
            return Err(ConfigError::DuplicatePeer {
                name: name.to_string(),
                origin: origin.clone(),
            });
        }

        let mut diag = Diagnostics::new(origin, &mut self.diagnostics);
        let settings = PeerSettings::from_stanza(stanza, false, self.catalog, &mut diag);
        self.names.insert(name.clone());
        self.peers.push((name, settings));
        Ok(())
    }

    /// Apply inheritance and freeze the peer set
    #[must_use]
    pub fn build(self) -> PeerRegistry {
        let default = self.default;
        let peers = self
            .peers
            .into_iter()
            .map(|(name, settings)| Arc::new(Peer::new(settings.finalize(name, default.as_ref()))))
            .collect();

        PeerRegistry {
            peers,
            default,
            diagnostics: self.diagnostics,
        }
    }
}

/// Every configured peer, in configuration order
///
/// The registry itself never changes after it is built. The only mutable
/// per-peer state (resolved addresses, counters) lives inside each [`Peer`].
#[derive(Debug)]
pub struct PeerRegistry {
    peers: Vec<Arc<Peer>>,
    default: Option<PeerSettings>,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl PeerRegistry {
    /// Build the registry from every peer stanza in `config`
    pub fn from_config(config: &Config, catalog: &FilterCatalog) -> Result<Self, ConfigError> {
        let mut builder = RegistryBuilder::new(catalog);
        for stanza in &config.peers {
            builder.register(stanza)?;
        }
        let registry = builder.build();

        info!(
            "Configured {} peer(s), {} outbound{}",
            registry.len(),
            registry.outbound().count(),
            if registry.default.is_some() {
                ", with default peer"
            } else {
                ""
            }
        );
        if !registry.diagnostics.is_empty() {
            warn!(
                "{} configuration problem(s) were ignored",
                registry.diagnostics.len()
            );
        }

        Ok(registry)
    }

    /// Look a peer up by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<Peer>> {
        self.peers.iter().find(|p| p.name().as_str() == name)
    }

    /// All peers in configuration order
    #[must_use]
    pub fn all(&self) -> &[Arc<Peer>] {
        &self.peers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Peer>> {
        self.peers.iter()
    }

    /// Peers that articles are routed to, in registry order
    pub fn outbound(&self) -> impl Iterator<Item = &Arc<Peer>> {
        self.peers.iter().filter(|p| gate::participates(p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Settings of the default peer, if one was configured
    #[must_use]
    pub fn default_peer(&self) -> Option<&PeerSettings> {
        self.default.as_ref()
    }

    /// Problems found while reading peer stanzas
    #[must_use]
    pub fn diagnostics(&self) -> &[ConfigDiagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PortSpec, StanzaOrigin};

    fn stanza(name: Option<&str>, line: usize) -> PeerStanza {
        PeerStanza {
            name: name.map(str::to_string),
            origin: StanzaOrigin::new("transit.toml", line),
            ..PeerStanza::default()
        }
    }

    #[test]
    fn test_configuration_order_kept() {
        let catalog = FilterCatalog::new();
        let mut builder = RegistryBuilder::new(&catalog);
        for (i, name) in ["charlie", "alpha", "bravo"].iter().enumerate() {
            builder.register(&stanza(Some(name), i + 1)).unwrap();
        }
        let registry = builder.build();

        let names: Vec<_> = registry.iter().map(|p| p.name().as_str()).collect();
        assert_eq!(names, ["charlie", "alpha", "bravo"]);
        assert!(registry.find("alpha").is_some());
        assert!(registry.find("delta").is_none());
    }

    #[test]
    fn test_duplicate_name_is_an_error() {
        let catalog = FilterCatalog::new();
        let mut builder = RegistryBuilder::new(&catalog);
        builder.register(&stanza(Some("alpha"), 1)).unwrap();

        let err = builder.register(&stanza(Some("alpha"), 9)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"transit.toml\", line 9: peer \"alpha\" is already defined"
        );
    }

    #[test]
    fn test_invalid_name_is_an_error() {
        let catalog = FilterCatalog::new();
        let mut builder = RegistryBuilder::new(&catalog);
        let err = builder.register(&stanza(Some("a/b"), 3)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPeerName { .. }));
    }

    #[test]
    fn test_second_default_peer_ignored() {
        let catalog = FilterCatalog::new();
        let mut builder = RegistryBuilder::new(&catalog);

        let mut first = stanza(None, 1);
        first.port = Some(PortSpec::Number(433));
        let mut second = stanza(None, 5);
        second.port = Some(PortSpec::Number(1119));
        builder.register(&first).unwrap();
        builder.register(&second).unwrap();
        builder.register(&stanza(Some("alpha"), 9)).unwrap();
        let registry = builder.build();

        assert_eq!(registry.diagnostics().len(), 1);
        assert_eq!(registry.diagnostics()[0].origin.line, 5);
        assert_eq!(
            registry.find("alpha").unwrap().config().port,
            PortSpec::Number(433)
        );
    }

    #[test]
    fn test_default_peer_after_named_peers_still_inherited() {
        let catalog = FilterCatalog::new();
        let mut builder = RegistryBuilder::new(&catalog);

        builder.register(&stanza(Some("alpha"), 1)).unwrap();
        let mut default = stanza(None, 5);
        default.port = Some(PortSpec::Number(433));
        builder.register(&default).unwrap();
        let registry = builder.build();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.find("alpha").unwrap().config().port,
            PortSpec::Number(433)
        );
    }
}
