//! Configuration loading from TOML files
//!
//! Peer stanzas remember the file and line they came from so that problems
//! found later, while the peer registry is built, can point at them.

use anyhow::Result;
use serde::Deserialize;

use super::types::{BacklogConfig, Config, DnsConfig, PeerStanza, StanzaOrigin, StatsConfig};

/// Wire shape of the file: identical to [`Config`] but with span-tracked stanzas
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    peer: Vec<toml::Spanned<PeerStanza>>,
    #[serde(default)]
    backlog: BacklogConfig,
    #[serde(default)]
    dns: DnsConfig,
    #[serde(default)]
    stats: StatsConfig,
}

/// 1-based line number of a byte offset
fn line_of(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Parse configuration text; `file` is only used in error messages
pub fn parse_config(text: &str, file: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", file, e))?;

    let peers = raw
        .peer
        .into_iter()
        .map(|spanned| {
            let line = line_of(text, spanned.span().start);
            let mut stanza = spanned.into_inner();
            stanza.origin = StanzaOrigin::new(file, line);
            stanza
        })
        .collect();

    Ok(Config {
        peers,
        backlog: raw.backlog,
        dns: raw.dns,
        stats: raw.stats,
    })
}

/// Load and validate configuration from a TOML file
pub fn load_config(config_path: &str) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let config = parse_config(&config_content, config_path)?;

    // Validate the loaded configuration
    config.validate()?;

    tracing::info!(
        "Loaded {} peer stanza(s) from {}",
        config.peers.len(),
        config_path
    );

    Ok(config)
}
