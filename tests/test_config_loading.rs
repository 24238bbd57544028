//! Tests for configuration file loading
//!
//! Covers file access, TOML shapes, service-wide settings and the origin
//! information carried by each peer stanza.

use anyhow::Result;
use nntp_transit::config::{PortSpec, load_config, parse_config};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> Result<NamedTempFile> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;
    Ok(temp_file)
}

/// Test loading from TOML file
#[test]
fn test_load_config_from_file() -> Result<()> {
    let temp_file = write_config(
        r#"
[[peer]]
max-size = "1mb"

[[peer]]
name = "alpha"
host = "feed.alpha.net"
port = 433
"#,
    )?;

    let path = temp_file.path().to_str().unwrap();
    let config = load_config(path)?;

    assert_eq!(config.peers.len(), 2);
    assert!(config.peers[0].is_default());
    assert_eq!(config.peers[0].max_size.map(|s| s.get()), Some(1_000_000));
    assert_eq!(config.peers[1].name.as_deref(), Some("alpha"));
    assert_eq!(config.peers[1].port, Some(PortSpec::Number(433)));
    assert_eq!(&*config.peers[1].origin.file, path);

    Ok(())
}

/// Test invalid TOML returns error
#[test]
fn test_invalid_toml_returns_error() -> Result<()> {
    let temp_file = write_config("this is not valid TOML [[[")?;

    let path = temp_file.path().to_str().unwrap();
    let result = load_config(path);

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to parse"));

    Ok(())
}

#[test]
fn test_missing_file_returns_error() {
    let err = load_config("/nonexistent/path/transit.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_unknown_peer_option_rejected() {
    let result = parse_config("[[peer]]\nname = \"alpha\"\nfeed-mode = \"fast\"\n", "t.toml");
    assert!(result.is_err());
}

#[test]
fn test_service_sections() -> Result<()> {
    let config = parse_config(
        r#"
[backlog]
sync = false

[dns]
refresh-interval = 600
timeout = 5

[stats]
interval = 30
"#,
        "t.toml",
    )?;

    assert!(!config.backlog.sync);
    assert_eq!(config.dns.refresh_interval, Duration::from_secs(600));
    assert_eq!(config.dns.timeout, Duration::from_secs(5));
    assert_eq!(config.stats.interval, Duration::from_secs(30));
    assert!(config.validate().is_ok());

    Ok(())
}

#[test]
fn test_zero_refresh_interval_fails_validation() -> Result<()> {
    let temp_file = write_config("[dns]\nrefresh-interval = 0\n")?;
    let path = temp_file.path().to_str().unwrap();

    let err = load_config(path).unwrap_err();
    assert!(err.to_string().contains("refresh-interval"));

    Ok(())
}

#[test]
fn test_stanza_lines_follow_file_order() -> Result<()> {
    let config = parse_config(
        r#"
[[peer]]
name = "alpha"

[[peer]]
name = "bravo"

[[peer]]
name = "charlie"
"#,
        "order.toml",
    )?;

    let lines: Vec<usize> = config.peers.iter().map(|p| p.origin.line).collect();
    assert!(lines.windows(2).all(|w| w[0] < w[1]), "lines: {lines:?}");
    assert!(
        config.peers[1]
            .origin
            .to_string()
            .starts_with("\"order.toml\", line ")
    );

    Ok(())
}
