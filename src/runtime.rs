//! Tokio runtime configuration and common utilities for the binary
//!
//! This module provides:
//! - Testable runtime configuration and builder logic
//! - Configuration loading with a summary of the configured peers
//! - Shutdown signal handling

use anyhow::Result;
use tracing::{error, info};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads
    worker_threads: usize,
}

impl RuntimeConfig {
    /// Create runtime config from an optional thread count
    ///
    /// `None` means a single-threaded runtime; `Some(0)` uses one worker per
    /// available CPU.
    #[must_use]
    pub fn from_args(threads: Option<usize>) -> Self {
        let worker_threads = match threads {
            None => 1,
            Some(0) => std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            Some(n) => n,
        };
        Self { worker_threads }
    }

    /// Get number of worker threads
    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Check if single-threaded
    #[must_use]
    pub const fn is_single_threaded(&self) -> bool {
        self.worker_threads == 1
    }

    /// Build the tokio runtime
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = if self.is_single_threaded() {
            info!("Starting transit core with single-threaded runtime");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            info!(
                "Starting transit core with {} worker threads",
                self.worker_threads
            );
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .enable_all()
                .build()?
        };
        Ok(rt)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_args(None)
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
///
/// If a handler cannot be installed the error is logged and that signal
/// source is ignored.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Load configuration and log the configured peers
///
/// # Errors
/// Returns error if configuration loading fails
pub fn load_and_log_config(config_path: &str) -> Result<crate::config::Config> {
    let config = crate::config::load_config(config_path)?;

    for stanza in &config.peers {
        match &stanza.name {
            Some(name) => info!(
                "  - {} ({})",
                name,
                stanza.host.as_deref().or(stanza.send_to.as_deref()).unwrap_or("inbound only")
            ),
            None => info!("  - default peer ({})", stanza.origin),
        }
    }

    Ok(config)
}
