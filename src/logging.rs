//! Centralized logging setup with dual output (stdout + transit.log)

use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log file written next to the working directory
pub const LOG_FILE: &str = "transit.log";

/// Initialize logging with dual output: stdout + transit.log file
///
/// Both outputs use the same log level from RUST_LOG environment variable.
/// Defaults to "info" level if RUST_LOG is not set.
///
/// The _guard is forgotten to keep the file appender alive for the program lifetime.
pub fn init_dual_logging() {
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(env_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .init();

    // Keep guard alive for the program lifetime
    std::mem::forget(_guard);
}

/// Initialize stdout-only logging for `--check-config` runs
///
/// Configuration problems are reported on stdout without leaving a log
/// file behind.
pub fn init_console_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_filter(env_filter),
        )
        .init();
}
