use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use nntp_transit::TransitServiceBuilder;
use nntp_transit::filter::FilterCatalog;
use nntp_transit::logging::{init_console_logging, init_dual_logging};
use nntp_transit::peer::PeerRegistry;
use nntp_transit::runtime::{RuntimeConfig, load_and_log_config, shutdown_signal};

#[derive(Parser, Debug)]
#[command(author, version, about = "News transit peer-feed core", long_about = None)]
struct Args {
    /// Configuration file path
    ///
    /// Can be overridden with NNTP_TRANSIT_CONFIG environment variable
    #[arg(short, long, default_value = "transit.toml", env = "NNTP_TRANSIT_CONFIG")]
    config: String,

    /// Number of worker threads (default: 1, use 0 for CPU cores)
    ///
    /// Can be overridden with NNTP_TRANSIT_THREADS environment variable
    #[arg(short, long, env = "NNTP_TRANSIT_THREADS")]
    threads: Option<usize>,

    /// Load the configuration, report every problem found in it, and exit
    #[arg(long)]
    check_config: bool,
}

fn main() {
    let args = Args::parse();

    let result = if args.check_config {
        init_console_logging();
        check_config(&args)
    } else {
        init_dual_logging();
        run(&args)
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Build the peer registry without starting anything
fn check_config(args: &Args) -> Result<()> {
    let config = load_and_log_config(&args.config)?;
    let registry = PeerRegistry::from_config(&config, &FilterCatalog::new())
        .context("Invalid peer configuration")?;

    let problems = registry.diagnostics().len();
    if problems > 0 {
        anyhow::bail!("{}: {} problem(s) found", args.config, problems);
    }
    info!("{}: {} peer(s), configuration OK", args.config, registry.len());
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = load_and_log_config(&args.config)?;
    let rt = RuntimeConfig::from_args(args.threads).build_runtime()?;

    rt.block_on(async move {
        let mut service = TransitServiceBuilder::new(config).build()?;

        let diagnostics = service.registry().diagnostics().len();
        if diagnostics > 0 {
            warn!(
                "{} configuration problem(s) were ignored; run with --check-config for details",
                diagnostics
            );
        }

        service.start();
        info!("Transit core running");

        shutdown_signal().await;
        info!("Shutdown signal received");
        service.shutdown();
        Ok(())
    })
}
