//! Subwatch - standalone subscription monitor.

use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subwatch_core::{InMemoryLookup, SubscriptionMonitor};
use subwatch_server::console::{log_target, register_everywhere};
use subwatch_server::{start_processor, Args, BindingsFile, Console};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subwatch_server=info,subwatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting subwatch");

    // Parse command-line arguments
    let args = Args::parse();
    let config = args.into_config();

    tracing::info!(
        slot_count = config.slot_count,
        bindings = ?config.bindings_path,
        signal_buffer = config.signal_buffer,
        "configuration loaded"
    );

    // Seed the lookup service
    let lookup = match &config.bindings_path {
        Some(path) => BindingsFile::load(path)?.into_lookup(config.slot_count)?,
        None => InMemoryLookup::new(config.slot_count),
    };
    let lookup = Arc::new(lookup);

    let monitor = Arc::new(SubscriptionMonitor::new(
        config.monitor_config(),
        lookup.clone(),
    )?);

    register_everywhere(&monitor, &log_target())?;

    let signals = start_processor(monitor.clone(), config.signal_buffer);
    let console = Console::new(lookup, monitor.clone(), signals);

    tracing::info!("monitor ready, reading commands from stdin");
    match console.run(BufReader::new(tokio::io::stdin())).await {
        Ok(()) => {
            tracing::info!(stats = ?monitor.stats(), "subwatch shutdown complete");
        }
        Err(e) => {
            tracing::error!(error = %e, "console error");
            return Err(e.into());
        }
    }

    Ok(())
}
