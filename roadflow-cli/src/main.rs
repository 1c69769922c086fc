mod config;
mod error;
mod sink;
mod zone;

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::Parser;
use roadflow_core::cycle::CycleMeta;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::CliConfig,
    error::CliError,
    zone::{load_zones, process_cycle, process_pending},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fuse tile traffic measurements onto road networks", long_about = None)]
struct Args {
    /// Path to the TOML configuration
    #[arg(long, short, global = true, default_value = "roadflow.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Process a single cycle in every zone
    Run {
        /// Cycle id, e.g. 2024_05_06_08_15_00
        #[arg(long)]
        cycle: String,
    },
    /// Poll the input directories and process new cycles until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = Arc::new(CliConfig::load(&args.config)?);
    let zones = {
        let config = Arc::clone(&config);
        Arc::new(tokio::task::spawn_blocking(move || load_zones(&config)).await??)
    };

    match args.command {
        Commands::Run { cycle } => {
            CycleMeta::from_cycle_id(&cycle)?;
            let total = zones.len();
            let stored =
                tokio::task::spawn_blocking(move || process_cycle(&zones, &config, &cycle)).await?;
            if stored < total {
                return Err(CliError::ZonesFailed {
                    failed: total - stored,
                    total,
                });
            }
            Ok(())
        }
        Commands::Watch => watch(zones, config).await,
    }
}

async fn watch(zones: Arc<Vec<zone::Zone>>, config: Arc<CliConfig>) -> Result<(), CliError> {
    // Spawned so the listener is registered now and a Ctrl-C that arrives
    // while a cycle runs is still seen afterwards.
    let ctrl_c = tokio::spawn(tokio::signal::ctrl_c());
    watch_until(zones, config, async {
        if let Ok(Err(e)) = ctrl_c.await {
            error!("Ctrl-C listener failed: {e}");
        }
    })
    .await
}

/// Poll until `shutdown` completes. A shutdown that completes during a poll
/// stops the loop right after it.
async fn watch_until(
    zones: Arc<Vec<zone::Zone>>,
    config: Arc<CliConfig>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), CliError> {
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    info!(
        "Watching {} zones every {}s",
        zones.len(),
        config.poll_interval_secs
    );
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!("Shutting down");
                return Ok(());
            }
            _ = interval.tick() => {
                let zones = Arc::clone(&zones);
                let config = Arc::clone(&config);
                let stored = tokio::task::spawn_blocking(move || process_pending(&zones, &config)).await?;
                if stored > 0 {
                    info!("Stored {stored} documents");
                }
            }
        }
    }
}
