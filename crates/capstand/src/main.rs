//! capstand — the capstan daemon.
//!
//! Single binary that assembles the reservation metrics engine:
//! - Static inventory loaded from a fixture file
//! - Deadline-bounded inventory client
//! - Producer factory with the built-in variants
//! - Gauge reconciler
//!
//! Gauge statuses are reported on the engine interval until ctrl-c.
//!
//! # Usage
//!
//! ```text
//! capstand run --config capstan.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use capstan_core::config::{CapstanConfig, parse_duration};
use capstan_inventory::{DeadlineClient, InventoryClient, StaticInventory};
use capstan_producers::ProducerFactory;
use capstan_reconciler::{BackoffPolicy, Reconciler, ReconcilerConfig};

#[derive(Parser)]
#[command(name = "capstand", about = "Capstan reservation metrics daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the engine against a configuration file.
    Run {
        /// Path to capstan.toml.
        #[arg(long, default_value = "capstan.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,capstand=debug,capstan=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { config } => run(config).await,
    }
}

async fn run(config_path: PathBuf) -> anyhow::Result<()> {
    info!(config = ?config_path, "capstan engine starting");

    let config = CapstanConfig::from_file(&config_path)?;

    // ── Initialize subsystems ──────────────────────────────────

    // Inventory: static fixture behind a read deadline.
    let inventory = StaticInventory::from_file(&config.inventory.fixture)?;
    let deadline = parse_duration(
        &config.engine.inventory_timeout,
        std::time::Duration::from_secs(5),
    );
    let client: Arc<dyn InventoryClient> =
        Arc::new(DeadlineClient::new(Arc::new(inventory), deadline));
    info!(fixture = ?config.inventory.fixture, ?deadline, "inventory client initialized");

    // Producer factory.
    let factory = Arc::new(ProducerFactory::with_builtins(client));
    info!(kinds = ?factory.kinds(), "producer factory initialized");

    // Reconciler.
    let interval = parse_duration(&config.engine.interval, std::time::Duration::from_secs(30));
    let reconciler_config = ReconcilerConfig {
        interval,
        jitter: parse_duration(&config.engine.jitter, std::time::Duration::from_secs(3)),
        backoff: BackoffPolicy {
            base: parse_duration(&config.backoff.base, std::time::Duration::from_secs(1)),
            max: parse_duration(&config.backoff.max, std::time::Duration::from_secs(300)),
            ..BackoffPolicy::default()
        },
    };
    let reconciler = Reconciler::new(factory, reconciler_config);

    for gauge in &config.gauges {
        reconciler.apply(&gauge.name, gauge.spec.clone()).await;
    }
    info!(gauges = config.gauges.len(), ?interval, "reconciler started");

    // ── Report loop ────────────────────────────────────────────

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                for name in reconciler.gauge_names().await {
                    if let Some(state) = reconciler.status(&name).await {
                        info!(
                            gauge = %name,
                            phase = ?state.phase,
                            ready = state.ready,
                            status = %serde_json::to_string(&state.status).unwrap_or_default(),
                            "gauge status"
                        );
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("capstan engine shutting down");
                break;
            }
        }
    }

    reconciler.stop_all().await;
    Ok(())
}
