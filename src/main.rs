//! Large header inspector.
//!
//! ```text
//!   Client ──▶ listener ──▶ [inspect middleware] ──▶ upstream (or echo)
//!   Client ◀────────────── [inspect middleware] ◀── response
//!                                   │
//!                                   ├──▶ <tmp>/largeheaders.log (+ .1)
//!                                   └──▶ tracing target `largeheaders`
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use largeheaders::admin::run_admin;
use largeheaders::config::{load_config, LargeHeadersConfig, SharedConfig};
use largeheaders::config::watcher::ConfigWatcher;
use largeheaders::lifecycle::signals::spawn_signal_listener;
use largeheaders::observability::{logging, metrics};
use largeheaders::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "largeheaders")]
#[command(about = "Flags HTTP responses with anomalously large headers", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LargeHeadersConfig::default(),
    };

    logging::init_logging(&config.observability);

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    tracing::info!("largeheaders v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = ?config.upstream.as_ref().map(|u| &u.address),
        length_threshold = config.thresholds.length_threshold,
        total_data_threshold = config.thresholds.total_data_threshold,
        num_headers_threshold = config.thresholds.num_headers_threshold,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shared = SharedConfig::new(config.clone());

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin_config = shared.clone();
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = run_admin(admin_listener, admin_config, admin_shutdown).await {
                tracing::error!(error = %e, "Admin endpoint failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(shared);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
