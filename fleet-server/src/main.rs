use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use fleet_server::{
    AppState, api,
    config::{Config, RegistryConfig},
    reconcile::{ReconcileOutcome, Reconciler},
    registry::{
        DeviceRegistry, HeartbeatRegistry, UploadStatRegistry,
        memory::{InMemoryDeviceRegistry, InMemoryHeartbeatRegistry, InMemoryUploadStatRegistry},
        sqlite::{self, SqliteDeviceRegistry, SqliteHeartbeatRegistry, SqliteUploadStatRegistry},
    },
    source::CsvDeviceSource,
    telemetry::Telemetry,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fleet-server")]
#[command(about = "Fleet monitoring server")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "fleet-server.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tracing=info,fleet_server=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    info!(http_addr = %config.server.http_addr, source = ?config.devices.source, "Starting server");

    match config.registry {
        RegistryConfig::Memory => {
            info!("Using in-memory registries");
            run_server(
                InMemoryDeviceRegistry::new(),
                InMemoryHeartbeatRegistry::new(),
                InMemoryUploadStatRegistry::new(),
                "memory",
                config.devices.source,
                config.server.http_addr,
            )
            .await?;
        }
        RegistryConfig::Sqlite {
            path,
            max_connections,
        } => {
            info!(path = ?path, max_connections, "Using SQLite registries");
            // The event tables reference devices, so all three share one database.
            let pool = sqlite::connect(&path, max_connections).await?;
            run_server(
                SqliteDeviceRegistry::from_pool(pool.clone()),
                SqliteHeartbeatRegistry::from_pool(pool.clone()),
                SqliteUploadStatRegistry::from_pool(pool),
                "sqlite",
                config.devices.source,
                config.server.http_addr,
            )
            .await?;
        }
    }

    Ok(())
}

async fn run_server<D, H, U>(
    device_registry: D,
    heartbeat_registry: H,
    upload_stat_registry: U,
    backend: &'static str,
    device_source: PathBuf,
    http_addr: SocketAddr,
) -> color_eyre::Result<()>
where
    D: DeviceRegistry,
    H: HeartbeatRegistry,
    U: UploadStatRegistry,
{
    // The fleet must be registered before any traffic is accepted
    let reconciler = Reconciler::new(device_registry.clone());
    match reconciler
        .reconcile_from(&CsvDeviceSource::new(device_source))
        .await?
    {
        ReconcileOutcome::UpToDate => info!("Device registry up to date"),
        ReconcileOutcome::Registered { devices, batches } => {
            info!(devices, batches, "Device registry reconciled")
        }
    }

    let state = AppState {
        telemetry: Telemetry::new(device_registry, heartbeat_registry, upload_stat_registry),
        backend,
    };
    let app = api::app(state);

    let cancel = CancellationToken::new();

    let listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");

    let cancel_clone = cancel.clone();
    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(async move {
            cancel_clone.cancelled().await;
        }) => {
            if let Err(e) = result {
                error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    }

    Ok(())
}
