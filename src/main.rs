// src/main.rs - Kiln controller entry point
use clap::Parser;
use kiln_rs::config::{self, HardwareBackend, KilnConfig};
use kiln_rs::hardware::Hardware;
use kiln_rs::{web, ControlLoop, KilnController};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(name = "kiln-controller", version, about = "Single-zone kiln controller with an HTTP control surface")]
struct Args {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Run against the simulated kiln instead of real hardware
    #[arg(long)]
    simulate: bool,

    /// Log every tick
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    tracing::info!("Starting kiln controller");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            config::load_config(path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path.display(), e);
                Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
            })?
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            KilnConfig::default()
        }
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if args.simulate {
        config.hardware.backend = HardwareBackend::Simulated;
    }

    tracing::info!(
        "Tick every {:?}, default setpoint {:.0}°F, enclosure fan {:.0}/{:.0}°C",
        config.control.tick_interval(),
        config.firing.default_setpoint_f,
        config.enclosure.fan_on_c,
        config.enclosure.fan_off_c
    );

    let hardware = Hardware::from_config(&config).await.map_err(|e| {
        tracing::error!("Failed to initialize hardware: {}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;
    let kiln = KilnController::new(&config, hardware);

    let listener = tokio::net::TcpListener::bind(config.server.listen).await?;
    tracing::info!("Web API listening on http://{}", listener.local_addr()?);

    // Spawn the control loop; it stops (heater off) when shutdown fires.
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let control_loop = ControlLoop::new(kiln.clone(), &config);
    let loop_handle = tokio::spawn(control_loop.run(shutdown_rx));

    let app = web::api::create_router(kiln);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C, serving until killed: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested");
        })
        .await;

    let _ = shutdown_tx.send(());
    loop_handle.await?;
    served?;
    tracing::info!("Kiln controller stopped");
    Ok(())
}
