use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use growd::config::Config;
use growd::device::sim::{SimClimateSensor, SimLevelSensor, SimRelay, SimThermometer};
use growd::device::{ClimateSensor, LatestReading, RelayBank, Switch};
use growd::job::{self, JobRegistry, JobStore, Scheduler};
use growd::server::{self, AppState, Devices};

/// Growd - a small self-hosted controller for grow-room automation
#[derive(Parser, Debug)]
#[command(version = growd::build_info::VERSION, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "growd.yaml")]
    config: String,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    // CLI port overrides config
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Devices: simulated backends until real drivers are wired in via the
    // device traits.
    let relays = RelayBank::new(
        config
            .devices
            .relays
            .iter()
            .map(|id| (id.clone(), SimRelay::new(id.clone()) as Arc<dyn Switch>))
            .collect::<HashMap<_, _>>(),
    );
    let climate = Arc::new(
        ClimateSensor::new(SimClimateSensor::new(), SimRelay::new("climate-power"))
            .with_settle(Duration::from_secs(config.devices.climate.settle_seconds)),
    );
    let latest_climate = LatestReading::new();

    // Job registry, fixed for the life of the process.
    let mut registry = JobRegistry::new();
    registry.register(job::cycle::JOB_TYPE, job::cycle::relay_cycle(relays.clone()))?;
    registry.register(
        job::poll::JOB_TYPE,
        job::poll::climate_poll(climate.clone(), latest_climate.clone()),
    )?;
    info!(job_types = ?registry.names(), "Registered job types");

    // Resume persisted jobs before accepting requests.
    let scheduler = Scheduler::new(JobStore::new(config.jobs_dir.clone()), Arc::new(registry));
    scheduler.recover().await?;

    let state = AppState {
        scheduler: scheduler.clone(),
        devices: Devices {
            relays,
            climate,
            water_temperature: SimThermometer::new(19.2),
            water_level: SimLevelSensor::new(true),
        },
        latest_climate,
        read_timeout_seconds: config.devices.climate.read_timeout_seconds,
    };

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain running jobs; their records stay so the next boot resumes them.
    scheduler.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
