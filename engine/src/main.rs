// Sower Actuator Engine
// Main entry point for the sower binary

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::{mpsc, watch};

use sdk::errors::SowerErrorExt;
use sdk::transport::{Transport, TransportRequest};

use sower_engine::classifier::{ClassifierAdapter, DecisionTreeModel};
use sower_engine::cli::{Cli, Command};
use sower_engine::config::Config;
use sower_engine::controller::{ControlCommand, CycleController, StatusSnapshot, Timing};
use sower_engine::discovery::DiscoveryManager;
use sower_engine::registration::RegistrationManager;
use sower_engine::report::Reporter;
use sower_engine::sensors::SensorPoller;
use sower_engine::server::start_server;
use sower_engine::telemetry::{init_telemetry, init_telemetry_with_level};
use sower_engine::transport::HttpTransport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Sower Engine v{} ({} - {})", version, commit, timestamp);

    // Load configuration (or use custom path if provided)
    let loaded = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)
    } else {
        Config::load_or_create()
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}. {}", e, e.user_hint());
            return Err(e.into());
        }
    };

    // Re-initialize telemetry with the effective log level
    // (only takes effect if RUST_LOG env var is not set)
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(level);

    match cli.command {
        Command::Run => run(config).await,
        Command::Check => check(config, cli.json).await,
    }
}

/// Run the actuator: controller loop plus control surface.
async fn run(config: Config) -> anyhow::Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);

    let (cmd_tx, cmd_rx) = mpsc::channel::<ControlCommand>(16);
    let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());

    let controller = CycleController::new(
        RegistrationManager::new(transport.clone(), config.coordinator.clone()),
        DiscoveryManager::new(transport.clone(), config.coordinator.clone()),
        SensorPoller::new(transport.clone(), config.coordinator.request_timeout()),
        ClassifierAdapter::new(Arc::new(DecisionTreeModel)),
        Reporter::new(
            transport,
            config.coordinator.clone(),
            Duration::from_secs(config.timing.report_spacing_secs),
        ),
        config.registration.clone(),
        Timing::from(&config.timing),
        cmd_rx,
        status_tx,
    );

    let (addr, shutdown_tx) =
        start_server(&config.server.listen_addr, cmd_tx.clone(), status_rx).await?;
    tracing::info!("Control surface available at http://{}", addr);

    let mut controller_handle = tokio::spawn(controller.run());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutdown signal received; tearing down");
            // Teardown is terminal: the controller clears field state and
            // exits at its next tick
            cmd_tx.send(ControlCommand::Teardown).await.ok();
            drop(cmd_tx);
            (&mut controller_handle).await?;
        }
        // A DELETE on the control surface tears the controller down too
        result = &mut controller_handle => {
            tracing::info!("Controller stopped");
            result?;
        }
    }

    shutdown_tx.send(()).ok();
    tracing::info!("Sower stopped.");
    Ok(())
}

/// Validate the configuration and probe coordinator reachability.
async fn check(config: Config, json: bool) -> anyhow::Result<()> {
    config.validate()?;

    let transport = HttpTransport::new()?;
    let probe = TransportRequest::get(
        config.coordinator.base_url.clone(),
        config.coordinator.register_path.clone(),
        config.coordinator.request_timeout(),
    );

    let reachable = match transport.request(probe).await {
        Ok(_) => true,
        // Any HTTP answer proves the coordinator is up; only transport-level
        // failures count as unreachable
        Err(sdk::transport::TransportError::Status(_)) => true,
        Err(e) => {
            tracing::warn!("Coordinator probe failed: {}", e);
            false
        }
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "config": "ok",
                "coordinator": config.coordinator.base_url,
                "reachable": reachable,
            })
        );
    } else {
        println!("Configuration: ok");
        println!(
            "Coordinator {}: {}",
            config.coordinator.base_url,
            if reachable { "reachable" } else { "unreachable" }
        );
    }

    if reachable {
        Ok(())
    } else {
        anyhow::bail!("coordinator is unreachable")
    }
}
