//! Zenoh bridge for the RTD-W Modbus interface.
//!
//! Polls the heat pump over Modbus RTU and publishes point values to Zenoh;
//! applies hub commands received on Zenoh.

use anyhow::{Context, Result};
use clap::Parser;
use rtdw_common::KeyExprBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use zenoh_bridge_rtdw::commands::{self, COMMAND_QUEUE_DEPTH};
use zenoh_bridge_rtdw::config::RtdwBridgeConfig;
use zenoh_bridge_rtdw::status::BridgeStatus;
use zenoh_bridge_rtdw::{Engine, ModbusTransport, PointCatalog, ZenohSink};

/// Zenoh bridge for the Daikin Altherma RTD-W interface.
#[derive(Parser, Debug)]
#[command(name = "zenoh-bridge-rtdw")]
#[command(about = "Polls an RTD-W heat-pump interface and publishes to Zenoh")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format)
    #[arg(short, long, default_value = "rtdw.json5")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = RtdwBridgeConfig::load_from_file(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize logging
    let log_config = config
        .logging
        .resolve(config.rtdw.debug, args.log_level.as_deref());
    rtdw_common::init_tracing(&log_config)
        .map_err(|e| anyhow::anyhow!("Failed to init tracing: {}", e))?;

    info!("Starting zenoh-bridge-rtdw");
    info!("Loaded configuration from {:?}", args.config);
    debug!(?config, "Resolved configuration");

    let catalog = PointCatalog::rtdw().context("Invalid point table")?;

    // Connect to Zenoh
    let session = Arc::new(
        rtdw_common::connect(&config.zenoh)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to Zenoh: {}", e))?,
    );

    let keys = KeyExprBuilder::with_prefix(&config.rtdw.key_prefix, &config.rtdw.device);
    let status_key = keys.status_key();
    let command_key = keys.command_key();

    let sink = ZenohSink::new(session.clone(), keys, config.rtdw.format, &catalog);
    let transport = ModbusTransport::new(config.rtdw.serial.clone());
    let engine = Engine::new(catalog, transport, sink, config.rtdw.poll.ticks_per_poll());

    if let Err(e) = engine.announce().await {
        error!("Failed to announce points: {}", e);
    }

    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

    let listener = {
        let session = session.clone();
        tokio::spawn(async move {
            if let Err(e) = commands::listen(session, command_key, command_tx).await {
                error!("Command listener failed: {}", e);
            }
        })
    };

    let heartbeat = config.rtdw.poll.heartbeat();
    let mut engine = tokio::spawn(engine.run(command_rx, heartbeat));

    info!(
        "RTD-W bridge running for device '{}' on {}",
        config.rtdw.device, config.rtdw.serial.port
    );

    // Publish bridge status
    if let Err(e) = BridgeStatus::running()
        .with_device(&config)
        .publish(&session, &status_key)
        .await
    {
        error!("Failed to publish bridge status: {}", e);
    }

    // Wait for shutdown signal; the engine only ends on its own if it panics
    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received shutdown signal");
            engine.abort();
            Ok(())
        }
        joined = &mut engine => {
            let reason = match joined {
                Ok(()) => "engine stopped".to_string(),
                Err(e) => format!("engine task failed: {}", e),
            };
            error!("{}", reason);
            Err(anyhow::anyhow!(reason))
        }
    };

    listener.abort();

    let status = match &outcome {
        Ok(()) => BridgeStatus::offline(),
        Err(e) => BridgeStatus::error(e.to_string()),
    };
    let _ = status.publish(&session, &status_key).await;

    session
        .close()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to close Zenoh session: {}", e))?;
    info!("RTD-W bridge stopped");

    outcome
}
