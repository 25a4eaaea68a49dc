//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ScenarioBlueprint;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::{ensure_exists, CliError};
use crate::simulation::{Simulation, SimulationConfig};

/// Execute the `run` command
pub async fn run_simulation(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scenario");

    ensure_exists(&args.config)?;

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load scenario from {}", args.config.display()))?;

    if let Some(tick_hz) = args.tick_hz {
        if !(tick_hz.is_finite() && tick_hz > 0.0) {
            return Err(CliError::InvalidTickRate { value: tick_hz }.into());
        }
        info!(tick_hz, "Overriding tick rate from CLI");
        blueprint.scheduler.tick_hz = tick_hz;
    }

    info!(
        sensors = blueprint.sensors.len(),
        tick_hz = blueprint.scheduler.tick_hz,
        batch_size = blueprint.scheduler.batch_size,
        "Scenario loaded"
    );

    if args.dry_run {
        info!("Dry run mode - scenario is valid, exiting");
        print_scenario_summary(&blueprint);
        return Ok(());
    }

    let config = SimulationConfig {
        tick_hz: blueprint.scheduler.tick_hz,
        blueprint,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    let stats = Simulation::new(config)
        .run(shutdown_signal())
        .await
        .context("Simulation failed")?;

    info!(
        ticks = stats.ticks,
        captures = stats.captures.total_captures,
        duration_secs = stats.duration.as_secs_f64(),
        captures_per_second = format!("{:.2}", stats.captures_per_second()),
        "Simulation finished"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM; never resolves if no handler can be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print scenario summary for dry-run mode
fn print_scenario_summary(blueprint: &ScenarioBlueprint) {
    println!("\n=== Scenario Summary ===\n");
    println!("Scheduler:");
    println!("  Tick rate: {} Hz", blueprint.scheduler.tick_hz);
    match blueprint.scheduler.batch_size {
        0 => println!("  Batch size: all registered sensors"),
        n => println!("  Batch size: {n}"),
    }
    println!(
        "  Distance unit scale: {}",
        blueprint.scheduler.distance_unit_scale
    );

    println!("\nSensors ({}):", blueprint.sensors.len());
    for sensor in &blueprint.sensors {
        let cadence = if sensor.capture_hz > 0.0 {
            format!("{} Hz", sensor.capture_hz)
        } else {
            "manual".to_string()
        };
        let scan = if sensor.scan.is_some() {
            "custom scan"
        } else {
            "canonical scan"
        };
        println!("  - {} ({}, {}, {})", sensor.id, sensor.model, cadence, scan);
    }

    println!();
}
