//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{LidarModel, RayGenerateMethod, ScenarioBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::ensure_exists;

/// One built-in model
#[derive(Serialize)]
struct ModelInfo {
    model: String,
    lasers: usize,
    horizontal_steps: usize,
    rays: usize,
    min_range: f64,
    max_range: f64,
    cycle_period_ms: f64,
    method: RayGenerateMethod,
}

/// Scenario description for JSON output
#[derive(Serialize)]
struct ScenarioInfo {
    version: String,
    tick_hz: f64,
    batch_size: usize,
    distance_unit_scale: f64,
    sensors: Vec<SensorInfo>,
}

#[derive(Serialize)]
struct SensorInfo {
    id: String,
    model: String,
    capture_hz: f64,
    rays: usize,
    custom_scan: bool,
    distance_noise: bool,
    angular_noise: bool,
    velocity_distortion: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let Some(path) = &args.config else {
        return print_catalog(args.json);
    };

    info!(config = %path.display(), "Loading scenario info");
    ensure_exists(path)?;

    let blueprint = config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load scenario from {}", path.display()))?;

    let info = build_scenario_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize scenario info")?;
        println!("{}", json);
    } else {
        print_scenario_info(&info);
    }

    Ok(())
}

fn model_info(model: LidarModel) -> ModelInfo {
    let preset = laser_catalog::preset(model);
    let config = preset.configuration;
    ModelInfo {
        model: model.to_string(),
        lasers: preset.bank.laser_count(),
        horizontal_steps: config.horizontal_steps(),
        rays: config.total_ray_count(preset.bank.laser_count()),
        min_range: config.min_range,
        max_range: config.max_range,
        cycle_period_ms: config.cycle_period_ms,
        method: config.ray_generate_method,
    }
}

fn print_catalog(json: bool) -> Result<()> {
    let models: Vec<ModelInfo> = LidarModel::ALL.into_iter().map(model_info).collect();

    if json {
        let json =
            serde_json::to_string_pretty(&models).context("Failed to serialize model catalog")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Built-in lidar models\n");
    println!(
        "{:<18} {:>6} {:>7} {:>8} {:>14}  method",
        "model", "lasers", "steps", "rays", "range (m)"
    );
    for m in &models {
        println!(
            "{:<18} {:>6} {:>7} {:>8} {:>6.2}-{:<7.1}  {:?}",
            m.model, m.lasers, m.horizontal_steps, m.rays, m.min_range, m.max_range, m.method
        );
    }
    println!();
    Ok(())
}

fn build_scenario_info(blueprint: &ScenarioBlueprint) -> ScenarioInfo {
    let sensors = blueprint
        .sensors
        .iter()
        .map(|s| {
            let bank = laser_catalog::laser_bank(s.model);
            let scan = s
                .scan
                .unwrap_or_else(|| laser_catalog::canonical_configuration(s.model));
            SensorInfo {
                id: s.id.clone(),
                model: s.model.to_string(),
                capture_hz: s.capture_hz,
                rays: scan.total_ray_count(bank.laser_count()),
                custom_scan: s.scan.is_some(),
                distance_noise: s.noise.distance_noise,
                angular_noise: s.noise.angular_noise,
                velocity_distortion: s.noise.velocity_distortion,
            }
        })
        .collect();

    ScenarioInfo {
        version: format!("{:?}", blueprint.version),
        tick_hz: blueprint.scheduler.tick_hz,
        batch_size: blueprint.scheduler.batch_size,
        distance_unit_scale: blueprint.scheduler.distance_unit_scale,
        sensors,
    }
}

fn print_scenario_info(info: &ScenarioInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   lidar-sim Scenario                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Scheduler");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Tick rate: {} Hz", info.tick_hz);
    println!("   ├─ Batch size: {}", info.batch_size);
    println!("   └─ Distance unit scale: {}", info.distance_unit_scale);

    println!("\n📡 Sensors ({})", info.sensors.len());
    for (i, sensor) in info.sensors.iter().enumerate() {
        let is_last = i == info.sensors.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({}, {} Hz, {} rays{})",
            prefix,
            sensor.id,
            sensor.model,
            sensor.capture_hz,
            sensor.rays,
            if sensor.custom_scan { ", custom scan" } else { "" }
        );
        println!(
            "   {}  └─ noise: distance={} angular={} distortion={}",
            child_prefix, sensor.distance_noise, sensor.angular_noise, sensor.velocity_distortion
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_model() {
        let models: Vec<_> = LidarModel::ALL.into_iter().map(model_info).collect();
        assert_eq!(models.len(), 7);
        let at128 = models
            .iter()
            .find(|m| m.model == "hesai_at128_e2x")
            .unwrap();
        assert_eq!(at128.lasers, 128);
        assert_eq!(at128.rays, 128 * 1200);
    }

    #[test]
    fn scenario_info_reports_rays() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
[[sensors]]
id = "roof"
model = "ouster_os1_64"
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let info = build_scenario_info(&blueprint);
        assert_eq!(info.sensors[0].rays, 64 * 1024);
        assert!(!info.sensors[0].custom_scan);
    }
}
