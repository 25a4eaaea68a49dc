//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ScenarioBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ScenarioSummary>,
}

#[derive(Serialize)]
struct ScenarioSummary {
    version: String,
    tick_hz: f64,
    batch_size: usize,
    sensor_count: usize,
    total_rays: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating scenario");

    let result = validate_scenario(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Scenario validation failed")
    }
}

fn validate_scenario(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ScenarioSummary {
                    version: format!("{:?}", blueprint.version),
                    tick_hz: blueprint.scheduler.tick_hz,
                    batch_size: blueprint.scheduler.batch_size,
                    sensor_count: blueprint.sensors.len(),
                    total_rays: blueprint.sensors.iter().map(ray_count).sum(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Rays per revolution of one sensor
fn ray_count(sensor: &contracts::SensorSpec) -> usize {
    let bank = laser_catalog::laser_bank(sensor.model);
    let scan = sensor
        .scan
        .unwrap_or_else(|| laser_catalog::canonical_configuration(sensor.model));
    scan.total_ray_count(bank.laser_count())
}

/// Collect non-fatal issues
fn collect_warnings(blueprint: &ScenarioBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sensors.is_empty() {
        warnings.push("No sensors configured - nothing will be captured".to_string());
    }

    for sensor in &blueprint.sensors {
        if sensor.capture_hz == 0.0 {
            warnings.push(format!(
                "Sensor '{}' has capture_hz = 0 and only captures on demand",
                sensor.id
            ));
        } else if sensor.capture_hz > blueprint.scheduler.tick_hz {
            warnings.push(format!(
                "Sensor '{}' captures at {} Hz but the scheduler ticks at {} Hz; captures are capped at one per tick",
                sensor.id, sensor.capture_hz, blueprint.scheduler.tick_hz
            ));
        }

        if sensor.velocity.is_some() && !sensor.noise.velocity_distortion {
            warnings.push(format!(
                "Sensor '{}' moves but velocity_distortion is disabled",
                sensor.id
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Scenario is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Tick rate: {} Hz", summary.tick_hz);
            println!("  Batch size: {}", summary.batch_size);
            println!("  Sensors: {}", summary.sensor_count);
            println!("  Rays per revolution: {}", summary.total_rays);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Scenario is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn scenario_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_scenario_with_warnings() {
        let file = scenario_file(
            r#"
[[sensors]]
id = "roof"
model = "velodyne_vlp16"
capture_hz = 0.0
"#,
        );
        let result = validate_scenario(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.sensor_count, 1);
        assert_eq!(summary.total_rays, 16 * 1800);
        assert_eq!(result.warnings.unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_scenario() {
        let file = scenario_file(
            r#"
[[sensors]]
id = "roof"
model = "velodyne_vlp16"
[sensors.scan]
horizontal_resolution_deg = 0.0
min_h_angle_deg = -180.0
max_h_angle_deg = 180.0
min_range = 0.0
max_range = 100.0
cycle_period_ms = 0.05
"#,
        );
        let result = validate_scenario(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });

        assert!(!result.valid);
        assert!(result.error.unwrap().contains("horizontal_resolution_deg"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_scenario(&ValidateArgs {
            config: PathBuf::from("/nonexistent/scenario.toml"),
            json: false,
        });
        assert!(!result.valid);
    }
}
