//! Scenario validation
//!
//! Rules:
//! - field ranges declared on the blueprint types (`capture_hz >= 0`,
//!   `tick_hz > 0`, non-empty ids)
//! - sensor ids unique
//! - scan overrides satisfy the ray generation preconditions

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{ContractError, ScenarioBlueprint};

/// Validate a parsed scenario, returning the first violation
pub fn validate(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_sensor_ids(blueprint)?;
    validate_scan_overrides(blueprint)?;
    Ok(())
}

fn validate_fields(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|key| key.to_string())
            .unwrap_or_else(|| "blueprint".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

fn validate_sensor_ids(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for sensor in &blueprint.sensors {
        if !seen.insert(sensor.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("sensors[id={}]", sensor.id),
                "duplicate sensor_id",
            ));
        }
    }
    Ok(())
}

fn validate_scan_overrides(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    for sensor in &blueprint.sensors {
        let Some(scan) = &sensor.scan else {
            continue;
        };
        if let Err(e) = scan.validate() {
            let field = e.offending_field().unwrap_or("scan");
            return Err(ContractError::config_validation(
                format!("sensors[{}].scan.{field}", sensor.id),
                e.to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, LidarModel, NoiseToggles, SchedulerConfig, SensorSpec, Transform,
    };

    fn sensor(id: &str) -> SensorSpec {
        SensorSpec {
            id: id.into(),
            model: LidarModel::VelodyneVlp16,
            capture_hz: 10.0,
            noise: NoiseToggles::default(),
            mount: Transform::default(),
            velocity: None,
            scan: None,
        }
    }

    fn blueprint(sensors: Vec<SensorSpec>) -> ScenarioBlueprint {
        ScenarioBlueprint {
            version: ConfigVersion::V1,
            scheduler: SchedulerConfig::default(),
            sensors,
        }
    }

    #[test]
    fn test_valid_blueprint() {
        assert!(validate(&blueprint(vec![sensor("roof"), sensor("rear")])).is_ok());
    }

    #[test]
    fn test_duplicate_sensor_id() {
        let err = validate(&blueprint(vec![sensor("roof"), sensor("roof")])).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_zero_tick_rate() {
        let mut bp = blueprint(vec![sensor("roof")]);
        bp.scheduler.tick_hz = 0.0;
        let err = validate(&bp).unwrap_err();
        assert_eq!(err.offending_field(), Some("scheduler"));
    }

    #[test]
    fn test_negative_cadence() {
        let mut roof = sensor("roof");
        roof.capture_hz = -5.0;
        let err = validate(&blueprint(vec![roof])).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
        assert!(err.to_string().contains("capture_hz"));
    }

    #[test]
    fn test_zero_cadence_is_manual_not_invalid() {
        let mut roof = sensor("roof");
        roof.capture_hz = 0.0;
        assert!(validate(&blueprint(vec![roof])).is_ok());
    }

    #[test]
    fn test_invalid_scan_override() {
        let mut roof = sensor("roof");
        let mut scan = laser_scan();
        scan.min_h_angle_deg = 10.0;
        scan.max_h_angle_deg = 5.0;
        roof.scan = Some(scan);

        let err = validate(&blueprint(vec![roof])).unwrap_err();
        assert_eq!(err.offending_field(), Some("sensors[roof].scan.min_h_angle_deg"));
    }

    fn laser_scan() -> contracts::ScanConfiguration {
        contracts::ScanConfiguration {
            horizontal_resolution_deg: 0.2,
            min_h_angle_deg: -180.0,
            max_h_angle_deg: 180.0,
            min_range: 0.0,
            max_range: 100.0,
            cycle_period_ms: 0.055296,
            ray_generate_method: Default::default(),
            noise: Default::default(),
            beam_divergence_deg: 0.0,
        }
    }
}
