//! # Config Loader
//!
//! Loads lidar simulation scenarios.
//!
//! Responsibilities:
//! - Parse TOML/JSON scenario files
//! - Validate field ranges, id uniqueness and scan overrides
//! - Produce a `ScenarioBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("scenario.toml")).unwrap();
//! println!("sensors: {}", blueprint.sensors.len());
//! ```

mod parser;
mod validator;

pub use contracts::ScenarioBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Scenario loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a scenario, detecting the format from the file extension.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ScenarioBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a scenario from a string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ScenarioBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Validate an in-memory blueprint
    pub fn validate(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &ScenarioBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &ScenarioBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::LidarModel;

    const SCENARIO_TOML: &str = r#"
[scheduler]
tick_hz = 50.0
batch_size = 0
distance_unit_scale = 1.0

[[sensors]]
id = "roof"
model = "velodyne_vlp16"
capture_hz = 10.0
[sensors.noise]
distance_noise = true
angular_noise = false
velocity_distortion = true
[sensors.mount.location]
x = 0.0
y = 1.8
z = 0.0
[sensors.velocity]
x = 0.0
y = 0.0
z = 5.0

[[sensors]]
id = "bumper"
model = "hesai_qt128_c2x"
capture_hz = 0.0
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(SCENARIO_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.sensors.len(), 2);
        assert_eq!(bp.sensors[1].model, LidarModel::HesaiQt128C2x);
        assert!(bp.sensors[0].noise.velocity_distortion);
        assert_eq!(bp.sensors[0].velocity.unwrap().z, 5.0);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(SCENARIO_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.sensors.len(), bp2.sensors.len());
        assert_eq!(bp.sensors[0].id, bp2.sensors[0].id);
        assert_eq!(bp.sensors[0].mount, bp2.sensors[0].mount);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(SCENARIO_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.sensors[1].model, bp2.sensors[1].model);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[sensors]]
id = "roof"
model = "velodyne_vlp16"

[[sensors]]
id = "roof"
model = "ouster_os1_64"
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("scenario.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
