//! ScenarioBlueprint - Config Loader output
//!
//! Describes the scheduler settings and every simulated sensor: model preset,
//! capture cadence, runtime toggles, host pose and optional scan override.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{pose_from_degrees, LidarModel, Pose, ScanConfiguration};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScenarioBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Capture scheduler settings
    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerConfig,

    /// Simulated sensors
    #[validate(nested)]
    pub sensors: Vec<SensorSpec>,
}

/// Capture scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchedulerConfig {
    /// Fixed tick cadence driving the scheduler (Hz)
    #[serde(default = "default_tick_hz")]
    #[validate(range(exclusive_min = 0.0))]
    pub tick_hz: f64,

    /// Pending sensors per batch, 0 = every registered sensor
    #[serde(default)]
    pub batch_size: usize,

    /// Factor from host translation units to distortion-stage units
    #[serde(default = "default_distance_unit_scale")]
    #[validate(range(exclusive_min = 0.0))]
    pub distance_unit_scale: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            batch_size: 0,
            distance_unit_scale: default_distance_unit_scale(),
        }
    }
}

fn default_tick_hz() -> f64 {
    50.0
}

fn default_distance_unit_scale() -> f64 {
    1.0
}

fn default_capture_hz() -> f64 {
    10.0
}

/// One simulated sensor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensorSpec {
    /// Unique identifier
    #[validate(length(min = 1, message = "sensor id cannot be empty"))]
    pub id: String,

    /// Built-in model preset
    pub model: LidarModel,

    /// Automatic captures per second, 0 = manual capture only
    #[serde(default = "default_capture_hz")]
    #[validate(range(min = 0.0))]
    pub capture_hz: f64,

    /// Runtime stage toggles
    #[serde(default)]
    pub noise: NoiseToggles,

    /// Host pose
    #[serde(default)]
    pub mount: Transform,

    /// Host linear velocity (m/s), used to move the host between ticks
    #[serde(default)]
    pub velocity: Option<Location>,

    /// Overrides the preset's canonical scan configuration
    #[serde(default)]
    pub scan: Option<ScanConfiguration>,
}

/// Independent enable flags of the optional stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseToggles {
    pub distance_noise: bool,
    pub angular_noise: bool,
    pub velocity_distortion: bool,
}

impl Default for NoiseToggles {
    fn default() -> Self {
        Self {
            distance_noise: true,
            angular_noise: true,
            velocity_distortion: false,
        }
    }
}

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Location (x, y, z), meters
    #[serde(default)]
    pub location: Location,

    /// Rotation (pitch, yaw, roll), degrees
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    pub fn to_pose(&self) -> Pose {
        pose_from_degrees(
            self.location.to_vector(),
            self.rotation.pitch,
            self.rotation.yaw,
            self.rotation.roll,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sensor(id: &str) -> SensorSpec {
        SensorSpec {
            id: id.to_string(),
            model: LidarModel::VelodyneVlp16,
            capture_hz: 10.0,
            noise: NoiseToggles::default(),
            mount: Transform::default(),
            velocity: None,
            scan: None,
        }
    }

    #[test]
    fn test_field_validation_passes() {
        let blueprint = ScenarioBlueprint {
            version: ConfigVersion::V1,
            scheduler: SchedulerConfig::default(),
            sensors: vec![sample_sensor("roof")],
        };
        assert!(blueprint.validate().is_ok());
    }

    #[test]
    fn test_field_validation_rejects_negative_cadence() {
        let mut sensor = sample_sensor("roof");
        sensor.capture_hz = -1.0;
        let blueprint = ScenarioBlueprint {
            version: ConfigVersion::V1,
            scheduler: SchedulerConfig::default(),
            sensors: vec![sensor],
        };
        let errors = blueprint.validate().unwrap_err();
        assert!(errors.to_string().contains("capture_hz"), "got: {errors}");
    }

    #[test]
    fn test_field_validation_rejects_empty_id() {
        let blueprint = ScenarioBlueprint {
            version: ConfigVersion::V1,
            scheduler: SchedulerConfig::default(),
            sensors: vec![sample_sensor("")],
        };
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn test_transform_to_pose() {
        let transform = Transform {
            location: Location {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
            rotation: Rotation {
                pitch: 0.0,
                yaw: 90.0,
                roll: 0.0,
            },
        };
        let pose = transform.to_pose();
        assert_eq!(pose.translation.vector, Vector3::new(1.0, 2.0, 3.0));
        let forward = pose.rotation * Vector3::z();
        assert!((forward - Vector3::x()).norm() < 1e-12);
    }
}
