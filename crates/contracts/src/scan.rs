//! Scan parameters of a sensor instance
//!
//! Validation rules:
//! - horizontal_resolution_deg > 0
//! - min/max horizontal angle within [-360, 360], min <= max, span <= 360
//! - ranges finite and non-negative, min_range <= max_range
//! - cycle_period_ms >= 0

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Maximum horizontal span of one revolution (degrees)
pub const FULL_REVOLUTION_DEG: f64 = 360.0;

/// Minimum range reported by near-field capable AT128 lasers (meters)
pub const HESAI_AT128_NEAR_MIN_RANGE: f64 = 0.5;

/// Minimum range of AT128 far-field firings (meters)
pub const HESAI_AT128_FAR_MIN_RANGE: f64 = 7.2;

/// QT128 lasers per firing bank
pub const HESAI_QT128_BANK_SIZE: usize = 32;

/// First QT128 laser of the half-step sub-bank
pub const HESAI_QT128_SHIFTED_FROM: usize = 3 * HESAI_QT128_BANK_SIZE;

/// Ray generation variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayGenerateMethod {
    /// One range window shared by every ray
    #[default]
    RotatingLidarEqualRange,
    /// Per-laser range windows broadcast over every step
    RotatingLidarDifferentLaserRanges,
    /// Per-laser ranges with near/far-field alternation
    #[serde(rename = "hesai_at128")]
    HesaiAt128,
    /// Per-laser ranges with the upper sub-bank shifted by half a step
    #[serde(rename = "hesai_qt128_c2x")]
    HesaiQt128C2x,
}

/// Where angular noise is injected relative to the raycast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngularNoiseMode {
    /// Perturb ray directions before the raycast
    #[default]
    RayBased,
    /// Perturb hit points after the raycast
    HitpointBased,
}

/// Gaussian noise parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParameters {
    pub angular_noise_mode: AngularNoiseMode,
    pub angular_mean_deg: f64,
    pub angular_std_dev_deg: f64,
    pub distance_mean: f64,
    pub distance_std_dev_base: f64,
    pub distance_std_dev_rise_per_meter: f64,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            angular_noise_mode: AngularNoiseMode::RayBased,
            angular_mean_deg: 0.0,
            angular_std_dev_deg: 0.05,
            distance_mean: 0.0,
            distance_std_dev_base: 0.02,
            distance_std_dev_rise_per_meter: 0.0,
        }
    }
}

/// Scan parameters of one sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanConfiguration {
    /// Azimuth step between consecutive firings (degrees)
    pub horizontal_resolution_deg: f64,

    /// First azimuth of the sweep (degrees)
    pub min_h_angle_deg: f64,

    /// Last azimuth of the sweep (degrees)
    pub max_h_angle_deg: f64,

    /// Default minimum range (meters)
    pub min_range: f64,

    /// Default maximum range (meters)
    pub max_range: f64,

    /// Time between successive horizontal steps (milliseconds)
    pub cycle_period_ms: f64,

    /// Ray generation variant
    #[serde(default)]
    pub ray_generate_method: RayGenerateMethod,

    /// Noise parameters
    #[serde(default)]
    pub noise: NoiseParameters,

    /// Beam divergence forwarded to the raycast stage (degrees)
    #[serde(default)]
    pub beam_divergence_deg: f64,
}

impl ScanConfiguration {
    /// Check every precondition of ray generation.
    ///
    /// # Errors
    /// `InvalidConfiguration` naming the first offending field.
    pub fn validate(&self) -> Result<(), ContractError> {
        let res = self.horizontal_resolution_deg;
        if !res.is_finite() || res <= 0.0 {
            return Err(ContractError::invalid_configuration(
                "horizontal_resolution_deg",
                format!("must be > 0, got {res}"),
            ));
        }

        for (field, angle) in [
            ("min_h_angle_deg", self.min_h_angle_deg),
            ("max_h_angle_deg", self.max_h_angle_deg),
        ] {
            if !angle.is_finite() || angle.abs() > FULL_REVOLUTION_DEG {
                return Err(ContractError::invalid_configuration(
                    field,
                    format!("must be within [-360, 360], got {angle}"),
                ));
            }
        }

        if self.min_h_angle_deg > self.max_h_angle_deg {
            return Err(ContractError::invalid_configuration(
                "min_h_angle_deg",
                format!(
                    "min_h_angle_deg ({}) must be <= max_h_angle_deg ({})",
                    self.min_h_angle_deg, self.max_h_angle_deg
                ),
            ));
        }

        let span = self.max_h_angle_deg - self.min_h_angle_deg;
        if span > FULL_REVOLUTION_DEG {
            return Err(ContractError::invalid_configuration(
                "max_h_angle_deg",
                format!("horizontal span {span} exceeds 360 degrees"),
            ));
        }

        for (field, range) in [("min_range", self.min_range), ("max_range", self.max_range)] {
            if !range.is_finite() || range < 0.0 {
                return Err(ContractError::invalid_configuration(
                    field,
                    format!("must be finite and >= 0, got {range}"),
                ));
            }
        }

        if self.min_range > self.max_range {
            return Err(ContractError::invalid_configuration(
                "min_range",
                format!(
                    "min_range ({}) must be <= max_range ({})",
                    self.min_range, self.max_range
                ),
            ));
        }

        if !self.cycle_period_ms.is_finite() || self.cycle_period_ms < 0.0 {
            return Err(ContractError::invalid_configuration(
                "cycle_period_ms",
                format!("must be finite and >= 0, got {}", self.cycle_period_ms),
            ));
        }

        Ok(())
    }

    /// `max(round(span / resolution), 1)`
    pub fn horizontal_steps(&self) -> usize {
        let steps = ((self.max_h_angle_deg - self.min_h_angle_deg)
            / self.horizontal_resolution_deg)
            .round();
        if steps.is_finite() && steps >= 1.0 {
            steps as usize
        } else {
            1
        }
    }

    /// `laser_count * horizontal_steps`
    pub fn total_ray_count(&self, laser_count: usize) -> usize {
        laser_count * self.horizontal_steps()
    }
}
