//! Pipeline stages and their activation rules

use std::fmt;

use contracts::{AngularNoiseMode, NoiseParameters, NoiseToggles};

/// The twelve stages of a sensor subgraph, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Rays,
    RangeWindow,
    RingIds,
    TimeOffsets,
    VelocityDistortion,
    WorldPose,
    AngularNoiseRay,
    Raycast,
    AngularNoiseHitpoint,
    DistanceNoise,
    Compact,
    LidarFrame,
}

impl Stage {
    pub const ALL: [Stage; 12] = [
        Stage::Rays,
        Stage::RangeWindow,
        Stage::RingIds,
        Stage::TimeOffsets,
        Stage::VelocityDistortion,
        Stage::WorldPose,
        Stage::AngularNoiseRay,
        Stage::Raycast,
        Stage::AngularNoiseHitpoint,
        Stage::DistanceNoise,
        Stage::Compact,
        Stage::LidarFrame,
    ];

    /// Node id suffix, never changes for the lifetime of a sensor
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Rays => "rays",
            Stage::RangeWindow => "range_window",
            Stage::RingIds => "ring_ids",
            Stage::TimeOffsets => "time_offsets",
            Stage::VelocityDistortion => "velocity_distortion",
            Stage::WorldPose => "world_pose",
            Stage::AngularNoiseRay => "angular_noise_ray",
            Stage::Raycast => "raycast",
            Stage::AngularNoiseHitpoint => "angular_noise_hitpoint",
            Stage::DistanceNoise => "distance_noise",
            Stage::Compact => "compact",
            Stage::LidarFrame => "lidar_frame",
        }
    }

    /// Stages that may be switched off at runtime
    pub fn is_toggleable(&self) -> bool {
        matches!(
            self,
            Stage::VelocityDistortion
                | Stage::AngularNoiseRay
                | Stage::AngularNoiseHitpoint
                | Stage::DistanceNoise
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which angular noise stage runs, if any.
///
/// Ray-based and hitpoint-based noise are never active together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngularNoiseStage {
    #[default]
    Disabled,
    RayBased,
    HitpointBased,
}

impl AngularNoiseStage {
    pub fn select(enabled: bool, mode: AngularNoiseMode) -> Self {
        match (enabled, mode) {
            (false, _) => AngularNoiseStage::Disabled,
            (true, AngularNoiseMode::RayBased) => AngularNoiseStage::RayBased,
            (true, AngularNoiseMode::HitpointBased) => AngularNoiseStage::HitpointBased,
        }
    }
}

/// Activation flags derived from toggles and noise parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageActivation {
    pub velocity_distortion: bool,
    pub angular_noise: AngularNoiseStage,
    pub distance_noise: bool,
}

impl StageActivation {
    pub fn evaluate(toggles: &NoiseToggles, noise: &NoiseParameters) -> Self {
        Self {
            velocity_distortion: toggles.velocity_distortion,
            angular_noise: AngularNoiseStage::select(toggles.angular_noise, noise.angular_noise_mode),
            distance_noise: toggles.distance_noise,
        }
    }

    pub fn is_active(&self, stage: Stage) -> bool {
        match stage {
            Stage::VelocityDistortion => self.velocity_distortion,
            Stage::AngularNoiseRay => self.angular_noise == AngularNoiseStage::RayBased,
            Stage::AngularNoiseHitpoint => self.angular_noise == AngularNoiseStage::HitpointBased,
            Stage::DistanceNoise => self.distance_noise,
            _ => true,
        }
    }
}
