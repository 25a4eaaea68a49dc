//! Poses and motion deltas

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// Rigid world pose of a host or sensor
pub type Pose = Isometry3<f64>;

/// Motion since the previous capture, consumed by the velocity distortion stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDelta {
    /// Previous minus current position (distortion-stage units)
    pub translation: Vector3<f64>,

    /// Previous minus current (pitch, yaw, roll) in radians
    pub rotation: Vector3<f64>,
}

impl MotionDelta {
    pub fn zero() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: Vector3::zeros(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.translation == Vector3::zeros() && self.rotation == Vector3::zeros()
    }
}

impl Default for MotionDelta {
    fn default() -> Self {
        Self::zero()
    }
}

/// Rotation from (pitch, yaw, roll) degrees, applied roll first, then pitch, then yaw.
///
/// Pitch turns about +X, yaw about +Y (the azimuth axis), roll about +Z.
pub fn rotation_from_degrees(pitch: f64, yaw: f64, roll: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw.to_radians())
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch.to_radians())
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), roll.to_radians())
}

/// Pose from a location (meters) and (pitch, yaw, roll) degrees
pub fn pose_from_degrees(location: Vector3<f64>, pitch: f64, yaw: f64, roll: f64) -> Pose {
    Isometry3::from_parts(
        Translation3::from(location),
        rotation_from_degrees(pitch, yaw, roll),
    )
}
