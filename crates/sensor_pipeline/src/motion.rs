//! Sensor world pose and motion since the previous capture

use std::f64::consts::{PI, TAU};

use contracts::{LaserBank, MotionDelta, Pose};
use nalgebra::{Translation3, Vector3};

/// Host pose composed with the bank's offset to its optical center
pub fn sensor_world_pose(host: &Pose, bank: &LaserBank) -> Pose {
    host * Translation3::from(bank.center_of_measurement)
}

/// (pitch, yaw, roll) in radians, decomposed in the same `RotY * RotX * RotZ`
/// order `rotation_from_degrees` composes with.
fn pitch_yaw_roll(pose: &Pose) -> Vector3<f64> {
    let forward = pose.rotation * Vector3::z();
    let up = pose.rotation * Vector3::y();
    let right = pose.rotation * Vector3::x();

    let pitch = (-forward.y).clamp(-1.0, 1.0).asin();
    let yaw = forward.x.atan2(forward.z);
    let roll = right.y.atan2(up.y);
    Vector3::new(pitch, yaw, roll)
}

/// Wrap into (-PI, PI]
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Motion between two captures.
///
/// Translation is `previous - current` scaled by `distance_unit_scale`;
/// rotation is the per-axis (pitch, yaw, roll) difference, each wrapped into
/// (-PI, PI]. Zero when there is no previous capture.
pub fn motion_delta(previous: Option<&Pose>, current: &Pose, distance_unit_scale: f64) -> MotionDelta {
    let Some(previous) = previous else {
        return MotionDelta::zero();
    };

    let translation =
        (previous.translation.vector - current.translation.vector) * distance_unit_scale;
    let rotation = (pitch_yaw_roll(previous) - pitch_yaw_roll(current)).map(wrap_angle);

    MotionDelta {
        translation,
        rotation,
    }
}
