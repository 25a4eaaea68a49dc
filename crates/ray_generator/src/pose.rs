//! Per-laser local poses and the horizontal sweep

use contracts::{
    rotation_from_degrees, LaserBank, RayGenerateMethod, ScanConfiguration, HESAI_QT128_SHIFTED_FROM,
};
use nalgebra::{Isometry3, Matrix4, Translation3, UnitQuaternion, Vector3};


/// `T_up(v) * R(pitch, yaw) * T_fwd(-f)` for every laser, firing order.
pub fn local_poses(bank: &LaserBank) -> Vec<Isometry3<f64>> {
    let apex = Isometry3::from_parts(
        Translation3::new(0.0, 0.0, -bank.focal_distance),
        UnitQuaternion::identity(),
    );

    bank.lasers
        .iter()
        .map(|laser| {
            let lift = Isometry3::from_parts(
                Translation3::new(0.0, laser.vertical_linear_offset, 0.0),
                UnitQuaternion::identity(),
            );
            let aim = Isometry3::from_parts(
                Translation3::identity(),
                rotation_from_degrees(
                    laser.vertical_angular_offset_deg,
                    laser.horizontal_angular_offset_deg,
                    0.0,
                ),
            );
            lift * aim * apex
        })
        .collect()
}

/// Azimuth of `laser` at horizontal `step` (degrees)
pub fn azimuth(config: &ScanConfiguration, laser: usize, step: usize) -> f64 {
    let res = config.horizontal_resolution_deg;
    let base = config.min_h_angle_deg + step as f64 * res;
    match config.ray_generate_method {
        RayGenerateMethod::HesaiQt128C2x if laser >= HESAI_QT128_SHIFTED_FROM => base + res / 2.0,
        _ => base,
    }
}

/// Swept poses, laser-major and step-minor.
pub fn sweep(local: &[Isometry3<f64>], config: &ScanConfiguration, steps: usize) -> Vec<Matrix4<f64>> {
    let mut poses = Vec::with_capacity(local.len() * steps);
    for step in 0..steps {
        for (laser, pose) in local.iter().enumerate() {
            let yaw = UnitQuaternion::from_axis_angle(
                &Vector3::y_axis(),
                azimuth(config, laser, step).to_radians(),
            );
            poses.push((yaw * pose).to_homogeneous());
        }
    }
    poses
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contracts::Laser;

    #[test]
    fn focal_distance_moves_origin_behind_aperture() {
        let bank = LaserBank::new(vec![Laser::new(0.0, 0.0, 0, 0.0)]).with_focal_distance(0.1);
        let local = local_poses(&bank);
        assert_relative_eq!(local[0].translation.vector, Vector3::new(0.0, 0.0, -0.1));
    }

    #[test]
    fn apex_follows_pointing_direction() {
        let bank = LaserBank::new(vec![Laser::new(90.0, 0.0, 0, 0.0)]).with_focal_distance(1.0);
        let local = local_poses(&bank);
        // yawed to +X, so the apex sits on -X
        assert_relative_eq!(
            local[0].translation.vector,
            Vector3::new(-1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn vertical_offset_lifts_origin() {
        let bank = LaserBank::new(vec![
            Laser::new(0.0, 5.0, 0, 0.0).with_vertical_linear_offset(0.02)
        ]);
        let local = local_poses(&bank);
        assert_relative_eq!(local[0].translation.vector, Vector3::new(0.0, 0.02, 0.0));
    }
}
