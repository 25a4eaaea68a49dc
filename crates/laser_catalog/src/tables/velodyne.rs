use contracts::{Laser, LaserBank};
use nalgebra::Vector3;

use super::{emitter, rings_by_elevation};

/// Time between two consecutive single firings (ms)
const VELODYNE_FIRING_MS: f64 = 0.002304;

const VLP16_ELEVATION_DEG: [f64; 16] = [
    -15.0, 1.0, -13.0, 3.0, -11.0, 5.0, -9.0, 7.0, -7.0, 9.0, -5.0, 11.0, -3.0, 13.0, -1.0, 15.0,
];

const VLP32C_ELEVATION_DEG: [f64; 32] = [
    -25.0, -1.0, -1.667, -15.639, -11.31, 0.0, -0.667, -8.843, -7.254, 0.333, -0.333, -6.148,
    -5.333, 1.333, 0.667, -4.0, -4.667, 1.667, 1.0, -3.667, -3.333, 3.333, 2.333, -2.667, -3.0,
    7.0, 4.667, -2.333, -2.0, 15.0, 10.333, -1.333,
];

const VLP32C_AZIMUTH_DEG: [f64; 32] = [
    1.4, -4.2, 1.4, -1.4, 1.4, -1.4, 4.2, -1.4, 1.4, -4.2, 1.4, -1.4, 4.2, -1.4, 4.2, -1.4, 1.4,
    -4.2, 1.4, -4.2, 4.2, -1.4, 1.4, -1.4, 1.4, -1.4, 1.4, -4.2, 4.2, -1.4, 1.4, -1.4,
];

/// Single forward-facing beam
pub(crate) fn range_meter() -> LaserBank {
    LaserBank::new(vec![Laser::new(0.0, 0.0, 0, 0.0)])
}

pub(crate) fn velodyne_vlp16() -> LaserBank {
    let rings = rings_by_elevation(&VLP16_ELEVATION_DEG);
    let lasers = VLP16_ELEVATION_DEG
        .iter()
        .zip(rings)
        .enumerate()
        .map(|(i, (&elevation, ring))| {
            emitter(0.0, elevation, ring, i as f64 * VELODYNE_FIRING_MS)
        })
        .collect();

    LaserBank::new(lasers).with_center_of_measurement(Vector3::new(0.0, 0.0377, 0.0))
}

/// Lasers fire in pairs, so two consecutive entries share a time offset
pub(crate) fn velodyne_vlp32c() -> LaserBank {
    let rings = rings_by_elevation(&VLP32C_ELEVATION_DEG);
    let lasers = VLP32C_ELEVATION_DEG
        .iter()
        .zip(VLP32C_AZIMUTH_DEG)
        .zip(rings)
        .enumerate()
        .map(|(i, ((&elevation, azimuth), ring))| {
            emitter(azimuth, elevation, ring, (i / 2) as f64 * VELODYNE_FIRING_MS)
        })
        .collect();

    LaserBank::new(lasers).with_center_of_measurement(Vector3::new(0.0, 0.0378, 0.0))
}
