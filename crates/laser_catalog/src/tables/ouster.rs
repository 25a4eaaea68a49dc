use contracts::LaserBank;
use nalgebra::Vector3;

use super::emitter;

const OS1_64_CHANNELS: usize = 64;
const OS1_64_VERTICAL_FOV_DEG: f64 = 45.0;

/// Staggered azimuth corrections, repeating every four beams
const OS1_AZIMUTH_PATTERN_DEG: [f64; 4] = [3.164, 1.055, -1.055, -3.164];

/// Every beam of a column fires together; ring 0 is the top beam.
pub(crate) fn ouster_os1_64() -> LaserBank {
    let step = OS1_64_VERTICAL_FOV_DEG / (OS1_64_CHANNELS - 1) as f64;
    let lasers = (0..OS1_64_CHANNELS)
        .map(|i| {
            let elevation = OS1_64_VERTICAL_FOV_DEG / 2.0 - i as f64 * step;
            emitter(OS1_AZIMUTH_PATTERN_DEG[i % 4], elevation, i as i32, 0.0)
        })
        .collect();

    LaserBank::new(lasers)
        .with_center_of_measurement(Vector3::new(0.0, 0.03618, 0.0))
        .with_focal_distance(0.01502)
}
