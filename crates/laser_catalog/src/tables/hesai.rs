use contracts::{
    LaserBank, HESAI_AT128_FAR_MIN_RANGE, HESAI_AT128_NEAR_MIN_RANGE, HESAI_QT128_BANK_SIZE,
};
use nalgebra::Vector3;

use super::{emitter, rings_by_elevation};

const PANDAR40P_ELEVATION_DEG: [f64; 40] = [
    15.0, 11.0, 8.0, 5.0, 3.0, 2.0, 1.67, 1.33, 1.0, 0.67, 0.33, 0.0, -0.33, -0.67, -1.0, -1.33,
    -1.67, -2.0, -2.33, -2.67, -3.0, -3.33, -3.67, -4.0, -4.33, -4.67, -5.0, -5.33, -5.67, -6.0,
    -7.0, -8.0, -9.0, -10.0, -11.0, -12.0, -13.0, -14.0, -19.0, -25.0,
];

/// Azimuth corrections alternate between the two emitter boards
const PANDAR40P_AZIMUTH_DEG: [f64; 2] = [-1.042, 3.125];

/// Time between two Pandar40P channel firings (ms)
const PANDAR40P_FIRING_MS: f64 = 0.001389;

const AT128_CHANNELS: usize = 128;
const AT128_LOWEST_ELEVATION_DEG: f64 = -12.5;
const AT128_ELEVATION_STEP_DEG: f64 = 0.2;
const AT128_MAX_RANGE: f64 = 210.0;

const QT128_CHANNELS: usize = 128;
const QT128_HALF_FOV_DEG: f64 = 52.6;
const QT128_MIN_RANGE: f64 = 0.05;
const QT128_MAX_RANGE: f64 = 50.0;

/// Time between two QT128 bank firings (ms)
const QT128_BANK_FIRING_MS: f64 = 0.00926;

pub(crate) fn hesai_pandar40p() -> LaserBank {
    let rings = rings_by_elevation(&PANDAR40P_ELEVATION_DEG);
    let lasers = PANDAR40P_ELEVATION_DEG
        .iter()
        .zip(rings)
        .enumerate()
        .map(|(i, (&elevation, ring))| {
            emitter(
                PANDAR40P_AZIMUTH_DEG[i % 2],
                elevation,
                ring,
                i as f64 * PANDAR40P_FIRING_MS,
            )
        })
        .collect();

    LaserBank::new(lasers).with_center_of_measurement(Vector3::new(0.0, 0.0475, 0.0))
}

/// Lower half of the stack has near-field capability.
pub(crate) fn hesai_at128_e2x() -> LaserBank {
    let lasers = (0..AT128_CHANNELS)
        .map(|i| {
            let elevation = AT128_LOWEST_ELEVATION_DEG + i as f64 * AT128_ELEVATION_STEP_DEG;
            let min_range = if i < AT128_CHANNELS / 2 {
                HESAI_AT128_NEAR_MIN_RANGE
            } else {
                HESAI_AT128_FAR_MIN_RANGE
            };
            emitter(0.0, elevation, i as i32, 0.0).with_range(min_range, AT128_MAX_RANGE)
        })
        .collect();

    LaserBank::new(lasers).with_center_of_measurement(Vector3::new(0.0, 0.0406, 0.0))
}

/// Four banks of 32 fire in sequence; ring 0 is the top beam.
pub(crate) fn hesai_qt128_c2x() -> LaserBank {
    let step = 2.0 * QT128_HALF_FOV_DEG / (QT128_CHANNELS - 1) as f64;
    let lasers = (0..QT128_CHANNELS)
        .map(|i| {
            let elevation = QT128_HALF_FOV_DEG - i as f64 * step;
            let bank = i / HESAI_QT128_BANK_SIZE;
            emitter(0.0, elevation, i as i32, bank as f64 * QT128_BANK_FIRING_MS)
                .with_range(QT128_MIN_RANGE, QT128_MAX_RANGE)
        })
        .collect();

    LaserBank::new(lasers).with_center_of_measurement(Vector3::new(0.0, 0.0351, 0.0))
}
