//! Range windows and time offsets

use contracts::{
    LaserBank, RayGenerateMethod, ScanConfiguration, HESAI_AT128_FAR_MIN_RANGE,
    HESAI_AT128_NEAR_MIN_RANGE,
};
use nalgebra::Vector2;

/// Per-laser window, unset bounds fall back to the configuration defaults.
fn laser_windows(bank: &LaserBank, config: &ScanConfiguration) -> Vec<Vector2<f64>> {
    bank.lasers
        .iter()
        .map(|laser| {
            Vector2::new(
                laser.min_range.unwrap_or(config.min_range),
                laser.max_range.unwrap_or(config.max_range),
            )
        })
        .collect()
}

/// Range window of every ray, same layout as the poses.
pub fn range_windows(
    bank: &LaserBank,
    config: &ScanConfiguration,
    steps: usize,
) -> Vec<Vector2<f64>> {
    let laser_count = bank.laser_count();

    match config.ray_generate_method {
        RayGenerateMethod::RotatingLidarEqualRange => {
            vec![Vector2::new(config.min_range, config.max_range); laser_count * steps]
        }
        RayGenerateMethod::RotatingLidarDifferentLaserRanges
        | RayGenerateMethod::HesaiQt128C2x => laser_windows(bank, config).repeat(steps),
        RayGenerateMethod::HesaiAt128 => {
            let windows = laser_windows(bank, config);
            let mut ranges = Vec::with_capacity(laser_count * steps);
            for step in 0..steps {
                for window in &windows {
                    let mut window = *window;
                    // near-field firings only on even steps
                    if window.x == HESAI_AT128_NEAR_MIN_RANGE && step % 2 == 1 {
                        window.x = HESAI_AT128_FAR_MIN_RANGE;
                    }
                    ranges.push(window);
                }
            }
            ranges
        }
    }
}

/// `laser.time_offset + cycle_period * step`
pub fn time_offsets(bank: &LaserBank, config: &ScanConfiguration, steps: usize) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(bank.laser_count() * steps);
    for step in 0..steps {
        let elapsed = config.cycle_period_ms * step as f64;
        offsets.extend(bank.lasers.iter().map(|laser| laser.time_offset_ms + elapsed));
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Laser, NoiseParameters};

    fn config(method: RayGenerateMethod) -> ScanConfiguration {
        ScanConfiguration {
            horizontal_resolution_deg: 1.0,
            min_h_angle_deg: 0.0,
            max_h_angle_deg: 4.0,
            min_range: 1.0,
            max_range: 50.0,
            cycle_period_ms: 0.5,
            ray_generate_method: method,
            noise: NoiseParameters::default(),
            beam_divergence_deg: 0.0,
        }
    }

    fn mixed_bank() -> LaserBank {
        LaserBank::new(vec![
            Laser::new(0.0, 0.0, 0, 0.0).with_range(0.5, 200.0),
            Laser::new(0.0, 1.0, 1, 0.01).with_range(7.2, 200.0),
            Laser::new(0.0, 2.0, 2, 0.02),
        ])
    }

    #[test]
    fn equal_range_ignores_laser_overrides() {
        let ranges = range_windows(&mixed_bank(), &config(RayGenerateMethod::RotatingLidarEqualRange), 2);
        assert_eq!(ranges.len(), 6);
        assert!(ranges.iter().all(|r| *r == Vector2::new(1.0, 50.0)));
    }

    #[test]
    fn different_ranges_fall_back_to_defaults() {
        let ranges = range_windows(
            &mixed_bank(),
            &config(RayGenerateMethod::RotatingLidarDifferentLaserRanges),
            2,
        );
        assert_eq!(ranges[0], Vector2::new(0.5, 200.0));
        assert_eq!(ranges[2], Vector2::new(1.0, 50.0));
        // broadcast unchanged to step 1
        assert_eq!(&ranges[..3], &ranges[3..]);
    }

    #[test]
    fn at128_alternates_near_field() {
        let ranges = range_windows(&mixed_bank(), &config(RayGenerateMethod::HesaiAt128), 4);
        let near: Vec<f64> = (0..4).map(|step| ranges[step * 3].x).collect();
        assert_eq!(near, vec![0.5, 7.2, 0.5, 7.2]);
        let far: Vec<f64> = (0..4).map(|step| ranges[1 + step * 3].x).collect();
        assert_eq!(far, vec![7.2; 4]);
    }

    #[test]
    fn time_offsets_add_cycle_period() {
        let offsets = time_offsets(&mixed_bank(), &config(RayGenerateMethod::RotatingLidarEqualRange), 3);
        assert_eq!(offsets.len(), 9);
        assert_eq!(offsets[1], 0.01);
        assert_eq!(offsets[1 + 3], 0.01 + 0.5);
        assert_eq!(offsets[2 + 6], 0.02 + 1.0);
    }
}
