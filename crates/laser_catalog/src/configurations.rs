//! Canonical scan configuration of every built-in model

use contracts::{
    LidarModel, NoiseParameters, RayGenerateMethod, ScanConfiguration,
    HESAI_AT128_NEAR_MIN_RANGE,
};

const VELODYNE_CYCLE_MS: f64 = 0.055296;
const OUSTER_COLUMNS: f64 = 1024.0;

fn rotating(resolution: f64, min_range: f64, max_range: f64, cycle_ms: f64) -> ScanConfiguration {
    ScanConfiguration {
        horizontal_resolution_deg: resolution,
        min_h_angle_deg: -180.0,
        max_h_angle_deg: 180.0,
        min_range,
        max_range,
        cycle_period_ms: cycle_ms,
        ray_generate_method: RayGenerateMethod::RotatingLidarEqualRange,
        noise: NoiseParameters::default(),
        beam_divergence_deg: 0.0,
    }
}

/// Scan configuration a preset switch installs
pub fn canonical_configuration(model: LidarModel) -> ScanConfiguration {
    match model {
        LidarModel::RangeMeter => ScanConfiguration {
            min_h_angle_deg: 0.0,
            max_h_angle_deg: 0.0,
            ..rotating(1.0, 0.0, 40.0, 0.0)
        },
        LidarModel::VelodyneVlp16 => rotating(0.2, 0.0, 100.0, VELODYNE_CYCLE_MS),
        LidarModel::VelodyneVlp32c => rotating(0.2, 0.0, 200.0, VELODYNE_CYCLE_MS),
        LidarModel::OusterOs1_64 => ScanConfiguration {
            noise: NoiseParameters {
                distance_std_dev_base: 0.03,
                ..NoiseParameters::default()
            },
            ..rotating(360.0 / OUSTER_COLUMNS, 0.3, 120.0, 0.09765625)
        },
        LidarModel::HesaiPandar40p => rotating(0.2, 0.3, 200.0, 0.05556),
        LidarModel::HesaiAt128E2x => ScanConfiguration {
            min_h_angle_deg: -60.0,
            max_h_angle_deg: 60.0,
            ray_generate_method: RayGenerateMethod::HesaiAt128,
            ..rotating(0.1, HESAI_AT128_NEAR_MIN_RANGE, 210.0, 0.0833)
        },
        LidarModel::HesaiQt128C2x => ScanConfiguration {
            ray_generate_method: RayGenerateMethod::HesaiQt128C2x,
            ..rotating(0.4, 0.05, 50.0, 0.111)
        },
    }
}
