//! Laser Catalog - built-in sensor models
//!
//! Read-only, process-wide lookup of model -> laser bank. Banks are built on
//! first access and shared as `Arc<LaserBank>` afterwards; nothing in this
//! crate mutates them.
//!
//! # Usage
//! ```
//! use contracts::LidarModel;
//!
//! let bank = laser_catalog::laser_bank(LidarModel::VelodyneVlp16);
//! let config = laser_catalog::canonical_configuration(LidarModel::VelodyneVlp16);
//! assert_eq!(config.total_ray_count(bank.laser_count()), 16 * 1800);
//! ```

mod configurations;
mod tables;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use contracts::{LaserBank, LidarModel, ScanConfiguration};

pub use configurations::canonical_configuration;

static CATALOG: OnceLock<HashMap<LidarModel, Arc<LaserBank>>> = OnceLock::new();

fn catalog() -> &'static HashMap<LidarModel, Arc<LaserBank>> {
    CATALOG.get_or_init(|| {
        LidarModel::ALL
            .iter()
            .map(|&model| (model, Arc::new(build_bank(model))))
            .collect()
    })
}

fn build_bank(model: LidarModel) -> LaserBank {
    match model {
        LidarModel::RangeMeter => tables::range_meter(),
        LidarModel::VelodyneVlp16 => tables::velodyne_vlp16(),
        LidarModel::VelodyneVlp32c => tables::velodyne_vlp32c(),
        LidarModel::OusterOs1_64 => tables::ouster_os1_64(),
        LidarModel::HesaiPandar40p => tables::hesai_pandar40p(),
        LidarModel::HesaiAt128E2x => tables::hesai_at128_e2x(),
        LidarModel::HesaiQt128C2x => tables::hesai_qt128_c2x(),
    }
}

/// Shared laser bank of a model
pub fn laser_bank(model: LidarModel) -> Arc<LaserBank> {
    match catalog().get(&model) {
        Some(bank) => Arc::clone(bank),
        // every variant is inserted by `catalog()`
        None => Arc::new(build_bank(model)),
    }
}

/// Bank and canonical scan configuration of a model
#[derive(Debug, Clone)]
pub struct ModelPreset {
    pub model: LidarModel,
    pub bank: Arc<LaserBank>,
    pub configuration: ScanConfiguration,
}

pub fn preset(model: LidarModel) -> ModelPreset {
    ModelPreset {
        model,
        bank: laser_bank(model),
        configuration: canonical_configuration(model),
    }
}
