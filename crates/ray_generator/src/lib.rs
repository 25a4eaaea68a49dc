//! Ray Generator
//!
//! Pure mapping of a laser bank and a scan configuration to the concrete rays
//! of one revolution. Output arrays are laser-major, step-minor:
//! `index = laser + step * laser_count`.
//!
//! # Usage
//! ```
//! use contracts::LidarModel;
//!
//! let bank = laser_catalog::laser_bank(LidarModel::VelodyneVlp16);
//! let config = laser_catalog::canonical_configuration(LidarModel::VelodyneVlp16);
//! let batch = ray_generator::generate(&bank, &config).unwrap();
//! assert_eq!(batch.ray_count(), 16 * 1800);
//! assert_eq!(batch.ring_ids.len(), 16);
//! ```

pub mod pose;
pub mod ranges;

use contracts::{ContractError, LaserBank, RayBatch, ScanConfiguration};
use tracing::{debug, instrument};

/// Generate the rays of one revolution.
///
/// # Errors
/// `InvalidConfiguration` naming the offending field when the configuration
/// violates a precondition or the bank has no lasers. Nothing is corrected
/// silently.
#[instrument(
    name = "ray_generate",
    skip(bank, config),
    fields(lasers = bank.laser_count(), method = ?config.ray_generate_method)
)]
pub fn generate(bank: &LaserBank, config: &ScanConfiguration) -> Result<RayBatch, ContractError> {
    config.validate()?;
    if bank.lasers.is_empty() {
        return Err(ContractError::invalid_configuration(
            "lasers",
            "laser bank has no emitters",
        ));
    }

    let steps = config.horizontal_steps();
    let local = pose::local_poses(bank);
    let batch = RayBatch {
        poses: pose::sweep(&local, config, steps),
        ranges: ranges::range_windows(bank, config, steps),
        ring_ids: bank.ring_ids().collect(),
        time_offsets: ranges::time_offsets(bank, config, steps),
        horizontal_steps: steps,
    };

    debug!(steps, rays = batch.ray_count(), "Rays generated");
    Ok(batch)
}
