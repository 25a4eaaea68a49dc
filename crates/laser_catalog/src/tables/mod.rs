//! Per-model laser tables
//!
//! Datasheets list elevation (positive up) while `Laser` stores a pitch
//! (positive down), hence the sign flip in [`emitter`].

mod hesai;
mod ouster;
mod velodyne;

pub(crate) use hesai::{hesai_at128_e2x, hesai_pandar40p, hesai_qt128_c2x};
pub(crate) use ouster::ouster_os1_64;
pub(crate) use velodyne::{range_meter, velodyne_vlp16, velodyne_vlp32c};

use contracts::Laser;

/// Emitter from datasheet azimuth correction and elevation (degrees)
pub(crate) fn emitter(azimuth_deg: f64, elevation_deg: f64, ring_id: i32, time_ms: f64) -> Laser {
    Laser::new(azimuth_deg, -elevation_deg, ring_id, time_ms)
}

/// Ring ids ranked by elevation, lowest beam = 0
pub(crate) fn rings_by_elevation(elevations: &[f64]) -> Vec<i32> {
    let mut order: Vec<usize> = (0..elevations.len()).collect();
    order.sort_by(|&a, &b| elevations[a].total_cmp(&elevations[b]));

    let mut rings = vec![0; elevations.len()];
    for (rank, index) in order.into_iter().enumerate() {
        rings[index] = rank as i32;
    }
    rings
}
