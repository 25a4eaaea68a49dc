//! RayBatch - RayGenerator output
//!
//! Arrays are laser-major, step-minor: `index = laser + step * laser_count`.
//! `ring_ids` holds one entry per laser and is reused for every step.

use nalgebra::{Matrix4, Vector2};

/// Concrete rays of one revolution
#[derive(Debug, Clone, PartialEq)]
pub struct RayBatch {
    /// Ray poses in the sensor frame; +Z of each pose is the ray direction
    pub poses: Vec<Matrix4<f64>>,

    /// (min, max) range window per ray (meters)
    pub ranges: Vec<Vector2<f64>>,

    /// Ring id per laser, firing order
    pub ring_ids: Vec<i32>,

    /// Emission time per ray since scan start (milliseconds)
    pub time_offsets: Vec<f64>,

    /// Number of horizontal steps in the sweep
    pub horizontal_steps: usize,
}

impl RayBatch {
    pub fn laser_count(&self) -> usize {
        self.ring_ids.len()
    }

    pub fn ray_count(&self) -> usize {
        self.poses.len()
    }

    /// Flat index of `laser` at horizontal `step`
    #[inline]
    pub fn index(&self, laser: usize, step: usize) -> usize {
        laser + step * self.laser_count()
    }

    /// Ray direction in the sensor frame
    pub fn direction(&self, ray: usize) -> nalgebra::Vector3<f64> {
        self.poses[ray].fixed_view::<3, 1>(0, 2).into_owned()
    }

    /// Ray origin in the sensor frame
    pub fn origin(&self, ray: usize) -> nalgebra::Vector3<f64> {
        self.poses[ray].fixed_view::<3, 1>(0, 3).into_owned()
    }
}
