//! Laser emitters and laser banks
//!
//! A bank is the static geometric description of one physical sensor model.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Single laser emitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    /// Horizontal angular offset (degrees)
    pub horizontal_angular_offset_deg: f64,

    /// Vertical angular offset (degrees, positive pitches the ray down)
    pub vertical_angular_offset_deg: f64,

    /// Vertical linear offset of the emitter (meters)
    #[serde(default)]
    pub vertical_linear_offset: f64,

    /// Ring identifier, unique within a bank
    pub ring_id: i32,

    /// Offset within one firing cycle (milliseconds)
    #[serde(default)]
    pub time_offset_ms: f64,

    /// Per-laser minimum range override (meters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_range: Option<f64>,

    /// Per-laser maximum range override (meters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_range: Option<f64>,
}

impl Laser {
    pub const fn new(
        horizontal_angular_offset_deg: f64,
        vertical_angular_offset_deg: f64,
        ring_id: i32,
        time_offset_ms: f64,
    ) -> Self {
        Self {
            horizontal_angular_offset_deg,
            vertical_angular_offset_deg,
            vertical_linear_offset: 0.0,
            ring_id,
            time_offset_ms,
            min_range: None,
            max_range: None,
        }
    }

    pub const fn with_vertical_linear_offset(mut self, offset: f64) -> Self {
        self.vertical_linear_offset = offset;
        self
    }

    pub const fn with_range(mut self, min_range: f64, max_range: f64) -> Self {
        self.min_range = Some(min_range);
        self.max_range = Some(max_range);
        self
    }
}

/// Ordered laser emitters of one sensor model.
///
/// Order is the physical firing order and determines ring id output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserBank {
    /// Emitters in firing order
    pub lasers: Vec<Laser>,

    /// Offset from the mounting frame to the optical center (meters)
    #[serde(default = "Vector3::zeros")]
    pub center_of_measurement: Vector3<f64>,

    /// Distance each cone apex is projected back along its ray (meters)
    #[serde(default)]
    pub focal_distance: f64,
}

impl LaserBank {
    pub fn new(lasers: Vec<Laser>) -> Self {
        Self {
            lasers,
            center_of_measurement: Vector3::zeros(),
            focal_distance: 0.0,
        }
    }

    pub fn with_center_of_measurement(mut self, offset: Vector3<f64>) -> Self {
        self.center_of_measurement = offset;
        self
    }

    pub fn with_focal_distance(mut self, focal_distance: f64) -> Self {
        self.focal_distance = focal_distance;
        self
    }

    pub fn laser_count(&self) -> usize {
        self.lasers.len()
    }

    /// Ring ids in firing order
    pub fn ring_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.lasers.iter().map(|laser| laser.ring_id)
    }
}
