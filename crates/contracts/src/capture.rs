//! Capture metadata - CaptureScheduler output
//!
//! Handed to "new data" observers and to the metrics layer once a batch has
//! executed.

use crate::{MotionDelta, Pose, SensorId};

/// One sensor's contribution to an executed batch
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureMeta {
    /// Sensor identifier
    pub sensor_id: SensorId,

    /// Per-sensor capture counter, starts at 1
    pub frame: u64,

    /// Scheduler clock at capture time (milliseconds)
    pub timestamp_ms: f64,

    /// Rays emitted by the sensor's pipeline
    pub ray_count: usize,

    /// World pose pushed for this capture
    pub pose: Pose,

    /// Motion since the previous capture
    pub motion: MotionDelta,
}

/// One executed batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMeta {
    /// Scheduler-wide batch counter, starts at 1
    pub batch_id: u64,

    /// Captures in flush order
    pub captures: Vec<CaptureMeta>,
}

impl BatchMeta {
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Rays across every capture of the batch
    pub fn total_rays(&self) -> usize {
        self.captures.iter().map(|c| c.ray_count).sum()
    }
}
