//! # Capture Scheduler
//!
//! Drives periodic lidar captures and batches the sensors whose cadence
//! timers coincide into one execution round, so the scene is refreshed once
//! per batch instead of once per sensor.
//!
//! The tick is synchronous and cooperative: within a batch every pose update
//! lands before the first graph executes, and every graph executes before
//! the first "new data" callback fires.
//!
//! ## Example
//!
//! ```
//! use capture_scheduler::{BatchPolicy, CaptureScheduler, SchedulerSettings};
//! use contracts::LidarModel;
//! use sensor_pipeline::{MockGraphEngine, MockSceneProvider, SensorSettings};
//!
//! let mut scheduler = CaptureScheduler::new(
//!     MockGraphEngine::new(),
//!     Some(MockSceneProvider::new()),
//!     SchedulerSettings::default(),
//! );
//! scheduler
//!     .add_sensor(SensorSettings::new("roof", LidarModel::VelodyneVlp16))
//!     .unwrap();
//!
//! let batches = scheduler.tick(100.0).unwrap();
//! assert_eq!(batches.len(), 1);
//! assert_eq!(scheduler.policy(), BatchPolicy::AllRegistered);
//! ```

mod error;
mod policy;
mod scheduler;

pub use error::{Result, SchedulerError};
pub use policy::{BatchPolicy, SchedulerSettings};
pub use scheduler::CaptureScheduler;
