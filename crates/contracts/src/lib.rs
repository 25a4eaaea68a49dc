//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Conventions
//! - Angles are degrees unless a field name says `_rad`
//! - Distances are meters, times are milliseconds
//! - +Y is the azimuth (vertical) axis, +Z is the ray forward axis

mod blueprint;
mod capture;
mod error;
mod graph;
mod laser;
mod model;
mod motion;
mod ray_batch;
mod result;
mod scan;
mod scene;
mod sensor_id;

pub use blueprint::*;
pub use capture::{BatchMeta, CaptureMeta};
pub use error::*;
pub use graph::*;
pub use laser::*;
pub use model::LidarModel;
pub use motion::*;
pub use ray_batch::RayBatch;
pub use result::*;
pub use scan::*;
pub use scene::SceneProvider;
pub use sensor_id::SensorId;
