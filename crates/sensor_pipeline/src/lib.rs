//! # Sensor Pipeline
//!
//! Persistent Graph Engine subgraph and runtime state of each simulated lidar.
//!
//! Every sensor owns twelve chained stage nodes with stable ids
//! (`<sensor_id>/<stage>`). Reconfiguration updates node parameters in place;
//! runtime toggles only flip node activation.
//!
//! ## Example
//!
//! ```
//! use contracts::LidarModel;
//! use sensor_pipeline::{LidarSensor, MockGraphEngine, MockSceneProvider, SensorSettings};
//!
//! let engine = MockGraphEngine::new();
//! let scene = MockSceneProvider::new();
//! let mut sensor = LidarSensor::activate(
//!     SensorSettings::new("roof", LidarModel::VelodyneVlp16),
//!     engine.clone(),
//!     Some(&scene),
//! )
//! .unwrap();
//!
//! assert_eq!(engine.node_count(), 12);
//! sensor.prepare_capture(1.0).unwrap();
//! sensor.execute().unwrap();
//! ```

mod error;
mod mock_engine;
mod mock_scene;
mod motion;
mod pipeline;
mod preset;
mod sensor;
mod stage;
mod timer;

pub use error::{PipelineError, Result};
pub use mock_engine::{EngineCall, Journal, MockEngineConfig, MockGraphEngine};
pub use mock_scene::MockSceneProvider;
pub use motion::{motion_delta, sensor_world_pose};
pub use pipeline::{FrameOutput, SensorPipeline};
pub use preset::PresetState;
pub use sensor::{
    LidarSensor, ModelChange, ModelChangedCallback, NewDataCallback, PreparedCapture,
    SensorSettings,
};
pub use stage::{AngularNoiseStage, Stage, StageActivation};
pub use timer::CaptureTimer;
