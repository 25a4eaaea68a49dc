//! Capture Scheduler error types

use contracts::GraphEngineError;
use sensor_pipeline::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Backend failure during a batch, passed through as reported
    #[error(transparent)]
    GraphEngine(#[from] GraphEngineError),

    /// Sensor activation or reconfiguration failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("sensor '{sensor_id}' is already registered")]
    DuplicateSensor { sensor_id: String },

    #[error("unknown sensor '{sensor_id}'")]
    UnknownSensor { sensor_id: String },
}

impl SchedulerError {
    pub fn duplicate_sensor(sensor_id: impl Into<String>) -> Self {
        Self::DuplicateSensor {
            sensor_id: sensor_id.into(),
        }
    }

    pub fn unknown_sensor(sensor_id: impl Into<String>) -> Self {
        Self::UnknownSensor {
            sensor_id: sensor_id.into(),
        }
    }

    /// The backend error, wherever it was raised
    pub fn engine_error(&self) -> Option<&GraphEngineError> {
        match self {
            Self::GraphEngine(e) => Some(e),
            Self::Pipeline(e) => e.engine_error(),
            _ => None,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SchedulerError>;
