//! Sensor Pipeline error types

use contracts::{ContractError, GraphEngineError};
use thiserror::Error;

/// Sensor Pipeline specific error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Backend failure, passed through as reported
    #[error(transparent)]
    GraphEngine(#[from] GraphEngineError),

    /// Rejected configuration or missing collaborator
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Subgraph construction failed and was rolled back
    #[error("failed to build pipeline for sensor '{sensor_id}': {source}")]
    BuildFailed {
        sensor_id: String,
        #[source]
        source: GraphEngineError,
    },
}

impl PipelineError {
    pub fn build_failed(sensor_id: impl Into<String>, source: GraphEngineError) -> Self {
        Self::BuildFailed {
            sensor_id: sensor_id.into(),
            source,
        }
    }

    /// The backend error, if the failure came from the Graph Engine
    pub fn engine_error(&self) -> Option<&GraphEngineError> {
        match self {
            Self::GraphEngine(e) | Self::BuildFailed { source: e, .. } => Some(e),
            Self::Contract(ContractError::GraphEngine(e)) => Some(e),
            Self::Contract(_) => None,
        }
    }

    /// `true` for configurations rejected by validation
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            Self::Contract(ContractError::InvalidConfiguration { .. })
        )
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_display_unchanged() {
        let source = GraphEngineError::new("front/raycast", "device lost");
        let err = PipelineError::from(source.clone());
        assert_eq!(err.to_string(), source.to_string());
        assert_eq!(err.engine_error(), Some(&source));
    }

    #[test]
    fn invalid_configuration_is_detected() {
        let err = PipelineError::from(ContractError::invalid_configuration(
            "min_h_angle_deg",
            "bad",
        ));
        assert!(err.is_invalid_configuration());
        assert!(err.engine_error().is_none());
    }
}
