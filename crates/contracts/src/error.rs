//! Layered error definitions
//!
//! Categorized by source: config / scan / collaborator / graph engine

use thiserror::Error;

/// Opaque failure reported by the Graph Engine backend.
///
/// Carried through every layer unchanged so the batch initiator sees exactly
/// what the backend reported.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("graph engine failure at '{node}': {message}")]
pub struct GraphEngineError {
    /// Node the failing call targeted (empty for graph-wide calls)
    pub node: String,
    /// Backend-provided message
    pub message: String,
}

impl GraphEngineError {
    pub fn new(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            message: message.into(),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Scan Errors =====
    /// Scan configuration rejected by the ray generator preconditions
    #[error("invalid scan configuration '{field}': {message}")]
    InvalidConfiguration { field: String, message: String },

    /// Unknown sensor model name
    #[error("unknown lidar model '{name}'")]
    UnknownModel { name: String },

    // ===== Collaborator Errors =====
    /// Required external collaborator is absent
    #[error("sensor '{sensor_id}' cannot start: missing {collaborator}")]
    MissingCollaborator {
        sensor_id: String,
        collaborator: String,
    },

    /// Backend failure
    #[error(transparent)]
    GraphEngine(#[from] GraphEngineError),

    /// Result buffer does not match the requested element layout
    #[error("result buffer for {field} is malformed: {message}")]
    ResultLayout { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create scan configuration error
    pub fn invalid_configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing collaborator error
    pub fn missing_collaborator(
        sensor_id: impl Into<String>,
        collaborator: impl Into<String>,
    ) -> Self {
        Self::MissingCollaborator {
            sensor_id: sensor_id.into(),
            collaborator: collaborator.into(),
        }
    }

    /// Field named by an `InvalidConfiguration` or `ConfigValidation` error
    pub fn offending_field(&self) -> Option<&str> {
        match self {
            Self::InvalidConfiguration { field, .. } | Self::ConfigValidation { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}
