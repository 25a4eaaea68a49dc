//! Error types for CLI operations.

use std::path::Path;

use capture_scheduler::SchedulerError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Scenario file not found
    #[error("Scenario file not found: {path}")]
    ConfigNotFound { path: String },

    /// Tick rate override is not a positive number
    #[error("Invalid tick rate {value}: must be > 0")]
    InvalidTickRate { value: f64 },

    /// Scheduler failure while running a scenario
    #[error("Simulation failed at tick {tick}: {source}")]
    Simulation {
        tick: u64,
        #[source]
        source: SchedulerError,
    },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn simulation(tick: u64, source: SchedulerError) -> Self {
        Self::Simulation { tick, source }
    }
}

/// Fail early when a scenario path does not exist
pub fn ensure_exists(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::config_not_found(path))
    }
}
