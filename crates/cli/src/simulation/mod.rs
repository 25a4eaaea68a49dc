//! Scenario simulation over the mock backend.

mod orchestrator;
mod stats;

pub use orchestrator::{Simulation, SimulationConfig};
pub use stats::SimulationStats;
