//! Simulation statistics.

use std::time::Duration;

use observability::CaptureStatsAggregator;

/// Statistics from a simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    /// Scheduler ticks executed
    pub ticks: u64,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Sensors registered with the scheduler
    pub active_sensors: usize,

    /// Batch and capture aggregates
    pub captures: CaptureStatsAggregator,
}

impl SimulationStats {
    /// Captures per wall-clock second
    pub fn captures_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.captures.total_captures as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Simulation Statistics                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   ├─ Active sensors: {}", self.active_sensors);
        println!("   └─ Captures/s: {:.2}", self.captures_per_second());

        println!("\n{}", self.captures.summary());
    }
}
