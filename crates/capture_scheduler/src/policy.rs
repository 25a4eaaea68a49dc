//! Batch threshold policy

use contracts::SchedulerConfig;

/// How many pending sensors trigger a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Flush every capture on its own
    Immediate,
    /// Flush once `n` sensors are pending
    Threshold(usize),
    /// Flush once every registered sensor is pending
    #[default]
    AllRegistered,
}

impl BatchPolicy {
    /// `0` means every registered sensor, `1` means immediate
    pub fn from_batch_size(batch_size: usize) -> Self {
        match batch_size {
            0 => Self::AllRegistered,
            1 => Self::Immediate,
            n => Self::Threshold(n),
        }
    }

    /// Pending count that triggers a flush, never below 1
    pub fn threshold(&self, registered: usize) -> usize {
        match self {
            Self::Immediate => 1,
            Self::Threshold(n) => (*n).max(1),
            Self::AllRegistered => registered.max(1),
        }
    }
}

/// Scheduler-wide settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerSettings {
    pub policy: BatchPolicy,
    /// Factor from host translation units to distortion-stage units
    pub distance_unit_scale: f64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            policy: BatchPolicy::default(),
            distance_unit_scale: 1.0,
        }
    }
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            policy: BatchPolicy::from_batch_size(config.batch_size),
            distance_unit_scale: config.distance_unit_scale,
        }
    }
}
