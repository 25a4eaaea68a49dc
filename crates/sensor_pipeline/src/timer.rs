//! Capture cadence

/// Elapsed-time accumulator firing once per capture period.
///
/// The accumulator resets to zero on every fire instead of subtracting the
/// period, so a long tick never queues catch-up captures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureTimer {
    period_ms: Option<f64>,
    accumulated_ms: f64,
}

impl CaptureTimer {
    /// `capture_hz <= 0` (or non-finite) disables automatic capture
    pub fn new(capture_hz: f64) -> Self {
        let period_ms = (capture_hz.is_finite() && capture_hz > 0.0).then(|| 1000.0 / capture_hz);
        Self {
            period_ms,
            accumulated_ms: 0.0,
        }
    }

    /// Add elapsed time, `true` when a capture is due
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        let Some(period) = self.period_ms else {
            return false;
        };
        self.accumulated_ms += elapsed_ms;
        if self.accumulated_ms >= period {
            self.accumulated_ms = 0.0;
            true
        } else {
            false
        }
    }

    pub fn period_ms(&self) -> Option<f64> {
        self.period_ms
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    pub fn is_manual(&self) -> bool {
        self.period_ms.is_none()
    }
}
