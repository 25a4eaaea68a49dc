//! Capture metrics
//!
//! `record_*` functions publish through the `metrics` facade (a no-op until a
//! recorder is installed). `CaptureStatsAggregator` keeps the same figures in
//! memory for end-of-run summaries.

use std::collections::BTreeMap;

use contracts::BatchMeta;
use metrics::{counter, gauge, histogram};

/// Record one executed batch.
///
/// # Example
///
/// ```ignore
/// for batch in scheduler.tick(dt)? {
///     observability::metrics::record_batch_metrics(&batch);
/// }
/// ```
pub fn record_batch_metrics(batch: &BatchMeta) {
    counter!("lidar_sim_batches_total").increment(1);
    histogram!("lidar_sim_batch_size").record(batch.len() as f64);
    gauge!("lidar_sim_last_batch_id").set(batch.batch_id as f64);

    for capture in &batch.captures {
        counter!(
            "lidar_sim_captures_total",
            "sensor_id" => capture.sensor_id.to_string()
        )
        .increment(1);

        histogram!(
            "lidar_sim_rays_per_capture",
            "sensor_id" => capture.sensor_id.to_string()
        )
        .record(capture.ray_count as f64);
    }
}

/// Record an applied scan configuration
pub fn record_reconfiguration(sensor_id: &str) {
    counter!(
        "lidar_sim_reconfigurations_total",
        "sensor_id" => sensor_id.to_string()
    )
    .increment(1);
}

/// Record a scan configuration rejected by validation
pub fn record_configuration_rejected(sensor_id: &str, field: &str) {
    counter!(
        "lidar_sim_rejected_configurations_total",
        "sensor_id" => sensor_id.to_string(),
        "field" => field.to_string()
    )
    .increment(1);
}

/// Record a backend failure surfaced to the batch initiator
pub fn record_engine_failure(node: &str) {
    counter!("lidar_sim_engine_failures_total", "node" => node.to_string()).increment(1);
}

/// In-memory capture statistics.
#[derive(Debug, Clone, Default)]
pub struct CaptureStatsAggregator {
    /// Executed batches
    pub total_batches: u64,

    /// Captures across all batches
    pub total_captures: u64,

    /// Rays across all captures
    pub total_rays: u64,

    /// Failed flushes
    pub engine_failures: u64,

    /// Sensors per batch
    pub batch_size_stats: RunningStats,

    /// Hits retrieved per capture
    pub hit_stats: RunningStats,

    /// Captures per sensor
    pub captures_per_sensor: BTreeMap<String, u64>,
}

impl CaptureStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, batch: &BatchMeta) {
        self.total_batches += 1;
        self.batch_size_stats.push(batch.len() as f64);

        for capture in &batch.captures {
            self.total_captures += 1;
            self.total_rays += capture.ray_count as u64;
            *self
                .captures_per_sensor
                .entry(capture.sensor_id.to_string())
                .or_insert(0) += 1;
        }
    }

    /// Points retrieved from a compacted stream
    pub fn record_hits(&mut self, hits: usize) {
        self.hit_stats.push(hits as f64);
    }

    pub fn record_failure(&mut self) {
        self.engine_failures += 1;
    }

    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary {
            total_batches: self.total_batches,
            total_captures: self.total_captures,
            total_rays: self.total_rays,
            engine_failures: self.engine_failures,
            mean_batch_size: self.batch_size_stats.mean(),
            hits_per_capture: StatsSummary::from(&self.hit_stats),
            captures_per_sensor: self.captures_per_sensor.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Capture summary report
#[derive(Debug, Clone, Default)]
pub struct CaptureSummary {
    pub total_batches: u64,
    pub total_captures: u64,
    pub total_rays: u64,
    pub engine_failures: u64,
    pub mean_batch_size: f64,
    pub hits_per_capture: StatsSummary,
    pub captures_per_sensor: BTreeMap<String, u64>,
}

impl std::fmt::Display for CaptureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Summary ===")?;
        writeln!(f, "Batches: {}", self.total_batches)?;
        writeln!(f, "Captures: {}", self.total_captures)?;
        writeln!(f, "Rays: {}", self.total_rays)?;
        writeln!(f, "Mean batch size: {:.2}", self.mean_batch_size)?;
        writeln!(f, "Hits per capture: {}", self.hits_per_capture)?;
        writeln!(f, "Engine failures: {}", self.engine_failures)?;

        if !self.captures_per_sensor.is_empty() {
            writeln!(f, "Captures per sensor:")?;
            for (sensor, count) in &self.captures_per_sensor {
                writeln!(f, "  {}: {}", sensor, count)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
