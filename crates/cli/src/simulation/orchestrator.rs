//! Simulation orchestrator - drives the capture scheduler at a fixed cadence.
//!
//! Runs against the in-process mock backend: a mock Graph Engine shared by
//! every sensor and a mock Scene Provider. Hosts with a configured velocity
//! are moved before every tick so velocity distortion sees real motion.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use capture_scheduler::{CaptureScheduler, SchedulerSettings};
use contracts::{BatchMeta, CaptureMeta, Field, ScenarioBlueprint, SensorId};
use nalgebra::{Translation3, Vector3};
use sensor_pipeline::{
    FrameOutput, MockGraphEngine, MockSceneProvider, ModelChange, SensorSettings,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::SimulationStats;
use crate::error::CliError;

type MockScheduler = CaptureScheduler<MockGraphEngine, MockSceneProvider>;

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// The loaded scenario
    pub blueprint: ScenarioBlueprint,

    /// Scheduler tick rate (Hz)
    pub tick_hz: f64,

    /// Ticks to run (None = until shutdown)
    pub max_ticks: Option<u64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Host velocity applied between ticks
#[derive(Debug, Clone)]
struct HostMotion {
    sensor_id: SensorId,
    velocity: Vector3<f64>,
}

/// Scenario runner
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run until `max_ticks` is reached or `shutdown` completes
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<SimulationStats> {
        let start_time = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let (mut scheduler, motions) = self.build_scheduler()?;
        let mut stats = SimulationStats {
            active_sensors: scheduler.sensor_count(),
            ..Default::default()
        };

        let period = Duration::from_secs_f64(1.0 / self.config.tick_hz);
        let dt_ms = period.as_secs_f64() * 1000.0;
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            tick_hz = self.config.tick_hz,
            max_ticks = ?self.config.max_ticks,
            sensors = stats.active_sensors,
            "Simulation running (MOCK backend)"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping simulation...");
                    break;
                }
                _ = interval.tick() => {}
            }

            move_hosts(&mut scheduler, &motions, dt_ms / 1000.0);
            match scheduler.tick(dt_ms) {
                Ok(batches) => record_batches(&scheduler, &batches, &mut stats),
                Err(e) => return Err(CliError::simulation(stats.ticks, e).into()),
            }
            stats.ticks += 1;

            if let Some(max) = self.config.max_ticks {
                if stats.ticks >= max {
                    info!(ticks = stats.ticks, "Reached max ticks limit");
                    break;
                }
            }
        }

        info!("Releasing sensors...");
        scheduler
            .shutdown()
            .context("Failed to release sensor pipelines")?;

        stats.duration = start_time.elapsed();
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            captures = stats.captures.total_captures,
            "Simulation complete"
        );
        Ok(stats)
    }

    fn build_scheduler(&self) -> Result<(MockScheduler, Vec<HostMotion>)> {
        let blueprint = &self.config.blueprint;
        let engine = MockGraphEngine::new();
        let scene = MockSceneProvider::new();
        let mut scheduler =
            CaptureScheduler::new(engine, Some(scene), SchedulerSettings::from(&blueprint.scheduler));

        let mut motions = Vec::new();
        for spec in &blueprint.sensors {
            let sensor = scheduler
                .add_sensor(SensorSettings::from_spec(spec))
                .with_context(|| format!("Failed to activate sensor '{}'", spec.id))?;

            sensor.on_model_changed(Arc::new(|change: &ModelChange| {
                info!(
                    sensor_id = %change.sensor_id,
                    model = ?change.model,
                    rays = change.ray_count,
                    "Sensor model changed"
                );
            }));
            sensor.on_new_data(Arc::new(|capture: &CaptureMeta| {
                debug!(
                    sensor_id = %capture.sensor_id,
                    frame = capture.frame,
                    rays = capture.ray_count,
                    "New capture"
                );
            }));

            if let Some(velocity) = spec.velocity {
                motions.push(HostMotion {
                    sensor_id: sensor.id().clone(),
                    velocity: velocity.to_vector(),
                });
            }

            info!(
                sensor_id = %spec.id,
                model = %spec.model,
                capture_hz = spec.capture_hz,
                rays = sensor.ray_count(),
                "Sensor activated"
            );
        }

        Ok((scheduler, motions))
    }
}

fn move_hosts(scheduler: &mut MockScheduler, motions: &[HostMotion], dt_s: f64) {
    for motion in motions {
        if let Some(sensor) = scheduler.sensor_mut(&motion.sensor_id) {
            let moved = Translation3::from(motion.velocity * dt_s) * *sensor.host_pose();
            sensor.set_host_pose(moved);
        }
    }
}

fn record_batches(scheduler: &MockScheduler, batches: &[BatchMeta], stats: &mut SimulationStats) {
    for batch in batches {
        stats.captures.update(batch);

        for capture in &batch.captures {
            let Some(sensor) = scheduler.sensor(&capture.sensor_id) else {
                continue;
            };
            match sensor.retrieve(FrameOutput::CompactedWorldFrame, Field::Xyz) {
                Ok(points) => stats.captures.record_hits(points.count),
                Err(e) => warn!(sensor_id = %capture.sensor_id, error = %e, "Failed to retrieve points"),
            }
        }

        debug!(
            batch_id = batch.batch_id,
            captures = batch.len(),
            rays = batch.total_rays(),
            "Batch executed"
        );
    }
}
