//! Mock Capture Example
//!
//! Drives a capture scheduler over the mock Graph Engine: two sensors on a
//! moving host, a preset switch halfway through and point retrieval after
//! every batch. No raytracing backend is required.
//!
//! Run with: cargo run -p demos --bin mock_capture [scenario.toml]

use std::sync::Arc;

use capture_scheduler::{CaptureScheduler, SchedulerSettings};
use config_loader::ConfigLoader;
use contracts::{
    CaptureMeta, ConfigVersion, Field, LidarModel, Location, NoiseToggles, ScenarioBlueprint,
    SchedulerConfig, SensorSpec, Transform,
};
use nalgebra::Translation3;
use sensor_pipeline::{FrameOutput, MockGraphEngine, MockSceneProvider, SensorSettings};

const TICKS: u32 = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Capture Demo");

    // ==== Stage 1: Load scenario or use the built-in one ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading scenario");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_test_blueprint()
    };

    // ==== Stage 2: Activate sensors ====
    let engine = MockGraphEngine::new();
    let scene = MockSceneProvider::with_journal(engine.journal());
    let mut scheduler = CaptureScheduler::new(
        engine.clone(),
        Some(scene),
        SchedulerSettings::from(&blueprint.scheduler),
    );

    for spec in &blueprint.sensors {
        let sensor = scheduler.add_sensor(SensorSettings::from_spec(spec))?;
        sensor.on_new_data(Arc::new(|capture: &CaptureMeta| {
            tracing::info!(
                sensor_id = %capture.sensor_id,
                frame = capture.frame,
                moving = !capture.motion.is_zero(),
                "New capture"
            );
        }));
        tracing::info!(sensor_id = %spec.id, rays = sensor.ray_count(), "Sensor activated");
    }
    tracing::info!(nodes = engine.node_count(), "Engine graph built");

    // ==== Stage 3: Run ====
    let dt_ms = 1000.0 / blueprint.scheduler.tick_hz;
    for tick in 0..TICKS {
        for sensor in scheduler.sensors_mut() {
            // 10 m/s along +Z
            let moved = Translation3::new(0.0, 0.0, 10.0 * dt_ms / 1000.0) * *sensor.host_pose();
            sensor.set_host_pose(moved);
        }

        if tick == TICKS / 2 {
            if let Some(sensor) = scheduler.sensor_mut("roof") {
                sensor.select_model(LidarModel::HesaiPandar40p)?;
                tracing::info!(rays = sensor.ray_count(), "Roof sensor switched preset");
            }
        }

        for batch in scheduler.tick(dt_ms)? {
            for capture in &batch.captures {
                if let Some(sensor) = scheduler.sensor(&capture.sensor_id) {
                    let hits = sensor.retrieve(FrameOutput::CompactedWorldFrame, Field::Xyz)?;
                    tracing::info!(
                        batch_id = batch.batch_id,
                        sensor_id = %capture.sensor_id,
                        rays = capture.ray_count,
                        hits = hits.count,
                        "Points retrieved"
                    );
                }
            }
        }
    }

    // ==== Stage 4: Cleanup ====
    tracing::info!(batches = scheduler.batches(), "Shutting down and cleaning up...");
    scheduler.shutdown()?;
    tracing::info!(nodes = engine.node_count(), "Demo completed");

    Ok(())
}

fn create_test_blueprint() -> ScenarioBlueprint {
    let sensor = |id: &str, model: LidarModel, z: f64| SensorSpec {
        id: id.to_string(),
        model,
        capture_hz: 10.0,
        noise: NoiseToggles {
            velocity_distortion: true,
            ..NoiseToggles::default()
        },
        mount: Transform {
            location: Location { x: 0.0, y: z, z: 0.0 },
            ..Transform::default()
        },
        velocity: None,
        scan: None,
    };

    ScenarioBlueprint {
        version: ConfigVersion::V1,
        scheduler: SchedulerConfig {
            tick_hz: 20.0,
            ..SchedulerConfig::default()
        },
        sensors: vec![
            sensor("roof", LidarModel::VelodyneVlp16, 1.8),
            sensor("bumper", LidarModel::HesaiQt128C2x, 0.5),
        ],
    }
}
