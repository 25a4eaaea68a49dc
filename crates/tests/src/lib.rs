//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots
//! - Mock e2e runs (scenario file -> scheduler -> batches)
//! - Per-model ray generation properties

#[cfg(test)]
mod contract_tests {
    use contracts::{LidarModel, RayGenerateMethod};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_every_model_generates() {
        for model in LidarModel::ALL {
            let preset = laser_catalog::preset(model);
            let batch = ray_generator::generate(&preset.bank, &preset.configuration).unwrap();
            assert_eq!(
                batch.ray_count(),
                preset.configuration.total_ray_count(preset.bank.laser_count()),
                "{model}"
            );
            assert_eq!(batch.ranges.len(), batch.ray_count());
            assert_eq!(batch.time_offsets.len(), batch.ray_count());
        }
    }

    #[test]
    fn test_model_names_round_trip() {
        for model in LidarModel::ALL {
            assert_eq!(model.as_str().parse::<LidarModel>().unwrap(), model);
        }
        assert_eq!(
            laser_catalog::canonical_configuration(LidarModel::VelodyneVlp16).ray_generate_method,
            RayGenerateMethod::RotatingLidarEqualRange
        );
    }
}

#[cfg(test)]
mod ray_tests {
    use approx::assert_relative_eq;
    use contracts::{
        LidarModel, HESAI_AT128_FAR_MIN_RANGE, HESAI_AT128_NEAR_MIN_RANGE, HESAI_QT128_SHIFTED_FROM,
    };

    fn canonical(model: LidarModel) -> contracts::RayBatch {
        let preset = laser_catalog::preset(model);
        ray_generator::generate(&preset.bank, &preset.configuration).unwrap()
    }

    /// Azimuth of a ray direction, +Y up and +Z forward
    fn azimuth_deg(direction: nalgebra::Vector3<f64>) -> f64 {
        direction.x.atan2(direction.z).to_degrees()
    }

    #[test]
    fn test_at128_near_field_alternates() {
        let batch = canonical(LidarModel::HesaiAt128E2x);
        assert_eq!(batch.horizontal_steps, 1200);

        // laser 0 is near-field capable, laser 127 is not
        assert_eq!(batch.ranges[batch.index(0, 0)].x, HESAI_AT128_NEAR_MIN_RANGE);
        assert_eq!(batch.ranges[batch.index(0, 1)].x, HESAI_AT128_FAR_MIN_RANGE);
        assert_eq!(batch.ranges[batch.index(0, 2)].x, HESAI_AT128_NEAR_MIN_RANGE);
        assert_eq!(batch.ranges[batch.index(127, 0)].x, HESAI_AT128_FAR_MIN_RANGE);
        assert!(batch.ranges.iter().all(|r| r.y == 210.0));
    }

    #[test]
    fn test_qt128_shifted_bank_is_half_a_step_ahead() {
        let batch = canonical(LidarModel::HesaiQt128C2x);
        let step = 10;

        let regular = azimuth_deg(batch.direction(batch.index(HESAI_QT128_SHIFTED_FROM - 1, step)));
        let shifted = azimuth_deg(batch.direction(batch.index(HESAI_QT128_SHIFTED_FROM, step)));
        assert_relative_eq!(regular, -176.0, epsilon = 1e-6);
        assert_relative_eq!(shifted - regular, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_time_offsets_grow_with_steps() {
        let batch = canonical(LidarModel::VelodyneVlp16);
        let laser = 5;
        let cycle = laser_catalog::canonical_configuration(LidarModel::VelodyneVlp16).cycle_period_ms;
        let t0 = batch.time_offsets[batch.index(laser, 0)];
        let t9 = batch.time_offsets[batch.index(laser, 9)];
        assert_relative_eq!(t9 - t0, 9.0 * cycle, epsilon = 1e-12);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};

    use capture_scheduler::{CaptureScheduler, SchedulerError, SchedulerSettings};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{CaptureMeta, Field, LidarModel, NodeId, ScenarioBlueprint};
    use sensor_pipeline::{
        EngineCall, FrameOutput, MockGraphEngine, MockSceneProvider, ModelChange, SensorSettings,
    };

    const SCENARIO: &str = r#"
[scheduler]
tick_hz = 10.0
batch_size = 0

[[sensors]]
id = "front"
model = "velodyne_vlp16"
capture_hz = 10.0

[[sensors]]
id = "rear"
model = "ouster_os1_64"
capture_hz = 10.0

[[sensors]]
id = "meter"
model = "range_meter"
capture_hz = 5.0
"#;

    type Scheduler = CaptureScheduler<MockGraphEngine, MockSceneProvider>;

    fn scheduler_from(blueprint: &ScenarioBlueprint, engine: &MockGraphEngine) -> Scheduler {
        let scene = MockSceneProvider::with_journal(engine.journal());
        let mut scheduler = CaptureScheduler::new(
            engine.clone(),
            Some(scene),
            SchedulerSettings::from(&blueprint.scheduler),
        );
        for spec in &blueprint.sensors {
            scheduler.add_sensor(SensorSettings::from_spec(spec)).unwrap();
        }
        scheduler
    }

    fn ids(captures: &[CaptureMeta]) -> Vec<&str> {
        captures.iter().map(|c| c.sensor_id.as_str()).collect()
    }

    /// Scenario file -> scheduler -> batches -> point retrieval
    #[test]
    fn test_e2e_scenario_capture() {
        let blueprint = ConfigLoader::load_from_str(SCENARIO, ConfigFormat::Toml).unwrap();
        let engine = MockGraphEngine::new();
        let mut scheduler = scheduler_from(&blueprint, &engine);
        assert_eq!(scheduler.sensor_count(), 3);

        // meter runs at half cadence: two sensors pending, flushed at the end of the tick
        let batches = scheduler.tick(100.0).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(ids(&batches[0].captures), vec!["front", "rear"]);
        assert_eq!(batches[0].total_rays(), 16 * 1800 + 64 * 1024);

        // every sensor pending: the threshold flushes inside the loop
        let batches = scheduler.tick(100.0).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(ids(&batches[0].captures), vec!["front", "rear", "meter"]);
        assert_eq!(batches[0].batch_id, 2);
        assert_eq!(batches[0].captures[0].frame, 2);
        assert_eq!(batches[0].captures[2].frame, 1);

        let front = scheduler.sensor("front").unwrap();
        let hits = front
            .retrieve(FrameOutput::CompactedWorldFrame, Field::Xyz)
            .unwrap();
        assert_eq!(hits.count, front.ray_count());

        scheduler.shutdown().unwrap();
        assert_eq!(engine.node_count(), 0);
    }

    /// Within a batch: every pose update, one scene refresh, then every execution
    #[test]
    fn test_e2e_batch_ordering() {
        let blueprint = ConfigLoader::load_from_str(SCENARIO, ConfigFormat::Toml).unwrap();
        let engine = MockGraphEngine::new();
        let mut scheduler = scheduler_from(&blueprint, &engine);
        let journal = engine.journal();
        journal.clear();

        scheduler.tick(200.0).unwrap();

        let entries = journal.entries();
        let refreshes: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, call)| matches!(call, EngineCall::SceneRefresh))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(refreshes.len(), 1);
        let refresh = refreshes[0];

        let last_update = journal
            .rposition(|call| matches!(call, EngineCall::Update { .. }))
            .unwrap();
        let first_execute = journal
            .position(|call| matches!(call, EngineCall::Execute { .. }))
            .unwrap();
        assert!(last_update < refresh);
        assert!(refresh < first_execute);

        let roots: Vec<String> = entries
            .iter()
            .filter_map(|call| match call {
                EngineCall::Execute { root } => Some(root.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(roots, vec!["front/rays", "rear/rays", "meter/rays"]);
    }

    /// Preset switch keeps the same nodes and changes the ray count
    #[test]
    fn test_e2e_model_switch() {
        let blueprint = ConfigLoader::load_from_str(SCENARIO, ConfigFormat::Toml).unwrap();
        let engine = MockGraphEngine::new();
        let mut scheduler = scheduler_from(&blueprint, &engine);
        let nodes_before = engine.node_count();

        let changes = Arc::new(Mutex::new(Vec::<ModelChange>::new()));
        let sink = Arc::clone(&changes);
        let front = scheduler.sensor_mut("front").unwrap();
        front.on_model_changed(Arc::new(move |change: &ModelChange| {
            sink.lock().unwrap().push(change.clone());
        }));

        let journal = engine.journal();
        journal.clear();
        assert!(front.select_model(LidarModel::HesaiPandar40p).unwrap());
        assert!(!front.select_model(LidarModel::HesaiPandar40p).unwrap());

        assert!(journal
            .position(|call| matches!(call, EngineCall::Create { .. } | EngineCall::Destroy { .. }))
            .is_none());
        assert_eq!(engine.node_count(), nodes_before);

        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].model, Some(LidarModel::HesaiPandar40p));
        assert_eq!(changes[0].ray_count, 40 * 1800);
        drop(changes);

        let batch = scheduler.capture_now("front").unwrap();
        assert_eq!(batch.total_rays(), 40 * 1800);
    }

    /// A failing execution surfaces unchanged and fires no callbacks
    #[test]
    fn test_e2e_engine_failure() {
        let blueprint = ConfigLoader::load_from_str(SCENARIO, ConfigFormat::Toml).unwrap();
        let engine = MockGraphEngine::new();
        let mut scheduler = scheduler_from(&blueprint, &engine);

        let notified = Arc::new(Mutex::new(0usize));
        for sensor in scheduler.sensors_mut() {
            let counter = Arc::clone(&notified);
            sensor.on_new_data(Arc::new(move |_: &CaptureMeta| {
                *counter.lock().unwrap() += 1;
            }));
        }

        engine.fail_execution_of(&NodeId::new("rear/rays"));
        let err = scheduler.tick(100.0).unwrap_err();
        match &err {
            SchedulerError::GraphEngine(e) => {
                assert_eq!(e.node, "rear/rays");
                assert_eq!(e.message, "mock execution failure");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*notified.lock().unwrap(), 0);
        assert_eq!(scheduler.pending_count(), 0);

        engine.restore_execution_of(&NodeId::new("rear/rays"));
        let batches = scheduler.tick(100.0).unwrap();
        assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), 3);
        assert_eq!(*notified.lock().unwrap(), 3);
    }

    /// Rays whose window excludes the hit distance are compacted away
    #[test]
    fn test_e2e_range_window_filters_hits() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[[sensors]]
id = "short"
model = "velodyne_vlp16"

[sensors.scan]
horizontal_resolution_deg = 1.0
min_h_angle_deg = -180.0
max_h_angle_deg = 180.0
min_range = 0.0
max_range = 5.0
cycle_period_ms = 0.05
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        let engine = MockGraphEngine::new();
        let mut scheduler = scheduler_from(&blueprint, &engine);

        scheduler.capture_now("short").unwrap();
        let sensor = scheduler.sensor("short").unwrap();
        assert_eq!(sensor.ray_count(), 16 * 360);

        let all = sensor.retrieve(FrameOutput::WorldFrame, Field::IsHit).unwrap();
        let hits = sensor
            .retrieve(FrameOutput::CompactedWorldFrame, Field::Xyz)
            .unwrap();
        assert_eq!(all.count, 16 * 360);
        assert_eq!(hits.count, 0);
    }
}
