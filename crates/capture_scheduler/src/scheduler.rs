//! CaptureScheduler - cadence timers and batched execution rounds

use contracts::{BatchMeta, CaptureMeta, GraphEngine, SceneProvider, SensorId};
use sensor_pipeline::{LidarSensor, SensorSettings};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Result, SchedulerError};
use crate::policy::{BatchPolicy, SchedulerSettings};

/// Owns every active sensor and drives their captures.
///
/// Per sensor: `Idle -> Pending` when its cadence timer fires, `Pending ->
/// Idle` when the batch is flushed. A flush
/// 1. pushes pose and motion into every pending pipeline,
/// 2. refreshes the scene once,
/// 3. executes every pending graph,
/// 4. fires every "new data" callback,
/// 5. clears the pending set.
///
/// Sensors left pending when a tick ends are flushed before `tick` returns.
pub struct CaptureScheduler<E: GraphEngine, S: SceneProvider> {
    engine: E,
    scene: Option<S>,
    settings: SchedulerSettings,
    sensors: Vec<LidarSensor<E>>,
    /// Indices into `sensors`, in the order they became pending
    pending: Vec<usize>,
    clock_ms: f64,
    batches: u64,
}

impl<E: GraphEngine + Clone, S: SceneProvider> CaptureScheduler<E, S> {
    pub fn new(engine: E, scene: Option<S>, settings: SchedulerSettings) -> Self {
        if scene.is_none() {
            warn!("capture scheduler created without a scene provider, sensors cannot activate");
        }
        Self {
            engine,
            scene,
            settings,
            sensors: Vec::new(),
            pending: Vec::new(),
            clock_ms: 0.0,
            batches: 0,
        }
    }

    /// Activate a sensor and register it for capture.
    ///
    /// # Errors
    /// `DuplicateSensor` for a known id; activation errors (including a
    /// missing scene provider) leave the scheduler unchanged.
    #[instrument(name = "scheduler_add_sensor", skip(self, settings), fields(sensor_id = %settings.id))]
    pub fn add_sensor(&mut self, settings: SensorSettings) -> Result<&mut LidarSensor<E>> {
        if self.position(&settings.id).is_some() {
            return Err(SchedulerError::duplicate_sensor(settings.id.as_str()));
        }

        let sensor = LidarSensor::activate(settings, self.engine.clone(), self.scene.as_ref())?;
        self.sensors.push(sensor);
        info!(sensors = self.sensors.len(), "sensor registered");

        let last = self.sensors.len() - 1;
        Ok(&mut self.sensors[last])
    }
}

impl<E: GraphEngine, S: SceneProvider> CaptureScheduler<E, S> {
    /// Deactivate a sensor and release its engine nodes
    #[instrument(name = "scheduler_remove_sensor", skip(self))]
    pub fn remove_sensor(&mut self, sensor_id: &str) -> Result<()> {
        let index = self
            .position(sensor_id)
            .ok_or_else(|| SchedulerError::unknown_sensor(sensor_id))?;

        let sensor = self.sensors.remove(index);
        sensor.release()?;
        info!(sensors = self.sensors.len(), "sensor removed");
        Ok(())
    }

    /// Advance every cadence timer by `elapsed_ms` and flush the resulting
    /// batches.
    ///
    /// # Errors
    /// The first backend failure, unmodified. The failing batch fires no
    /// callbacks and its pending set is dropped; batches flushed earlier in
    /// the same tick are not rolled back.
    pub fn tick(&mut self, elapsed_ms: f64) -> Result<Vec<BatchMeta>> {
        self.clock_ms += elapsed_ms;
        let threshold = self.settings.policy.threshold(self.sensors.len());
        let mut batches = Vec::new();

        for index in 0..self.sensors.len() {
            if self.sensors[index].advance_timer(elapsed_ms) {
                self.pending.push(index);
                if self.pending.len() >= threshold {
                    batches.push(self.flush()?);
                }
            }
        }

        if !self.pending.is_empty() {
            batches.push(self.flush()?);
        }
        Ok(batches)
    }

    /// Capture one sensor right away, regardless of its cadence
    pub fn capture_now(&mut self, sensor_id: &str) -> Result<BatchMeta> {
        let index = self
            .position(sensor_id)
            .ok_or_else(|| SchedulerError::unknown_sensor(sensor_id))?;
        self.pending.push(index);
        self.flush()
    }

    #[instrument(name = "scheduler_flush", skip(self), fields(pending = self.pending.len()))]
    fn flush(&mut self) -> Result<BatchMeta> {
        let pending = std::mem::take(&mut self.pending);
        match self.run_batch(&pending) {
            Ok(batch) => {
                observability::record_batch_metrics(&batch);
                debug!(
                    batch_id = batch.batch_id,
                    captures = batch.len(),
                    rays = batch.total_rays(),
                    "batch flushed"
                );
                Ok(batch)
            }
            Err(e) => {
                error!(node = %e.node, error = %e, "batch aborted by graph engine failure");
                observability::record_engine_failure(&e.node);
                Err(e.into())
            }
        }
    }

    fn run_batch(
        &mut self,
        pending: &[usize],
    ) -> std::result::Result<BatchMeta, contracts::GraphEngineError> {
        let clock_ms = self.clock_ms;
        let scale = self.settings.distance_unit_scale;

        let mut captures = Vec::with_capacity(pending.len());
        for &index in pending {
            let sensor = &mut self.sensors[index];
            let prepared = sensor.prepare_capture(scale)?;
            captures.push(CaptureMeta {
                sensor_id: sensor.id().clone(),
                frame: prepared.frame,
                timestamp_ms: clock_ms,
                ray_count: sensor.ray_count(),
                pose: prepared.pose,
                motion: prepared.motion,
            });
        }

        if let Some(scene) = self.scene.as_mut() {
            scene.refresh_scene_state();
        }

        for &index in pending {
            self.sensors[index].execute()?;
        }

        for (&index, capture) in pending.iter().zip(&captures) {
            self.sensors[index].notify_new_data(capture);
        }

        self.batches += 1;
        Ok(BatchMeta {
            batch_id: self.batches,
            captures,
        })
    }

    /// Release every sensor; the first failure is returned after all were tried
    pub fn shutdown(mut self) -> Result<()> {
        let mut first_error = None;
        for sensor in self.sensors.drain(..) {
            let id = sensor.id().clone();
            if let Err(e) = sensor.release() {
                error!(sensor_id = %id, error = %e, "failed to release sensor");
                first_error.get_or_insert(e);
            }
        }
        info!(batches = self.batches, "capture scheduler shut down");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn position(&self, sensor_id: &str) -> Option<usize> {
        self.sensors.iter().position(|s| s.id().as_str() == sensor_id)
    }

    pub fn sensor(&self, sensor_id: &str) -> Option<&LidarSensor<E>> {
        self.position(sensor_id).map(|i| &self.sensors[i])
    }

    pub fn sensor_mut(&mut self, sensor_id: &str) -> Option<&mut LidarSensor<E>> {
        self.position(sensor_id).map(|i| &mut self.sensors[i])
    }

    pub fn sensors(&self) -> impl Iterator<Item = &LidarSensor<E>> {
        self.sensors.iter()
    }

    pub fn sensors_mut(&mut self) -> impl Iterator<Item = &mut LidarSensor<E>> {
        self.sensors.iter_mut()
    }

    /// Registered ids, registration order
    pub fn sensor_ids(&self) -> Vec<SensorId> {
        self.sensors.iter().map(|s| s.id().clone()).collect()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Sensors waiting for a flush; empty between calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn policy(&self) -> BatchPolicy {
        self.settings.policy
    }

    pub fn set_policy(&mut self, policy: BatchPolicy) {
        self.settings.policy = policy;
    }

    /// Milliseconds accumulated by `tick`
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Batches flushed so far
    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn scene(&self) -> Option<&S> {
        self.scene.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{pose_from_degrees, LidarModel, Pose};
    use nalgebra::Vector3;
    use sensor_pipeline::{EngineCall, Journal, MockGraphEngine, MockSceneProvider};
    use std::sync::{Arc, Mutex};

    type Scheduler = CaptureScheduler<MockGraphEngine, MockSceneProvider>;

    fn scheduler(policy: BatchPolicy) -> (Scheduler, MockGraphEngine, Journal) {
        let engine = MockGraphEngine::new();
        let journal = engine.journal();
        let scene = MockSceneProvider::with_journal(journal.clone());
        let settings = SchedulerSettings {
            policy,
            ..SchedulerSettings::default()
        };
        (
            CaptureScheduler::new(engine.clone(), Some(scene), settings),
            engine,
            journal,
        )
    }

    fn add(scheduler: &mut Scheduler, id: &str, capture_hz: f64) {
        let journal = scheduler.engine().journal();
        let label = format!("new_data:{id}");
        let sensor = scheduler
            .add_sensor(SensorSettings::new(id, LidarModel::RangeMeter).with_capture_hz(capture_hz))
            .unwrap();
        sensor.on_new_data(Arc::new(move |_: &CaptureMeta| journal.mark(label.clone())));
    }

    fn is_pose_update(call: &EngineCall) -> bool {
        matches!(call, EngineCall::Update { kind, .. } if *kind == "points_transform" || *kind == "rays_transform" || *kind == "velocity_distortion")
    }

    #[test]
    fn test_batch_ordering() {
        let (mut scheduler, _engine, journal) = scheduler(BatchPolicy::AllRegistered);
        for id in ["a", "b", "c"] {
            add(&mut scheduler, id, 10.0);
        }
        journal.clear();

        let batches = scheduler.tick(100.0).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);

        let entries = journal.entries();
        let last_update = journal.rposition(is_pose_update).unwrap();
        let refresh = journal.position(|c| *c == EngineCall::SceneRefresh).unwrap();
        let first_execute = journal
            .position(|c| matches!(c, EngineCall::Execute { .. }))
            .unwrap();
        let last_execute = journal
            .rposition(|c| matches!(c, EngineCall::Execute { .. }))
            .unwrap();
        let first_callback = journal
            .position(|c| matches!(c, EngineCall::Marker(_)))
            .unwrap();

        assert!(last_update < refresh);
        assert!(refresh < first_execute);
        assert!(last_execute < first_callback);
        assert_eq!(
            entries
                .iter()
                .filter(|c| **c == EngineCall::SceneRefresh)
                .count(),
            1
        );
        assert_eq!(
            entries[first_callback..],
            [
                EngineCall::Marker("new_data:a".into()),
                EngineCall::Marker("new_data:b".into()),
                EngineCall::Marker("new_data:c".into()),
            ]
        );
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_threshold_splits_batches() {
        let (mut scheduler, _engine, journal) = scheduler(BatchPolicy::Threshold(2));
        for id in ["a", "b", "c"] {
            add(&mut scheduler, id, 10.0);
        }
        journal.clear();

        let batches = scheduler.tick(100.0).unwrap();
        let sizes: Vec<_> = batches.iter().map(BatchMeta::len).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(batches[1].batch_id, 2);
        assert_eq!(
            journal
                .entries()
                .iter()
                .filter(|c| **c == EngineCall::SceneRefresh)
                .count(),
            2
        );
    }

    #[test]
    fn test_immediate_policy() {
        let (mut scheduler, _engine, _journal) = scheduler(BatchPolicy::Immediate);
        add(&mut scheduler, "a", 10.0);
        add(&mut scheduler, "b", 10.0);

        let batches = scheduler.tick(100.0).unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 1));
        assert_eq!(scheduler.scene().unwrap().refreshes(), 2);
    }

    #[test]
    fn test_cadence() {
        let (mut scheduler, engine, _journal) = scheduler(BatchPolicy::AllRegistered);
        add(&mut scheduler, "fast", 20.0);
        add(&mut scheduler, "manual", 0.0);

        assert!(scheduler.tick(25.0).unwrap().is_empty());
        let batches = scheduler.tick(25.0).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].captures[0].sensor_id, "fast");
        assert_eq!(batches[0].captures[0].timestamp_ms, 50.0);

        for _ in 0..10 {
            scheduler.tick(1000.0).unwrap();
        }
        assert_eq!(scheduler.sensor("manual").unwrap().frames(), 0);
        assert_eq!(engine.executions(), 11);
    }

    #[test]
    fn test_capture_now_uses_single_sensor_path() {
        let (mut scheduler, _engine, _journal) = scheduler(BatchPolicy::AllRegistered);
        add(&mut scheduler, "a", 0.0);
        add(&mut scheduler, "b", 0.0);

        let batch = scheduler.capture_now("b").unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.captures[0].frame, 1);
        assert_eq!(scheduler.scene().unwrap().refreshes(), 1);

        assert!(matches!(
            scheduler.capture_now("zzz"),
            Err(SchedulerError::UnknownSensor { .. })
        ));
    }

    #[test]
    fn test_motion_between_captures() {
        let (mut scheduler, _engine, _journal) = scheduler(BatchPolicy::AllRegistered);
        add(&mut scheduler, "a", 0.0);

        let first = scheduler.capture_now("a").unwrap();
        assert!(first.captures[0].motion.is_zero());

        let moved = Pose::translation(1.0, 0.0, 0.0);
        scheduler.sensor_mut("a").unwrap().set_host_pose(moved);
        let second = scheduler.capture_now("a").unwrap();
        let delta = second.captures[0].motion.translation;
        assert!((delta - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_between_captures() {
        let (mut scheduler, _engine, _journal) = scheduler(BatchPolicy::AllRegistered);
        add(&mut scheduler, "a", 0.0);

        let heading = |yaw: f64| pose_from_degrees(Vector3::zeros(), 0.0, yaw, 0.0);
        scheduler.sensor_mut("a").unwrap().set_host_pose(heading(89.5));
        scheduler.capture_now("a").unwrap();

        scheduler.sensor_mut("a").unwrap().set_host_pose(heading(90.5));
        let batch = scheduler.capture_now("a").unwrap();
        let rotation = batch.captures[0].motion.rotation;
        assert!((rotation - Vector3::new(0.0, -1f64.to_radians(), 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_engine_failure_propagates_unmodified() {
        let (mut scheduler, engine, journal) = scheduler(BatchPolicy::AllRegistered);
        add(&mut scheduler, "a", 10.0);
        add(&mut scheduler, "b", 10.0);
        let failing = SensorId::from("b").node("rays");
        engine.fail_execution_of(&failing);
        journal.clear();

        let err = scheduler.tick(100.0).unwrap_err();
        let SchedulerError::GraphEngine(source) = &err else {
            panic!("expected a graph engine error, got {err:?}");
        };
        assert_eq!(source.node, "b/rays");
        assert_eq!(source.message, "mock execution failure");

        assert!(journal
            .position(|c| matches!(c, EngineCall::Marker(_)))
            .is_none());
        assert_eq!(scheduler.pending_count(), 0);
        // poses already pushed in the failed batch stay applied
        assert_eq!(scheduler.sensor("a").unwrap().frames(), 1);

        engine.restore_execution_of(&failing);
        let batches = scheduler.tick(100.0).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].captures[1].frame, 2);
    }

    #[test]
    fn test_missing_scene_rejects_sensor() {
        let engine = MockGraphEngine::new();
        let mut scheduler: Scheduler =
            CaptureScheduler::new(engine.clone(), None, SchedulerSettings::default());

        let result = scheduler.add_sensor(SensorSettings::new("roof", LidarModel::VelodyneVlp16));
        assert!(matches!(result, Err(SchedulerError::Pipeline(_))));
        assert_eq!(scheduler.sensor_count(), 0);
        assert_eq!(engine.node_count(), 0);
    }

    #[test]
    fn test_duplicate_and_remove() {
        let (mut scheduler, engine, _journal) = scheduler(BatchPolicy::AllRegistered);
        add(&mut scheduler, "a", 10.0);
        let duplicate = scheduler.add_sensor(SensorSettings::new("a", LidarModel::RangeMeter));
        assert!(matches!(
            duplicate,
            Err(SchedulerError::DuplicateSensor { .. })
        ));

        add(&mut scheduler, "b", 10.0);
        assert_eq!(engine.node_count(), 24);
        scheduler.remove_sensor("a").unwrap();
        assert_eq!(engine.node_count(), 12);
        assert_eq!(scheduler.sensor_ids(), vec![SensorId::from("b")]);

        let batches = scheduler.tick(100.0).unwrap();
        assert_eq!(batches[0].captures[0].sensor_id, "b");
    }

    #[test]
    fn test_callbacks_see_complete_batch() {
        let (mut scheduler, engine, _journal) = scheduler(BatchPolicy::AllRegistered);
        let observed = Arc::new(Mutex::new(Vec::new()));
        for id in ["a", "b"] {
            let sensor = scheduler
                .add_sensor(SensorSettings::new(id, LidarModel::RangeMeter))
                .unwrap();
            let observed = observed.clone();
            let engine = engine.clone();
            sensor.on_new_data(Arc::new(move |_: &CaptureMeta| {
                observed.lock().unwrap().push(engine.executions());
            }));
        }

        scheduler.tick(100.0).unwrap();
        assert_eq!(*observed.lock().unwrap(), vec![2, 2]);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (mut scheduler, engine, _journal) = scheduler(BatchPolicy::AllRegistered);
        add(&mut scheduler, "a", 10.0);
        add(&mut scheduler, "b", 10.0);
        scheduler.shutdown().unwrap();
        assert_eq!(engine.node_count(), 0);
    }
}
