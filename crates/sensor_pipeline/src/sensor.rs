//! LidarSensor - state of one live sensor
//!
//! Owns the sensor's pipeline, preset state, capture cadence and last known
//! pose, and fans out the two notifications a sensor emits: "model changed"
//! and "new data".

use std::fmt;
use std::sync::Arc;

use contracts::{
    CaptureMeta, ContractError, Field, GraphEngine, GraphEngineError, LaserBank, LidarModel,
    MotionDelta, NodeId, NoiseToggles, Pose, ResultBuffer, ScanConfiguration, SceneProvider,
    SensorId, SensorSpec,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::motion::{motion_delta, sensor_world_pose};
use crate::pipeline::{FrameOutput, SensorPipeline};
use crate::preset::PresetState;
use crate::timer::CaptureTimer;

/// Everything needed to activate a sensor
#[derive(Debug, Clone)]
pub struct SensorSettings {
    pub id: SensorId,
    pub model: LidarModel,
    /// Automatic captures per second, 0 = manual only
    pub capture_hz: f64,
    pub toggles: NoiseToggles,
    /// Replaces the model's canonical scan configuration
    pub scan: Option<ScanConfiguration>,
    pub host_pose: Pose,
}

impl SensorSettings {
    pub fn new(id: impl Into<SensorId>, model: LidarModel) -> Self {
        Self {
            id: id.into(),
            model,
            capture_hz: 10.0,
            toggles: NoiseToggles::default(),
            scan: None,
            host_pose: Pose::identity(),
        }
    }

    pub fn from_spec(spec: &SensorSpec) -> Self {
        Self {
            id: spec.id.as_str().into(),
            model: spec.model,
            capture_hz: spec.capture_hz,
            toggles: spec.noise,
            scan: spec.scan,
            host_pose: spec.mount.to_pose(),
        }
    }

    pub fn with_capture_hz(mut self, capture_hz: f64) -> Self {
        self.capture_hz = capture_hz;
        self
    }

    pub fn with_toggles(mut self, toggles: NoiseToggles) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn with_scan(mut self, scan: ScanConfiguration) -> Self {
        self.scan = Some(scan);
        self
    }

    pub fn with_host_pose(mut self, pose: Pose) -> Self {
        self.host_pose = pose;
        self
    }
}

/// Payload of the "model changed" notification
#[derive(Debug, Clone, PartialEq)]
pub struct ModelChange {
    pub sensor_id: SensorId,
    /// Preset in effect after the change
    pub model: Option<LidarModel>,
    pub configuration: ScanConfiguration,
    pub ray_count: usize,
}

pub type ModelChangedCallback = Arc<dyn Fn(&ModelChange) + Send + Sync>;
pub type NewDataCallback = Arc<dyn Fn(&CaptureMeta) + Send + Sync>;

/// Pose and motion pushed for one capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedCapture {
    pub frame: u64,
    pub pose: Pose,
    pub motion: MotionDelta,
}

pub struct LidarSensor<E: GraphEngine> {
    id: SensorId,
    model: LidarModel,
    preset: PresetState,
    capture_hz: f64,
    timer: CaptureTimer,
    host_pose: Pose,
    last_pose: Option<Pose>,
    frames: u64,
    pipeline: SensorPipeline<E>,
    model_changed: Vec<ModelChangedCallback>,
    new_data: Vec<NewDataCallback>,
}

impl<E: GraphEngine> fmt::Debug for LidarSensor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LidarSensor")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("preset", &self.preset)
            .field("capture_hz", &self.capture_hz)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl<E: GraphEngine> LidarSensor<E> {
    /// Activate a sensor and build its subgraph.
    ///
    /// # Errors
    /// `MissingCollaborator` without a scene provider; the sensor is not
    /// created and no node reaches the engine.
    #[instrument(
        name = "lidar_sensor_activate",
        skip(settings, engine, scene),
        fields(sensor_id = %settings.id, model = %settings.model)
    )]
    pub fn activate<S: SceneProvider + ?Sized>(
        settings: SensorSettings,
        engine: E,
        scene: Option<&S>,
    ) -> Result<Self> {
        if scene.is_none() {
            error!(
                sensor_id = %settings.id,
                "no scene provider available, sensor will not start"
            );
            return Err(
                ContractError::missing_collaborator(settings.id.as_str(), "scene provider").into(),
            );
        }

        let bank = laser_catalog::laser_bank(settings.model);
        let canonical = laser_catalog::canonical_configuration(settings.model);
        let configuration = match settings.scan {
            Some(scan) => match scan.validate() {
                Ok(()) => scan,
                Err(e) => {
                    warn!(
                        sensor_id = %settings.id,
                        error = %e,
                        "scan override rejected, using canonical configuration"
                    );
                    observability::record_configuration_rejected(
                        settings.id.as_str(),
                        e.offending_field().unwrap_or("unknown"),
                    );
                    canonical
                }
            },
            None => canonical,
        };

        let pipeline = SensorPipeline::build(
            engine,
            settings.id.clone(),
            bank,
            configuration,
            settings.toggles,
        )?;

        let mut preset = PresetState::default();
        preset.validate(settings.model);

        info!(
            rays = pipeline.ray_count(),
            capture_hz = settings.capture_hz,
            "lidar sensor activated"
        );

        Ok(Self {
            id: settings.id,
            model: settings.model,
            preset,
            capture_hz: settings.capture_hz,
            timer: CaptureTimer::new(settings.capture_hz),
            host_pose: settings.host_pose,
            last_pose: None,
            frames: 0,
            pipeline,
            model_changed: Vec::new(),
            new_data: Vec::new(),
        })
    }

    /// Subscribe to "model changed", fired after validation and before the
    /// graph is updated. When the backend then rejects the update, it fires
    /// again with the restored configuration.
    pub fn on_model_changed(&mut self, callback: ModelChangedCallback) {
        self.model_changed.push(callback);
    }

    /// Subscribe to "new data", fired once per executed capture
    pub fn on_new_data(&mut self, callback: NewDataCallback) {
        self.new_data.push(callback);
    }

    /// Select a preset. Returns whether the configuration was overwritten.
    #[instrument(name = "lidar_sensor_select_model", skip(self), fields(sensor_id = %self.id))]
    pub fn select_model(&mut self, model: LidarModel) -> Result<bool> {
        if !self.preset.requires_overwrite(model) {
            self.preset.validate(model);
            self.model = model;
            return Ok(false);
        }

        self.apply(
            laser_catalog::laser_bank(model),
            laser_catalog::canonical_configuration(model),
            Some(model),
        )?;
        self.preset.validate(model);
        self.model = model;
        Ok(true)
    }

    /// Replace the scan configuration, keeping the current laser bank.
    ///
    /// A rejected configuration leaves the previous one running.
    pub fn set_configuration(&mut self, configuration: ScanConfiguration) -> Result<()> {
        let bank = self.pipeline.bank().clone();
        self.apply(bank, configuration, self.preset.model())
    }

    fn apply(
        &mut self,
        bank: Arc<LaserBank>,
        configuration: ScanConfiguration,
        model: Option<LidarModel>,
    ) -> Result<()> {
        let batch = match ray_generator::generate(&bank, &configuration) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(
                    sensor_id = %self.id,
                    error = %e,
                    "scan configuration rejected, previous configuration kept"
                );
                observability::record_configuration_rejected(
                    self.id.as_str(),
                    e.offending_field().unwrap_or("unknown"),
                );
                return Err(e.into());
            }
        };

        let change = ModelChange {
            sensor_id: self.id.clone(),
            model,
            configuration,
            ray_count: batch.ray_count(),
        };
        for callback in &self.model_changed {
            callback(&change);
        }

        if let Err(e) = self.pipeline.reconfigure(bank, configuration, batch) {
            error!(sensor_id = %self.id, error = %e, "reconfiguration failed, previous configuration restored");
            let restored = ModelChange {
                sensor_id: self.id.clone(),
                model: self.preset.model(),
                configuration: *self.pipeline.configuration(),
                ray_count: self.pipeline.ray_count(),
            };
            for callback in &self.model_changed {
                callback(&restored);
            }
            return Err(e.into());
        }
        observability::record_reconfiguration(self.id.as_str());
        info!(sensor_id = %self.id, rays = change.ray_count, "scan configuration applied");
        Ok(())
    }

    pub fn set_toggles(&mut self, toggles: NoiseToggles) -> Result<()> {
        self.pipeline.set_toggles(toggles)?;
        Ok(())
    }

    /// Change the cadence; restarts the capture timer
    pub fn set_capture_hz(&mut self, capture_hz: f64) {
        self.capture_hz = capture_hz;
        self.timer = CaptureTimer::new(capture_hz);
    }

    /// Advance the capture timer, `true` when a capture is due
    pub fn advance_timer(&mut self, elapsed_ms: f64) -> bool {
        self.timer.advance(elapsed_ms)
    }

    pub fn set_host_pose(&mut self, pose: Pose) {
        self.host_pose = pose;
    }

    /// Host pose composed with the bank's center of measurement
    pub fn world_pose(&self) -> Pose {
        sensor_world_pose(&self.host_pose, self.pipeline.bank())
    }

    /// Compute pose and motion, push them into the pipeline and remember the
    /// pose for the next capture.
    pub fn prepare_capture(
        &mut self,
        distance_unit_scale: f64,
    ) -> std::result::Result<PreparedCapture, GraphEngineError> {
        let pose = self.world_pose();
        let motion = motion_delta(self.last_pose.as_ref(), &pose, distance_unit_scale);
        self.pipeline.update_pose(&pose, &motion)?;
        self.last_pose = Some(pose);
        self.frames += 1;

        debug!(sensor_id = %self.id, frame = self.frames, moving = !motion.is_zero(), "capture prepared");
        Ok(PreparedCapture {
            frame: self.frames,
            pose,
            motion,
        })
    }

    pub fn execute(&mut self) -> std::result::Result<(), GraphEngineError> {
        self.pipeline.execute()
    }

    /// Fire every "new data" callback
    pub fn notify_new_data(&self, capture: &CaptureMeta) {
        for callback in &self.new_data {
            callback(capture);
        }
    }

    pub fn retrieve(
        &self,
        output: FrameOutput,
        field: Field,
    ) -> std::result::Result<ResultBuffer, GraphEngineError> {
        self.pipeline.retrieve(output, field)
    }

    pub fn connect_to_world_frame(
        &mut self,
        sink: &NodeId,
        compacted: bool,
    ) -> std::result::Result<(), GraphEngineError> {
        self.pipeline.connect_to_world_frame(sink, compacted)
    }

    pub fn connect_to_lidar_frame(
        &mut self,
        sink: &NodeId,
    ) -> std::result::Result<(), GraphEngineError> {
        self.pipeline.connect_to_lidar_frame(sink)
    }

    /// Deactivate and release every engine node
    pub fn release(self) -> std::result::Result<(), GraphEngineError> {
        info!(sensor_id = %self.id, frames = self.frames, "lidar sensor deactivated");
        self.pipeline.release()
    }

    pub fn id(&self) -> &SensorId {
        &self.id
    }

    /// Preset last selected
    pub fn model(&self) -> LidarModel {
        self.model
    }

    pub fn preset_state(&self) -> PresetState {
        self.preset
    }

    pub fn configuration(&self) -> &ScanConfiguration {
        self.pipeline.configuration()
    }

    pub fn toggles(&self) -> NoiseToggles {
        self.pipeline.toggles()
    }

    pub fn capture_hz(&self) -> f64 {
        self.capture_hz
    }

    pub fn ray_count(&self) -> usize {
        self.pipeline.ray_count()
    }

    pub fn host_pose(&self) -> &Pose {
        &self.host_pose
    }

    pub fn last_pose(&self) -> Option<&Pose> {
        self.last_pose.as_ref()
    }

    /// Captures prepared so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pipeline(&self) -> &SensorPipeline<E> {
        &self.pipeline
    }
}
