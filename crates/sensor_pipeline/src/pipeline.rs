//! SensorPipeline - one persistent Graph Engine subgraph per sensor
//!
//! The twelve stage nodes are created once, chained in [`Stage::ALL`] order and
//! never recreated: reconfiguration only updates parameters and activation, so
//! sinks connected to the output stages stay valid.

use std::sync::Arc;

use contracts::{
    Field, GraphEngine, GraphEngineError, LaserBank, MotionDelta, NodeId, NodeParams,
    NoiseToggles, Pose, RayBatch, ResultBuffer, ScanConfiguration, SensorId,
};
use nalgebra::{Matrix4, Vector2};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::stage::{Stage, StageActivation};

/// Stages refreshed on every scan configuration change
const CONFIG_STAGES: [Stage; 8] = [
    Stage::Rays,
    Stage::RangeWindow,
    Stage::RingIds,
    Stage::TimeOffsets,
    Stage::AngularNoiseRay,
    Stage::Raycast,
    Stage::AngularNoiseHitpoint,
    Stage::DistanceNoise,
];

/// Stages refreshed on every capture
const POSE_STAGES: [Stage; 3] = [Stage::VelocityDistortion, Stage::WorldPose, Stage::LidarFrame];

const TOGGLEABLE_STAGES: [Stage; 4] = [
    Stage::VelocityDistortion,
    Stage::AngularNoiseRay,
    Stage::AngularNoiseHitpoint,
    Stage::DistanceNoise,
];

/// Output streams external consumers can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameOutput {
    /// World frame, misses included
    WorldFrame,
    /// World frame, hits only
    CompactedWorldFrame,
    /// Sensor-local frame, hits only
    LidarFrame,
}

impl FrameOutput {
    pub fn stage(&self) -> Stage {
        match self {
            FrameOutput::WorldFrame => Stage::DistanceNoise,
            FrameOutput::CompactedWorldFrame => Stage::Compact,
            FrameOutput::LidarFrame => Stage::LidarFrame,
        }
    }
}

/// Ray arrays in the shared form the engine parameters take
#[derive(Clone)]
struct RayArrays {
    poses: Arc<[Matrix4<f64>]>,
    ranges: Arc<[Vector2<f64>]>,
    ring_ids: Arc<[i32]>,
    time_offsets: Arc<[f64]>,
}

impl From<RayBatch> for RayArrays {
    fn from(batch: RayBatch) -> Self {
        Self {
            poses: Arc::from(batch.poses),
            ranges: Arc::from(batch.ranges),
            ring_ids: Arc::from(batch.ring_ids),
            time_offsets: Arc::from(batch.time_offsets),
        }
    }
}

fn stage_params(
    stage: Stage,
    rays: &RayArrays,
    config: &ScanConfiguration,
    pose: &Pose,
    motion: &MotionDelta,
) -> NodeParams {
    let noise = &config.noise;
    match stage {
        Stage::Rays => NodeParams::RaysFromMat {
            poses: rays.poses.clone(),
        },
        Stage::RangeWindow => NodeParams::RaysSetRange {
            ranges: rays.ranges.clone(),
        },
        Stage::RingIds => NodeParams::RaysSetRingIds {
            ring_ids: rays.ring_ids.clone(),
        },
        Stage::TimeOffsets => NodeParams::RaysSetTimeOffsets {
            offsets_ms: rays.time_offsets.clone(),
        },
        Stage::VelocityDistortion => NodeParams::VelocityDistortion {
            translation: motion.translation,
            rotation: motion.rotation,
        },
        Stage::WorldPose => NodeParams::RaysTransform {
            transform: pose.to_homogeneous(),
        },
        Stage::AngularNoiseRay => NodeParams::GaussianNoiseAngularRay {
            mean_rad: noise.angular_mean_deg.to_radians(),
            std_dev_rad: noise.angular_std_dev_deg.to_radians(),
        },
        Stage::Raycast => NodeParams::Raycast {
            beam_divergence_rad: config.beam_divergence_deg.to_radians(),
        },
        Stage::AngularNoiseHitpoint => NodeParams::GaussianNoiseAngularHitpoint {
            mean_rad: noise.angular_mean_deg.to_radians(),
            std_dev_rad: noise.angular_std_dev_deg.to_radians(),
        },
        Stage::DistanceNoise => NodeParams::GaussianNoiseDistance {
            mean: noise.distance_mean,
            std_dev_base: noise.distance_std_dev_base,
            std_dev_rise_per_meter: noise.distance_std_dev_rise_per_meter,
        },
        Stage::Compact => NodeParams::Compact,
        Stage::LidarFrame => NodeParams::PointsTransform {
            transform: pose.inverse().to_homogeneous(),
        },
    }
}

/// Persistent subgraph of one sensor.
pub struct SensorPipeline<E: GraphEngine> {
    engine: E,
    sensor_id: SensorId,
    nodes: [NodeId; 12],
    bank: Arc<LaserBank>,
    configuration: ScanConfiguration,
    /// Arrays currently held by the ray stages
    rays: RayArrays,
    toggles: NoiseToggles,
    activation: StageActivation,
    ray_count: usize,
    pose: Pose,
    motion: MotionDelta,
}

impl<E: GraphEngine> SensorPipeline<E> {
    /// Generate rays and create the chained stage nodes.
    ///
    /// Nodes created before a backend failure are destroyed again.
    #[instrument(
        name = "sensor_pipeline_build",
        skip(engine, bank, configuration, toggles),
        fields(sensor_id = %sensor_id, lasers = bank.laser_count())
    )]
    pub fn build(
        engine: E,
        sensor_id: SensorId,
        bank: Arc<LaserBank>,
        configuration: ScanConfiguration,
        toggles: NoiseToggles,
    ) -> Result<Self> {
        let batch = ray_generator::generate(&bank, &configuration)?;
        let ray_count = batch.ray_count();
        let nodes = Stage::ALL.map(|stage| sensor_id.node(stage.name()));

        let mut pipeline = Self {
            engine,
            sensor_id,
            nodes,
            bank,
            configuration,
            rays: RayArrays::from(batch),
            toggles,
            activation: StageActivation::evaluate(&toggles, &configuration.noise),
            ray_count,
            pose: Pose::identity(),
            motion: MotionDelta::zero(),
        };

        let mut created = Vec::with_capacity(Stage::ALL.len());
        if let Err(e) = pipeline.create_nodes(&mut created) {
            warn!(error = %e, created = created.len(), "pipeline build failed, rolling back nodes");
            for node in created.iter().rev() {
                pipeline.destroy_node_safe(node);
            }
            return Err(PipelineError::build_failed(pipeline.sensor_id.as_str(), e));
        }

        info!(rays = ray_count, "sensor pipeline built");
        Ok(pipeline)
    }

    fn create_nodes(&mut self, created: &mut Vec<NodeId>) -> std::result::Result<(), GraphEngineError> {
        for stage in Stage::ALL {
            let id = self.node(stage).clone();
            let params = stage_params(stage, &self.rays, &self.configuration, &self.pose, &self.motion);
            self.engine.create_node(&id, params)?;
            created.push(id);
        }
        for pair in self.nodes.windows(2) {
            self.engine.connect(&pair[0], &pair[1])?;
        }
        for stage in TOGGLEABLE_STAGES {
            let active = self.activation.is_active(stage);
            self.engine
                .set_node_active(&self.nodes[stage as usize], active)?;
        }
        Ok(())
    }

    fn destroy_node_safe(&mut self, node: &NodeId) {
        if let Err(e) = self.engine.destroy_node(node) {
            error!(node = %node, error = %e, "failed to destroy node");
        }
    }

    /// Validate, generate and push a new scan configuration.
    ///
    /// On a validation failure nothing reaches the engine and the previous
    /// configuration stays active.
    pub fn apply_configuration(
        &mut self,
        bank: Arc<LaserBank>,
        configuration: ScanConfiguration,
    ) -> Result<usize> {
        let batch = ray_generator::generate(&bank, &configuration)?;
        self.reconfigure(bank, configuration, batch)?;
        Ok(self.ray_count)
    }

    /// Push an already generated batch into the ray stages and refresh noise
    /// parameters and activation. Node identities and connections are kept.
    ///
    /// On a backend failure the stages already updated get the previous
    /// arrays and parameters back, so the graph keeps matching
    /// [`Self::configuration`].
    #[instrument(
        name = "sensor_pipeline_reconfigure",
        skip(self, bank, configuration, batch),
        fields(sensor_id = %self.sensor_id, rays = batch.ray_count())
    )]
    pub fn reconfigure(
        &mut self,
        bank: Arc<LaserBank>,
        configuration: ScanConfiguration,
        batch: RayBatch,
    ) -> std::result::Result<(), GraphEngineError> {
        let ray_count = batch.ray_count();
        let rays = RayArrays::from(batch);

        let mut updated = 0;
        for stage in CONFIG_STAGES {
            let params = stage_params(stage, &rays, &configuration, &self.pose, &self.motion);
            if let Err(e) = self.engine.update_node(&self.nodes[stage as usize], params) {
                warn!(node = %self.node(stage), error = %e, "reconfiguration failed, restoring previous stages");
                self.restore_stages(&CONFIG_STAGES[..updated]);
                return Err(e);
            }
            updated += 1;
        }

        let previous_bank = std::mem::replace(&mut self.bank, bank);
        let previous_configuration = std::mem::replace(&mut self.configuration, configuration);
        let previous_rays = std::mem::replace(&mut self.rays, rays);
        let previous_ray_count = std::mem::replace(&mut self.ray_count, ray_count);

        if let Err(e) = self.refresh_activation() {
            warn!(error = %e, "stage activation failed, restoring previous configuration");
            self.bank = previous_bank;
            self.configuration = previous_configuration;
            self.rays = previous_rays;
            self.ray_count = previous_ray_count;
            self.restore_stages(&CONFIG_STAGES);
            self.restore_activation();
            return Err(e);
        }

        debug!(rays = ray_count, "pipeline reconfigured");
        Ok(())
    }

    /// Push the stored configuration back into `stages`, logging failures
    fn restore_stages(&mut self, stages: &[Stage]) {
        for &stage in stages {
            let params = stage_params(stage, &self.rays, &self.configuration, &self.pose, &self.motion);
            let node = self.node(stage).clone();
            if let Err(e) = self.engine.update_node(&node, params) {
                error!(node = %node, error = %e, "failed to restore stage parameters");
            }
        }
    }

    /// Push the stored activation into every toggleable stage, logging failures
    fn restore_activation(&mut self) {
        for stage in TOGGLEABLE_STAGES {
            let node = self.node(stage).clone();
            if let Err(e) = self.engine.set_node_active(&node, self.activation.is_active(stage)) {
                error!(node = %node, error = %e, "failed to restore stage activation");
            }
        }
    }

    /// Replace the runtime stage toggles
    pub fn set_toggles(&mut self, toggles: NoiseToggles) -> std::result::Result<(), GraphEngineError> {
        self.toggles = toggles;
        self.refresh_activation()
    }

    fn refresh_activation(&mut self) -> std::result::Result<(), GraphEngineError> {
        let next = StageActivation::evaluate(&self.toggles, &self.configuration.noise);
        for stage in TOGGLEABLE_STAGES {
            let active = next.is_active(stage);
            if active != self.activation.is_active(stage) {
                self.engine
                    .set_node_active(&self.nodes[stage as usize], active)?;
            }
        }
        self.activation = next;
        Ok(())
    }

    /// Push the sensor world pose and the motion since the previous capture
    pub fn update_pose(
        &mut self,
        pose: &Pose,
        motion: &MotionDelta,
    ) -> std::result::Result<(), GraphEngineError> {
        for stage in POSE_STAGES {
            let params = stage_params(stage, &self.rays, &self.configuration, pose, motion);
            self.engine
                .update_node(&self.nodes[stage as usize], params)?;
        }
        self.pose = *pose;
        self.motion = *motion;
        Ok(())
    }

    /// Run the whole subgraph once
    pub fn execute(&mut self) -> std::result::Result<(), GraphEngineError> {
        let root = self.node(Stage::Rays).clone();
        self.engine.execute(&root)
    }

    /// Field buffer of the last execution at an output stream
    pub fn retrieve(
        &self,
        output: FrameOutput,
        field: Field,
    ) -> std::result::Result<ResultBuffer, GraphEngineError> {
        self.engine.retrieve(self.node(output.stage()), field)
    }

    /// Attach a sink to the world-frame stream, compacted or not
    pub fn connect_to_world_frame(
        &mut self,
        sink: &NodeId,
        compacted: bool,
    ) -> std::result::Result<(), GraphEngineError> {
        let output = if compacted {
            FrameOutput::CompactedWorldFrame
        } else {
            FrameOutput::WorldFrame
        };
        let parent = self.node(output.stage()).clone();
        self.engine.connect(&parent, sink)
    }

    /// Attach a sink to the compacted sensor-local stream
    pub fn connect_to_lidar_frame(
        &mut self,
        sink: &NodeId,
    ) -> std::result::Result<(), GraphEngineError> {
        let parent = self.node(Stage::LidarFrame).clone();
        self.engine.connect(&parent, sink)
    }

    /// Destroy every stage node, last stage first.
    ///
    /// Keeps going after a failure and reports the first one.
    #[instrument(name = "sensor_pipeline_release", skip(self), fields(sensor_id = %self.sensor_id))]
    pub fn release(mut self) -> std::result::Result<(), GraphEngineError> {
        let mut first_error = None;
        for stage in Stage::ALL.iter().rev() {
            let node = self.node(*stage).clone();
            if let Err(e) = self.engine.destroy_node(&node) {
                error!(node = %node, error = %e, "failed to destroy node");
                first_error.get_or_insert(e);
            }
        }
        info!("sensor pipeline released");
        first_error.map_or(Ok(()), Err)
    }

    pub fn node(&self, stage: Stage) -> &NodeId {
        &self.nodes[stage as usize]
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn bank(&self) -> &Arc<LaserBank> {
        &self.bank
    }

    pub fn configuration(&self) -> &ScanConfiguration {
        &self.configuration
    }

    pub fn toggles(&self) -> NoiseToggles {
        self.toggles
    }

    pub fn activation(&self) -> StageActivation {
        self.activation
    }

    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}
