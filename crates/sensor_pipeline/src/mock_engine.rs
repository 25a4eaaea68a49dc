//! Mock Graph Engine
//!
//! In-process stand-in for the raytracing backend, used by tests and the CLI.
//! Every call is appended to a shared [`Journal`]; failures can be injected
//! per node. Raycasts hit an imaginary sphere of radius `hit_distance` around
//! each ray origin, so a ray hits exactly when `hit_distance` lies inside its
//! range window.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{Field, GraphEngine, GraphEngineError, NodeId, NodeParams, ResultBuffer, Vec3f};
use nalgebra::{Matrix4, Point3, Vector2, Vector3};
use tracing::{instrument, trace};

/// One recorded backend interaction
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create { node: NodeId, kind: &'static str },
    Update { node: NodeId, kind: &'static str },
    SetActive { node: NodeId, active: bool },
    Connect { parent: NodeId, child: NodeId },
    Execute { root: NodeId },
    Destroy { node: NodeId },
    /// Recorded by [`crate::MockSceneProvider`]
    SceneRefresh,
    /// Free-form entry recorded by observers
    Marker(String),
}

/// Shared, append-only call log
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<EngineCall>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EngineCall>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, call: EngineCall) {
        self.lock().push(call);
    }

    pub fn mark(&self, label: impl Into<String>) {
        self.record(EngineCall::Marker(label.into()));
    }

    /// Snapshot of every entry so far
    pub fn entries(&self) -> Vec<EngineCall> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Index of the first entry matching `pred`
    pub fn position(&self, pred: impl Fn(&EngineCall) -> bool) -> Option<usize> {
        self.lock().iter().position(pred)
    }

    /// Index of the last entry matching `pred`
    pub fn rposition(&self, pred: impl Fn(&EngineCall) -> bool) -> Option<usize> {
        self.lock().iter().rposition(pred)
    }
}

/// Mock engine configuration (failure injection)
#[derive(Debug, Clone)]
pub struct MockEngineConfig {
    /// Distance at which every ray hits
    pub hit_distance: f64,
    /// Node ids whose creation fails
    pub fail_create: Vec<String>,
    /// Node ids whose parameter updates fail
    pub fail_update: Vec<String>,
    /// Root node ids whose execution fails
    pub fail_execute: Vec<String>,
}

impl Default for MockEngineConfig {
    fn default() -> Self {
        Self {
            hit_distance: 10.0,
            fail_create: Vec::new(),
            fail_update: Vec::new(),
            fail_execute: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct MockNode {
    params: NodeParams,
    active: bool,
    children: Vec<NodeId>,
}

/// Stream flowing through the mock graph during one execution
#[derive(Debug, Clone)]
struct Stream {
    poses: Arc<[Matrix4<f64>]>,
    ranges: Arc<[Vector2<f64>]>,
    ring_ids: Arc<[i32]>,
    time_offsets: Arc<[f64]>,
    transform: Matrix4<f64>,
    points: Option<Points>,
}

impl Default for Stream {
    fn default() -> Self {
        Self {
            poses: Arc::from(Vec::new()),
            ranges: Arc::from(Vec::new()),
            ring_ids: Arc::from(Vec::new()),
            time_offsets: Arc::from(Vec::new()),
            transform: Matrix4::identity(),
            points: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Points {
    xyz: Vec<Vec3f>,
    distance: Vec<f32>,
    ring_id: Vec<i32>,
    time_stamp: Vec<f64>,
    is_hit: Vec<i32>,
}

#[derive(Debug, Default)]
struct MockState {
    nodes: HashMap<NodeId, MockNode>,
    outputs: HashMap<NodeId, Points>,
    fail_execute: HashSet<String>,
    executions: u64,
}

/// Mock Graph Engine.
///
/// Cloning yields another handle onto the same backend and journal.
#[derive(Debug, Clone)]
pub struct MockGraphEngine {
    config: Arc<MockEngineConfig>,
    state: Arc<Mutex<MockState>>,
    journal: Journal,
}

impl MockGraphEngine {
    pub fn new() -> Self {
        Self::with_config(MockEngineConfig::default())
    }

    pub fn with_config(config: MockEngineConfig) -> Self {
        let state = MockState {
            fail_execute: config.fail_execute.iter().cloned().collect(),
            ..MockState::default()
        };
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
            journal: Journal::new(),
        }
    }

    /// Handle onto the shared call log
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Make every following execution rooted at `root` fail
    pub fn fail_execution_of(&self, root: &NodeId) {
        self.lock().fail_execute.insert(root.to_string());
    }

    /// Undo [`Self::fail_execution_of`]
    pub fn restore_execution_of(&self, root: &NodeId) {
        self.lock().fail_execute.remove(root.as_str());
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.lock().nodes.contains_key(id)
    }

    /// Current parameters of a node
    pub fn node_params(&self, id: &NodeId) -> Option<NodeParams> {
        self.lock().nodes.get(id).map(|node| node.params.clone())
    }

    pub fn is_active(&self, id: &NodeId) -> Option<bool> {
        self.lock().nodes.get(id).map(|node| node.active)
    }

    /// Direct children of a node, connection order
    pub fn children(&self, id: &NodeId) -> Vec<NodeId> {
        self.lock()
            .nodes
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Successful executions so far
    pub fn executions(&self) -> u64 {
        self.lock().executions
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn missing(id: &NodeId) -> GraphEngineError {
        GraphEngineError::new(id.as_str(), "node does not exist")
    }

    fn evaluate(&self, state: &mut MockState, id: &NodeId, mut stream: Stream) {
        let Some(node) = state.nodes.get(id).cloned() else {
            return;
        };

        if node.active {
            self.apply(&node.params, &mut stream);
        }
        if let Some(points) = &stream.points {
            state.outputs.insert(id.clone(), points.clone());
        }
        for child in &node.children {
            self.evaluate(state, child, stream.clone());
        }
    }

    fn apply(&self, params: &NodeParams, stream: &mut Stream) {
        match params {
            NodeParams::RaysFromMat { poses } => stream.poses = poses.clone(),
            NodeParams::RaysSetRange { ranges } => stream.ranges = ranges.clone(),
            NodeParams::RaysSetRingIds { ring_ids } => stream.ring_ids = ring_ids.clone(),
            NodeParams::RaysSetTimeOffsets { offsets_ms } => {
                stream.time_offsets = offsets_ms.clone()
            }
            NodeParams::RaysTransform { transform } => stream.transform = *transform,
            NodeParams::Raycast { .. } => stream.points = Some(self.raycast(stream)),
            NodeParams::Compact => {
                if let Some(points) = stream.points.as_mut() {
                    compact(points);
                }
            }
            NodeParams::PointsTransform { transform } => {
                if let Some(points) = stream.points.as_mut() {
                    for p in &mut points.xyz {
                        let moved = transform.transform_point(&Point3::new(
                            p.x as f64, p.y as f64, p.z as f64,
                        ));
                        *p = Vec3f::new(moved.x as f32, moved.y as f32, moved.z as f32);
                    }
                }
            }
            // noise and distortion are deterministic pass-throughs here
            NodeParams::VelocityDistortion { .. }
            | NodeParams::GaussianNoiseAngularRay { .. }
            | NodeParams::GaussianNoiseAngularHitpoint { .. }
            | NodeParams::GaussianNoiseDistance { .. }
            | NodeParams::Sink { .. } => {}
        }
    }

    fn raycast(&self, stream: &Stream) -> Points {
        let d = self.config.hit_distance;
        let mut points = Points::default();

        for (i, pose) in stream.poses.iter().enumerate() {
            let world = stream.transform * pose;
            let origin: Vector3<f64> = world.fixed_view::<3, 1>(0, 3).into_owned();
            let direction: Vector3<f64> = world.fixed_view::<3, 1>(0, 2).normalize();
            let window = stream
                .ranges
                .get(i)
                .copied()
                .unwrap_or_else(|| Vector2::new(0.0, f64::INFINITY));
            let hit = window.x <= d && d <= window.y;
            let reach = if hit { d } else { window.y.min(d) };
            let p: Vector3<f64> = origin + direction * reach;

            points.xyz.push(Vec3f::new(p.x as f32, p.y as f32, p.z as f32));
            points.distance.push(reach as f32);
            points.ring_id.push(if stream.ring_ids.is_empty() {
                0
            } else {
                stream.ring_ids[i % stream.ring_ids.len()]
            });
            points
                .time_stamp
                .push(stream.time_offsets.get(i).copied().unwrap_or_default());
            points.is_hit.push(i32::from(hit));
        }
        points
    }
}

impl Default for MockGraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn compact(points: &mut Points) {
    let hits: Vec<usize> = (0..points.is_hit.len())
        .filter(|&i| points.is_hit[i] == 1)
        .collect();
    *points = Points {
        xyz: hits.iter().map(|&i| points.xyz[i]).collect(),
        distance: hits.iter().map(|&i| points.distance[i]).collect(),
        ring_id: hits.iter().map(|&i| points.ring_id[i]).collect(),
        time_stamp: hits.iter().map(|&i| points.time_stamp[i]).collect(),
        is_hit: vec![1; hits.len()],
    };
}

impl GraphEngine for MockGraphEngine {
    #[instrument(name = "mock_engine_create_node", skip(self, params), fields(node = %id, kind = params.kind()))]
    fn create_node(&mut self, id: &NodeId, params: NodeParams) -> Result<(), GraphEngineError> {
        if self.config.fail_create.iter().any(|f| f == id.as_str()) {
            return Err(GraphEngineError::new(id.as_str(), "mock create failure"));
        }

        let mut state = self.lock();
        if state.nodes.contains_key(id) {
            return Err(GraphEngineError::new(id.as_str(), "node already exists"));
        }
        self.journal.record(EngineCall::Create {
            node: id.clone(),
            kind: params.kind(),
        });
        state.nodes.insert(
            id.clone(),
            MockNode {
                params,
                active: true,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    fn update_node(&mut self, id: &NodeId, params: NodeParams) -> Result<(), GraphEngineError> {
        if self.config.fail_update.iter().any(|f| f == id.as_str()) {
            return Err(GraphEngineError::new(id.as_str(), "mock update failure"));
        }

        let mut state = self.lock();
        let node = state.nodes.get_mut(id).ok_or_else(|| Self::missing(id))?;
        if node.params.kind() != params.kind() {
            return Err(GraphEngineError::new(
                id.as_str(),
                format!("cannot change kind {} to {}", node.params.kind(), params.kind()),
            ));
        }
        trace!(node = %id, kind = params.kind(), "mock node updated");
        self.journal.record(EngineCall::Update {
            node: id.clone(),
            kind: params.kind(),
        });
        node.params = params;
        Ok(())
    }

    fn set_node_active(&mut self, id: &NodeId, active: bool) -> Result<(), GraphEngineError> {
        let mut state = self.lock();
        let node = state.nodes.get_mut(id).ok_or_else(|| Self::missing(id))?;
        self.journal.record(EngineCall::SetActive {
            node: id.clone(),
            active,
        });
        node.active = active;
        Ok(())
    }

    fn connect(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), GraphEngineError> {
        let mut state = self.lock();
        if !state.nodes.contains_key(child) {
            return Err(Self::missing(child));
        }
        let node = state.nodes.get_mut(parent).ok_or_else(|| Self::missing(parent))?;
        if !node.children.contains(child) {
            node.children.push(child.clone());
        }
        self.journal.record(EngineCall::Connect {
            parent: parent.clone(),
            child: child.clone(),
        });
        Ok(())
    }

    #[instrument(name = "mock_engine_execute", skip(self), fields(root = %root))]
    fn execute(&mut self, root: &NodeId) -> Result<(), GraphEngineError> {
        let mut state = self.lock();
        if !state.nodes.contains_key(root) {
            return Err(Self::missing(root));
        }
        if state.fail_execute.contains(root.as_str()) {
            return Err(GraphEngineError::new(root.as_str(), "mock execution failure"));
        }

        self.journal.record(EngineCall::Execute { root: root.clone() });
        self.evaluate(&mut state, root, Stream::default());
        state.executions += 1;
        Ok(())
    }

    fn retrieve(&self, node: &NodeId, field: Field) -> Result<ResultBuffer, GraphEngineError> {
        let state = self.lock();
        if !state.nodes.contains_key(node) {
            return Err(Self::missing(node));
        }
        let points = state
            .outputs
            .get(node)
            .ok_or_else(|| GraphEngineError::new(node.as_str(), "no point data at node"))?;

        Ok(match field {
            Field::Xyz => ResultBuffer::from_slice(field, &points.xyz),
            Field::Distance => ResultBuffer::from_slice(field, &points.distance),
            Field::RingId => ResultBuffer::from_slice(field, &points.ring_id),
            Field::TimeStamp => ResultBuffer::from_slice(field, &points.time_stamp),
            Field::IsHit => ResultBuffer::from_slice(field, &points.is_hit),
        })
    }

    fn destroy_node(&mut self, id: &NodeId) -> Result<(), GraphEngineError> {
        let mut state = self.lock();
        if state.nodes.remove(id).is_none() {
            return Err(Self::missing(id));
        }
        state.outputs.remove(id);
        for node in state.nodes.values_mut() {
            node.children.retain(|child| child != id);
        }
        self.journal.record(EngineCall::Destroy { node: id.clone() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_ray() -> Arc<[Matrix4<f64>]> {
        Arc::from(vec![Matrix4::identity(), Matrix4::identity()])
    }

    fn chain(engine: &mut MockGraphEngine, windows: Vec<Vector2<f64>>) -> (NodeId, NodeId, NodeId) {
        let rays = NodeId::new("s/rays");
        let range = NodeId::new("s/range");
        let raycast = NodeId::new("s/raycast");
        let compact = NodeId::new("s/compact");
        engine
            .create_node(&rays, NodeParams::RaysFromMat { poses: forward_ray() })
            .unwrap();
        engine
            .create_node(&range, NodeParams::RaysSetRange { ranges: Arc::from(windows) })
            .unwrap();
        engine
            .create_node(&raycast, NodeParams::Raycast { beam_divergence_rad: 0.0 })
            .unwrap();
        engine.create_node(&compact, NodeParams::Compact).unwrap();
        engine.connect(&rays, &range).unwrap();
        engine.connect(&range, &raycast).unwrap();
        engine.connect(&raycast, &compact).unwrap();
        (rays, raycast, compact)
    }

    #[test]
    fn test_hits_inside_range_window() {
        let mut engine = MockGraphEngine::new();
        let (rays, raycast, compact) = chain(
            &mut engine,
            vec![Vector2::new(0.0, 100.0), Vector2::new(0.0, 5.0)],
        );
        engine.execute(&rays).unwrap();

        let hits: Vec<i32> = engine.retrieve(&raycast, Field::IsHit).unwrap().decode().unwrap();
        assert_eq!(hits, vec![1, 0]);

        let xyz: Vec<Vec3f> = engine.retrieve(&compact, Field::Xyz).unwrap().decode().unwrap();
        assert_eq!(xyz, vec![Vec3f::new(0.0, 0.0, 10.0)]);
    }

    #[test]
    fn test_inactive_compact_passes_through() {
        let mut engine = MockGraphEngine::new();
        let (rays, _, compact) = chain(
            &mut engine,
            vec![Vector2::new(0.0, 100.0), Vector2::new(0.0, 5.0)],
        );
        engine.set_node_active(&compact, false).unwrap();
        engine.execute(&rays).unwrap();
        let buffer = engine.retrieve(&compact, Field::Distance).unwrap();
        assert_eq!(buffer.count, 2);
    }

    #[test]
    fn test_injected_execute_failure() {
        let mut engine = MockGraphEngine::new();
        let (rays, _, _) = chain(&mut engine, vec![Vector2::new(0.0, 100.0); 2]);
        engine.fail_execution_of(&rays);
        let err = engine.execute(&rays).unwrap_err();
        assert_eq!(err.node, "s/rays");
        assert_eq!(engine.executions(), 0);

        engine.restore_execution_of(&rays);
        engine.execute(&rays).unwrap();
        assert_eq!(engine.executions(), 1);
    }

    #[test]
    fn test_update_cannot_change_kind() {
        let mut engine = MockGraphEngine::new();
        let (_, raycast, _) = chain(&mut engine, vec![]);
        assert!(engine.update_node(&raycast, NodeParams::Compact).is_err());
        assert!(engine
            .update_node(&raycast, NodeParams::Raycast { beam_divergence_rad: 0.01 })
            .is_ok());
    }

    #[test]
    fn test_destroy_removes_connections() {
        let mut engine = MockGraphEngine::new();
        let (_, raycast, compact) = chain(&mut engine, vec![]);
        engine.destroy_node(&compact).unwrap();
        assert!(engine.children(&raycast).is_empty());
        assert!(engine.destroy_node(&compact).is_err());
    }

    #[test]
    fn test_journal_shared_between_handles() {
        let engine = MockGraphEngine::new();
        let mut other = engine.clone();
        other.create_node(&NodeId::new("a"), NodeParams::Compact).unwrap();
        assert_eq!(engine.journal().len(), 1);
        assert!(engine.has_node(&NodeId::new("a")));
    }

    #[test]
    fn test_create_failure_injection() {
        let mut engine = MockGraphEngine::with_config(MockEngineConfig {
            fail_create: vec!["bad".to_string()],
            ..MockEngineConfig::default()
        });
        assert!(engine.create_node(&NodeId::new("bad"), NodeParams::Compact).is_err());
        assert_eq!(engine.node_count(), 0);
    }
}
