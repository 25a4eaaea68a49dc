//! GraphEngine trait - external raytracing backend interface
//!
//! The backend is an opaque DAG executor. Nodes are created once under stable
//! string identifiers and only their parameters and activation change afterwards.

use std::fmt;
use std::sync::Arc;

use nalgebra::{Matrix4, Vector2, Vector3};

use crate::{Field, GraphEngineError, ResultBuffer};

/// Stable node identifier, chosen at subgraph construction
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// `"{owner}/{stage}"`
    pub fn scoped(owner: &str, stage: &str) -> Self {
        Self(Arc::from(format!("{owner}/{stage}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:?})", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Node kind together with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum NodeParams {
    /// Emit rays from poses
    RaysFromMat { poses: Arc<[Matrix4<f64>]> },
    /// Per-ray (min, max) range window
    RaysSetRange { ranges: Arc<[Vector2<f64>]> },
    /// Per-laser ring ids
    RaysSetRingIds { ring_ids: Arc<[i32]> },
    /// Per-ray emission time (milliseconds)
    RaysSetTimeOffsets { offsets_ms: Arc<[f64]> },
    /// Motion since the previous capture
    VelocityDistortion {
        translation: Vector3<f64>,
        rotation: Vector3<f64>,
    },
    /// Sensor world pose applied to every ray
    RaysTransform { transform: Matrix4<f64> },
    /// Angular noise applied to ray directions
    GaussianNoiseAngularRay { mean_rad: f64, std_dev_rad: f64 },
    /// Intersection query against the scene, bounded by the range window
    Raycast { beam_divergence_rad: f64 },
    /// Angular noise applied to hit points
    GaussianNoiseAngularHitpoint { mean_rad: f64, std_dev_rad: f64 },
    /// Distance noise
    GaussianNoiseDistance {
        mean: f64,
        std_dev_base: f64,
        std_dev_rise_per_meter: f64,
    },
    /// Drop non-hit entries
    Compact,
    /// Transform points, e.g. world to sensor-local
    PointsTransform { transform: Matrix4<f64> },
    /// Externally owned consumer
    Sink { label: String },
}

impl NodeParams {
    /// Kind name, stable across parameter updates
    pub fn kind(&self) -> &'static str {
        match self {
            NodeParams::RaysFromMat { .. } => "rays_from_mat",
            NodeParams::RaysSetRange { .. } => "rays_set_range",
            NodeParams::RaysSetRingIds { .. } => "rays_set_ring_ids",
            NodeParams::RaysSetTimeOffsets { .. } => "rays_set_time_offsets",
            NodeParams::VelocityDistortion { .. } => "velocity_distortion",
            NodeParams::RaysTransform { .. } => "rays_transform",
            NodeParams::GaussianNoiseAngularRay { .. } => "gaussian_noise_angular_ray",
            NodeParams::Raycast { .. } => "raycast",
            NodeParams::GaussianNoiseAngularHitpoint { .. } => "gaussian_noise_angular_hitpoint",
            NodeParams::GaussianNoiseDistance { .. } => "gaussian_noise_distance",
            NodeParams::Compact => "compact",
            NodeParams::PointsTransform { .. } => "points_transform",
            NodeParams::Sink { .. } => "sink",
        }
    }
}

/// Graph Engine interface
///
/// Injected into each sensor pipeline. A sensor exclusively owns the nodes it
/// creates; implementations are expected to be cheap handles onto the backend.
pub trait GraphEngine {
    /// Create a named node
    fn create_node(&mut self, id: &NodeId, params: NodeParams) -> Result<(), GraphEngineError>;

    /// Replace the parameters of an existing node; the node kind must not change
    fn update_node(&mut self, id: &NodeId, params: NodeParams) -> Result<(), GraphEngineError>;

    /// Toggle a node; inactive nodes pass their input through unchanged
    fn set_node_active(&mut self, id: &NodeId, active: bool) -> Result<(), GraphEngineError>;

    /// Connect `parent` output to `child` input
    fn connect(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), GraphEngineError>;

    /// Execute the subgraph reachable from `root`
    fn execute(&mut self, root: &NodeId) -> Result<(), GraphEngineError>;

    /// Typed result buffer of the last execution at `node`
    fn retrieve(&self, node: &NodeId, field: Field) -> Result<ResultBuffer, GraphEngineError>;

    /// Release a node and its connections
    fn destroy_node(&mut self, id: &NodeId) -> Result<(), GraphEngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_ids_are_stable() {
        let a = NodeId::scoped("roof", "raycast");
        let b = NodeId::scoped("roof", "raycast");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "roof/raycast");
    }

    #[test]
    fn kind_ignores_parameters() {
        let a = NodeParams::Raycast {
            beam_divergence_rad: 0.0,
        };
        let b = NodeParams::Raycast {
            beam_divergence_rad: 0.003,
        };
        assert_eq!(a.kind(), b.kind());
        assert_ne!(a.kind(), NodeParams::Compact.kind());
    }
}
