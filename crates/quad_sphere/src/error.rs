//! Error taxonomy for terrain tessellation.
//!
//! Configuration errors and invariant violations are reported as
//! [`TerrainError`]. Transient conditions (no POIs yet, a sibling still
//! rebuilding) are not errors: the controller simply re-evaluates next step.

use crate::quadtree::NodeId;

/// Errors surfaced by the quadtree, the mesh builder and the patch controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
  /// The patch grid would need more vertices than a 16-bit index buffer holds.
  #[error(
    "patch grid with {subdivisions} edge subdivisions needs {vertices} vertices, limit is {limit}"
  )]
  MeshTooLarge {
    subdivisions: u32,
    vertices: usize,
    limit: usize,
  },

  /// A size, radius or distance is zero, negative or not finite.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// Tried to subdivide a node that already has children.
  #[error("node {0:?} is already subdivided")]
  AlreadySubdivided(NodeId),

  /// Tried to subdivide a node at the hard depth limit.
  #[error("node {node:?} is at the depth limit {limit}")]
  DepthLimit { node: NodeId, limit: u32 },

  /// Tried to turn a leaf into a leaf.
  #[error("node {0:?} has no children")]
  NotSubdivided(NodeId),

  /// Tried to unsubdivide a level 0 patch.
  #[error("level 0 patches cannot be unsubdivided")]
  UnsubdivideRoot,

  /// The node id is stale or was never allocated.
  #[error("node {0:?} does not exist")]
  NodeNotFound(NodeId),

  /// The leaf has no materialized patch.
  #[error("node {0:?} carries no patch")]
  MissingPatch(NodeId),

  /// The worker running a mesh build went away before delivering a result.
  #[error("mesh build {0} was abandoned by its worker")]
  BuildAbandoned(u64),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TerrainError>;
