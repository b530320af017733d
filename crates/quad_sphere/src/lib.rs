//! quad_sphere - Engine independent planet terrain with a floating origin
//!
//! This crate tessellates a spherical body as six adaptive quadtrees (one per
//! cube face) whose leaves carry terrain patches, and keeps single precision
//! simulation space numerically stable at any distance from the global origin
//! by re-centering the scene frame on the tracked object.
//!
//! # Features
//!
//! - **Quadtree LOD**: Patches subdivide near points of interest and merge
//!   back with a factor 2 hysteresis
//! - **Neighbor Stitching**: Weak edge references between adjacent patches;
//!   edges facing coarser neighbors are snapped to avoid cracks
//! - **Parallel Mesh Builds**: Patch meshes are built on rayon and joined or
//!   polled at the end of each step
//! - **Floating Origin**: Double precision global positions, single precision
//!   local ones, and synchronous frame switch notifications
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quad_sphere::{
//!     GlobalPosition, LodQuadSphere, OffsetFrame, QuadSphereConfig, RayonDispatcher,
//! };
//!
//! let config = QuadSphereConfig::new(600_000.0);
//! let mut sphere = LodQuadSphere::new(config, Arc::new(RayonDispatcher::new()), glam::Vec3::ZERO)?;
//!
//! let frame = OffsetFrame::new(GlobalPosition::ZERO);
//! let report = sphere.step(&[GlobalPosition::new(610_000.0, 0.0, 0.0)], &frame)?;
//!
//! println!("{} subdivisions, {} meshes", report.subdivisions, report.builds_completed);
//! for event in sphere.drain_events() {
//!     // upload or drop meshes
//! }
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::{
  edge_vertex_count, patch_vertex_count, DEFAULT_EDGE_SUBDIVISIONS, DEFAULT_HARD_LIMIT_LEVEL,
  DEFAULT_MAX_FLOATING_ORIGIN_RANGE, MAX_PATCH_VERTICES,
};
pub use error::{Result, TerrainError};
pub use types::{MaterialHandle, MinMaxAABB, PatchMesh};

// Cube-sphere and geodetic projection
pub mod sphere;
pub use sphere::{CubeFace, Direction2D, Geodetic};

// Arena quadtree per face
pub mod quadtree;
pub use quadtree::{Bounds2, NodeId, QuadTree};

// Patch mesh generation
pub mod mesh;
pub use mesh::{build_patch_mesh, MeshRequest};

// Build dispatch (rayon + crossbeam)
pub mod threading;
pub use threading::{
  BuildCompletion, BuildHandle, InlineDispatcher, MeshDispatcher, RayonDispatcher,
};

// Terrain patches and stitching
pub mod patch;
pub use patch::{Patch, PatchState, StateRequest};

// LOD controller
pub mod config;
pub mod lod_sphere;
pub use config::QuadSphereConfig;
pub use lod_sphere::{LodQuadSphere, PatchKey, SphereStats, StepReport, TerrainEvent};

// Floating origin
pub mod reference_frame;
pub use reference_frame::{
  FrameConfig, FrameSwitch, FrameSwitchResponder, GlobalPosition, LocalPosition, OffsetFrame,
  ReferenceFrame, ReferenceFrameManager, SharedFrame, TrailBuffer,
};

pub mod scene;
pub use scene::{FloatingOriginScene, SceneStepReport, TrackedObject};

// Build statistics
pub mod metrics;
pub use metrics::{BuildMetrics, RollingWindow};
