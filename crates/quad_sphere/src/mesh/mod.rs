//! Patch mesh generation.
//!
//! Turns one quadtree leaf into a triangle grid draped over the sphere.
//!
//! # Processing Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        INPUT (MeshRequest)                      │
//! │  face, center, level     - which square of which cube face      │
//! │  edge_subdivisions       - N = 2^s grid cells per edge          │
//! │  radius, origin          - body radius, patch origin            │
//! │  coarser_edges           - level delta to coarser neighbors     │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 1: Validation                          │
//! │    (N + 1)² must fit a u16 index buffer                         │
//! │    radius, center and origin must be finite                     │
//! │    Nothing is allocated before this passes                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 2: Vertex Grid                         │
//! │    face (x, y) → cube surface → unit sphere → × radius          │
//! │    position = sphere point - origin   (f64, stored as f32)      │
//! │    normal = unit sphere direction                               │
//! │    uv = equirectangular latitude / longitude                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 3: Seam Snapping                       │
//! │    Edges facing a coarser neighbor are re-placed on the         │
//! │    coarse neighbor's edge so no T-junction cracks appear        │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 4: Triangulation                       │
//! │    2 triangles per cell, counter-clockwise from outside         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`builder`]: `MeshRequest` and `build_patch_mesh`
//! - [`seams`]: edge snapping against coarser neighbors

pub mod builder;
pub mod seams;

pub use builder::{build_patch_mesh, MeshRequest};
pub use seams::{edge_vertex_index, snap_coarser_edges};
