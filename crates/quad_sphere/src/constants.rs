//! Layout and policy constants for quad-sphere patches.
//!
//! # Patch Grid Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PATCH GRID (N = 2^s)                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   j=N  B ─── D ─── o ─── o        Vertex (i, j) lives at                │
//! │        │   ╱ │   ╱ │   ╱ │          index = i * (N + 1) + j             │
//! │        │  ╱  │  ╱  │  ╱  │                                              │
//! │        A ─── C ─── o ─── o        Each cell → 2 triangles:              │
//! │        │   ╱ │   ╱ │   ╱ │          (A, C, D) and (A, D, B)             │
//! │   j=0  o ─── o ─── o ─── o                                              │
//! │       i=0                i=N      (N + 1)² vertices, 6·N² indices       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Indices are stored as `u16`, so `(N + 1)²` must stay at or below
//! [`MAX_PATCH_VERTICES`]. With `s = 7` a patch has 129² = 16641 vertices;
//! `s = 8` (257² = 66049) no longer fits.

/// Upper bound on vertices per patch mesh (16-bit index buffer).
pub const MAX_PATCH_VERTICES: usize = u16::MAX as usize;

/// Default number of grid subdivisions applied along each patch edge.
pub const DEFAULT_EDGE_SUBDIVISIONS: u32 = 7;

/// Default deepest quadtree level a patch may reach.
pub const DEFAULT_HARD_LIMIT_LEVEL: u32 = 16;

/// Edge length of a level 0 face in face space (`[-1, 1]²`).
pub const ROOT_FACE_SIZE: f64 = 2.0;

/// Unsubdivide only once every POI is this many times the child's
/// subdivision distance away from the parent origin.
pub const UNSUBDIVIDE_HYSTERESIS: f64 = 2.0;

/// Directional acceptance cone for neighbor stitching: cos(45°) + 0.025.
///
/// Candidates exactly on a diagonal (corner contacts) fall outside the cone.
pub const COS_45_DEG_PLUS_EPSILON: f64 = std::f64::consts::FRAC_1_SQRT_2 + 0.025;

/// Default radius around the local origin inside which the tracked object may
/// move before the scene frame is re-centered.
pub const DEFAULT_MAX_FLOATING_ORIGIN_RANGE: f32 = 8192.0;

/// Number of frame switches remembered by the reference frame manager.
pub const FRAME_HISTORY_CAPACITY: usize = 64;

/// Number of vertices along one patch edge for a subdivision count.
#[inline]
pub const fn edge_vertex_count(edge_subdivisions: u32) -> usize {
  (1usize << edge_subdivisions) + 1
}

/// Total vertex count of a patch grid for a subdivision count.
#[inline]
pub const fn patch_vertex_count(edge_subdivisions: u32) -> usize {
  let n = edge_vertex_count(edge_subdivisions);
  n * n
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
