//! Seam snapping between patches of different levels.
//!
//! # The Seam Problem
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    T-JUNCTION ON A SHARED EDGE                  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   FINE PATCH (level L)           COARSE NEIGHBOR (level L-1)    │
//! │                                                                 │
//! │   * --- * --- * --- * --- *  │  o ----------- o ----------- o   │
//! │   |     |     |     |     |  │  |             |             |   │
//! │   * --- * --- * --- * --- *  │  |             |             |   │
//! │                           ▲  │                                  │
//! │           odd vertices sit on the sphere, the coarse edge is    │
//! │           a straight chord between its vertices → crack         │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Snapping
//!
//! For a neighbor `d` levels coarser, only every `2^d`-th fine edge vertex
//! coincides with a coarse vertex. The vertices in between are moved onto the
//! chord between their two enclosing shared vertices:
//!
//! ```text
//!   before:  A --- b --- C --- d --- E       (b, d bulge outward)
//!   after:   A ----b---- C ----d---- E       (b, d on chords AC, CE)
//! ```
//!
//! Normals are interpolated the same way and UVs recomputed from them.

use glam::{DVec3, Vec3};

use crate::sphere::{geodetic_uv, Direction2D};
use crate::types::PatchMesh;

/// Index of the `k`-th vertex along the edge facing `direction`.
///
/// `n` is the number of grid cells per edge. Vertices are laid out as
/// `i * (n + 1) + j`, so:
///
/// - `Xp` → `i = n`
/// - `Xn` → `i = 0`
/// - `Yp` → `j = n`
/// - `Yn` → `j = 0`
#[inline]
pub fn edge_vertex_index(direction: Direction2D, k: usize, n: usize) -> usize {
  let stride = n + 1;
  match direction {
    Direction2D::Xp => n * stride + k,
    Direction2D::Xn => k,
    Direction2D::Yp => k * stride + n,
    Direction2D::Yn => k * stride,
  }
}

/// Snap every edge that faces a coarser neighbor.
///
/// `coarser_edges[dir]` is the level delta to the neighbor in that direction
/// (0 leaves the edge untouched).
pub fn snap_coarser_edges(mesh: &mut PatchMesh, n: usize, coarser_edges: &[u32; 4]) {
  for direction in Direction2D::ALL {
    let delta = coarser_edges[direction.index()];
    if delta > 0 {
      snap_edge(mesh, n, direction, delta);
    }
  }
}

fn snap_edge(mesh: &mut PatchMesh, n: usize, direction: Direction2D, delta: u32) {
  // A neighbor more levels coarser than the grid is fine collapses the whole
  // edge onto a single chord.
  let step = 1usize.checked_shl(delta).unwrap_or(usize::MAX).min(n);
  if step <= 1 {
    return;
  }

  for k0 in (0..n).step_by(step) {
    let k1 = k0 + step;
    let a = edge_vertex_index(direction, k0, n);
    let b = edge_vertex_index(direction, k1, n);

    let pa = Vec3::from_array(mesh.positions[a]);
    let pb = Vec3::from_array(mesh.positions[b]);
    let na = DVec3::from_array(mesh.normals[a].map(f64::from));
    let nb = DVec3::from_array(mesh.normals[b].map(f64::from));

    for k in (k0 + 1)..k1 {
      let t = (k - k0) as f32 / step as f32;
      let index = edge_vertex_index(direction, k, n);
      let normal = na.lerp(nb, t as f64).normalize_or_zero();

      mesh.positions[index] = pa.lerp(pb, t).to_array();
      mesh.normals[index] = normal.as_vec3().to_array();
      mesh.uvs[index] = geodetic_uv(normal).to_array();
    }
  }
}

#[cfg(test)]
#[path = "seams_test.rs"]
mod seams_test;
