//! Patch mesh builder.
//!
//! A pure function of its request, so it can run on any worker thread.

use glam::{DVec2, Vec3};
use web_time::Instant;

use super::seams::snap_coarser_edges;
use crate::constants::{MAX_PATCH_VERTICES, ROOT_FACE_SIZE};
use crate::error::{Result, TerrainError};
use crate::sphere::{geodetic_uv, CubeFace};
use crate::types::{MinMaxAABB, PatchMesh};

/// Everything needed to build one patch mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRequest {
  pub face: CubeFace,
  /// Grid cells per edge = `2^edge_subdivisions`.
  pub edge_subdivisions: u32,
  /// Patch center in face space.
  pub center: DVec2,
  /// Quadtree level; face-space size is `2 / 2^level`.
  pub level: u32,
  /// Patch origin in body space; vertex positions are relative to it.
  pub origin: Vec3,
  /// Body radius.
  pub radius: f64,
  /// Per [`crate::sphere::Direction2D`] slot: how many levels coarser the
  /// stitched neighbor is (0 = same level, finer, or none).
  pub coarser_edges: [u32; 4],
}

impl MeshRequest {
  /// Face-space edge length of the patch.
  #[inline]
  pub fn size(&self) -> f64 {
    ROOT_FACE_SIZE * 0.5f64.powi(self.level as i32)
  }

  /// Grid cells per edge.
  #[inline]
  pub fn cells_per_edge(&self) -> usize {
    1usize << self.edge_subdivisions
  }

  /// Vertex count of the grid, or `None` if it does not fit in `usize`.
  fn checked_vertex_count(&self) -> Option<usize> {
    let n = 1usize.checked_shl(self.edge_subdivisions)?.checked_add(1)?;
    n.checked_mul(n)
  }

  /// Reject requests that cannot produce a valid mesh.
  ///
  /// Runs before any buffer is allocated.
  pub fn validate(&self) -> Result<()> {
    let vertices = self.checked_vertex_count().unwrap_or(usize::MAX);
    if vertices > MAX_PATCH_VERTICES {
      return Err(TerrainError::MeshTooLarge {
        subdivisions: self.edge_subdivisions,
        vertices,
        limit: MAX_PATCH_VERTICES,
      });
    }
    if !self.radius.is_finite() || self.radius <= 0.0 {
      return Err(TerrainError::InvalidConfig(format!(
        "radius must be positive and finite, got {}",
        self.radius
      )));
    }
    if !self.center.is_finite() || !self.origin.is_finite() {
      return Err(TerrainError::InvalidConfig(format!(
        "patch center {:?} and origin {:?} must be finite",
        self.center, self.origin
      )));
    }
    Ok(())
  }
}

/// Build the triangle grid for one patch.
///
/// Vertex `(i, j)` (i along face x, j along face y) is stored at
/// `i * (N + 1) + j`.
#[cfg_attr(
  feature = "trace_spans",
  tracing::instrument(skip_all, name = "mesh::build_patch_mesh")
)]
pub fn build_patch_mesh(request: &MeshRequest) -> Result<PatchMesh> {
  let start = Instant::now();
  request.validate()?;

  let n = request.cells_per_edge();
  let stride = n + 1;
  let vertex_count = stride * stride;

  let size = request.size();
  let min = request.center - DVec2::splat(size * 0.5);
  let spacing = size / n as f64;
  let origin = request.origin.as_dvec3();

  let mut mesh = PatchMesh {
    positions: Vec::with_capacity(vertex_count),
    normals: Vec::with_capacity(vertex_count),
    uvs: Vec::with_capacity(vertex_count),
    indices: Vec::with_capacity(n * n * 6),
    ..Default::default()
  };

  for i in 0..stride {
    for j in 0..stride {
      let face_point = min + DVec2::new(i as f64, j as f64) * spacing;
      let direction = request.face.sphere_point_at(face_point);
      let position = direction * request.radius - origin;

      mesh.positions.push(position.as_vec3().to_array());
      mesh.normals.push(direction.as_vec3().to_array());
      mesh.uvs.push(geodetic_uv(direction).to_array());
    }
  }

  snap_coarser_edges(&mut mesh, n, &request.coarser_edges);

  // (N + 1)² <= u16::MAX was checked above, so every index fits.
  for i in 0..n {
    for j in 0..n {
      let a = (i * stride + j) as u16;
      let b = (i * stride + j + 1) as u16;
      let c = ((i + 1) * stride + j) as u16;
      let d = ((i + 1) * stride + j + 1) as u16;
      mesh.indices.extend_from_slice(&[a, c, d, a, d, b]);
    }
  }

  let mut bounds = MinMaxAABB::empty();
  for p in &mesh.positions {
    bounds.encapsulate(*p);
  }
  mesh.bounds = bounds;
  mesh.build_time_us = start.elapsed().as_micros() as u64;

  Ok(mesh)
}
