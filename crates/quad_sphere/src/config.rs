//! Configuration for a terrain sphere.

use crate::constants::{
  patch_vertex_count, DEFAULT_EDGE_SUBDIVISIONS, DEFAULT_HARD_LIMIT_LEVEL, MAX_PATCH_VERTICES,
};
use crate::error::{Result, TerrainError};
use crate::threading::BuildCompletion;
use crate::types::MaterialHandle;

/// Deepest level that still has distinct face-space centers in `f64`.
pub const MAX_HARD_LIMIT_LEVEL: u32 = 52;

/// Settings for [`crate::LodQuadSphere`].
#[derive(Clone, Debug, PartialEq)]
pub struct QuadSphereConfig {
  /// Body radius.
  pub radius: f64,
  /// Grid subdivisions per patch edge (`2^n` cells).
  pub edge_subdivisions: u32,
  /// Deepest quadtree level.
  pub hard_limit: u32,
  /// Subdivision distance of a level 0 patch; halves every level.
  pub root_subdivision_distance: f64,
  /// How outstanding builds are completed at the end of a step.
  pub build_completion: BuildCompletion,
  /// Passed through to every patch.
  pub material: MaterialHandle,
}

impl QuadSphereConfig {
  /// Defaults for a body of `radius`: subdivision starts within one diameter.
  pub fn new(radius: f64) -> Self {
    Self {
      radius,
      edge_subdivisions: DEFAULT_EDGE_SUBDIVISIONS,
      hard_limit: DEFAULT_HARD_LIMIT_LEVEL,
      root_subdivision_distance: radius * 2.0,
      build_completion: BuildCompletion::default(),
      material: MaterialHandle::default(),
    }
  }

  pub fn with_edge_subdivisions(mut self, edge_subdivisions: u32) -> Self {
    self.edge_subdivisions = edge_subdivisions;
    self
  }

  pub fn with_hard_limit(mut self, hard_limit: u32) -> Self {
    self.hard_limit = hard_limit;
    self
  }

  pub fn with_root_subdivision_distance(mut self, distance: f64) -> Self {
    self.root_subdivision_distance = distance;
    self
  }

  pub fn with_build_completion(mut self, mode: BuildCompletion) -> Self {
    self.build_completion = mode;
    self
  }

  pub fn with_material(mut self, material: MaterialHandle) -> Self {
    self.material = material;
    self
  }

  /// Subdivision distance at `level`.
  #[inline]
  pub fn subdivision_distance(&self, level: u32) -> f64 {
    self.root_subdivision_distance * 0.5f64.powi(level as i32)
  }

  /// Check every setting before any patch is built.
  pub fn validate(&self) -> Result<()> {
    if !self.radius.is_finite() || self.radius <= 0.0 {
      return Err(TerrainError::InvalidConfig(format!(
        "radius must be positive and finite, got {}",
        self.radius
      )));
    }
    if !self.root_subdivision_distance.is_finite() || self.root_subdivision_distance <= 0.0 {
      return Err(TerrainError::InvalidConfig(format!(
        "root subdivision distance must be positive and finite, got {}",
        self.root_subdivision_distance
      )));
    }
    // 2^16 + 1 squared already overflows the index width; larger shifts would
    // overflow the count itself.
    if self.edge_subdivisions >= 16
      || patch_vertex_count(self.edge_subdivisions) > MAX_PATCH_VERTICES
    {
      let vertices = if self.edge_subdivisions >= 16 {
        usize::MAX
      } else {
        patch_vertex_count(self.edge_subdivisions)
      };
      return Err(TerrainError::MeshTooLarge {
        subdivisions: self.edge_subdivisions,
        vertices,
        limit: MAX_PATCH_VERTICES,
      });
    }
    if self.hard_limit > MAX_HARD_LIMIT_LEVEL {
      return Err(TerrainError::InvalidConfig(format!(
        "hard limit {} exceeds {}",
        self.hard_limit, MAX_HARD_LIMIT_LEVEL
      )));
    }
    Ok(())
  }
}
