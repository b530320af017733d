//! Core data types shared by the mesh builder and the patch controller.

/// Opaque material reference handed through to the render glue.
///
/// The terrain never interprets it; every patch of a sphere carries the
/// sphere's handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Axis-aligned bounding box.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxAABB {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl MinMaxAABB {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: [f32::INFINITY; 3],
      max: [f32::NEG_INFINITY; 3],
    }
  }

  /// Expand AABB to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: [f32; 3]) {
    for i in 0..3 {
      self.min[i] = self.min[i].min(point[i]);
      self.max[i] = self.max[i].max(point[i]);
    }
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Triangle mesh of one terrain patch.
///
/// Positions are relative to the patch origin so they stay small enough for
/// single precision regardless of the body radius.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchMesh {
  /// Vertex positions relative to the patch origin.
  pub positions: Vec<[f32; 3]>,
  /// Unit surface normals (parallel to `positions`).
  pub normals: Vec<[f32; 3]>,
  /// Equirectangular texture coordinates (parallel to `positions`).
  pub uvs: Vec<[f32; 2]>,
  /// Triangle indices (3 per triangle).
  pub indices: Vec<u16>,
  /// Bounds of `positions`.
  pub bounds: MinMaxAABB,
  /// Time spent building, in microseconds.
  pub build_time_us: u64,
}

impl PatchMesh {
  /// Returns true if no geometry was generated.
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn vertex_count(&self) -> usize {
    self.positions.len()
  }

  /// Number of triangles in the mesh.
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Approximate heap footprint of the buffers in bytes.
  pub fn memory_bytes(&self) -> usize {
    self.positions.len() * std::mem::size_of::<[f32; 3]>()
      + self.normals.len() * std::mem::size_of::<[f32; 3]>()
      + self.uvs.len() * std::mem::size_of::<[f32; 2]>()
      + self.indices.len() * std::mem::size_of::<u16>()
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
