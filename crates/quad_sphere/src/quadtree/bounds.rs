//! Axis-aligned rectangle with double precision face coordinates.

use glam::DVec2;

/// Double-precision axis-aligned rectangle in face space.
///
/// Used for node bounds and for overlap queries when stitching neighbors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
  /// Minimum corner (inclusive).
  pub min: DVec2,
  /// Maximum corner (inclusive).
  pub max: DVec2,
}

impl Bounds2 {
  /// Create a new rectangle from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on both axes.
  pub fn new(min: DVec2, max: DVec2) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y,
      "Bounds min must be <= max on both axes"
    );
    Self { min, max }
  }

  /// Create a square from its center and edge length.
  pub fn from_center_size(center: DVec2, size: f64) -> Self {
    let half = DVec2::splat(size * 0.5);
    Self {
      min: center - half,
      max: center + half,
    }
  }

  /// Check if this rectangle overlaps another.
  ///
  /// Shared edges and corners count as overlapping, which is what makes
  /// edge-adjacent leaves show up in neighbor queries.
  #[inline]
  pub fn overlaps(&self, other: &Bounds2) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
  }

  /// Check if this rectangle contains a point.
  #[inline]
  pub fn contains_point(&self, point: DVec2) -> bool {
    point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
  }

  /// Get the size of the rectangle (max - min).
  #[inline]
  pub fn size(&self) -> DVec2 {
    self.max - self.min
  }

  /// Get the center of the rectangle.
  #[inline]
  pub fn center(&self) -> DVec2 {
    (self.min + self.max) * 0.5
  }
}
