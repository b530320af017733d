//! CubeFace - one of the six faces of the cube-sphere.

use glam::{DVec2, DVec3};

/// Cube face, named after the axis its outward normal points along.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CubeFace {
  Xp,
  Xn,
  Yp,
  Yn,
  Zp,
  Zn,
}

impl CubeFace {
  /// All faces in index order.
  pub const ALL: [CubeFace; 6] = [
    CubeFace::Xp,
    CubeFace::Xn,
    CubeFace::Yp,
    CubeFace::Yn,
    CubeFace::Zp,
    CubeFace::Zn,
  ];

  /// Stable index in `0..6`.
  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }

  /// Outward unit normal of the face.
  #[inline]
  pub fn normal(self) -> DVec3 {
    match self {
      CubeFace::Xp => DVec3::X,
      CubeFace::Xn => DVec3::NEG_X,
      CubeFace::Yp => DVec3::Y,
      CubeFace::Yn => DVec3::NEG_Y,
      CubeFace::Zp => DVec3::Z,
      CubeFace::Zn => DVec3::NEG_Z,
    }
  }

  /// Face-space +X axis expressed in body space.
  #[inline]
  pub fn right(self) -> DVec3 {
    match self {
      CubeFace::Xp => DVec3::NEG_Z,
      CubeFace::Xn => DVec3::Z,
      CubeFace::Yp | CubeFace::Yn | CubeFace::Zp => DVec3::X,
      CubeFace::Zn => DVec3::NEG_X,
    }
  }

  /// Face-space +Y axis expressed in body space.
  #[inline]
  pub fn up(self) -> DVec3 {
    match self {
      CubeFace::Yp => DVec3::NEG_Z,
      CubeFace::Yn => DVec3::Z,
      CubeFace::Xp | CubeFace::Xn | CubeFace::Zp | CubeFace::Zn => DVec3::Y,
    }
  }

  /// Face whose normal is the dominant axis of `v`.
  ///
  /// Ties resolve in X, Y, Z order. A zero vector maps to `Xp`.
  pub fn from_vector(v: DVec3) -> CubeFace {
    let a = v.abs();
    if a.x >= a.y && a.x >= a.z {
      if v.x >= 0.0 {
        CubeFace::Xp
      } else {
        CubeFace::Xn
      }
    } else if a.y >= a.z {
      if v.y >= 0.0 {
        CubeFace::Yp
      } else {
        CubeFace::Yn
      }
    } else if v.z >= 0.0 {
      CubeFace::Zp
    } else {
      CubeFace::Zn
    }
  }

  /// Point on the cube surface (not normalized) for face coordinates.
  #[inline]
  pub fn cube_point(self, x: f64, y: f64) -> DVec3 {
    self.normal() + self.right() * x + self.up() * y
  }

  /// Project face coordinates `(x, y) ∈ [-1, 1]²` onto the unit sphere.
  #[inline]
  pub fn sphere_point(self, x: f64, y: f64) -> DVec3 {
    self.cube_point(x, y).normalize()
  }

  /// [`Self::sphere_point`] taking a 2D face coordinate.
  #[inline]
  pub fn sphere_point_at(self, p: DVec2) -> DVec3 {
    self.sphere_point(p.x, p.y)
  }

  /// Face coordinates of a body-space direction lying on this face.
  ///
  /// Inverse of [`Self::sphere_point`] for directions whose dominant axis is
  /// this face's normal.
  pub fn face_coordinates(self, direction: DVec3) -> DVec2 {
    let along = direction.dot(self.normal());
    let on_cube = direction / along;
    DVec2::new(on_cube.dot(self.right()), on_cube.dot(self.up()))
  }
}

#[cfg(test)]
#[path = "face_test.rs"]
mod face_test;
