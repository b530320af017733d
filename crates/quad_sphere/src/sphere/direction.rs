//! Direction2D - the four principal directions inside a cube face.

use glam::DVec2;

/// In-face direction. The discriminant is the slot in a patch's edge array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction2D {
  Xp = 0,
  Xn = 1,
  Yp = 2,
  Yn = 3,
}

impl Direction2D {
  /// Every direction in slot order.
  pub const ALL: [Direction2D; 4] = [
    Direction2D::Xp,
    Direction2D::Xn,
    Direction2D::Yp,
    Direction2D::Yn,
  ];

  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }

  /// Unit vector in face space.
  #[inline]
  pub fn to_vec2(self) -> DVec2 {
    match self {
      Direction2D::Xp => DVec2::X,
      Direction2D::Xn => DVec2::NEG_X,
      Direction2D::Yp => DVec2::Y,
      Direction2D::Yn => DVec2::NEG_Y,
    }
  }

  /// Opposite direction.
  #[inline]
  pub fn inverse(self) -> Direction2D {
    match self {
      Direction2D::Xp => Direction2D::Xn,
      Direction2D::Xn => Direction2D::Xp,
      Direction2D::Yp => Direction2D::Yn,
      Direction2D::Yn => Direction2D::Yp,
    }
  }
}
