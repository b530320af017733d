//! Global and local position types.

use std::ops::{Add, AddAssign, Sub};

use glam::{DVec3, Vec3};

/// Position in the scene's current local frame (single precision).
pub type LocalPosition = Vec3;

/// Position in the fixed, double precision inertial frame.
///
/// Used for every distance comparison that must stay valid across frame
/// switches.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobalPosition(pub DVec3);

impl GlobalPosition {
  pub const ZERO: GlobalPosition = GlobalPosition(DVec3::ZERO);

  #[inline]
  pub const fn new(x: f64, y: f64, z: f64) -> Self {
    Self(DVec3::new(x, y, z))
  }

  #[inline]
  pub fn as_dvec3(self) -> DVec3 {
    self.0
  }

  #[inline]
  pub fn distance(self, other: GlobalPosition) -> f64 {
    self.0.distance(other.0)
  }

  #[inline]
  pub fn is_finite(self) -> bool {
    self.0.is_finite()
  }
}

impl From<DVec3> for GlobalPosition {
  fn from(v: DVec3) -> Self {
    Self(v)
  }
}

impl Add<DVec3> for GlobalPosition {
  type Output = GlobalPosition;

  #[inline]
  fn add(self, rhs: DVec3) -> GlobalPosition {
    GlobalPosition(self.0 + rhs)
  }
}

impl AddAssign<DVec3> for GlobalPosition {
  #[inline]
  fn add_assign(&mut self, rhs: DVec3) {
    self.0 += rhs;
  }
}

impl Sub for GlobalPosition {
  type Output = DVec3;

  #[inline]
  fn sub(self, rhs: GlobalPosition) -> DVec3 {
    self.0 - rhs.0
  }
}
