//! Reference frames: global ⇄ local transforms.

use std::fmt::Debug;
use std::sync::Arc;

use super::position::{GlobalPosition, LocalPosition};

/// Shared handle to an immutable frame.
pub type SharedFrame = Arc<dyn ReferenceFrame>;

/// A mapping between the global inertial frame and a local frame.
///
/// Frames are immutable; moving a frame produces a new one via
/// [`ReferenceFrame::shift`].
pub trait ReferenceFrame: Debug + Send + Sync {
  /// Global → local.
  fn transform_to_local(&self, global: GlobalPosition) -> LocalPosition;

  /// Local → global.
  fn transform_to_global(&self, local: LocalPosition) -> GlobalPosition;

  /// A new frame whose local origin sits at `delta` in this frame.
  ///
  /// `self.shift(p).transform_to_global(ZERO) == self.transform_to_global(p)`.
  fn shift(&self, delta: LocalPosition) -> SharedFrame;
}

/// Pure translation by a global origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OffsetFrame {
  pub origin: GlobalPosition,
}

impl OffsetFrame {
  pub fn new(origin: GlobalPosition) -> Self {
    Self { origin }
  }

  /// Same frame behind a shared handle.
  pub fn shared(origin: GlobalPosition) -> SharedFrame {
    Arc::new(Self::new(origin))
  }
}

impl ReferenceFrame for OffsetFrame {
  #[inline]
  fn transform_to_local(&self, global: GlobalPosition) -> LocalPosition {
    (global - self.origin).as_vec3()
  }

  #[inline]
  fn transform_to_global(&self, local: LocalPosition) -> GlobalPosition {
    self.origin + local.as_dvec3()
  }

  fn shift(&self, delta: LocalPosition) -> SharedFrame {
    Arc::new(OffsetFrame::new(self.origin + delta.as_dvec3()))
  }
}

/// A frame switch as delivered to subscribers.
#[derive(Clone, Debug)]
pub struct FrameSwitch {
  pub old: SharedFrame,
  pub new: SharedFrame,
}

impl FrameSwitch {
  /// Map a position cached in the old frame into the new one.
  #[inline]
  pub fn remap(&self, p: LocalPosition) -> LocalPosition {
    self.new.transform_to_local(self.old.transform_to_global(p))
  }

  /// Remap every position of a buffer in place.
  pub fn remap_all(&self, points: &mut [LocalPosition]) {
    for p in points {
      *p = self.remap(*p);
    }
  }
}
