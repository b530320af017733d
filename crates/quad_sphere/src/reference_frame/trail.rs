//! Bounded history of local-space points that follows frame switches.
//!
//! Remapping is O(n) per switch; keep the capacity modest when the tracked
//! object moves fast enough to shift the origin often.

use std::collections::VecDeque;

use super::frame::FrameSwitch;
use super::manager::FrameSwitchResponder;
use super::position::LocalPosition;

/// Trail of recent positions in the current scene frame.
#[derive(Clone, Debug)]
pub struct TrailBuffer {
  points: VecDeque<LocalPosition>,
  capacity: usize,
  min_spacing: f32,
}

impl TrailBuffer {
  /// `min_spacing` drops points closer than that to the previous one.
  pub fn new(capacity: usize, min_spacing: f32) -> Self {
    Self {
      points: VecDeque::with_capacity(capacity),
      capacity,
      min_spacing,
    }
  }

  /// Append a point, evicting the oldest one at capacity.
  ///
  /// Returns false if the point was too close to the previous one.
  pub fn push(&mut self, point: LocalPosition) -> bool {
    if self.capacity == 0 {
      return false;
    }
    if let Some(last) = self.points.back() {
      if last.distance(point) < self.min_spacing {
        return false;
      }
    }
    if self.points.len() >= self.capacity {
      self.points.pop_front();
    }
    self.points.push_back(point);
    true
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn clear(&mut self) {
    self.points.clear();
  }

  /// Most recent point.
  pub fn last(&self) -> Option<LocalPosition> {
    self.points.back().copied()
  }

  /// Points from oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &LocalPosition> {
    self.points.iter()
  }
}

impl FrameSwitchResponder for TrailBuffer {
  fn on_frame_switch(&mut self, switch: &FrameSwitch) {
    for p in self.points.iter_mut() {
      *p = switch.remap(*p);
    }
  }
}

#[cfg(test)]
mod tests {
  use glam::Vec3;

  use super::*;
  use crate::reference_frame::{GlobalPosition, OffsetFrame, ReferenceFrame};

  #[test]
  fn test_capacity_and_spacing() {
    let mut trail = TrailBuffer::new(3, 1.0);
    assert!(trail.push(Vec3::ZERO));
    assert!(!trail.push(Vec3::new(0.5, 0.0, 0.0)));
    assert!(trail.push(Vec3::new(1.0, 0.0, 0.0)));
    assert!(trail.push(Vec3::new(2.0, 0.0, 0.0)));
    assert!(trail.push(Vec3::new(3.0, 0.0, 0.0)));
    assert_eq!(trail.len(), 3);
    assert_eq!(trail.iter().next(), Some(&Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(trail.last(), Some(Vec3::new(3.0, 0.0, 0.0)));
  }

  #[test]
  fn test_zero_capacity_keeps_nothing() {
    let mut trail = TrailBuffer::new(0, 0.0);
    assert!(!trail.push(Vec3::ONE));
    assert!(trail.is_empty());
  }

  #[test]
  fn test_remap_keeps_global_positions() {
    let old = OffsetFrame::shared(GlobalPosition::new(100.0, 0.0, 0.0));
    let new = old.shift(Vec3::new(50.0, -10.0, 0.0));

    let mut trail = TrailBuffer::new(8, 0.0);
    trail.push(Vec3::new(50.0, -10.0, 0.0));
    trail.push(Vec3::new(60.0, 0.0, 5.0));
    let before: Vec<_> = trail.iter().map(|p| old.transform_to_global(*p)).collect();

    trail.on_frame_switch(&FrameSwitch { old, new: new.clone() });

    assert_eq!(trail.iter().next(), Some(&Vec3::ZERO));
    for (p, g) in trail.iter().zip(before) {
      assert!(new.transform_to_global(*p).distance(g) < 1e-4);
    }
  }
}
