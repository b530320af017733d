//! Floating origin: owner of the scene's active reference frame.
//!
//! The tracked object is allowed to drift up to `max_floating_origin_range`
//! away from the local origin. Past that, the scene frame is re-centered on it
//! and every subscriber remaps its cached local positions before anything else
//! reads the new frame.
//!
//! ```text
//!   global:  ──────────●──────────────────────────────●──────────▶
//!                   old origin                     new origin
//!                      │◀──── tracked local (9000) ───▶│
//!
//!   local before:  tracked = (9000, 0, 0)   > range (8192)  → shift
//!   local after:   tracked = (0, 0, 0)
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use glam::Vec3;
use web_time::Instant;

use super::frame::{FrameSwitch, OffsetFrame, SharedFrame};
use super::position::{GlobalPosition, LocalPosition};
use crate::constants::{DEFAULT_MAX_FLOATING_ORIGIN_RANGE, FRAME_HISTORY_CAPACITY};
use crate::error::{Result, TerrainError};

/// Anything that caches local-space positions and must follow frame switches.
pub trait FrameSwitchResponder: Send {
  /// Called synchronously from [`ReferenceFrameManager::change_frame`].
  fn on_frame_switch(&mut self, switch: &FrameSwitch);
}

/// Shared, lockable responder as held by its owner.
pub type SharedResponder = Arc<Mutex<dyn FrameSwitchResponder>>;

/// Settings for a [`ReferenceFrameManager`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameConfig {
  /// Origin of the initial scene frame.
  pub initial_origin: GlobalPosition,
  /// Local distance from the origin past which the frame is re-centered.
  pub max_floating_origin_range: f32,
  /// Number of switches kept in [`ReferenceFrameManager::history`].
  pub history_capacity: usize,
}

impl Default for FrameConfig {
  fn default() -> Self {
    Self {
      initial_origin: GlobalPosition::ZERO,
      max_floating_origin_range: DEFAULT_MAX_FLOATING_ORIGIN_RANGE,
      history_capacity: FRAME_HISTORY_CAPACITY,
    }
  }
}

impl FrameConfig {
  pub fn with_initial_origin(mut self, origin: GlobalPosition) -> Self {
    self.initial_origin = origin;
    self
  }

  pub fn with_max_floating_origin_range(mut self, range: f32) -> Self {
    self.max_floating_origin_range = range;
    self
  }

  pub fn with_history_capacity(mut self, capacity: usize) -> Self {
    self.history_capacity = capacity;
    self
  }

  pub fn validate(&self) -> Result<()> {
    if !self.max_floating_origin_range.is_finite() || self.max_floating_origin_range <= 0.0 {
      return Err(TerrainError::InvalidConfig(format!(
        "max floating origin range must be positive and finite, got {}",
        self.max_floating_origin_range
      )));
    }
    if !self.initial_origin.is_finite() {
      return Err(TerrainError::InvalidConfig(
        "initial frame origin must be finite".to_string(),
      ));
    }
    Ok(())
  }
}

/// Record of a frame switch for diagnostics.
#[derive(Clone, Debug)]
pub struct FrameSwitchRecord {
  /// 1-based switch number.
  pub sequence: u64,
  /// Global position of the old local origin.
  pub old_origin: GlobalPosition,
  /// Global position of the new local origin.
  pub new_origin: GlobalPosition,
  /// Tracked position that triggered an automatic shift.
  pub trigger: Option<LocalPosition>,
  pub timestamp: Instant,
}

/// Owner of the active scene frame and its subscribers.
pub struct ReferenceFrameManager {
  active: SharedFrame,
  max_floating_origin_range: f32,
  responders: Vec<Weak<Mutex<dyn FrameSwitchResponder>>>,
  switch_count: u64,
  history: VecDeque<FrameSwitchRecord>,
  history_capacity: usize,
}

impl Default for ReferenceFrameManager {
  fn default() -> Self {
    Self {
      active: OffsetFrame::shared(GlobalPosition::ZERO),
      max_floating_origin_range: DEFAULT_MAX_FLOATING_ORIGIN_RANGE,
      responders: Vec::new(),
      switch_count: 0,
      history: VecDeque::with_capacity(FRAME_HISTORY_CAPACITY),
      history_capacity: FRAME_HISTORY_CAPACITY,
    }
  }
}

impl ReferenceFrameManager {
  pub fn new(config: &FrameConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self {
      active: OffsetFrame::shared(config.initial_origin),
      max_floating_origin_range: config.max_floating_origin_range,
      history: VecDeque::with_capacity(config.history_capacity),
      history_capacity: config.history_capacity,
      ..Default::default()
    })
  }

  /// The active scene frame.
  #[inline]
  pub fn active(&self) -> &SharedFrame {
    &self.active
  }

  /// A snapshot of the active frame, valid for a whole step.
  #[inline]
  pub fn active_frame(&self) -> SharedFrame {
    Arc::clone(&self.active)
  }

  #[inline]
  pub fn max_floating_origin_range(&self) -> f32 {
    self.max_floating_origin_range
  }

  pub fn set_max_floating_origin_range(&mut self, range: f32) -> Result<()> {
    if !range.is_finite() || range <= 0.0 {
      return Err(TerrainError::InvalidConfig(format!(
        "max floating origin range must be positive and finite, got {range}"
      )));
    }
    tracing::debug!(range, "setting max floating origin range");
    self.max_floating_origin_range = range;
    Ok(())
  }

  /// Number of switches performed so far.
  #[inline]
  pub fn switch_count(&self) -> u64 {
    self.switch_count
  }

  /// Most recent switches, oldest first.
  pub fn history(&self) -> impl Iterator<Item = &FrameSwitchRecord> {
    self.history.iter()
  }

  /// Register a responder. Only a weak reference is kept; dropping the
  /// responder unsubscribes it.
  pub fn subscribe<R: FrameSwitchResponder + 'static>(&mut self, responder: &Arc<Mutex<R>>) {
    let shared: SharedResponder = responder.clone();
    self.responders.push(Arc::downgrade(&shared));
  }

  /// Register an already type-erased responder.
  pub fn subscribe_shared(&mut self, responder: &SharedResponder) {
    self.responders.push(Arc::downgrade(responder));
  }

  /// Number of responders still alive.
  pub fn subscriber_count(&self) -> usize {
    self.responders.iter().filter(|r| r.strong_count() > 0).count()
  }

  /// Replace the active frame and notify every live responder before
  /// returning.
  ///
  /// Responders are locked one at a time; the caller must not hold any of
  /// their locks.
  pub fn change_frame(&mut self, new: SharedFrame) -> FrameSwitch {
    self.switch_to(new, None)
  }

  /// Re-center the scene frame on `tracked` if it has left the permitted
  /// range. Returns the switch if one happened.
  pub fn check_and_shift_if_out_of_bounds(
    &mut self,
    tracked: LocalPosition,
  ) -> Option<FrameSwitch> {
    if tracked.length() <= self.max_floating_origin_range {
      return None;
    }
    let new = self.active.shift(tracked);
    Some(self.switch_to(new, Some(tracked)))
  }

  fn switch_to(&mut self, new: SharedFrame, trigger: Option<LocalPosition>) -> FrameSwitch {
    let old = std::mem::replace(&mut self.active, Arc::clone(&new));
    let switch = FrameSwitch { old, new };
    self.switch_count += 1;

    let old_origin = switch.old.transform_to_global(Vec3::ZERO);
    let new_origin = switch.new.transform_to_global(Vec3::ZERO);
    match trigger {
      Some(tracked) => tracing::info!(
        sequence = self.switch_count,
        ?old_origin,
        ?new_origin,
        ?tracked,
        "floating origin shift"
      ),
      None => tracing::debug!(
        sequence = self.switch_count,
        ?old_origin,
        ?new_origin,
        "scene frame changed"
      ),
    }

    if self.history_capacity > 0 {
      if self.history.len() >= self.history_capacity {
        self.history.pop_front();
      }
      self.history.push_back(FrameSwitchRecord {
        sequence: self.switch_count,
        old_origin,
        new_origin,
        trigger,
        timestamp: Instant::now(),
      });
    }

    self.responders.retain(|weak| match weak.upgrade() {
      Some(responder) => {
        responder
          .lock()
          .unwrap_or_else(PoisonError::into_inner)
          .on_frame_switch(&switch);
        true
      }
      None => false,
    });

    switch
  }
}

impl std::fmt::Debug for ReferenceFrameManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReferenceFrameManager")
      .field("active", &self.active)
      .field("max_floating_origin_range", &self.max_floating_origin_range)
      .field("subscribers", &self.subscriber_count())
      .field("switch_count", &self.switch_count)
      .finish()
  }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
