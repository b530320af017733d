//! FloatingOriginScene - one simulation step across terrain and frames.
//!
//! ```text
//!   step(dt)
//!     1. integrate tracked object          (local space)
//!     2. POI = active.to_global(tracked)   (one frame snapshot)
//!     3. step every sphere with that frame
//!     4. check_and_shift_if_out_of_bounds  (the only switch point)
//! ```
//!
//! Frame switches never overlap terrain evaluation: every sphere in a step
//! sees the same frame, and subscribers are remapped before the next one.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::lod_sphere::{LodQuadSphere, StepReport};
use crate::reference_frame::{
  FrameConfig, FrameSwitch, FrameSwitchResponder, GlobalPosition, LocalPosition,
  ReferenceFrameManager,
};

/// Kinematic object the origin follows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackedObject {
  pub position: LocalPosition,
  pub velocity: LocalPosition,
}

impl TrackedObject {
  pub fn new(position: LocalPosition, velocity: LocalPosition) -> Self {
    Self { position, velocity }
  }

  #[inline]
  pub fn integrate(&mut self, dt: f32) {
    self.position += self.velocity * dt;
  }
}

impl FrameSwitchResponder for TrackedObject {
  fn on_frame_switch(&mut self, switch: &FrameSwitch) {
    // Frames only translate; velocity is unchanged.
    self.position = switch.remap(self.position);
  }
}

/// Result of one scene step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneStepReport {
  /// Per sphere, in registration order.
  pub spheres: Vec<StepReport>,
  /// Tracked object position used as the POI.
  pub poi: GlobalPosition,
  /// Whether the origin moved at the end of the step.
  pub shifted: bool,
}

/// Owns the frame manager and drives terrain around one tracked object.
pub struct FloatingOriginScene {
  frames: ReferenceFrameManager,
  tracked: Arc<Mutex<TrackedObject>>,
  spheres: Vec<Arc<Mutex<LodQuadSphere>>>,
  steps: u64,
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
  m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FloatingOriginScene {
  pub fn new(config: &FrameConfig, tracked: TrackedObject) -> Result<Self> {
    let mut frames = ReferenceFrameManager::new(config)?;
    let tracked = Arc::new(Mutex::new(tracked));
    frames.subscribe(&tracked);
    Ok(Self {
      frames,
      tracked,
      spheres: Vec::new(),
      steps: 0,
    })
  }

  /// Register a sphere; it is remapped on every frame switch.
  pub fn add_sphere(&mut self, sphere: LodQuadSphere) -> Arc<Mutex<LodQuadSphere>> {
    let sphere = Arc::new(Mutex::new(sphere));
    self.frames.subscribe(&sphere);
    self.spheres.push(Arc::clone(&sphere));
    sphere
  }

  /// Register any other frame-aware object (trails, markers).
  pub fn subscribe<R: FrameSwitchResponder + 'static>(&mut self, responder: &Arc<Mutex<R>>) {
    self.frames.subscribe(responder);
  }

  #[inline]
  pub fn frames(&self) -> &ReferenceFrameManager {
    &self.frames
  }

  #[inline]
  pub fn frames_mut(&mut self) -> &mut ReferenceFrameManager {
    &mut self.frames
  }

  #[inline]
  pub fn tracked(&self) -> &Arc<Mutex<TrackedObject>> {
    &self.tracked
  }

  #[inline]
  pub fn spheres(&self) -> &[Arc<Mutex<LodQuadSphere>>] {
    &self.spheres
  }

  /// Steps taken so far.
  #[inline]
  pub fn step_count(&self) -> u64 {
    self.steps
  }

  /// Tracked object position in the global frame.
  pub fn tracked_global(&self) -> GlobalPosition {
    let local = lock(&self.tracked).position;
    self.frames.active().transform_to_global(local)
  }

  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "scene::step"))]
  pub fn step(&mut self, dt: f32) -> Result<SceneStepReport> {
    let local = {
      let mut tracked = lock(&self.tracked);
      tracked.integrate(dt);
      tracked.position
    };

    let frame = self.frames.active_frame();
    let poi = frame.transform_to_global(local);

    let mut spheres = Vec::with_capacity(self.spheres.len());
    for sphere in &self.spheres {
      spheres.push(lock(sphere).step(&[poi], &*frame)?);
    }

    // No responder lock may be held here: the manager locks each one.
    let shifted = self.frames.check_and_shift_if_out_of_bounds(local).is_some();
    self.steps += 1;

    Ok(SceneStepReport {
      spheres,
      poi,
      shifted,
    })
  }
}

impl std::fmt::Debug for FloatingOriginScene {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FloatingOriginScene")
      .field("frames", &self.frames)
      .field("spheres", &self.spheres.len())
      .field("steps", &self.steps)
      .finish()
  }
}
