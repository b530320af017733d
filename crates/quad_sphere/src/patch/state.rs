//! Patch lifecycle states.
//!
//! ```text
//!   Idle ──Rebuild──▶ Rebuilding(handle) ──build joined──▶ Active
//!                        ▲                                  │
//!                        └────────────Rebuild───────────────┘
//! ```
//!
//! While `Rebuilding`, new requests are latched and applied once the build is
//! joined, so a patch never has more than one build in flight.

use crate::threading::BuildHandle;

/// Current lifecycle state of a patch.
#[derive(Debug, Default)]
pub enum PatchState {
  /// Created, no mesh built yet.
  #[default]
  Idle,
  /// Mesh ready; eligible for LOD evaluation.
  Active,
  /// Exactly one build outstanding.
  Rebuilding(BuildHandle),
}

impl PatchState {
  #[inline]
  pub fn is_idle(&self) -> bool {
    matches!(self, PatchState::Idle)
  }

  #[inline]
  pub fn is_active(&self) -> bool {
    matches!(self, PatchState::Active)
  }

  #[inline]
  pub fn is_rebuilding(&self) -> bool {
    matches!(self, PatchState::Rebuilding(_))
  }

  /// Short name for logs.
  pub fn name(&self) -> &'static str {
    match self {
      PatchState::Idle => "idle",
      PatchState::Active => "active",
      PatchState::Rebuilding(_) => "rebuilding",
    }
  }
}

/// A requested state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateRequest {
  /// Mark the patch ready without building.
  Active,
  /// Dispatch a new mesh build.
  Rebuild,
}

impl StateRequest {
  /// Combine a newly latched request with one already waiting.
  ///
  /// A pending rebuild is never downgraded: the edges it was requested for
  /// still need a fresh mesh.
  #[inline]
  pub fn merge(pending: Option<StateRequest>, new: StateRequest) -> StateRequest {
    match (pending, new) {
      (Some(StateRequest::Rebuild), _) => StateRequest::Rebuild,
      (_, new) => new,
    }
  }
}
