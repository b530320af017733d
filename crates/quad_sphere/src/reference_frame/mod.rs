//! Floating-origin reference frames.
//!
//! Simulation state lives in single precision local space; true positions
//! live in a double precision global frame. The active scene frame maps one
//! onto the other and is periodically re-centered on the tracked object.
//!
//! # Module Structure
//!
//! - [`position`]: `GlobalPosition` / `LocalPosition`
//! - [`frame`]: `ReferenceFrame` trait, `OffsetFrame`, `FrameSwitch`
//! - [`manager`]: `ReferenceFrameManager` - active frame, shifting, subscribers
//! - [`trail`]: `TrailBuffer` - a responder caching local-space points

pub mod frame;
pub mod manager;
pub mod position;
pub mod trail;

pub use frame::{FrameSwitch, OffsetFrame, ReferenceFrame, SharedFrame};
pub use manager::{
  FrameConfig, FrameSwitchRecord, FrameSwitchResponder, ReferenceFrameManager, SharedResponder,
};
pub use position::{GlobalPosition, LocalPosition};
pub use trail::TrailBuffer;

#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;
