//! Terrain patches and their neighbor bookkeeping.
//!
//! # Module Structure
//!
//! - [`patch`]: `Patch` - one tile, payload of a quadtree leaf
//! - [`state`]: `PatchState` / `StateRequest` - build lifecycle
//! - [`stitch`]: directional neighbor matching between leaves

#[allow(clippy::module_inception)]
pub mod patch;
pub mod state;
pub mod stitch;

pub use patch::Patch;
pub use state::{PatchState, StateRequest};
pub use stitch::{stitch, EdgeUpdate, NeighborInfo, StitchOutcome};
