//! Cube-sphere and geodetic projection.
//!
//! A sphere is approximated by six square cube faces whose points are pushed
//! radially outward onto the unit sphere. Every face is parameterized by a 2D
//! face-space coordinate in `[-1, 1]²`.
//!
//! ```text
//!            +Y
//!             │   ╱ +Z (face Zp: right = +X, up = +Y)
//!             │  ╱
//!             │ ╱
//!   ──────────┼──────────── +X (face Xp: right = -Z, up = +Y)
//!            ╱│
//!           ╱ │
//! ```
//!
//! Each face basis satisfies `right × up = normal`, so a counter-clockwise
//! loop in face space is counter-clockwise when seen from outside the sphere.
//!
//! # Module Structure
//!
//! - [`face`]: `CubeFace` - the 6 faces and face → sphere mapping
//! - [`geodetic`]: latitude / longitude / UV projection
//! - [`direction`]: `Direction2D` - the 4 principal in-face directions

pub mod direction;
pub mod face;
pub mod geodetic;

pub use direction::Direction2D;
pub use face::CubeFace;
pub use geodetic::{euclidean_to_geodetic, geodetic_uv, Geodetic};
