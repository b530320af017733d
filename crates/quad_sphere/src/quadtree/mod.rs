//! Quadtree module for LOD-based subdivision of one cube face.
//!
//! Unlike an implicit leaf set, this tree keeps explicit nodes in an arena so
//! that every leaf can own a payload (the terrain patch) and neighbors can
//! hold weak references to each other.
//!
//! # Level Convention
//!
//! Level 0 = the whole face (coarsest), higher level = finer.
//!
//! ```text
//! Node Size = ROOT_FACE_SIZE / 2^level
//!           = 2 / 2^level          (face space, [-1, 1]²)
//! ```
//!
//! # Child Layout
//!
//! ```text
//!   ┌─────┬─────┐      child index bits:
//!   │  2  │  3  │        bit 0: +X half
//!   ├─────┼─────┤        bit 1: +Y half
//!   │  0  │  1  │
//!   └─────┴─────┘
//! ```
//!
//! # Module Structure
//!
//! - [`bounds`]: `Bounds2` - double precision 2D rectangle
//! - [`node`]: `NodeId`, `QuadTreeNode` - arena handles and node data
//! - [`tree`]: `QuadTree` - subdivide / make_leaf / overlap queries

pub mod bounds;
pub mod node;
pub mod tree;

// Re-exports
pub use bounds::Bounds2;
pub use node::{child_offset, NodeId, QuadTreeNode};
pub use tree::QuadTree;
