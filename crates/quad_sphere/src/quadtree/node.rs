//! QuadTreeNode - one cell of a face subdivision, plus its arena handle.

use glam::DVec2;

use super::Bounds2;

/// Generational handle into a [`super::QuadTree`] arena.
///
/// Handles are weak: once a node is discarded its slot may be reused, but the
/// generation changes, so a stale handle resolves to nothing instead of the
/// new occupant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
  pub(crate) index: u32,
  pub(crate) generation: u32,
}

impl NodeId {
  /// Slot index in the arena.
  pub fn index(&self) -> u32 {
    self.index
  }

  /// Generation of the slot when this handle was issued.
  pub fn generation(&self) -> u32 {
    self.generation
  }
}

/// Offset of child `i` within its parent, as `(x, y)` bits.
///
/// - bit 0: +X half
/// - bit 1: +Y half
#[inline]
pub fn child_offset(i: usize) -> (usize, usize) {
  (i & 1, (i >> 1) & 1)
}

/// A node of the quadtree.
///
/// A node is a leaf iff `children` is `None`; only leaves carry a `value`.
#[derive(Debug)]
pub struct QuadTreeNode<T> {
  /// Center in face space.
  pub center: DVec2,
  /// Edge length in face space.
  pub size: f64,
  /// Depth below the root (0 = whole face).
  pub level: u32,
  pub(crate) parent: Option<NodeId>,
  pub(crate) children: Option<[NodeId; 4]>,
  pub(crate) value: Option<T>,
}

impl<T> QuadTreeNode<T> {
  pub(crate) fn new(parent: Option<NodeId>, center: DVec2, size: f64, level: u32) -> Self {
    Self {
      center,
      size,
      level,
      parent,
      children: None,
      value: None,
    }
  }

  /// Parent handle, `None` for the root.
  #[inline]
  pub fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  /// Child handles in child-index order, `None` for leaves.
  #[inline]
  pub fn children(&self) -> Option<[NodeId; 4]> {
    self.children
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_none()
  }

  /// Payload, present only on materialized leaves.
  #[inline]
  pub fn value(&self) -> Option<&T> {
    self.value.as_ref()
  }

  #[inline]
  pub fn value_mut(&mut self) -> Option<&mut T> {
    self.value.as_mut()
  }

  /// Bounds `(minX, minY, maxX, maxY)` in face space.
  #[inline]
  pub fn bounds(&self) -> Bounds2 {
    Bounds2::from_center_size(self.center, self.size)
  }

  /// Center of child `i` (see [`child_offset`]).
  #[inline]
  pub fn child_center(&self, i: usize) -> DVec2 {
    let (x, y) = child_offset(i);
    let quarter = self.size * 0.25;
    DVec2::new(
      self.center.x + if x == 1 { quarter } else { -quarter },
      self.center.y + if y == 1 { quarter } else { -quarter },
    )
  }
}
