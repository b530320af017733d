//! QuadTree - arena-backed quadtree over one square face.
//!
//! Nodes are stored in a slot arena and addressed by generational
//! [`NodeId`]s. The tree owns the payloads of its leaves; discarding a subtree
//! frees its slots and bumps their generations so outstanding handles go stale.

use glam::DVec2;
use smallvec::SmallVec;

use super::{Bounds2, NodeId, QuadTreeNode};
use crate::error::{Result, TerrainError};

struct Slot<T> {
  generation: u32,
  node: Option<QuadTreeNode<T>>,
}

/// Quadtree over the square domain `[-root_size/2, root_size/2]²`.
pub struct QuadTree<T> {
  slots: Vec<Slot<T>>,
  free: Vec<u32>,
  root: NodeId,
  root_size: f64,
  hard_limit: u32,
  live: usize,
}

impl<T> QuadTree<T> {
  /// Create a tree holding a single root leaf.
  ///
  /// `hard_limit` is the deepest level [`Self::subdivide`] may produce.
  pub fn new(root_size: f64, hard_limit: u32) -> Self {
    let root_node = QuadTreeNode::new(None, DVec2::ZERO, root_size, 0);
    Self {
      slots: vec![Slot {
        generation: 0,
        node: Some(root_node),
      }],
      free: Vec::new(),
      root: NodeId {
        index: 0,
        generation: 0,
      },
      root_size,
      hard_limit,
      live: 1,
    }
  }

  /// Handle of the root node (level 0).
  #[inline]
  pub fn root(&self) -> NodeId {
    self.root
  }

  /// Edge length of the root node.
  #[inline]
  pub fn root_size(&self) -> f64 {
    self.root_size
  }

  /// Deepest level the tree will subdivide to.
  #[inline]
  pub fn hard_limit(&self) -> u32 {
    self.hard_limit
  }

  /// Number of live nodes (internal and leaves).
  #[inline]
  pub fn len(&self) -> usize {
    self.live
  }

  /// A tree always holds at least its root.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.live == 0
  }

  /// Check whether a handle still refers to a live node.
  #[inline]
  pub fn contains(&self, id: NodeId) -> bool {
    self.get(id).is_some()
  }

  /// Resolve a handle.
  pub fn get(&self, id: NodeId) -> Option<&QuadTreeNode<T>> {
    self
      .slots
      .get(id.index as usize)
      .filter(|slot| slot.generation == id.generation)
      .and_then(|slot| slot.node.as_ref())
  }

  /// Resolve a handle mutably.
  pub fn get_mut(&mut self, id: NodeId) -> Option<&mut QuadTreeNode<T>> {
    self
      .slots
      .get_mut(id.index as usize)
      .filter(|slot| slot.generation == id.generation)
      .and_then(|slot| slot.node.as_mut())
  }

  fn node(&self, id: NodeId) -> Result<&QuadTreeNode<T>> {
    self.get(id).ok_or(TerrainError::NodeNotFound(id))
  }

  fn node_mut(&mut self, id: NodeId) -> Result<&mut QuadTreeNode<T>> {
    self.get_mut(id).ok_or(TerrainError::NodeNotFound(id))
  }

  /// True if the node exists and has no children.
  #[inline]
  pub fn is_leaf(&self, id: NodeId) -> bool {
    self.get(id).map(|n| n.is_leaf()).unwrap_or(false)
  }

  #[inline]
  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.get(id).and_then(|n| n.parent)
  }

  #[inline]
  pub fn children(&self, id: NodeId) -> Option<[NodeId; 4]> {
    self.get(id).and_then(|n| n.children)
  }

  /// The other three children of this node's parent (empty for the root).
  pub fn siblings(&self, id: NodeId) -> SmallVec<[NodeId; 3]> {
    self
      .parent(id)
      .and_then(|p| self.children(p))
      .map(|children| children.into_iter().filter(|c| *c != id).collect())
      .unwrap_or_default()
  }

  /// Payload of a leaf.
  #[inline]
  pub fn value(&self, id: NodeId) -> Option<&T> {
    self.get(id).and_then(|n| n.value.as_ref())
  }

  #[inline]
  pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
    self.get_mut(id).and_then(|n| n.value.as_mut())
  }

  /// Attach a payload to a leaf, returning the previous one.
  ///
  /// Attaching to an internal node would break the "only leaves carry
  /// payloads" invariant and is rejected.
  pub fn set_value(&mut self, id: NodeId, value: T) -> Result<Option<T>> {
    let node = self.node_mut(id)?;
    if !node.is_leaf() {
      return Err(TerrainError::AlreadySubdivided(id));
    }
    Ok(node.value.replace(value))
  }

  /// Detach the payload of a node, if any.
  #[inline]
  pub fn take_value(&mut self, id: NodeId) -> Option<T> {
    self.get_mut(id).and_then(|n| n.value.take())
  }

  fn allocate(&mut self, node: QuadTreeNode<T>) -> NodeId {
    self.live += 1;
    if let Some(index) = self.free.pop() {
      let slot = &mut self.slots[index as usize];
      slot.node = Some(node);
      NodeId {
        index,
        generation: slot.generation,
      }
    } else {
      let index = self.slots.len() as u32;
      self.slots.push(Slot {
        generation: 0,
        node: Some(node),
      });
      NodeId {
        index,
        generation: 0,
      }
    }
  }

  fn release(&mut self, id: NodeId) -> Option<QuadTreeNode<T>> {
    let slot = self.slots.get_mut(id.index as usize)?;
    if slot.generation != id.generation {
      return None;
    }
    let node = slot.node.take()?;
    slot.generation = slot.generation.wrapping_add(1);
    self.free.push(id.index);
    self.live -= 1;
    Some(node)
  }

  /// Split a leaf into 4 children with half its size.
  ///
  /// Children are centered on the parent's quadrant midpoints. No payloads
  /// are created; the parent's payload must already be detached.
  pub fn subdivide(&mut self, id: NodeId) -> Result<[NodeId; 4]> {
    let hard_limit = self.hard_limit;
    let node = self.node(id)?;
    if node.children.is_some() {
      return Err(TerrainError::AlreadySubdivided(id));
    }
    if node.level >= hard_limit {
      return Err(TerrainError::DepthLimit {
        node: id,
        limit: hard_limit,
      });
    }

    let child_size = node.size * 0.5;
    let child_level = node.level + 1;
    let centers: [DVec2; 4] = std::array::from_fn(|i| node.child_center(i));

    let children = centers.map(|center| {
      self.allocate(QuadTreeNode::new(Some(id), center, child_size, child_level))
    });

    let node = self.node_mut(id)?;
    // A parent never carries a payload.
    node.value = None;
    node.children = Some(children);

    Ok(children)
  }

  /// Discard all descendants of a node, turning it back into a leaf.
  ///
  /// Returns any payloads that were still attached below the node so the
  /// caller can tear them down.
  pub fn make_leaf(&mut self, id: NodeId) -> Result<Vec<T>> {
    let children = self
      .node_mut(id)?
      .children
      .take()
      .ok_or(TerrainError::NotSubdivided(id))?;

    let mut orphans = Vec::new();
    let mut stack: Vec<NodeId> = children.to_vec();
    while let Some(child) = stack.pop() {
      if let Some(node) = self.release(child) {
        if let Some(grandchildren) = node.children {
          stack.extend(grandchildren);
        }
        if let Some(value) = node.value {
          orphans.push(value);
        }
      }
    }

    Ok(orphans)
  }

  /// All leaves whose bounds intersect `rect`, shared boundaries included.
  ///
  /// Descends from the root and prunes quadrants that miss the rectangle.
  pub fn query_overlapping_leaves(&self, rect: &Bounds2) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![self.root];

    while let Some(id) = stack.pop() {
      let Some(node) = self.get(id) else {
        continue;
      };
      if !node.bounds().overlaps(rect) {
        continue;
      }
      match node.children {
        Some(children) => stack.extend(children),
        None => result.push(id),
      }
    }

    result
  }

  /// Every leaf of the tree.
  pub fn leaves(&self) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![self.root];
    while let Some(id) = stack.pop() {
      match self.get(id).and_then(|n| n.children) {
        Some(children) => stack.extend(children),
        None if self.contains(id) => result.push(id),
        None => {}
      }
    }
    result
  }

  /// Iterate over every live node.
  pub fn iter(&self) -> impl Iterator<Item = (NodeId, &QuadTreeNode<T>)> {
    self.slots.iter().enumerate().filter_map(|(index, slot)| {
      slot.node.as_ref().map(|node| {
        (
          NodeId {
            index: index as u32,
            generation: slot.generation,
          },
          node,
        )
      })
    })
  }

  /// Iterate over every live node mutably.
  pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut QuadTreeNode<T>)> {
    self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
      let generation = slot.generation;
      slot.node.as_mut().map(|node| {
        (
          NodeId {
            index: index as u32,
            generation,
          },
          node,
        )
      })
    })
  }
}
