//! Neighbor stitching.
//!
//! Decides, for each of the four in-face directions, which existing leaf a
//! newly materialized patch borders, and which neighbors must point back.
//!
//! ```text
//!   candidate offsets from the new patch center (N):
//!
//!            ╲   Yp   ╱
//!             ╲  ▲   ╱        a candidate lies in direction D when
//!          Xn ◀─ N ─▶ Xp        dot(normalize(offset), D) > cos45° + ε
//!             ╱  ▼   ╲
//!            ╱   Yn   ╲       diagonal (corner) contacts fall outside
//! ```
//!
//! Rules per direction:
//!
//! - one neighbor, same level or finer: link both ways
//! - one neighbor, coarser: link the new patch only; the coarse patch borders
//!   several finer ones on that side
//! - several neighbors: leave the new patch's edge unset and touch nothing

use glam::DVec2;
use smallvec::SmallVec;

use crate::constants::COS_45_DEG_PLUS_EPSILON;
use crate::quadtree::NodeId;
use crate::sphere::Direction2D;

/// Snapshot of a patch as seen by the stitcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborInfo {
  pub id: NodeId,
  pub center: DVec2,
  pub level: u32,
  pub edges: [Option<NodeId>; 4],
}

/// An edge reference to write on an existing neighbor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeUpdate {
  pub neighbor: NodeId,
  pub direction: Direction2D,
  pub target: NodeId,
}

/// Result of stitching one new patch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StitchOutcome {
  /// Edge references for the new patch.
  pub edges: [Option<NodeId>; 4],
  /// Back-references to write on neighbors whose edge actually changed.
  pub updates: SmallVec<[EdgeUpdate; 4]>,
}

impl StitchOutcome {
  /// Neighbors whose edges changed and need a rebuild.
  pub fn changed(&self) -> impl Iterator<Item = NodeId> + '_ {
    self.updates.iter().map(|u| u.neighbor)
  }
}

/// True if `candidate` lies in `direction` from `from`.
#[inline]
pub fn lies_in_direction(from: DVec2, candidate: DVec2, direction: Direction2D) -> bool {
  let offset = candidate - from;
  // Exact zero: a patch never neighbors a patch with the same center.
  if offset.x == 0.0 && offset.y == 0.0 {
    return false;
  }
  let offset = offset / offset.length();
  offset.dot(direction.to_vec2()) > COS_45_DEG_PLUS_EPSILON
}

/// Stitch `new` against `candidates` (typically the leaves overlapping its
/// bounds). `new` may appear among the candidates; it is skipped.
pub fn stitch(new: &NeighborInfo, candidates: &[NeighborInfo]) -> StitchOutcome {
  let mut outcome = StitchOutcome::default();

  for direction in Direction2D::ALL {
    let in_direction: SmallVec<[&NeighborInfo; 4]> = candidates
      .iter()
      .filter(|c| c.id != new.id)
      .filter(|c| lies_in_direction(new.center, c.center, direction))
      .collect();

    let [neighbor] = in_direction.as_slice() else {
      continue;
    };

    outcome.edges[direction.index()] = Some(neighbor.id);

    if neighbor.level >= new.level {
      let inverse = direction.inverse();
      if neighbor.edges[inverse.index()] != Some(new.id) {
        outcome.updates.push(EdgeUpdate {
          neighbor: neighbor.id,
          direction: inverse,
          target: new.id,
        });
      }
    }
  }

  outcome
}

#[cfg(test)]
#[path = "stitch_test.rs"]
mod stitch_test;
