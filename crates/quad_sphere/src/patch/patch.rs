//! Patch - one terrain tile, the payload of one quadtree leaf.

use std::sync::Arc;

use glam::{DVec2, Vec3};

use super::state::{PatchState, StateRequest};
use super::stitch::NeighborInfo;
use crate::constants::ROOT_FACE_SIZE;
use crate::error::{Result, TerrainError};
use crate::mesh::MeshRequest;
use crate::quadtree::{Bounds2, NodeId};
use crate::reference_frame::GlobalPosition;
use crate::sphere::{CubeFace, Direction2D};
use crate::threading::BuildHandle;
use crate::types::{MaterialHandle, PatchMesh};

/// One terrain tile.
///
/// `edges` are weak references into the same face's quadtree; they are only
/// bookkeeping for stitching and may go stale when the neighbor is discarded.
#[derive(Debug)]
pub struct Patch {
  face: CubeFace,
  center: DVec2,
  size: f64,
  level: u32,
  origin: Vec3,
  subdivision_distance: f64,
  material: MaterialHandle,
  pub(crate) edges: [Option<NodeId>; 4],
  pub(crate) state: PatchState,
  pub(crate) next_state: Option<StateRequest>,
  pub(crate) mesh: Option<Arc<PatchMesh>>,
  pub(crate) last_error: Option<TerrainError>,
}

impl Patch {
  /// Create an `Idle` patch for a leaf of `face`.
  ///
  /// The origin is the leaf center projected onto the sphere of `radius`.
  pub fn new(
    face: CubeFace,
    center: DVec2,
    level: u32,
    radius: f64,
    subdivision_distance: f64,
    material: MaterialHandle,
  ) -> Self {
    Self {
      face,
      center,
      size: ROOT_FACE_SIZE * 0.5f64.powi(level as i32),
      level,
      origin: (face.sphere_point_at(center) * radius).as_vec3(),
      subdivision_distance,
      material,
      edges: [None; 4],
      state: PatchState::Idle,
      next_state: None,
      mesh: None,
      last_error: None,
    }
  }

  #[inline]
  pub fn face(&self) -> CubeFace {
    self.face
  }

  /// Center in face space.
  #[inline]
  pub fn center(&self) -> DVec2 {
    self.center
  }

  /// Edge length in face space.
  #[inline]
  pub fn size(&self) -> f64 {
    self.size
  }

  #[inline]
  pub fn level(&self) -> u32 {
    self.level
  }

  /// Body-space origin; mesh positions are relative to it.
  #[inline]
  pub fn origin(&self) -> Vec3 {
    self.origin
  }

  /// POIs closer than this to the patch trigger a subdivide.
  #[inline]
  pub fn subdivision_distance(&self) -> f64 {
    self.subdivision_distance
  }

  #[inline]
  pub fn material(&self) -> MaterialHandle {
    self.material
  }

  /// Face-space bounds.
  #[inline]
  pub fn bounds(&self) -> Bounds2 {
    Bounds2::from_center_size(self.center, self.size)
  }

  /// Neighbor references, indexed by [`Direction2D::index`].
  #[inline]
  pub fn edges(&self) -> &[Option<NodeId>; 4] {
    &self.edges
  }

  #[inline]
  pub fn edge(&self, direction: Direction2D) -> Option<NodeId> {
    self.edges[direction.index()]
  }

  #[inline]
  pub fn state(&self) -> &PatchState {
    &self.state
  }

  /// Request latched while rebuilding, if any.
  #[inline]
  pub fn next_state(&self) -> Option<StateRequest> {
    self.next_state
  }

  /// Last committed mesh.
  #[inline]
  pub fn mesh(&self) -> Option<&Arc<PatchMesh>> {
    self.mesh.as_ref()
  }

  /// Error of the most recent failed build, cleared by the next success.
  #[inline]
  pub fn last_error(&self) -> Option<&TerrainError> {
    self.last_error.as_ref()
  }

  /// Global position of the patch origin for a body at `body`.
  #[inline]
  pub fn global_position(&self, body: GlobalPosition) -> GlobalPosition {
    body + self.origin.as_dvec3()
  }

  pub(crate) fn neighbor_info(&self, id: NodeId) -> NeighborInfo {
    NeighborInfo {
      id,
      center: self.center,
      level: self.level,
      edges: self.edges,
    }
  }

  pub(crate) fn mesh_request(
    &self,
    radius: f64,
    edge_subdivisions: u32,
    coarser_edges: [u32; 4],
  ) -> MeshRequest {
    MeshRequest {
      face: self.face,
      edge_subdivisions,
      center: self.center,
      level: self.level,
      origin: self.origin,
      radius,
      coarser_edges,
    }
  }

  /// Route a state request.
  ///
  /// Returns the request if it can be applied now; while rebuilding it is
  /// latched instead and `None` is returned.
  pub(crate) fn request_state(&mut self, request: StateRequest) -> Option<StateRequest> {
    if self.state.is_rebuilding() {
      self.next_state = Some(StateRequest::merge(self.next_state, request));
      None
    } else {
      Some(request)
    }
  }

  pub(crate) fn begin_rebuild(&mut self, handle: BuildHandle) {
    debug_assert!(!self.state.is_rebuilding(), "patch already has a build in flight");
    self.state = PatchState::Rebuilding(handle);
  }

  /// Take the in-flight build, leaving the patch `Active`.
  pub(crate) fn take_build(&mut self) -> Option<BuildHandle> {
    match std::mem::replace(&mut self.state, PatchState::Active) {
      PatchState::Rebuilding(handle) => Some(handle),
      other => {
        self.state = other;
        None
      }
    }
  }

  /// Commit a joined build and release the latched request.
  ///
  /// The patch is `Active` afterwards, with or without a mesh.
  pub(crate) fn finish_build(
    &mut self,
    result: Result<PatchMesh>,
  ) -> (std::result::Result<Arc<PatchMesh>, TerrainError>, Option<StateRequest>) {
    self.state = PatchState::Active;
    let committed = match result {
      Ok(mesh) => {
        let mesh = Arc::new(mesh);
        self.mesh = Some(Arc::clone(&mesh));
        self.last_error = None;
        Ok(mesh)
      }
      Err(err) => {
        self.last_error = Some(err.clone());
        Err(err)
      }
    };
    (committed, self.next_state.take())
  }
}
