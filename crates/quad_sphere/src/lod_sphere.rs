//! LodQuadSphere - adaptive terrain for one spherical body.
//!
//! Six quadtrees, one per cube face, whose leaves own the terrain patches.
//! Each [`LodQuadSphere::step`] runs two phases:
//!
//! ```text
//!   evaluate                                   complete
//!   ────────                                   ────────
//!   for every Active leaf:                      for every Rebuilding patch:
//!     POI close   → subdivide ─┐                  join (Blocking) / poll (Poll)
//!     all POIs far → unsubdivide ┤                commit mesh or record error
//!                               ▼                  apply latched request
//!                 tree surgery + stitching
//!                               ▼
//!                 rebuild requests → dispatcher
//! ```
//!
//! Tree surgery and stitching for one decision finish before any build is
//! dispatched, so a build always sees final neighbor levels.

use std::sync::Arc;

use glam::DVec2;
use smallvec::SmallVec;

use crate::config::QuadSphereConfig;
use crate::constants::{ROOT_FACE_SIZE, UNSUBDIVIDE_HYSTERESIS};
use crate::error::{Result, TerrainError};
use crate::metrics::BuildMetrics;
use crate::patch::{stitch, NeighborInfo, Patch, PatchState, StateRequest};
use crate::quadtree::{NodeId, QuadTree};
use crate::reference_frame::{
  FrameSwitch, FrameSwitchResponder, GlobalPosition, LocalPosition, ReferenceFrame,
};
use crate::sphere::{CubeFace, Direction2D};
use crate::threading::{BuildCompletion, MeshDispatcher};
use crate::types::PatchMesh;

/// Address of a patch: the face tree and the leaf holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatchKey {
  pub face: CubeFace,
  pub node: NodeId,
}

/// Notifications for whoever uploads meshes.
#[derive(Clone, Debug)]
pub enum TerrainEvent {
  /// A build finished and its mesh is now the patch's mesh.
  MeshCommitted {
    key: PatchKey,
    level: u32,
    mesh: Arc<PatchMesh>,
  },
  /// A patch was destroyed by a subdivide or unsubdivide.
  PatchRemoved { key: PatchKey },
}

/// What one step did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
  pub subdivisions: usize,
  pub unsubdivisions: usize,
  pub builds_dispatched: usize,
  pub builds_completed: usize,
  pub builds_failed: usize,
  pub patches_removed: usize,
  /// Builds still outstanding after the completion phase.
  pub pending_builds: usize,
}

/// Snapshot of the patch population.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SphereStats {
  /// Leaf patches per level, indexed by level.
  pub leaves_per_level: Vec<usize>,
  pub patches: usize,
  pub rebuilding: usize,
  pub with_mesh: usize,
  pub deepest_level: u32,
}

enum Decision {
  Keep,
  Subdivide,
  Unsubdivide,
}

/// Adaptive quad-sphere terrain.
pub struct LodQuadSphere {
  config: QuadSphereConfig,
  faces: [QuadTree<Patch>; 6],
  dispatcher: Arc<dyn MeshDispatcher>,
  body_position: LocalPosition,
  events: Vec<TerrainEvent>,
  metrics: BuildMetrics,
}

impl LodQuadSphere {
  /// Create the six level 0 patches and dispatch their first builds.
  ///
  /// `body_position` is the body center in the current scene frame.
  pub fn new(
    config: QuadSphereConfig,
    dispatcher: Arc<dyn MeshDispatcher>,
    body_position: LocalPosition,
  ) -> Result<Self> {
    config.validate()?;

    let faces = std::array::from_fn(|_| QuadTree::new(ROOT_FACE_SIZE, config.hard_limit));
    let mut sphere = Self {
      config,
      faces,
      dispatcher,
      body_position,
      events: Vec::new(),
      metrics: BuildMetrics::new(),
    };

    let mut report = StepReport::default();
    for face in CubeFace::ALL {
      let root = sphere.faces[face.index()].root();
      sphere.materialize(face, root)?;
      sphere.request_state(PatchKey { face, node: root }, StateRequest::Rebuild, &mut report)?;
    }

    tracing::debug!(
      radius = sphere.config.radius,
      edge_subdivisions = sphere.config.edge_subdivisions,
      hard_limit = sphere.config.hard_limit,
      "quad sphere created"
    );
    Ok(sphere)
  }

  #[inline]
  pub fn config(&self) -> &QuadSphereConfig {
    &self.config
  }

  /// Body center in the current scene frame.
  #[inline]
  pub fn body_position(&self) -> LocalPosition {
    self.body_position
  }

  /// Move the body (orbits are driven from outside).
  #[inline]
  pub fn set_body_position(&mut self, position: LocalPosition) {
    self.body_position = position;
  }

  /// Quadtree of one face.
  #[inline]
  pub fn tree(&self, face: CubeFace) -> &QuadTree<Patch> {
    &self.faces[face.index()]
  }

  #[inline]
  pub fn metrics(&self) -> &BuildMetrics {
    &self.metrics
  }

  /// Patch stored at `key`, if the leaf still exists.
  pub fn patch(&self, key: PatchKey) -> Option<&Patch> {
    self.faces[key.face.index()].value(key.node)
  }

  /// Every live patch.
  pub fn patches(&self) -> impl Iterator<Item = (PatchKey, &Patch)> + '_ {
    CubeFace::ALL.into_iter().flat_map(move |face| {
      self.faces[face.index()].iter().filter_map(move |(node, n)| {
        n.value().map(|patch| (PatchKey { face, node }, patch))
      })
    })
  }

  /// Take the events produced since the last drain.
  pub fn drain_events(&mut self) -> Vec<TerrainEvent> {
    std::mem::take(&mut self.events)
  }

  pub fn stats(&self) -> SphereStats {
    let mut stats = SphereStats::default();
    for (_, patch) in self.patches() {
      let level = patch.level() as usize;
      if stats.leaves_per_level.len() <= level {
        stats.leaves_per_level.resize(level + 1, 0);
      }
      stats.leaves_per_level[level] += 1;
      stats.patches += 1;
      stats.deepest_level = stats.deepest_level.max(patch.level());
      if patch.state().is_rebuilding() {
        stats.rebuilding += 1;
      }
      if patch.mesh().is_some() {
        stats.with_mesh += 1;
      }
    }
    stats
  }

  /// Advance the terrain one step for `pois` seen through `frame`.
  ///
  /// `frame` must be the active scene frame; it is not retained.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "lod_sphere::step"))]
  pub fn step(&mut self, pois: &[GlobalPosition], frame: &dyn ReferenceFrame) -> Result<StepReport> {
    let mut report = StepReport::default();
    let body = frame.transform_to_global(self.body_position);

    if !pois.is_empty() {
      for face in CubeFace::ALL {
        self.evaluate_face(face, pois, body, &mut report)?;
      }
    }

    self.complete_builds(&mut report)?;
    report.pending_builds = self.stats().rebuilding;
    Ok(report)
  }

  // ===========================================================================
  // Evaluation
  // ===========================================================================

  fn evaluate_face(
    &mut self,
    face: CubeFace,
    pois: &[GlobalPosition],
    body: GlobalPosition,
    report: &mut StepReport,
  ) -> Result<()> {
    let tree = &self.faces[face.index()];
    let candidates: Vec<NodeId> = tree
      .leaves()
      .into_iter()
      .filter(|id| tree.value(*id).is_some_and(|p| p.state().is_active()))
      .collect();

    for id in candidates {
      let key = PatchKey { face, node: id };
      match self.decide(key, pois, body) {
        Decision::Keep => {}
        Decision::Subdivide => {
          self.subdivide_patch(key, report)?;
        }
        Decision::Unsubdivide => {
          self.unsubdivide_patch(key, report)?;
        }
      }
    }
    Ok(())
  }

  fn decide(&self, key: PatchKey, pois: &[GlobalPosition], body: GlobalPosition) -> Decision {
    let tree = &self.faces[key.face.index()];
    // Earlier surgery in this step may have removed the leaf.
    let Some(patch) = tree.value(key.node) else {
      return Decision::Keep;
    };
    if !patch.state().is_active() {
      return Decision::Keep;
    }

    let distance = patch.subdivision_distance();
    let position = patch.global_position(body);
    if patch.level() < self.config.hard_limit && pois.iter().any(|p| p.distance(position) < distance)
    {
      return Decision::Subdivide;
    }

    if patch.level() == 0 {
      return Decision::Keep;
    }
    let Some(parent) = tree.parent(key.node).and_then(|p| tree.get(p)) else {
      return Decision::Keep;
    };
    let parent_position = body + self.surface_point(key.face, parent.center);
    let threshold = UNSUBDIVIDE_HYSTERESIS * distance;
    if pois.iter().all(|p| p.distance(parent_position) > threshold) {
      Decision::Unsubdivide
    } else {
      Decision::Keep
    }
  }

  #[cfg_attr(
    feature = "trace_spans",
    tracing::instrument(skip_all, name = "lod_sphere::subdivide")
  )]
  fn subdivide_patch(&mut self, key: PatchKey, report: &mut StepReport) -> Result<()> {
    let tree = &mut self.faces[key.face.index()];
    let patch = tree
      .take_value(key.node)
      .ok_or(TerrainError::MissingPatch(key.node))?;
    let children = match tree.subdivide(key.node) {
      Ok(children) => children,
      Err(err) => {
        tree.set_value(key.node, patch)?;
        return Err(err);
      }
    };

    tracing::debug!(
      face = ?key.face,
      level = patch.level(),
      center = ?patch.center(),
      "subdivide"
    );
    self.retire(key, patch, report);

    for child in children {
      self.materialize(key.face, child)?;
    }

    let mut rebuild: SmallVec<[NodeId; 12]> = SmallVec::new();
    for child in children {
      for changed in self.stitch_patch(key.face, child)? {
        if !children.contains(&changed) && !rebuild.contains(&changed) {
          rebuild.push(changed);
        }
      }
    }

    for node in children.into_iter().chain(rebuild) {
      self.request_state(PatchKey { face: key.face, node }, StateRequest::Rebuild, report)?;
    }

    self.metrics.subdivisions += 1;
    report.subdivisions += 1;
    Ok(())
  }

  #[cfg_attr(
    feature = "trace_spans",
    tracing::instrument(skip_all, name = "lod_sphere::unsubdivide")
  )]
  fn unsubdivide_patch(&mut self, key: PatchKey, report: &mut StepReport) -> Result<()> {
    let tree = &mut self.faces[key.face.index()];
    let parent = tree.parent(key.node).ok_or(TerrainError::UnsubdivideRoot)?;
    let children = tree.children(parent).ok_or(TerrainError::NotSubdivided(parent))?;

    // Siblings still refining or building: try again next step.
    let busy = children.iter().any(|c| {
      !tree.is_leaf(*c) || tree.value(*c).is_none_or(|p| p.state().is_rebuilding())
    });
    if busy {
      return Ok(());
    }

    let mut removed: SmallVec<[(NodeId, Patch); 4]> = SmallVec::new();
    for child in children {
      if let Some(patch) = tree.take_value(child) {
        removed.push((child, patch));
      }
    }
    let orphans = tree.make_leaf(parent)?;
    debug_assert!(orphans.is_empty(), "leaf children cannot hold descendants");

    for (node, patch) in removed {
      self.retire(PatchKey { face: key.face, node }, patch, report);
    }
    for orphan in orphans {
      Self::join_outstanding(orphan);
    }

    self.materialize(key.face, parent)?;
    if let Some(patch) = self.faces[key.face.index()].value(parent) {
      tracing::debug!(
        face = ?key.face,
        level = patch.level(),
        center = ?patch.center(),
        "unsubdivide"
      );
    }

    let changed = self.stitch_patch(key.face, parent)?;
    let parent_key = PatchKey { face: key.face, node: parent };
    self.request_state(parent_key, StateRequest::Rebuild, report)?;
    for node in changed {
      self.request_state(PatchKey { face: key.face, node }, StateRequest::Rebuild, report)?;
    }

    self.metrics.unsubdivisions += 1;
    report.unsubdivisions += 1;
    Ok(())
  }

  /// Attach a fresh `Idle` patch to a leaf.
  fn materialize(&mut self, face: CubeFace, node: NodeId) -> Result<()> {
    let tree = &mut self.faces[face.index()];
    let (center, level) = tree
      .get(node)
      .map(|n| (n.center, n.level))
      .ok_or(TerrainError::NodeNotFound(node))?;
    let patch = Patch::new(
      face,
      center,
      level,
      self.config.radius,
      self.config.subdivision_distance(level),
      self.config.material,
    );
    tree.set_value(node, patch)?;
    self.metrics.patches_created += 1;
    Ok(())
  }

  /// Tear down a detached patch: join its build and announce the removal.
  fn retire(&mut self, key: PatchKey, patch: Patch, report: &mut StepReport) {
    Self::join_outstanding(patch);
    self.events.push(TerrainEvent::PatchRemoved { key });
    self.metrics.patches_removed += 1;
    report.patches_removed += 1;
  }

  fn join_outstanding(mut patch: Patch) {
    if let Some(handle) = patch.take_build() {
      let id = handle.id();
      if let Err(err) = handle.join() {
        tracing::debug!(build = id, %err, "discarded build of removed patch failed");
      }
    }
  }

  /// Stitch a new patch against the leaves touching it and apply the result.
  ///
  /// Returns the neighbors whose edges changed.
  fn stitch_patch(&mut self, face: CubeFace, node: NodeId) -> Result<SmallVec<[NodeId; 4]>> {
    let tree = &mut self.faces[face.index()];
    let patch = tree.value(node).ok_or(TerrainError::MissingPatch(node))?;
    let new = patch.neighbor_info(node);
    let candidates: Vec<NeighborInfo> = tree
      .query_overlapping_leaves(&patch.bounds())
      .into_iter()
      .filter_map(|leaf| tree.value(leaf).map(|p| p.neighbor_info(leaf)))
      .collect();

    let outcome = stitch(&new, &candidates);

    if let Some(patch) = tree.value_mut(node) {
      patch.edges = outcome.edges;
    }
    for update in &outcome.updates {
      if let Some(neighbor) = tree.value_mut(update.neighbor) {
        neighbor.edges[update.direction.index()] = Some(update.target);
      }
    }

    Ok(outcome.changed().collect())
  }

  // ===========================================================================
  // State requests and dispatch
  // ===========================================================================

  fn request_state(
    &mut self,
    key: PatchKey,
    request: StateRequest,
    report: &mut StepReport,
  ) -> Result<()> {
    let patch = self.faces[key.face.index()]
      .value_mut(key.node)
      .ok_or(TerrainError::MissingPatch(key.node))?;

    match patch.request_state(request) {
      None => Ok(()),
      Some(StateRequest::Active) => {
        patch.state = PatchState::Active;
        Ok(())
      }
      Some(StateRequest::Rebuild) => self.dispatch(key, report),
    }
  }

  /// Levels by which each edge neighbor is coarser than the patch.
  fn coarser_edges(tree: &QuadTree<Patch>, patch: &Patch) -> [u32; 4] {
    Direction2D::ALL.map(|direction| {
      patch
        .edge(direction)
        .and_then(|id| tree.value(id))
        .map(|neighbor| patch.level().saturating_sub(neighbor.level()))
        .unwrap_or(0)
    })
  }

  fn dispatch(&mut self, key: PatchKey, report: &mut StepReport) -> Result<()> {
    let tree = &self.faces[key.face.index()];
    let patch = tree
      .value(key.node)
      .ok_or(TerrainError::MissingPatch(key.node))?;
    let coarser = Self::coarser_edges(tree, patch);
    let request = patch.mesh_request(self.config.radius, self.config.edge_subdivisions, coarser);

    let handle = self.dispatcher.submit(request);
    tracing::trace!(build = handle.id(), face = ?key.face, level = patch.level(), "dispatch");

    if let Some(patch) = self.faces[key.face.index()].value_mut(key.node) {
      patch.begin_rebuild(handle);
    }
    self.metrics.builds_dispatched += 1;
    report.builds_dispatched += 1;
    Ok(())
  }

  // ===========================================================================
  // Completion
  // ===========================================================================

  fn rebuilding(&self) -> Vec<PatchKey> {
    self
      .patches()
      .filter(|(_, p)| p.state().is_rebuilding())
      .map(|(key, _)| key)
      .collect()
  }

  #[cfg_attr(
    feature = "trace_spans",
    tracing::instrument(skip_all, name = "lod_sphere::complete")
  )]
  fn complete_builds(&mut self, report: &mut StepReport) -> Result<()> {
    let mode = self.config.build_completion;
    loop {
      let mut released = false;
      for key in self.rebuilding() {
        let Some(patch) = self.faces[key.face.index()].value_mut(key.node) else {
          continue;
        };
        let result = match mode {
          BuildCompletion::Blocking => patch.take_build().map(|handle| handle.join()),
          BuildCompletion::Poll => match &mut patch.state {
            PatchState::Rebuilding(handle) => handle.poll(),
            _ => None,
          },
        };
        let Some(result) = result else {
          continue;
        };

        let (committed, next) = patch.finish_build(result);
        let level = patch.level();
        match committed {
          Ok(mesh) => {
            self.metrics.record_build(mesh.build_time_us);
            report.builds_completed += 1;
            self.events.push(TerrainEvent::MeshCommitted { key, level, mesh });
          }
          Err(err) => {
            tracing::error!(
              face = ?key.face,
              level,
              center = ?patch.center(),
              %err,
              "patch build failed"
            );
            self.metrics.record_failure();
            report.builds_failed += 1;
          }
        }

        if let Some(next) = next {
          released = true;
          self.request_state(key, next, report)?;
        }
      }

      // Latched rebuilds dispatched above must also land within a blocking step.
      if !(released && mode == BuildCompletion::Blocking) {
        return Ok(());
      }
    }
  }

  /// Face-space center of a patch projected to the body surface.
  pub fn surface_point(&self, face: CubeFace, center: DVec2) -> glam::DVec3 {
    face.sphere_point_at(center) * self.config.radius
  }
}

impl FrameSwitchResponder for LodQuadSphere {
  fn on_frame_switch(&mut self, switch: &FrameSwitch) {
    self.body_position = switch.remap(self.body_position);
  }
}

impl std::fmt::Debug for LodQuadSphere {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LodQuadSphere")
      .field("config", &self.config)
      .field("body_position", &self.body_position)
      .field("patches", &self.patches().count())
      .field("pending_events", &self.events.len())
      .finish()
  }
}

#[cfg(test)]
#[path = "lod_sphere_test.rs"]
mod lod_sphere_test;
