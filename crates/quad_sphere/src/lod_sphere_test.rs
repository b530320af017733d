//! Tests for the quad-sphere LOD controller.

use std::sync::{Arc, Mutex};

use glam::{DVec2, DVec3, Vec3};

use super::*;
use crate::mesh::{build_patch_mesh, MeshRequest};
use crate::reference_frame::OffsetFrame;
use crate::threading::{BuildHandle, BuildSender, InlineDispatcher};

// =============================================================================
// Helpers
// =============================================================================

fn config() -> QuadSphereConfig {
  QuadSphereConfig::new(1000.0)
    .with_root_subdivision_distance(1000.0)
    .with_edge_subdivisions(3)
}

fn identity() -> OffsetFrame {
  OffsetFrame::new(GlobalPosition::ZERO)
}

/// Sphere whose level 0 meshes are already committed.
fn settled(config: QuadSphereConfig) -> LodQuadSphere {
  let mut sphere = LodQuadSphere::new(config, Arc::new(InlineDispatcher), Vec3::ZERO).unwrap();
  let report = sphere.step(&[], &identity()).unwrap();
  assert_eq!(report.builds_completed, 6);
  sphere.drain_events();
  sphere
}

fn poi(x: f64, y: f64, z: f64) -> GlobalPosition {
  GlobalPosition::new(x, y, z)
}

fn root_key(sphere: &LodQuadSphere, face: CubeFace) -> PatchKey {
  PatchKey {
    face,
    node: sphere.tree(face).root(),
  }
}

/// Leaf invariant: leaf ⇔ no children, payloads only on leaves, every leaf
/// has a patch matching its node.
fn assert_tree_invariants(sphere: &LodQuadSphere) {
  for face in CubeFace::ALL {
    let tree = sphere.tree(face);
    for (id, node) in tree.iter() {
      assert_eq!(node.is_leaf(), node.children().is_none());
      if node.is_leaf() {
        let patch = node.value().unwrap_or_else(|| panic!("leaf {id:?} on {face:?} has no patch"));
        assert_eq!(patch.level(), node.level);
        assert_eq!(patch.center(), node.center);
        assert_eq!(patch.face(), face);
      } else {
        assert!(node.value().is_none(), "internal node {id:?} carries a patch");
      }
    }
  }
}

/// Dispatcher that keeps builds pending until the test releases them.
#[derive(Default)]
struct ManualDispatcher {
  pending: Mutex<Vec<(MeshRequest, BuildSender)>>,
}

impl ManualDispatcher {
  fn release_all(&self) -> usize {
    let pending = std::mem::take(&mut *self.pending.lock().unwrap());
    let count = pending.len();
    for (request, tx) in pending {
      tx.send(build_patch_mesh(&request)).unwrap();
    }
    count
  }
}

impl MeshDispatcher for ManualDispatcher {
  fn submit(&self, request: MeshRequest) -> BuildHandle {
    let (tx, handle) = BuildHandle::channel();
    self.pending.lock().unwrap().push((request, tx));
    handle
  }

  fn in_flight(&self) -> usize {
    self.pending.lock().unwrap().len()
  }
}

/// Dispatcher whose workers vanish without answering.
struct VanishingDispatcher;

impl MeshDispatcher for VanishingDispatcher {
  fn submit(&self, _request: MeshRequest) -> BuildHandle {
    let (tx, handle) = BuildHandle::channel();
    drop(tx);
    handle
  }
}

/// Builds normally except on one face, where the grid is too large to index.
struct OversizedFaceDispatcher(CubeFace);

impl MeshDispatcher for OversizedFaceDispatcher {
  fn submit(&self, mut request: MeshRequest) -> BuildHandle {
    if request.face == self.0 {
      request.edge_subdivisions = 9;
    }
    BuildHandle::ready(build_patch_mesh(&request))
  }
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_new_creates_six_rebuilding_roots() {
  let sphere = LodQuadSphere::new(config(), Arc::new(InlineDispatcher), Vec3::ZERO).unwrap();
  let stats = sphere.stats();
  assert_eq!(stats.patches, 6);
  assert_eq!(stats.rebuilding, 6);
  assert_eq!(stats.leaves_per_level, vec![6]);
  assert_eq!(sphere.metrics().builds_dispatched, 6);

  for face in CubeFace::ALL {
    let patch = sphere.patch(root_key(&sphere, face)).unwrap();
    assert_eq!(patch.level(), 0);
    assert_eq!(patch.size(), 2.0);
    assert!((patch.origin().as_dvec3() - face.normal() * 1000.0).length() < 1e-3);
  }
}

#[test]
fn test_new_rejects_invalid_config() {
  let result = LodQuadSphere::new(
    config().with_edge_subdivisions(8),
    Arc::new(InlineDispatcher),
    Vec3::ZERO,
  );
  assert!(matches!(result, Err(TerrainError::MeshTooLarge { .. })));

  let result = LodQuadSphere::new(QuadSphereConfig::new(-1.0), Arc::new(InlineDispatcher), Vec3::ZERO);
  assert!(matches!(result, Err(TerrainError::InvalidConfig(_))));
}

#[test]
fn test_first_step_commits_root_meshes() {
  let mut sphere = LodQuadSphere::new(config(), Arc::new(InlineDispatcher), Vec3::ZERO).unwrap();
  sphere.step(&[], &identity()).unwrap();

  let events = sphere.drain_events();
  assert_eq!(events.len(), 6);
  assert!(events
    .iter()
    .all(|e| matches!(e, TerrainEvent::MeshCommitted { level: 0, mesh, .. } if mesh.vertex_count() == 81)));
  assert!(sphere.drain_events().is_empty());

  let stats = sphere.stats();
  assert_eq!(stats.rebuilding, 0);
  assert_eq!(stats.with_mesh, 6);
  assert_eq!(sphere.metrics().builds_completed, 6);
}

// =============================================================================
// Subdivision policy
// =============================================================================

#[test]
fn test_poi_at_face_origin_subdivides_that_face_once() {
  let mut sphere = settled(config());
  let report = sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();

  assert_eq!(report.subdivisions, 1);
  assert_eq!(report.unsubdivisions, 0);
  assert_eq!(report.patches_removed, 1);
  assert_eq!(report.builds_dispatched, 4);
  assert_eq!(report.builds_completed, 4);
  assert_eq!(report.pending_builds, 0);

  let tree = sphere.tree(CubeFace::Xp);
  let children = tree.children(tree.root()).unwrap();
  let mut centers: Vec<_> = children
    .iter()
    .map(|c| {
      let patch = tree.value(*c).unwrap();
      assert_eq!(patch.level(), 1);
      assert_eq!(patch.size(), 1.0);
      assert!(patch.state().is_active());
      assert!(patch.mesh().is_some());
      patch.center()
    })
    .collect();
  centers.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
  assert_eq!(
    centers,
    vec![
      DVec2::new(-0.5, -0.5),
      DVec2::new(-0.5, 0.5),
      DVec2::new(0.5, -0.5),
      DVec2::new(0.5, 0.5),
    ]
  );

  for face in CubeFace::ALL.into_iter().filter(|f| *f != CubeFace::Xp) {
    assert!(sphere.tree(face).is_leaf(sphere.tree(face).root()));
  }

  let events = sphere.drain_events();
  let removed = events
    .iter()
    .filter(|e| matches!(e, TerrainEvent::PatchRemoved { .. }))
    .count();
  let committed = events
    .iter()
    .filter(|e| matches!(e, TerrainEvent::MeshCommitted { level: 1, .. }))
    .count();
  assert_eq!((removed, committed), (1, 4));

  // The children are out of reach of level 1 subdivision.
  let report = sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  assert_eq!(report, StepReport::default());
}

#[test]
fn test_empty_pois_change_nothing() {
  let mut sphere = settled(config());
  sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  let before = sphere.stats();

  let report = sphere.step(&[], &identity()).unwrap();
  assert_eq!(report, StepReport::default());
  assert_eq!(sphere.stats(), before);
}

#[test]
fn test_hysteresis_keeps_lod_stable_at_threshold() {
  let mut sphere = settled(config());

  // Exactly at the subdivision distance: not closer, no subdivide.
  for _ in 0..3 {
    let report = sphere.step(&[poi(2000.0, 0.0, 0.0)], &identity()).unwrap();
    assert_eq!(report.subdivisions, 0);
  }

  let report = sphere.step(&[poi(1999.0, 0.0, 0.0)], &identity()).unwrap();
  assert_eq!(report.subdivisions, 1);

  // Back at the threshold: the children are not beyond twice their distance.
  for _ in 0..5 {
    let report = sphere.step(&[poi(2000.0, 0.0, 0.0)], &identity()).unwrap();
    assert_eq!(report.subdivisions, 0);
    assert_eq!(report.unsubdivisions, 0);
  }
  assert_eq!(sphere.stats().leaves_per_level, vec![5, 4]);

  let report = sphere.step(&[poi(2000.5, 0.0, 0.0)], &identity()).unwrap();
  assert_eq!(report.unsubdivisions, 1);
  assert_eq!(sphere.stats().leaves_per_level, vec![6]);
}

#[test]
fn test_subdivide_then_unsubdivide_restores_patch() {
  let mut sphere = settled(config());
  let key = root_key(&sphere, CubeFace::Xp);
  let (center, level, bounds) = {
    let p = sphere.patch(key).unwrap();
    (p.center(), p.level(), p.bounds())
  };

  sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  assert!(sphere.patch(key).is_none());

  let report = sphere.step(&[poi(0.0, 0.0, 1.0e6)], &identity()).unwrap();
  assert_eq!(report.unsubdivisions, 1);
  assert_eq!(report.patches_removed, 4);
  assert_eq!(report.builds_completed, 1);

  let restored = sphere.patch(key).unwrap();
  assert_eq!(restored.center(), center);
  assert_eq!(restored.level(), level);
  assert_eq!(restored.bounds(), bounds);
  assert!(restored.state().is_active());
  assert!(restored.mesh().is_some());
  assert_eq!(sphere.stats().patches, 6);
  assert_eq!(sphere.metrics().live_patches(), 6);
  assert_tree_invariants(&sphere);
}

#[test]
fn test_depth_limit_stops_subdivision() {
  let mut sphere = settled(config().with_hard_limit(1));
  for _ in 0..4 {
    sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  }
  let child0 = {
    let tree = sphere.tree(CubeFace::Xp);
    tree.children(tree.root()).unwrap()[0]
  };
  let origin = sphere
    .patch(PatchKey {
      face: CubeFace::Xp,
      node: child0,
    })
    .unwrap()
    .global_position(GlobalPosition::ZERO);

  // Sitting on a level 1 patch at the hard limit.
  let report = sphere.step(&[origin], &identity()).unwrap();
  assert_eq!(report.subdivisions, 0);
  assert_eq!(sphere.stats().deepest_level, 1);
}

// =============================================================================
// Stitching
// =============================================================================

#[test]
fn test_siblings_are_stitched_both_ways() {
  let mut sphere = settled(config());
  sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();

  let tree = sphere.tree(CubeFace::Xp);
  let [c0, c1, c2, c3] = tree.children(tree.root()).unwrap();
  let edge = |id, dir| tree.value(id).unwrap().edge(dir);

  assert_eq!(edge(c0, Direction2D::Xp), Some(c1));
  assert_eq!(edge(c1, Direction2D::Xn), Some(c0));
  assert_eq!(edge(c0, Direction2D::Yp), Some(c2));
  assert_eq!(edge(c2, Direction2D::Yn), Some(c0));
  assert_eq!(edge(c3, Direction2D::Xn), Some(c2));
  assert_eq!(edge(c2, Direction2D::Xp), Some(c3));
  assert_eq!(edge(c3, Direction2D::Yn), Some(c1));
  assert_eq!(edge(c1, Direction2D::Yp), Some(c3));

  // Face borders have no in-face neighbor.
  assert_eq!(edge(c0, Direction2D::Xn), None);
  assert_eq!(edge(c0, Direction2D::Yn), None);
}

#[test]
fn test_finer_patch_links_to_coarser_neighbor() {
  let mut sphere = settled(config().with_hard_limit(2));
  sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();

  let [c0, c1, _, _] = {
    let tree = sphere.tree(CubeFace::Xp);
    tree.children(tree.root()).unwrap()
  };
  let target = sphere
    .patch(PatchKey {
      face: CubeFace::Xp,
      node: c0,
    })
    .unwrap()
    .global_position(GlobalPosition::ZERO);

  let report = sphere.step(&[target], &identity()).unwrap();
  assert_eq!(report.subdivisions, 1);
  assert_tree_invariants(&sphere);

  let tree = sphere.tree(CubeFace::Xp);
  let grandchildren = tree.children(c0).unwrap();
  // Child 1 of the subdivided quadrant borders the coarser level 1 patch on +X.
  let g1 = tree.value(grandchildren[1]).unwrap();
  assert_eq!(g1.center(), DVec2::new(-0.25, -0.75));
  assert_eq!(g1.edge(Direction2D::Xp), Some(c1));
  assert_eq!(g1.edge(Direction2D::Xn), Some(grandchildren[0]));
  assert_eq!(g1.edge(Direction2D::Yp), Some(grandchildren[3]));

  // The coarse neighbor is not rewired to a single finer patch.
  let coarse = tree.value(c1).unwrap();
  assert_ne!(coarse.edge(Direction2D::Xn), Some(grandchildren[1]));
}

// =============================================================================
// Build completion
// =============================================================================

#[test]
fn test_failed_builds_leave_patches_active_without_mesh() {
  let mut sphere = LodQuadSphere::new(config(), Arc::new(VanishingDispatcher), Vec3::ZERO).unwrap();
  let report = sphere.step(&[], &identity()).unwrap();

  assert_eq!(report.builds_failed, 6);
  assert_eq!(report.builds_completed, 0);
  assert_eq!(sphere.metrics().builds_failed, 6);
  for (_, patch) in sphere.patches() {
    assert!(patch.state().is_active());
    assert!(patch.mesh().is_none());
    assert!(matches!(patch.last_error(), Some(TerrainError::BuildAbandoned(_))));
  }
  assert!(sphere.drain_events().is_empty());

  // Failed patches still take part in LOD evaluation.
  let report = sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  assert_eq!(report.subdivisions, 1);
}

#[test]
fn test_configuration_error_aborts_only_that_patch() {
  let dispatcher = Arc::new(OversizedFaceDispatcher(CubeFace::Zn));
  let mut sphere = LodQuadSphere::new(config(), dispatcher, Vec3::ZERO).unwrap();
  let report = sphere.step(&[], &identity()).unwrap();

  assert_eq!(report.builds_failed, 1);
  assert_eq!(report.builds_completed, 5);
  assert_eq!(sphere.metrics().builds_failed, 1);

  let committed: Vec<_> = sphere
    .drain_events()
    .into_iter()
    .filter_map(|e| match e {
      TerrainEvent::MeshCommitted { key, .. } => Some(key.face),
      _ => None,
    })
    .collect();
  assert_eq!(committed.len(), 5);
  assert!(!committed.contains(&CubeFace::Zn));

  for (key, patch) in sphere.patches() {
    assert!(patch.state().is_active());
    if key.face == CubeFace::Zn {
      assert!(patch.mesh().is_none());
      assert!(matches!(
        patch.last_error(),
        Some(TerrainError::MeshTooLarge { subdivisions: 9, .. })
      ));
    } else {
      assert!(patch.mesh().is_some());
      assert!(patch.last_error().is_none());
    }
  }
}

#[test]
fn test_poll_mode_leaves_unfinished_builds_pending() {
  let dispatcher = Arc::new(ManualDispatcher::default());
  let config = config().with_build_completion(BuildCompletion::Poll);
  let mut sphere = LodQuadSphere::new(config, dispatcher.clone(), Vec3::ZERO).unwrap();
  assert_eq!(dispatcher.in_flight(), 6);

  let report = sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  assert_eq!(report.builds_completed, 0);
  assert_eq!(report.pending_builds, 6);
  // Rebuilding patches are not evaluated.
  assert_eq!(report.subdivisions, 0);

  assert_eq!(dispatcher.release_all(), 6);
  let report = sphere.step(&[], &identity()).unwrap();
  assert_eq!(report.builds_completed, 6);
  assert_eq!(report.pending_builds, 0);
  assert_eq!(sphere.stats().with_mesh, 6);
}

#[test]
fn test_rebuild_requested_while_rebuilding_is_latched() {
  let dispatcher = Arc::new(ManualDispatcher::default());
  let config = config().with_build_completion(BuildCompletion::Poll);
  let mut sphere = LodQuadSphere::new(config, dispatcher.clone(), Vec3::ZERO).unwrap();
  let key = root_key(&sphere, CubeFace::Yp);

  let mut report = StepReport::default();
  sphere.request_state(key, StateRequest::Rebuild, &mut report).unwrap();
  assert_eq!(report.builds_dispatched, 0);
  assert_eq!(sphere.patch(key).unwrap().next_state(), Some(StateRequest::Rebuild));
  assert_eq!(dispatcher.in_flight(), 6);

  dispatcher.release_all();
  let report = sphere.step(&[], &identity()).unwrap();
  assert_eq!(report.builds_completed, 6);
  // The latched request starts exactly one more build.
  assert_eq!(report.builds_dispatched, 1);
  assert_eq!(report.pending_builds, 1);
  assert!(sphere.patch(key).unwrap().state().is_rebuilding());
  assert_eq!(sphere.patch(key).unwrap().next_state(), None);
}

#[test]
fn test_rayon_dispatcher_end_to_end() {
  let dispatcher = Arc::new(crate::threading::RayonDispatcher::new());
  let mut sphere = LodQuadSphere::new(config(), dispatcher, Vec3::ZERO).unwrap();
  sphere.step(&[], &identity()).unwrap();
  let report = sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  assert_eq!(report.builds_completed, 4);
  assert_eq!(sphere.stats().with_mesh, 9);
}

// =============================================================================
// Frames
// =============================================================================

#[test]
fn test_frame_switch_keeps_global_lod() {
  let mut sphere = settled(config());
  let frame = OffsetFrame::shared(GlobalPosition::ZERO);
  sphere.step(&[poi(1000.0, 0.0, 0.0)], &*frame).unwrap();

  let shifted = frame.shift(Vec3::new(5000.0, 0.0, 0.0));
  sphere.on_frame_switch(&FrameSwitch {
    old: frame,
    new: shifted.clone(),
  });
  assert_eq!(sphere.body_position(), Vec3::new(-5000.0, 0.0, 0.0));

  // Same global POI through the new frame: nothing changes.
  let report = sphere.step(&[poi(1000.0, 0.0, 0.0)], &*shifted).unwrap();
  assert_eq!(report, StepReport::default());
  assert_eq!(sphere.stats().leaves_per_level, vec![5, 4]);
}

#[test]
fn test_moving_body_moves_patches() {
  let mut sphere = settled(config());
  sphere.set_body_position(Vec3::new(0.0, 0.0, 10_000.0));

  // The old POI is far from the moved body.
  let report = sphere.step(&[poi(1000.0, 0.0, 0.0)], &identity()).unwrap();
  assert_eq!(report.subdivisions, 0);

  let report = sphere.step(&[poi(1000.0, 0.0, 10_000.0)], &identity()).unwrap();
  assert_eq!(report.subdivisions, 1);
}

// =============================================================================
// Random walk
// =============================================================================

#[test]
fn test_random_walk_preserves_invariants() {
  use rand::{Rng, SeedableRng};

  let mut rng = rand::rngs::StdRng::seed_from_u64(42);
  let mut sphere = settled(config().with_hard_limit(4));

  for _ in 0..40 {
    let direction = DVec3::new(
      rng.random_range(-1.0..1.0),
      rng.random_range(-1.0..1.0),
      rng.random_range(-1.0..1.0),
    )
    .normalize_or(DVec3::X);
    let altitude = rng.random_range(1.0..1500.0);
    let p = GlobalPosition::from(direction * (1000.0 + altitude));

    sphere.step(&[p], &identity()).unwrap();
    assert_tree_invariants(&sphere);
    assert_eq!(sphere.stats().rebuilding, 0);
  }

  let live = sphere.patches().count() as u64;
  assert_eq!(sphere.metrics().live_patches(), live);
}
