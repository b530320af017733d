//! Round-trip and shift laws for reference frames.

use glam::{DVec3, Vec3};
use rand::{Rng, SeedableRng};

use super::*;

#[test]
fn test_offset_frame_round_trip() {
  let frame = OffsetFrame::new(GlobalPosition::new(1.0e6, -2.5e5, 3.0));
  let local = Vec3::new(12.5, -800.0, 4096.0);
  let global = frame.transform_to_global(local);
  assert_eq!(global, GlobalPosition::new(1.0e6 + 12.5, -2.5e5 - 800.0, 4099.0));
  assert_eq!(frame.transform_to_local(global), local);
}

#[test]
fn test_shift_preserves_global_position() {
  let mut rng = rand::rngs::StdRng::seed_from_u64(7);
  for _ in 0..200 {
    let origin = GlobalPosition::new(
      rng.random_range(-1.0e9..1.0e9),
      rng.random_range(-1.0e9..1.0e9),
      rng.random_range(-1.0e9..1.0e9),
    );
    let frame = OffsetFrame::shared(origin);
    let p = Vec3::new(
      rng.random_range(-1.0e4..1.0e4),
      rng.random_range(-1.0e4..1.0e4),
      rng.random_range(-1.0e4..1.0e4),
    );

    let shifted = frame.shift(p);
    let a = shifted.transform_to_global(Vec3::ZERO);
    let b = frame.transform_to_global(p);
    assert_eq!(a, b);

    // Local/global round trip within single precision of the local value.
    let x = Vec3::new(
      rng.random_range(-8192.0..8192.0),
      rng.random_range(-8192.0..8192.0),
      rng.random_range(-8192.0..8192.0),
    );
    let back = frame.transform_to_local(frame.transform_to_global(x));
    assert!((back - x).length() < 1e-3, "{x:?} -> {back:?}");
  }
}

#[test]
fn test_remap_through_switch() {
  let old = OffsetFrame::shared(GlobalPosition::new(1.0e6, 0.0, 0.0));
  let new = old.shift(Vec3::new(9000.0, 0.0, 0.0));
  let switch = FrameSwitch { old, new };

  assert_eq!(switch.remap(Vec3::new(9000.0, 0.0, 0.0)), Vec3::ZERO);
  assert_eq!(switch.remap(Vec3::new(9100.0, 5.0, 0.0)), Vec3::new(100.0, 5.0, 0.0));

  let mut points = [Vec3::ZERO, Vec3::new(9000.0, 1.0, 2.0)];
  switch.remap_all(&mut points);
  assert_eq!(points, [Vec3::new(-9000.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 2.0)]);
}

#[test]
fn test_far_positions_keep_precision_globally() {
  // A local offset lost to f32 at 1e9 is kept in the double precision origin.
  let frame = OffsetFrame::shared(GlobalPosition::new(1.0e9, 0.0, 0.0));
  let g = frame.transform_to_global(Vec3::new(0.25, 0.0, 0.0));
  assert_eq!(g.as_dvec3(), DVec3::new(1.0e9 + 0.25, 0.0, 0.0));
}

#[test]
fn test_global_position_ops() {
  let a = GlobalPosition::new(1.0, 2.0, 3.0);
  let mut b = a + DVec3::new(3.0, 2.0, 1.0);
  assert_eq!(b - a, DVec3::new(3.0, 2.0, 1.0));
  assert_eq!(a.distance(GlobalPosition::new(1.0, 2.0, 8.0)), 5.0);
  b += DVec3::ONE;
  assert_eq!(b, GlobalPosition::new(5.0, 5.0, 5.0));
  assert_eq!(GlobalPosition::from(DVec3::X), GlobalPosition::new(1.0, 0.0, 0.0));
}
