//! Geodetic (latitude / longitude) projection of body-space directions.

use glam::{DVec3, Vec2};

/// Geodetic coordinates in degrees, with altitude relative to the unit sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geodetic {
  /// Angle above the equator (XZ plane), in `[-90, 90]`.
  pub latitude: f64,
  /// Angle around +Y measured from +X toward +Z, in `(-180, 180]`.
  pub longitude: f64,
  /// Distance from the center minus one.
  pub altitude: f64,
}

/// Convert a body-space position to geodetic coordinates.
///
/// The zero vector maps to latitude 0, longitude 0, altitude -1.
pub fn euclidean_to_geodetic(v: DVec3) -> Geodetic {
  let length = v.length();
  if length == 0.0 {
    return Geodetic {
      latitude: 0.0,
      longitude: 0.0,
      altitude: -1.0,
    };
  }

  let latitude = (v.y / length).clamp(-1.0, 1.0).asin().to_degrees();
  let longitude = v.z.atan2(v.x).to_degrees();

  Geodetic {
    latitude,
    longitude,
    altitude: length - 1.0,
  }
}

/// Equirectangular texture coordinates for a body-space direction.
///
/// `u` wraps with longitude, `v` runs from the south pole (0) to the north
/// pole (1).
#[inline]
pub fn geodetic_uv(v: DVec3) -> Vec2 {
  let g = euclidean_to_geodetic(v);
  Vec2::new(
    ((g.longitude + 180.0) / 360.0) as f32,
    ((g.latitude + 90.0) / 180.0) as f32,
  )
}
