//! Geographic primitives: great-circle distances, bearings,
//! and a local planar projection for segment geometry.

use super::Point2d;
use serde::{Deserialize, Serialize};

/// Mean earth radius in m.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic coordinate in degrees.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new coordinate.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Computes the great-circle distance between two coordinates in m,
/// using the haversine formula.
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (0.5 * dlat).sin().powi(2) + lat1.cos() * lat2.cos() * (0.5 * dlng).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Computes the initial great-circle bearing from `a` to `b`,
/// in degrees clockwise from north, in the range [0, 360).
pub fn bearing_deg(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlng = (b.lng - a.lng).to_radians();
    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// An equirectangular projection centred on a reference coordinate.
///
/// Maps coordinates to a local plane in metres (x east, y north), which is
/// accurate enough near the origin for closest-point-on-segment projection.
#[derive(Clone, Copy, Debug)]
pub struct LocalPlane {
    origin: LatLng,
    cos_lat: f64,
}

impl LocalPlane {
    /// Creates a local plane centred on `origin`.
    pub fn new(origin: LatLng) -> Self {
        Self {
            origin,
            cos_lat: origin.lat.to_radians().cos(),
        }
    }

    /// Projects a coordinate onto the plane.
    pub fn project(&self, p: LatLng) -> Point2d {
        let x = (p.lng - self.origin.lng).to_radians() * self.cos_lat * EARTH_RADIUS_M;
        let y = (p.lat - self.origin.lat).to_radians() * EARTH_RADIUS_M;
        Point2d::new(x, y)
    }
}
