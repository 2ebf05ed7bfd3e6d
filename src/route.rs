//! Cumulative-distance index over a route polyline.

use crate::math::geo::{bearing_deg, haversine_m, LatLng, LocalPlane};
use cgmath::prelude::*;
use itertools::Itertools;
use thiserror::Error;

/// Segments shorter than this are considered degenerate, in m.
const MIN_SEGMENT_LEN_M: f64 = 0.001;

/// The reasons a polyline cannot be indexed as a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvalidRouteError {
    /// The polyline has fewer than two points.
    #[error("a route needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    /// Two consecutive points are (nearly) coincident.
    #[error("segment {0} is shorter than the minimum segment length")]
    DegenerateSegment(usize),
}

/// The result of projecting a point onto a route.
#[derive(Clone, Copy, Debug)]
pub struct NearestPoint {
    /// The fraction along the route closest to the queried point.
    pub fraction: f64,
    /// The distance from the queried point to the route at that fraction, in m.
    pub distance_m: f64,
}

/// An immutable arc-length index over a route polyline.
///
/// Positions along the route are addressed by a fraction in [0, 1],
/// where 0 is the start of the route and 1 is the end.
#[derive(Clone, Debug)]
pub struct RouteIndex {
    /// The points of the polyline.
    points: Vec<LatLng>,
    /// The distance from the route start to each point, in m.
    /// Monotonically increasing; the last entry is the total length.
    cum_dist: Vec<f64>,
    /// The total route length in m.
    total_len: f64,
}

impl RouteIndex {
    /// Builds the index from a polyline.
    pub fn build(points: &[LatLng]) -> Result<Self, InvalidRouteError> {
        if points.len() < 2 {
            return Err(InvalidRouteError::TooFewPoints(points.len()));
        }
        let mut cum_dist = Vec::with_capacity(points.len());
        cum_dist.push(0.0);
        for (i, (a, b)) in points.iter().tuple_windows().enumerate() {
            let len = haversine_m(*a, *b);
            if len < MIN_SEGMENT_LEN_M {
                return Err(InvalidRouteError::DegenerateSegment(i));
            }
            cum_dist.push(cum_dist[i] + len);
        }
        let total_len = cum_dist[points.len() - 1];
        Ok(Self {
            points: points.to_vec(),
            cum_dist,
            total_len,
        })
    }

    /// The total route length in m.
    pub fn total_length(&self) -> f64 {
        self.total_len
    }

    /// The points of the polyline.
    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    /// Finds the index of the segment containing the given distance from the start.
    fn segment_at(&self, dist: f64) -> usize {
        let num_segs = self.points.len() - 1;
        let idx = self.cum_dist.partition_point(|d| *d <= dist);
        usize::min(idx.saturating_sub(1), num_segs - 1)
    }

    /// Samples the position and bearing of travel at a fraction along the route.
    ///
    /// The fraction is clamped to [0, 1]; slight overshoot from elapsed-time
    /// drift is expected and not an error.
    pub fn position_at(&self, fraction: f64) -> (LatLng, f64) {
        let dist = fraction.clamp(0.0, 1.0) * self.total_len;
        let i = self.segment_at(dist);
        let (a, b) = (self.points[i], self.points[i + 1]);
        let seg_len = self.cum_dist[i + 1] - self.cum_dist[i];
        let t = ((dist - self.cum_dist[i]) / seg_len).clamp(0.0, 1.0);
        let pos = LatLng::new(a.lat + t * (b.lat - a.lat), a.lng + t * (b.lng - a.lng));
        (pos, bearing_deg(a, b))
    }

    /// Finds the fraction along the route geometrically closest to `point`,
    /// by exact closest-point projection onto every segment in a local plane
    /// centred on the query point. Deterministic for a fixed route.
    pub fn nearest_fraction(&self, point: LatLng) -> NearestPoint {
        let plane = LocalPlane::new(point);
        let q = plane.project(point);
        let mut best = NearestPoint {
            fraction: 0.0,
            distance_m: f64::INFINITY,
        };
        for (i, (a, b)) in self.points.iter().tuple_windows().enumerate() {
            let pa = plane.project(*a);
            let pb = plane.project(*b);
            let ab = pb - pa;
            let t = ((q - pa).dot(ab) / ab.magnitude2()).clamp(0.0, 1.0);
            let dist = (q - (pa + t * ab)).magnitude();
            if dist < best.distance_m {
                let seg_len = self.cum_dist[i + 1] - self.cum_dist[i];
                best = NearestPoint {
                    fraction: (self.cum_dist[i] + t * seg_len) / self.total_len,
                    distance_m: dist,
                };
            }
        }
        best
    }
}
