//! The simulated vehicle entity.

use crate::math::geo::LatLng;
use crate::route::RouteIndex;
use crate::tariff::VehicleCategory;
use crate::VehicleId;
use smallvec::SmallVec;

/// A vehicle travelling the route.
///
/// Lifecycle: spawned at progress 0, travels with a fixed speed, and is
/// retired (removed from the vehicle set) once its progress reaches 1 or the
/// simulation completes. Progress only ever increases.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    pub(crate) id: VehicleId,
    /// The vehicle's category, fixed at spawn.
    category: VehicleCategory,
    /// The vehicle's speed in km/h, fixed at spawn.
    speed_kmh: f64,
    /// How far along the route the vehicle is, in [0, 1] plus overshoot.
    progress: f64,
    /// Indices of the route bindings this vehicle has already been charged
    /// at. Routes cross a handful of gantries, so a small inline vector
    /// beats a hash set.
    charged: SmallVec<[u16; 8]>,
}

impl Vehicle {
    /// Creates a new vehicle at the start of the route.
    pub(crate) fn new(id: VehicleId, category: VehicleCategory, speed_kmh: f64) -> Self {
        Self {
            id,
            category,
            speed_kmh,
            progress: 0.0,
            charged: SmallVec::new(),
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The vehicle's category.
    pub fn category(&self) -> VehicleCategory {
        self.category
    }

    /// The vehicle's speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// The vehicle's progress fraction along the route.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Advances the vehicle by `sim_dt` simulated seconds over a route of
    /// `route_len_m` metres. Returns `true` once the vehicle has reached the
    /// end of the route and should be retired.
    pub(crate) fn advance(&mut self, sim_dt: f64, route_len_m: f64) -> bool {
        let speed_mps = self.speed_kmh / 3.6;
        self.progress += speed_mps * sim_dt / route_len_m;
        self.progress >= 1.0
    }

    /// Whether the vehicle has already been charged at a binding.
    pub(crate) fn has_charged(&self, binding_idx: u16) -> bool {
        self.charged.contains(&binding_idx)
    }

    /// Marks a binding as charged for the lifetime of this vehicle.
    pub(crate) fn mark_charged(&mut self, binding_idx: u16) {
        self.charged.push(binding_idx);
    }

    /// Samples the vehicle's geographic position and bearing on the route.
    pub fn position_on(&self, route: &RouteIndex) -> (LatLng, f64) {
        route.position_at(self.progress)
    }
}
