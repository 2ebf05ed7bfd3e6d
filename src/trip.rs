//! One-off trip cost estimation for a computed route.

use crate::gantry::RouteBinding;
use crate::route::RouteIndex;
use crate::tariff::VehicleCategory;
use serde::{Deserialize, Serialize};

/// The propulsion type used to estimate running cost per km.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    Gasoline,
    Diesel,
    Hybrid,
    Electric,
}

impl FuelType {
    /// Approximate running cost in CLP per km at current fuel prices.
    pub fn cost_per_km_clp(self) -> f64 {
        match self {
            FuelType::Gasoline => 108.0, // ~12 km/l at $1300/l
            FuelType::Diesel => 70.0,    // ~15 km/l at $1050/l
            FuelType::Hybrid => 59.0,    // ~22 km/l at $1300/l
            FuelType::Electric => 25.0,  // ~6 km/kWh at $150/kWh
        }
    }
}

/// The estimated cost of driving a route once.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TripEstimate {
    pub distance_km: f64,
    /// Fuel or energy cost, in CLP.
    pub fuel_cost: f64,
    /// Sum of every bound gantry's resolved price, in CLP.
    pub toll_cost: f64,
    pub total_cost: f64,
    /// Number of gantries the trip passes.
    pub gantry_count: usize,
}

/// Estimates the cost of driving the route once in the given vehicle.
pub fn estimate_trip(
    route: &RouteIndex,
    bindings: &[RouteBinding],
    fuel: FuelType,
    category: VehicleCategory,
) -> TripEstimate {
    let distance_km = route.total_length() / 1000.0;
    let fuel_cost = distance_km * fuel.cost_per_km_clp();
    let toll_cost = bindings.iter().map(|b| b.price(category)).sum();
    TripEstimate {
        distance_km,
        fuel_cost,
        toll_cost,
        total_cost: fuel_cost + toll_cost,
        gantry_count: bindings.len(),
    }
}
