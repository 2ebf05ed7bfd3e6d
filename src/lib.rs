pub use config::{ConfigError, SimulationConfig};
pub use gantry::{bind_route, CatalogueError, Gantry, RouteBinding};
pub use math::geo::LatLng;
pub use route::{InvalidRouteError, NearestPoint, RouteIndex};
pub use simulation::{
    CrossingEvent, SimState, Simulation, SimulationStats, StartError, TickReport, VehiclePosition,
};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use tariff::{resolve_price, TimeProfile, VehicleCategory};
pub use trip::{estimate_trip, FuelType, TripEstimate};
pub use util::Interval;
pub use vehicle::Vehicle;

mod config;
mod gantry;
pub mod math;
mod route;
mod simulation;
mod spawner;
mod tariff;
mod trip;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
