//! The simulation controller: lifecycle, the frame tick, crossing detection
//! and revenue accounting.

use crate::config::{ConfigError, SimulationConfig};
use crate::gantry::{bind_route, Gantry, RouteBinding};
use crate::math::geo::LatLng;
use crate::route::{InvalidRouteError, RouteIndex};
use crate::spawner::Spawner;
use crate::tariff::VehicleCategory;
use crate::vehicle::Vehicle;
use crate::{VehicleId, VehicleSet};
use log::debug;
use thiserror::Error;

/// The simulated time window of one complete run, in minutes.
const SIMULATED_MINUTES: f64 = 60.0;

/// Slack when comparing accumulated real time against the window, so the
/// final tick cannot strand the run one rounding error short of completion.
const COMPLETION_EPSILON_SECS: f64 = 1e-9;

/// The lifecycle state of the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimState {
    /// Entry and reset state; nothing is simulated.
    #[default]
    Idle,
    /// Ticks advance simulated time.
    Running,
    /// Ticks are ignored; simulated time is frozen.
    Paused,
    /// The simulated hour has elapsed. Terminal until an explicit reset.
    Completed,
}

/// Aggregate counters for a run. Reset on every start.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct SimulationStats {
    /// Total vehicles admitted to the route.
    pub vehicles_spawned: u64,
    /// Vehicles admitted per category, lightest first.
    pub spawned_by_category: [u64; 3],
    /// Total gantry crossings charged.
    pub crossings: u64,
    /// Gross revenue accumulated, in CLP.
    pub total_revenue: f64,
    /// Simulated minutes elapsed, in [0, 60].
    pub elapsed_sim_minutes: f64,
}

/// A single charge, emitted exactly once per (vehicle, gantry) pair.
#[derive(Clone, Debug)]
pub struct CrossingEvent {
    pub vehicle: VehicleId,
    pub category: VehicleCategory,
    pub gantry_id: String,
    pub price: f64,
    pub position: LatLng,
}

/// The outcome of one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Crossings charged during this tick, for transient display.
    pub events: Vec<CrossingEvent>,
    /// Vehicles admitted during this tick.
    pub spawned: usize,
    /// Set on the single tick that completes the run.
    pub completed: bool,
}

/// A snapshot of one active vehicle for the presentation layer.
#[derive(Clone, Copy, Debug)]
pub struct VehiclePosition {
    pub id: VehicleId,
    pub category: VehicleCategory,
    pub position: LatLng,
    pub bearing_deg: f64,
    pub progress: f64,
}

/// The reasons a run cannot start. The controller keeps its previous state.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("no route has been set")]
    NoRoute,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A route-based toll traffic simulation.
///
/// All mutable run state (vehicle set, accumulators) is owned here and only
/// changes inside [tick](Self::tick); external readers take snapshots
/// between ticks. The tick is a plain function of the elapsed real time, so
/// the host decides the scheduling mechanism — an animation frame callback,
/// a timer, or manual stepping in tests.
#[derive(Default)]
pub struct Simulation {
    state: SimState,
    config: SimulationConfig,
    /// The indexed route, set independently of the run lifecycle.
    route: Option<RouteIndex>,
    /// The full gantry catalogue staged for binding.
    gantries: Vec<Gantry>,
    /// Gantries bound to the current route, ordered by fraction.
    /// Read-only for the duration of a run.
    bindings: Vec<RouteBinding>,
    /// Revenue accumulated per binding, parallel to `bindings`.
    gantry_revenue: Vec<f64>,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    spawner: Option<Spawner>,
    stats: SimulationStats,
    /// Real seconds of running (unpaused) time accumulated this run.
    elapsed_real: f64,
    /// Invoked exactly once when the simulated hour completes.
    on_complete: Option<Box<dyn FnMut(&SimulationStats)>>,
}

impl Simulation {
    /// Creates a new simulation.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the route polyline. Discards any run in progress, since every
    /// vehicle position is defined relative to the route.
    pub fn set_route(&mut self, points: &[LatLng]) -> Result<(), InvalidRouteError> {
        let route = RouteIndex::build(points)?;
        self.reset();
        self.route = Some(route);
        Ok(())
    }

    /// Clears the route. The simulation cannot start without one.
    pub fn clear_route(&mut self) {
        self.reset();
        self.route = None;
    }

    /// Stages the gantry catalogue. Binding to the route happens at start.
    pub fn set_gantries(&mut self, gantries: Vec<Gantry>) {
        self.gantries = gantries;
    }

    /// Registers the completion callback, invoked exactly once per run.
    pub fn on_complete(&mut self, callback: impl FnMut(&SimulationStats) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Validates the configuration and starts a run.
    ///
    /// Calling start while a run is active is a restart: previous state is
    /// cleared first. On error nothing changes and the previous state holds.
    pub fn start(&mut self, config: SimulationConfig) -> Result<(), StartError> {
        config.validate()?;
        if self.route.is_none() {
            return Err(StartError::NoRoute);
        }

        self.clear_run();
        let route = self.route.as_ref().expect("checked above");
        self.bindings = bind_route(
            route,
            &self.gantries,
            config.proximity_threshold_m,
            config.time_profile,
        );
        self.gantry_revenue = vec![0.0; self.bindings.len()];
        self.spawner = Some(Spawner::new(&config));
        self.config = config;
        self.state = SimState::Running;
        debug!(
            "simulation started: {} gantries bound over {:.1} km",
            self.bindings.len(),
            route.total_length() / 1000.0
        );
        Ok(())
    }

    /// Freezes simulated time. Ticks while paused are ignored.
    pub fn pause(&mut self) {
        if self.state == SimState::Running {
            self.state = SimState::Paused;
        }
    }

    /// Resumes a paused run. Elapsed simulated time is unaffected by how
    /// long the pause lasted, because time only accumulates from the deltas
    /// of ticks processed while running.
    pub fn resume(&mut self) {
        if self.state == SimState::Paused {
            self.state = SimState::Running;
        }
    }

    /// Clears all vehicles and accumulators and returns to idle.
    pub fn reset(&mut self) {
        self.clear_run();
        self.state = SimState::Idle;
    }

    fn clear_run(&mut self) {
        self.vehicles.clear();
        self.bindings.clear();
        self.gantry_revenue.clear();
        self.spawner = None;
        self.stats = SimulationStats::default();
        self.elapsed_real = 0.0;
    }

    /// Advances the simulation by `dt_real` real seconds.
    ///
    /// No-op unless running. Within a tick, every active vehicle is moved
    /// before any crossing is evaluated, so detection always sees post-move
    /// positions. An implausibly large delta (e.g. after the host was
    /// suspended) is clamped to the remaining window, so one tick can
    /// complete the run but never overshoot it.
    pub fn tick(&mut self, dt_real: f64) -> TickReport {
        let mut report = TickReport::default();
        if self.state != SimState::Running {
            return report;
        }
        let Some(route) = self.route.as_ref() else {
            return report;
        };

        let remaining = (self.config.real_window_secs - self.elapsed_real).max(0.0);
        let dt = dt_real.clamp(0.0, remaining);
        let sim_dt = dt * self.config.time_compression();
        let route_len = route.total_length();

        // Admission
        if let Some(spawner) = self.spawner.as_mut() {
            for spawn in spawner.poll(dt) {
                self.vehicles
                    .insert_with_key(|id| Vehicle::new(id, spawn.category, spawn.speed_kmh));
                self.stats.vehicles_spawned += 1;
                self.stats.spawned_by_category[spawn.category.index()] += 1;
                report.spawned += 1;
            }
        }

        // Motion
        let mut retired = Vec::new();
        for (id, vehicle) in &mut self.vehicles {
            if vehicle.advance(sim_dt, route_len) {
                retired.push(id);
            }
        }

        // Crossing detection and charging. Vehicles retiring this tick are
        // still charged for every gantry their final movement passed.
        for (id, vehicle) in &mut self.vehicles {
            for (idx, binding) in self.bindings.iter().enumerate() {
                if binding.fraction <= vehicle.progress() && !vehicle.has_charged(idx as u16) {
                    vehicle.mark_charged(idx as u16);
                    let price = binding.price(vehicle.category());
                    self.stats.total_revenue += price;
                    self.stats.crossings += 1;
                    self.gantry_revenue[idx] += price;
                    report.events.push(CrossingEvent {
                        vehicle: id,
                        category: vehicle.category(),
                        gantry_id: binding.gantry_id.clone(),
                        price,
                        position: binding.position,
                    });
                }
            }
        }

        // Retirement
        for id in retired {
            self.vehicles.remove(id);
        }

        // Time accounting and completion
        self.elapsed_real += dt;
        self.stats.elapsed_sim_minutes =
            SIMULATED_MINUTES * self.elapsed_real / self.config.real_window_secs;
        if self.elapsed_real + COMPLETION_EPSILON_SECS >= self.config.real_window_secs {
            self.stats.elapsed_sim_minutes = SIMULATED_MINUTES;
            self.state = SimState::Completed;
            self.vehicles.clear();
            if let Some(callback) = self.on_complete.as_mut() {
                callback(&self.stats);
            }
            report.completed = true;
            debug!(
                "simulation completed: {} vehicles, {:.0} CLP",
                self.stats.vehicles_spawned, self.stats.total_revenue
            );
        }

        report
    }

    /// Gets the lifecycle state.
    pub fn state(&self) -> SimState {
        self.state
    }

    /// Gets the aggregate counters for the current run.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Gets the indexed route, if one is set.
    pub fn route(&self) -> Option<&RouteIndex> {
        self.route.as_ref()
    }

    /// Gets the gantries bound to the current run's route.
    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Revenue accumulated at each bound gantry, in binding order.
    pub fn gantry_totals(&self) -> impl Iterator<Item = (&str, f64)> {
        self.bindings
            .iter()
            .zip(&self.gantry_revenue)
            .map(|(binding, revenue)| (binding.gantry_id.as_str(), *revenue))
    }

    /// Snapshots the position of every active vehicle for display.
    pub fn vehicle_positions(&self) -> Vec<VehiclePosition> {
        let Some(route) = self.route.as_ref() else {
            return Vec::new();
        };
        self.vehicles
            .iter()
            .map(|(id, vehicle)| {
                let (position, bearing_deg) = vehicle.position_on(route);
                VehiclePosition {
                    id,
                    category: vehicle.category(),
                    position,
                    bearing_deg,
                    progress: vehicle.progress(),
                }
            })
            .collect()
    }
}
