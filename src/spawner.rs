//! Vehicle admission: arrival timing, category mix and speed assignment.

use crate::config::SimulationConfig;
use crate::tariff::VehicleCategory;
use crate::util::Interval;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

/// The category and speed drawn for a newly admitted vehicle.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SpawnedVehicle {
    pub category: VehicleCategory,
    pub speed_kmh: f64,
}

/// Admits vehicles at a rate derived from the configured flow and the
/// simulated-to-real time compression.
pub(crate) struct Spawner {
    rng: StdRng,
    /// Cumulative mix thresholds for light and two-axle, in percent.
    /// Rolls above both fall into the heavy category.
    thresholds: [f64; 2],
    /// Speed range per category in km/h.
    speed_ranges: [Interval<f64>; 3],
    /// Real seconds between consecutive arrivals.
    interval_secs: f64,
    /// Real seconds accumulated since the last arrival.
    since_spawn: f64,
}

/// Maps a uniform roll in [0, 100) to a category using cumulative mix
/// thresholds. The remainder above both thresholds is the heaviest category.
pub(crate) fn category_for_roll(thresholds: [f64; 2], roll: f64) -> VehicleCategory {
    if roll < thresholds[0] {
        VehicleCategory::Light
    } else if roll < thresholds[1] {
        VehicleCategory::TwoAxle
    } else {
        VehicleCategory::Heavy
    }
}

impl Spawner {
    pub(crate) fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            thresholds: [
                config.light_pct,
                config.light_pct + config.two_axle_pct,
            ],
            speed_ranges: config.speed_ranges_kmh,
            interval_secs: config.real_window_secs / config.flow_per_hour,
            since_spawn: 0.0,
        }
    }

    /// Advances the arrival clock by `dt` real seconds and returns the
    /// vehicles admitted within that span. This loops for as long as the
    /// accumulated time covers another full interval, so high flow rates
    /// spawn several vehicles in one tick rather than under-producing.
    pub(crate) fn poll(&mut self, dt: f64) -> Vec<SpawnedVehicle> {
        self.since_spawn += dt;
        let mut spawned = Vec::new();
        while self.since_spawn >= self.interval_secs {
            self.since_spawn -= self.interval_secs;
            spawned.push(self.draw());
        }
        spawned
    }

    /// Draws a category from the mix and a speed from its range.
    fn draw(&mut self) -> SpawnedVehicle {
        let roll = self.rng.gen_range(0.0..100.0);
        let category = category_for_roll(self.thresholds, roll);
        let range = self.speed_ranges[category.index()];
        let speed_kmh = Uniform::new_inclusive(range.min, range.max).sample(&mut self.rng);
        SpawnedVehicle { category, speed_kmh }
    }
}
