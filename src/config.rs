//! Simulation configuration and validation.

use crate::tariff::{TimeProfile, VehicleCategory};
use crate::util::Interval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters for a simulation run.
///
/// The speed ranges and the proximity threshold are empirically chosen
/// defaults, not invariants; hosts may override them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Vehicle arrivals per simulated hour.
    pub flow_per_hour: f64,
    /// Share of light vehicles in percent.
    pub light_pct: f64,
    /// Share of two-axle vehicles in percent. Whatever remains of 100%
    /// after the lighter categories is assigned to heavy vehicles.
    pub two_axle_pct: f64,
    /// The active time-of-day pricing regime.
    pub time_profile: TimeProfile,
    /// Real seconds into which the simulated hour is compressed.
    pub real_window_secs: f64,
    /// Maximum gantry offset from the route for it to be bound, in m.
    pub proximity_threshold_m: f64,
    /// Speed range per category in km/h, lightest first.
    pub speed_ranges_kmh: [Interval<f64>; 3],
    /// Seed for the spawn RNG; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            flow_per_hour: 1500.0,
            light_pct: 70.0,
            two_axle_pct: 20.0,
            time_profile: TimeProfile::Peak,
            real_window_secs: 10.0,
            proximity_threshold_m: 50.0,
            speed_ranges_kmh: [
                Interval::new(80.0, 120.0),
                Interval::new(60.0, 90.0),
                Interval::new(45.0, 70.0),
            ],
            seed: None,
        }
    }
}

/// The reasons a configuration is rejected at start.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("flow rate must be positive, got {0}")]
    NonPositiveFlow(f64),
    #[error("real time window must be positive, got {0}")]
    NonPositiveWindow(f64),
    #[error("category percentages must be non-negative")]
    NegativePercentage,
    #[error("category percentages sum to {0}, which exceeds 100")]
    MixExceedsFull(f64),
    #[error("speed range for {0:?} is empty or inverted")]
    EmptySpeedRange(VehicleCategory),
}

impl SimulationConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.flow_per_hour > 0.0) {
            return Err(ConfigError::NonPositiveFlow(self.flow_per_hour));
        }
        if !(self.real_window_secs > 0.0) {
            return Err(ConfigError::NonPositiveWindow(self.real_window_secs));
        }
        if self.light_pct < 0.0 || self.two_axle_pct < 0.0 {
            return Err(ConfigError::NegativePercentage);
        }
        let total = self.light_pct + self.two_axle_pct;
        if total > 100.0 {
            return Err(ConfigError::MixExceedsFull(total));
        }
        for cat in VehicleCategory::ALL {
            let range = self.speed_ranges_kmh[cat.index()];
            if !(range.min > 0.0 && range.max >= range.min) {
                return Err(ConfigError::EmptySpeedRange(cat));
            }
        }
        Ok(())
    }

    /// Simulated seconds that pass per real second.
    pub fn time_compression(&self) -> f64 {
        3600.0 / self.real_window_secs
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_flow() {
        let config = SimulationConfig {
            flow_per_hour: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveFlow(0.0)));

        let config = SimulationConfig {
            flow_per_hour: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_overfull_mix() {
        let config = SimulationConfig {
            light_pct: 80.0,
            two_axle_pct: 30.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MixExceedsFull(110.0)));
    }

    #[test]
    fn rejects_negative_percentages() {
        let config = SimulationConfig {
            light_pct: -5.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NegativePercentage));
    }

    #[test]
    fn rejects_inverted_speed_range() {
        let mut config = SimulationConfig::default();
        config.speed_ranges_kmh[1] = Interval::new(90.0, 60.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptySpeedRange(VehicleCategory::TwoAxle))
        ));
    }

    #[test]
    fn compression_maps_the_window_to_an_hour() {
        let config = SimulationConfig {
            real_window_secs: 10.0,
            ..Default::default()
        };
        assert_eq!(config.time_compression(), 360.0);
    }
}
