use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::CityBounds;
use crate::travel_time::DEFAULT_BASE_SPEED_KMH;

const DEFAULT_NUM_VEHICLES: usize = 10;
const DEFAULT_STEPS: usize = 100;
const DEFAULT_TIME_STEP_SECS: f64 = 30.0;
const DEFAULT_DEMAND_PROBABILITY: f64 = 0.5;

/// Seed offsets so fleet placement, demand and travel-time draws use independent streams.
const FLEET_SEED_OFFSET: u64 = 0;
const DEMAND_SEED_OFFSET: u64 = 1;
const TRAVEL_TIME_SEED_OFFSET: u64 = 2;

/// How a trip's pickup and dropoff legs are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPhases {
    /// One `Busy` state and a single timer covering both legs.
    #[default]
    Combined,
    /// Vehicles report pickup arrival (and move to the pickup) before completing.
    Split,
}

/// Engine-wide dispatch settings.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct DispatchConfig {
    pub trip_phases: TripPhases,
}

/// Reasons a set of parameters would produce a degenerate run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error(
        "city bounds must satisfy min < max (lat {min_lat}..{max_lat}, lon {min_lon}..{max_lon})"
    )]
    InvertedBounds {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },
    #[error("demand probability {0} is outside [0, 1]")]
    DemandProbabilityOutOfRange(f64),
    #[error("time step must be positive, got {0}s")]
    NonPositiveTimeStep(f64),
    #[error("base speed must be positive, got {0} km/h")]
    NonPositiveSpeed(f64),
}

/// Parameters for building and driving a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub num_vehicles: usize,
    pub bounds: CityBounds,
    pub seed: Option<u64>,
    pub steps: usize,
    pub time_step_secs: f64,
    pub demand_probability: f64,
    pub base_speed_kmh: f64,
    pub trip_phases: TripPhases,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            num_vehicles: DEFAULT_NUM_VEHICLES,
            bounds: CityBounds::san_francisco(),
            seed: None,
            steps: DEFAULT_STEPS,
            time_step_secs: DEFAULT_TIME_STEP_SECS,
            demand_probability: DEFAULT_DEMAND_PROBABILITY,
            base_speed_kmh: DEFAULT_BASE_SPEED_KMH,
            trip_phases: TripPhases::default(),
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_num_vehicles(mut self, num_vehicles: usize) -> Self {
        self.num_vehicles = num_vehicles;
        self
    }

    pub fn with_bounds(mut self, bounds: CityBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_time_step_secs(mut self, time_step_secs: f64) -> Self {
        self.time_step_secs = time_step_secs;
        self
    }

    pub fn with_demand_probability(mut self, demand_probability: f64) -> Self {
        self.demand_probability = demand_probability;
        self
    }

    pub fn with_base_speed_kmh(mut self, base_speed_kmh: f64) -> Self {
        self.base_speed_kmh = base_speed_kmh;
        self
    }

    pub fn with_trip_phases(mut self, trip_phases: TripPhases) -> Self {
        self.trip_phases = trip_phases;
        self
    }

    pub fn fleet_seed(&self) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(FLEET_SEED_OFFSET))
    }

    pub fn demand_seed(&self) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(DEMAND_SEED_OFFSET))
    }

    pub fn travel_time_seed(&self) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(TRAVEL_TIME_SEED_OFFSET))
    }

    /// Check for values the engine would accept but that make a run meaningless.
    /// The engine itself never calls this. Zero vehicles and zero steps are allowed.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.bounds.is_well_formed() {
            let b = self.bounds;
            return Err(ParamsError::InvertedBounds {
                min_lat: b.min_lat,
                max_lat: b.max_lat,
                min_lon: b.min_lon,
                max_lon: b.max_lon,
            });
        }
        if !(0.0..=1.0).contains(&self.demand_probability) {
            return Err(ParamsError::DemandProbabilityOutOfRange(
                self.demand_probability,
            ));
        }
        if self.time_step_secs.is_nan() || self.time_step_secs <= 0.0 {
            return Err(ParamsError::NonPositiveTimeStep(self.time_step_secs));
        }
        if self.base_speed_kmh.is_nan() || self.base_speed_kmh <= 0.0 {
            return Err(ParamsError::NonPositiveSpeed(self.base_speed_kmh));
        }
        Ok(())
    }
}
