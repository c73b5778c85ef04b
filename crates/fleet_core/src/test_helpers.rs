//! Test helpers: deterministic travel-time stubs and fixed San Francisco locations.
//!
//! Shared by unit tests, integration tests and benches.

use std::collections::VecDeque;

use crate::engine::DispatchEngine;
use crate::geo::Location;
use crate::scenario::ScenarioParams;
use crate::travel_time::TravelTimeModel;

/// Mission District; a central pickup point.
pub fn mission() -> Location {
    Location::new(37.7599, -122.4148)
}

/// Financial District; a dropoff a few kilometres north-east of [mission].
pub fn financial_district() -> Location {
    Location::new(37.7946, -122.3999)
}

/// Sunset District, on the western edge of the city.
pub fn sunset() -> Location {
    Location::new(37.7530, -122.4940)
}

/// Charges the same number of seconds for every leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTravelTime(pub f64);

impl TravelTimeModel for FlatTravelTime {
    fn travel_time_secs(&mut self, _start: Location, _end: Location) -> f64 {
        self.0
    }
}

/// Returns queued durations in order, then `fallback` once the script runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedTravelTime {
    script: VecDeque<f64>,
    fallback: f64,
    calls: usize,
}

impl ScriptedTravelTime {
    pub fn new(script: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            calls: 0,
        }
    }

    /// Number of estimates handed out so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl TravelTimeModel for ScriptedTravelTime {
    fn travel_time_secs(&mut self, _start: Location, _end: Location) -> f64 {
        self.calls += 1;
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

/// Engine with vehicles at `locations` and a flat per-leg cost. Demand
/// generation is seeded so injected requests repeat between runs.
pub fn flat_cost_engine(locations: &[Location], secs_per_leg: f64) -> DispatchEngine {
    DispatchEngine::with_fleet(
        ScenarioParams::default().with_seed(7),
        locations,
        Box::new(FlatTravelTime(secs_per_leg)),
    )
}
