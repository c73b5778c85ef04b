//! Scenario setup: parameters, validation and world construction.

mod build;
mod params;

pub use build::{
    build_scenario, build_scenario_with_fleet, create_stochastic_travel_time, spawn_vehicle,
};
pub use params::{DispatchConfig, ParamsError, ScenarioParams, TripPhases};
