//! Discrete-time ride-hailing dispatch simulation.
//!
//! A fixed-step clock drives a fleet of vehicles over a rectangular city.
//! Every tick resolves finished trips, may inject one random ride request,
//! and greedily assigns pending requests to the idle vehicle with the lowest
//! estimated pickup time.

pub mod clock;
pub mod demand;
pub mod ecs;
pub mod engine;
pub mod geo;
pub mod matching;
pub mod metrics;
pub mod registry;
pub mod scenario;
pub mod systems;
pub mod telemetry;
pub mod travel_time;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use engine::DispatchEngine;
pub use scenario::{ParamsError, ScenarioParams, TripPhases};
