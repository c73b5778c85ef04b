use bevy_ecs::prelude::World;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::SimulationClock;
use crate::demand::DemandGenerator;
use crate::ecs::{Vehicle, VehicleId};
use crate::geo::Location;
use crate::registry::{Backlog, Fleet, PendingRequests};
use crate::scenario::params::{DispatchConfig, ScenarioParams};
use crate::telemetry::{DispatchTelemetry, EventLog};
use crate::travel_time::{StochasticTravelTime, TravelTimeModel, TravelTimeModelResource};

/// The default cost model: weather/traffic multipliers on the scenario's base speed.
pub fn create_stochastic_travel_time(params: &ScenarioParams) -> Box<dyn TravelTimeModel> {
    Box::new(StochasticTravelTime::with_base_speed(
        params.travel_time_seed(),
        params.base_speed_kmh,
    ))
}

/// Insert all engine resources and place `params.num_vehicles` vehicles at
/// uniform random locations inside the city bounds.
pub fn build_scenario(world: &mut World, params: &ScenarioParams, model: Box<dyn TravelTimeModel>) {
    let mut rng = match params.fleet_seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let locations: Vec<Location> = (0..params.num_vehicles)
        .map(|_| params.bounds.sample(&mut rng))
        .collect();
    build_scenario_with_fleet(world, params, &locations, model);
}

/// Like [build_scenario] but with caller-chosen starting positions, one
/// vehicle per location, ids assigned in slice order. `params.num_vehicles`
/// is ignored.
pub fn build_scenario_with_fleet(
    world: &mut World,
    params: &ScenarioParams,
    locations: &[Location],
    model: Box<dyn TravelTimeModel>,
) {
    world.insert_resource(SimulationClock::default());
    world.insert_resource(DispatchConfig {
        trip_phases: params.trip_phases,
    });
    world.insert_resource(DemandGenerator::new(params.bounds, params.demand_seed()));
    world.insert_resource(TravelTimeModelResource::new(model));
    world.insert_resource(Fleet::default());
    world.insert_resource(Backlog::default());
    world.insert_resource(PendingRequests::default());
    world.insert_resource(EventLog::default());
    world.insert_resource(DispatchTelemetry::default());

    for location in locations {
        spawn_vehicle(world, *location);
    }
    tracing::debug!(vehicles = locations.len(), bounds = ?params.bounds, "scenario built");
}

/// Spawn an idle vehicle and register it under the next id.
pub fn spawn_vehicle(world: &mut World, location: Location) -> VehicleId {
    let id = world.resource::<Fleet>().next_id();
    let entity = world.spawn(Vehicle::new(id, location)).id();
    world.resource_mut::<Fleet>().register(entity)
}
