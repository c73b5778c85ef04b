//! Dispatch engine: owns the ECS world and drives it one tick at a time.
//!
//! Clock progression happens here, outside systems. Each tick advances
//! [SimulationClock], inserts the tick parameters as [CurrentTick], then runs
//! the dispatch schedule: trip resolution, demand injection, assignment.
//!
//! The engine is single-threaded; `tick` borrows it mutably, so one instance
//! is only ever driven from one place. Run independent engines for parallel
//! simulations.

use bevy_ecs::prelude::{Res, ResMut, Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};
use bevy_ecs::system::SystemState;

use crate::clock::{CurrentTick, SimulationClock};
use crate::demand::DemandGenerator;
use crate::ecs::{RequestId, RideRequest, Vehicle};
use crate::geo::Location;
use crate::metrics::SimulationSummary;
use crate::registry::{Backlog, Fleet, PendingRequests};
use crate::scenario::{
    build_scenario, build_scenario_with_fleet, create_stochastic_travel_time, ScenarioParams,
};
use crate::systems::{
    assignment::assignment_system, demand_injection::demand_injection_system,
    demand_injection::enqueue_request, trip_resolution::trip_resolution_system,
};
use crate::telemetry::{
    DispatchTelemetry, EventLog, RequestSnapshot, SimulationReport, VehicleSnapshot,
};
use crate::travel_time::TravelTimeModel;

/// Builds the per-tick schedule. [apply_deferred] makes requests spawned by
/// demand injection visible to the assignment pass of the same tick.
pub fn dispatch_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            trip_resolution_system,
            demand_injection_system,
            apply_deferred,
            assignment_system,
        )
            .chain(),
    );
    schedule
}

pub struct DispatchEngine {
    world: World,
    schedule: Schedule,
}

impl DispatchEngine {
    /// Random fleet placement and the stochastic travel-time model, both seeded
    /// from `params.seed`.
    pub fn new(params: ScenarioParams) -> Self {
        let model = create_stochastic_travel_time(&params);
        Self::with_travel_time_model(params, model)
    }

    /// Random fleet placement with a caller-supplied cost model.
    pub fn with_travel_time_model(params: ScenarioParams, model: Box<dyn TravelTimeModel>) -> Self {
        let mut world = World::new();
        build_scenario(&mut world, &params, model);
        Self::from_world(world)
    }

    /// One vehicle per location, ids in slice order.
    pub fn with_fleet(
        params: ScenarioParams,
        locations: &[Location],
        model: Box<dyn TravelTimeModel>,
    ) -> Self {
        let mut world = World::new();
        build_scenario_with_fleet(&mut world, &params, locations, model);
        Self::from_world(world)
    }

    /// Wrap a world prepared by [build_scenario] or [build_scenario_with_fleet].
    pub fn from_world(world: World) -> Self {
        Self {
            world,
            schedule: dispatch_schedule(),
        }
    }

    /// Run one indivisible simulation step.
    pub fn tick(&mut self, time_step_secs: f64, demand_probability: f64) {
        self.world
            .resource_mut::<SimulationClock>()
            .advance(time_step_secs);
        self.world.insert_resource(CurrentTick { demand_probability });
        self.schedule.run(&mut self.world);
    }

    /// Run `steps` ticks with fixed parameters.
    pub fn run(&mut self, steps: usize, time_step_secs: f64, demand_probability: f64) {
        for _ in 0..steps {
            self.tick(time_step_secs, demand_probability);
        }
        tracing::info!(
            steps,
            now = self.now(),
            requests = self.world.resource::<Backlog>().len(),
            pending = self.world.resource::<PendingRequests>().len(),
            "simulation run finished"
        );
    }

    /// Add a request from outside the demand generator. It joins the backlog at
    /// the current clock time and is considered by the next assignment pass.
    pub fn submit_request(&mut self, pickup: Location, dropoff: Location) -> RequestId {
        let now = self.now();
        let id = self
            .world
            .resource_mut::<DemandGenerator>()
            .next_request_id();
        let request = RideRequest::new(id, pickup, dropoff, now);
        let entity = self.world.spawn(request).id();

        let mut state: SystemState<(
            Res<SimulationClock>,
            ResMut<Backlog>,
            ResMut<PendingRequests>,
            ResMut<EventLog>,
        )> = SystemState::new(&mut self.world);
        let (clock, mut backlog, mut pending, mut log) = state.get_mut(&mut self.world);
        enqueue_request(&request, entity, &clock, &mut backlog, &mut pending, &mut log);
        id
    }

    pub fn now(&self) -> f64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn ticks(&self) -> u64 {
        self.world.resource::<SimulationClock>().ticks()
    }

    /// Current fleet, ascending id order.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.world
            .resource::<Fleet>()
            .iter()
            .filter_map(|entity| self.world.get::<Vehicle>(entity).copied())
            .collect()
    }

    /// Every request ever created, ascending id order.
    pub fn requests(&self) -> Vec<RideRequest> {
        self.world
            .resource::<Backlog>()
            .iter()
            .filter_map(|(_, entity)| self.world.get::<RideRequest>(entity).copied())
            .collect()
    }

    pub fn request(&self, id: RequestId) -> Option<RideRequest> {
        let entity = self.world.resource::<Backlog>().entity(id)?;
        self.world.get::<RideRequest>(entity).copied()
    }

    /// Ids of requests still waiting for a vehicle, oldest first.
    pub fn pending_request_ids(&self) -> Vec<RequestId> {
        self.world
            .resource::<PendingRequests>()
            .ordered()
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    pub fn log(&self) -> &EventLog {
        self.world.resource::<EventLog>()
    }

    pub fn telemetry(&self) -> &DispatchTelemetry {
        self.world.resource::<DispatchTelemetry>()
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary::from_engine(self)
    }

    /// Export view of [Self::requests], including completed history.
    pub fn request_snapshots(&self) -> Vec<RequestSnapshot> {
        self.requests().iter().map(RequestSnapshot::from).collect()
    }

    /// Log lines plus the fleet snapshot.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            simulation_log: self.log().lines().collect(),
            final_vehicle_states: self.vehicles().iter().map(VehicleSnapshot::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::RequestStatus;
    use crate::telemetry::DispatchEvent;
    use crate::travel_time::ConstantSpeedTravelTime;

    #[test]
    fn tick_advances_clock() {
        let mut engine = DispatchEngine::new(ScenarioParams::default().with_seed(1));
        engine.tick(30.0, 0.0);
        engine.tick(30.0, 0.0);
        assert_eq!(engine.now(), 60.0);
        assert_eq!(engine.ticks(), 2);
    }

    #[test]
    fn submitted_request_is_logged_and_pending() {
        let mut engine = DispatchEngine::with_fleet(
            ScenarioParams::default(),
            &[],
            Box::new(ConstantSpeedTravelTime::default()),
        );
        let id = engine.submit_request(
            Location::new(37.71, -122.45),
            Location::new(37.79, -122.39),
        );
        assert_eq!(id, RequestId(1));
        assert_eq!(engine.pending_request_ids(), vec![id]);
        let request = engine.request(id).expect("request");
        assert_eq!(request.status, RequestStatus::Unassigned);
        assert!(matches!(
            engine.log().entries()[0].event,
            DispatchEvent::NewDemand { request_id: RequestId(1), .. }
        ));
    }

    #[test]
    fn request_snapshots_follow_backlog_order() {
        let mut engine = DispatchEngine::with_fleet(
            ScenarioParams::default(),
            &[Location::new(37.75, -122.44)],
            Box::new(ConstantSpeedTravelTime::default()),
        );
        let pickup = Location::new(37.71, -122.45);
        let dropoff = Location::new(37.79, -122.39);
        engine.submit_request(pickup, dropoff);
        engine.submit_request(dropoff, pickup);
        engine.tick(30.0, 0.0);

        let snapshots = engine.request_snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].id, RequestId(1));
        assert_eq!(snapshots[0].pickup_location, pickup);
        assert_eq!(snapshots[0].status, RequestStatus::Assigned);
        assert_eq!(snapshots[1].status, RequestStatus::Unassigned);
    }

    #[test]
    fn report_lists_every_vehicle() {
        let mut engine =
            DispatchEngine::new(ScenarioParams::default().with_seed(8).with_num_vehicles(4));
        engine.run(5, 30.0, 1.0);
        let report = engine.report();
        assert_eq!(report.final_vehicle_states.len(), 4);
        assert_eq!(report.simulation_log.len(), engine.log().len());
    }
}
