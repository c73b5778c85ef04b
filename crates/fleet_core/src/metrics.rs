//! Summary metrics extracted from a finished (or paused) run.

use serde::Serialize;

use crate::ecs::RequestStatus;
use crate::engine::DispatchEngine;
use crate::telemetry::DispatchEvent;

/// Aggregated outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Seed the run was built from, when known.
    pub seed: Option<u64>,
    /// Simulation time reached, in seconds.
    pub simulated_secs: f64,
    pub ticks: u64,
    pub total_vehicles: usize,
    pub busy_vehicles: usize,
    /// Share of the fleet holding a trip at the end of the run.
    pub utilisation: f64,
    pub total_requests: usize,
    pub unassigned_requests: usize,
    pub assigned_requests: usize,
    pub completed_requests: usize,
    /// Completed / total requests (0 when there were none).
    pub completion_rate: f64,
    pub avg_pickup_eta_secs: f64,
    pub avg_trip_secs: f64,
    /// Average time between a request entering the backlog and getting a vehicle.
    pub avg_time_to_assign_secs: f64,
    pub no_vehicle_events: usize,
}

impl SimulationSummary {
    pub fn from_engine(engine: &DispatchEngine) -> Self {
        let requests = engine.requests();
        let count = |status: RequestStatus| requests.iter().filter(|r| r.status == status).count();
        let unassigned_requests = count(RequestStatus::Unassigned);
        let assigned_requests = count(RequestStatus::Assigned);
        let completed_requests = count(RequestStatus::Completed);

        let vehicles = engine.vehicles();
        let busy_vehicles = vehicles.iter().filter(|v| !v.is_idle()).count();

        let assignments = &engine.telemetry().assignments;
        let avg_pickup_eta_secs = mean(assignments.iter().map(|a| a.pickup_eta_secs));
        let avg_trip_secs = mean(assignments.iter().map(|a| a.trip_secs));
        let avg_time_to_assign_secs = mean(assignments.iter().map(|a| a.time_to_assign()));

        let no_vehicle_events = engine
            .log()
            .entries()
            .iter()
            .filter(|e| matches!(e.event, DispatchEvent::NoVehicleAvailable { .. }))
            .count();

        let utilisation = if vehicles.is_empty() {
            0.0
        } else {
            busy_vehicles as f64 / vehicles.len() as f64
        };
        let completion_rate = if requests.is_empty() {
            0.0
        } else {
            completed_requests as f64 / requests.len() as f64
        };

        Self {
            seed: None,
            simulated_secs: engine.now(),
            ticks: engine.ticks(),
            total_vehicles: vehicles.len(),
            busy_vehicles,
            utilisation,
            total_requests: requests.len(),
            unassigned_requests,
            assigned_requests,
            completed_requests,
            completion_rate,
            avg_pickup_eta_secs,
            avg_trip_secs,
            avg_time_to_assign_secs,
            no_vehicle_events,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
