//! Event log, trip telemetry and serialisable snapshots of engine state.

use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::ecs::{RequestId, RequestStatus, RideRequest, Vehicle, VehicleId, VehicleStatus};
use crate::geo::Location;

/// Something the dispatcher did, as recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchEvent {
    NewDemand {
        request_id: RequestId,
        pickup: Location,
        dropoff: Location,
    },
    Assigned {
        vehicle_id: VehicleId,
        request_id: RequestId,
        pickup_eta_secs: f64,
        trip_secs: f64,
    },
    PickedUp {
        vehicle_id: VehicleId,
        request_id: RequestId,
        location: Location,
    },
    TripCompleted {
        vehicle_id: VehicleId,
        request_id: RequestId,
        location: Location,
    },
    /// The idle pool ran dry; this and all later pending requests wait for the next tick.
    NoVehicleAvailable { request_id: RequestId },
}

impl DispatchEvent {
    pub fn request_id(&self) -> RequestId {
        match *self {
            DispatchEvent::NewDemand { request_id, .. }
            | DispatchEvent::Assigned { request_id, .. }
            | DispatchEvent::PickedUp { request_id, .. }
            | DispatchEvent::TripCompleted { request_id, .. }
            | DispatchEvent::NoVehicleAvailable { request_id } => request_id,
        }
    }
}

impl fmt::Display for DispatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchEvent::NewDemand {
                request_id,
                pickup,
                dropoff,
            } => write!(f, "New Demand (ID {request_id}) from {pickup} to {dropoff}"),
            DispatchEvent::Assigned {
                vehicle_id,
                request_id,
                pickup_eta_secs,
                trip_secs,
            } => write!(
                f,
                "Vehicle {vehicle_id} ASSIGNED to Request {request_id}. ETA to pickup: {}s. Total trip: {}s.",
                *pickup_eta_secs as u64, *trip_secs as u64
            ),
            DispatchEvent::PickedUp {
                vehicle_id,
                request_id,
                location,
            } => write!(f, "Vehicle {vehicle_id} PICKED UP Request {request_id} at {location}."),
            DispatchEvent::TripCompleted {
                vehicle_id,
                request_id,
                location,
            } => write!(
                f,
                "Vehicle {vehicle_id} COMPLETED trip for Request {request_id}. Now idle at {location}."
            ),
            DispatchEvent::NoVehicleAvailable { request_id } => {
                write!(f, "Request {request_id} has no available vehicles.")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEntry {
    /// Simulation time of the tick that produced the event.
    pub at: f64,
    /// Tick number (1-based) that produced the event; 0 before the first tick.
    pub tick: u64,
    pub event: DispatchEvent,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[T={}s] {}", self.at as u64, self.event)
    }
}

/// Append-only, ordered record of dispatch events.
#[derive(Debug, Default, Resource)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn record(&mut self, at: f64, tick: u64, event: DispatchEvent) {
        self.entries.push(LogEntry { at, tick, event });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|entry| entry.to_string())
    }

    pub fn in_tick(&self, tick: u64) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.tick == tick)
    }
}

/// One assignment decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignmentRecord {
    pub vehicle_id: VehicleId,
    pub request_id: RequestId,
    pub requested_at: f64,
    pub assigned_at: f64,
    pub pickup_eta_secs: f64,
    pub trip_secs: f64,
}

impl AssignmentRecord {
    /// Time the request spent in the backlog before a vehicle was found.
    pub fn time_to_assign(&self) -> f64 {
        self.assigned_at - self.requested_at
    }
}

/// One trip, recorded when the vehicle reaches the dropoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedTripRecord {
    pub vehicle_id: VehicleId,
    pub request_id: RequestId,
    pub assigned_at: f64,
    /// Scheduled completion time.
    pub ends_at: f64,
    /// Clock time of the tick that resolved the trip (`>= ends_at`).
    pub resolved_at: f64,
}

/// Collects dispatch telemetry for summary metrics.
#[derive(Debug, Default, Resource)]
pub struct DispatchTelemetry {
    pub assignments: Vec<AssignmentRecord>,
    pub completed_trips: Vec<CompletedTripRecord>,
}

/// Snapshot of one vehicle for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub location: Location,
    pub status: VehicleStatus,
    pub assigned_request_id: Option<RequestId>,
    pub trip_ends_at: Option<f64>,
}

impl From<&Vehicle> for VehicleSnapshot {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            location: vehicle.location,
            status: vehicle.status(),
            assigned_request_id: vehicle.assigned_request_id(),
            trip_ends_at: vehicle.trip_ends_at(),
        }
    }
}

/// Snapshot of one ride request for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub id: RequestId,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub requested_at: f64,
    pub status: RequestStatus,
}

impl From<&RideRequest> for RequestSnapshot {
    fn from(request: &RideRequest) -> Self {
        Self {
            id: request.id,
            pickup_location: request.pickup,
            dropoff_location: request.dropoff,
            requested_at: request.requested_at,
            status: request.status,
        }
    }
}

/// Final state of a run: the log lines and the fleet.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub simulation_log: Vec<String>,
    pub final_vehicle_states: Vec<VehicleSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_line_truncates_durations() {
        let entry = LogEntry {
            at: 90.7,
            tick: 3,
            event: DispatchEvent::Assigned {
                vehicle_id: VehicleId(2),
                request_id: RequestId(5),
                pickup_eta_secs: 123.9,
                trip_secs: 456.2,
            },
        };
        assert_eq!(
            entry.to_string(),
            "[T=90s] Vehicle 2 ASSIGNED to Request 5. ETA to pickup: 123s. Total trip: 456s."
        );
    }

    #[test]
    fn no_vehicle_line_names_the_request() {
        let entry = LogEntry {
            at: 30.0,
            tick: 1,
            event: DispatchEvent::NoVehicleAvailable {
                request_id: RequestId(1),
            },
        };
        assert_eq!(entry.to_string(), "[T=30s] Request 1 has no available vehicles.");
    }

    #[test]
    fn log_filters_by_tick() {
        let mut log = EventLog::default();
        let event = DispatchEvent::NoVehicleAvailable {
            request_id: RequestId(1),
        };
        log.record(30.0, 1, event);
        log.record(60.0, 2, event);
        log.record(60.0, 2, event);
        assert_eq!(log.len(), 3);
        assert_eq!(log.in_tick(2).count(), 2);
        assert_eq!(
            log.lines().next().as_deref(),
            Some("[T=30s] Request 1 has no available vehicles.")
        );
    }

    #[test]
    fn vehicle_snapshot_serializes_flat_ids() {
        let vehicle = Vehicle::new(VehicleId(4), Location::new(37.7, -122.4));
        let json = serde_json::to_value(VehicleSnapshot::from(&vehicle)).expect("json");
        assert_eq!(json["id"], 4);
        assert_eq!(json["status"], "idle");
        assert!(json["assigned_request_id"].is_null());
    }
}
