use std::fmt;

use bevy_ecs::prelude::{Component, Entity};
use serde::{Deserialize, Serialize};

use crate::geo::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An active pickup+dropoff job held by a vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trip {
    pub request_id: RequestId,
    pub request: Entity,
    /// Simulation time when the vehicle was assigned.
    pub assigned_at: f64,
    /// Simulation time when the vehicle reaches the pickup.
    pub pickup_at: f64,
    /// Simulation time when the whole pickup+dropoff sequence completes.
    pub ends_at: f64,
}

impl Trip {
    pub fn pickup_eta_secs(&self) -> f64 {
        self.pickup_at - self.assigned_at
    }

    pub fn duration_secs(&self) -> f64 {
        self.ends_at - self.assigned_at
    }
}

/// Vehicle state. The trip lives inside the non-idle variants, so a vehicle
/// holds an assignment iff it is not idle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleState {
    Idle,
    /// Single combined pickup+dropoff timer.
    Busy(Trip),
    /// Split-phase mode: driving to the pickup.
    EnRouteToPickup(Trip),
    /// Split-phase mode: passenger on board.
    EnRouteToDropoff(Trip),
}

/// Payload-free status label, for snapshots and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Idle,
    Busy,
    EnRouteToPickup,
    EnRouteToDropoff,
}

impl VehicleState {
    pub fn status(&self) -> VehicleStatus {
        match self {
            VehicleState::Idle => VehicleStatus::Idle,
            VehicleState::Busy(_) => VehicleStatus::Busy,
            VehicleState::EnRouteToPickup(_) => VehicleStatus::EnRouteToPickup,
            VehicleState::EnRouteToDropoff(_) => VehicleStatus::EnRouteToDropoff,
        }
    }

    pub fn trip(&self) -> Option<&Trip> {
        match self {
            VehicleState::Idle => None,
            VehicleState::Busy(trip)
            | VehicleState::EnRouteToPickup(trip)
            | VehicleState::EnRouteToDropoff(trip) => Some(trip),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Vehicle {
    pub id: VehicleId,
    pub location: Location,
    pub state: VehicleState,
}

impl Vehicle {
    pub fn new(id: VehicleId, location: Location) -> Self {
        Self {
            id,
            location,
            state: VehicleState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, VehicleState::Idle)
    }

    pub fn status(&self) -> VehicleStatus {
        self.state.status()
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.state.trip()
    }

    pub fn assigned_request_id(&self) -> Option<RequestId> {
        self.trip().map(|trip| trip.request_id)
    }

    pub fn trip_ends_at(&self) -> Option<f64> {
        self.trip().map(|trip| trip.ends_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Unassigned,
    Assigned,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct RideRequest {
    pub id: RequestId,
    pub pickup: Location,
    pub dropoff: Location,
    /// Simulation time when the request entered the backlog.
    pub requested_at: f64,
    pub status: RequestStatus,
}

impl RideRequest {
    pub fn new(id: RequestId, pickup: Location, dropoff: Location, requested_at: f64) -> Self {
        Self {
            id,
            pickup,
            dropoff,
            requested_at,
            status: RequestStatus::Unassigned,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.status == RequestStatus::Unassigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_vehicle_has_no_assignment() {
        let vehicle = Vehicle::new(VehicleId(0), Location::new(37.75, -122.44));
        assert!(vehicle.is_idle());
        assert_eq!(vehicle.assigned_request_id(), None);
        assert_eq!(vehicle.trip_ends_at(), None);
        assert_eq!(vehicle.status(), VehicleStatus::Idle);
    }

    #[test]
    fn busy_vehicle_exposes_trip_fields() {
        let mut vehicle = Vehicle::new(VehicleId(3), Location::new(37.75, -122.44));
        vehicle.state = VehicleState::Busy(Trip {
            request_id: RequestId(9),
            request: Entity::from_raw(1),
            assigned_at: 30.0,
            pickup_at: 90.0,
            ends_at: 300.0,
        });
        assert!(!vehicle.is_idle());
        assert_eq!(vehicle.assigned_request_id(), Some(RequestId(9)));
        assert_eq!(vehicle.trip_ends_at(), Some(300.0));
        let trip = vehicle.trip().expect("trip");
        assert_eq!(trip.pickup_eta_secs(), 60.0);
        assert_eq!(trip.duration_secs(), 270.0);
    }

    #[test]
    fn status_labels_serialize_snake_case() {
        let json = serde_json::to_string(&VehicleStatus::EnRouteToPickup).expect("json");
        assert_eq!(json, "\"en_route_to_pickup\"");
        let json = serde_json::to_string(&RequestStatus::Unassigned).expect("json");
        assert_eq!(json, "\"unassigned\"");
    }
}
