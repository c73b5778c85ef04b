#![allow(dead_code)]

use std::collections::HashSet;

use fleet_core::ecs::{RequestStatus, VehicleState};
use fleet_core::DispatchEngine;

/// Every busy vehicle points at a distinct Assigned request, every Assigned
/// request is held by exactly one vehicle, and idle vehicles hold nothing.
pub fn assert_fleet_consistent(engine: &DispatchEngine) {
    let vehicles = engine.vehicles();
    let mut held = HashSet::new();
    for vehicle in &vehicles {
        match vehicle.state {
            VehicleState::Idle => assert_eq!(vehicle.assigned_request_id(), None),
            _ => {
                let request_id = vehicle
                    .assigned_request_id()
                    .expect("busy vehicle has a request");
                assert!(
                    held.insert(request_id),
                    "request {request_id} held by two vehicles"
                );
                let request = engine.request(request_id).expect("assigned request exists");
                assert_eq!(request.status, RequestStatus::Assigned);
                let ends_at = vehicle.trip_ends_at().expect("trip end");
                assert!(ends_at >= request.requested_at);
            }
        }
    }

    let assigned = engine
        .requests()
        .iter()
        .filter(|r| r.status == RequestStatus::Assigned)
        .count();
    assert_eq!(assigned, held.len());
}

/// Request statuses as a plain vector, in id order.
pub fn statuses(engine: &DispatchEngine) -> Vec<RequestStatus> {
    engine.requests().iter().map(|r| r.status).collect()
}

/// Position of a status in the Unassigned -> Assigned -> Completed order.
pub fn rank(status: RequestStatus) -> u8 {
    match status {
        RequestStatus::Unassigned => 0,
        RequestStatus::Assigned => 1,
        RequestStatus::Completed => 2,
    }
}
