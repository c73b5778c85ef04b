//! Greedy assignment pass: match idle vehicles to pending requests, oldest first.
//!
//! The idle pool is fixed at the start of the pass; each assignment removes its
//! vehicle for the rest of the tick. When the pool runs dry the pass stops: the
//! current request gets a "no available vehicles" event and every later
//! request simply waits for the next tick.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::ecs::{RequestStatus, RideRequest, Trip, Vehicle, VehicleState};
use crate::matching::{select_nearest_vehicle, IdleVehicle};
use crate::registry::{Fleet, PendingRequests};
use crate::scenario::{DispatchConfig, TripPhases};
use crate::telemetry::{AssignmentRecord, DispatchEvent, DispatchTelemetry, EventLog};
use crate::travel_time::TravelTimeModelResource;

#[allow(clippy::too_many_arguments)]
pub fn assignment_system(
    clock: Res<SimulationClock>,
    config: Res<DispatchConfig>,
    fleet: Res<Fleet>,
    mut travel_time: ResMut<TravelTimeModelResource>,
    mut pending: ResMut<PendingRequests>,
    mut log: ResMut<EventLog>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut vehicles: Query<&mut Vehicle>,
    mut requests: Query<&mut RideRequest>,
) {
    let now = clock.now();
    let tick = clock.ticks();

    let mut idle_pool: Vec<IdleVehicle> = fleet
        .iter()
        .filter_map(|entity| {
            let vehicle = vehicles.get(entity).ok()?;
            vehicle.is_idle().then_some(IdleVehicle {
                entity,
                id: vehicle.id,
                location: vehicle.location,
            })
        })
        .collect();

    for (request_id, request_entity) in pending.ordered() {
        let Ok(mut request) = requests.get_mut(request_entity) else {
            pending.remove(request_id);
            continue;
        };
        if !request.is_unassigned() {
            pending.remove(request_id);
            continue;
        }

        if idle_pool.is_empty() {
            log.record(now, tick, DispatchEvent::NoVehicleAvailable { request_id });
            tracing::debug!(
                request_id = request_id.0,
                waiting = pending.len(),
                at = now,
                "no idle vehicles left; deferring remaining requests"
            );
            break;
        }

        let Some(best) = select_nearest_vehicle(travel_time.0.as_mut(), request.pickup, &idle_pool)
        else {
            continue;
        };
        let dropoff_secs = travel_time.0.travel_time_secs(request.pickup, request.dropoff);
        let trip_secs = best.pickup_eta_secs + dropoff_secs;
        let chosen = idle_pool.remove(best.index);

        let trip = Trip {
            request_id,
            request: request_entity,
            assigned_at: now,
            pickup_at: now + best.pickup_eta_secs,
            ends_at: now + trip_secs,
        };
        let Ok(mut vehicle) = vehicles.get_mut(chosen.entity) else {
            continue;
        };
        vehicle.state = match config.trip_phases {
            TripPhases::Combined => VehicleState::Busy(trip),
            TripPhases::Split => VehicleState::EnRouteToPickup(trip),
        };
        request.status = RequestStatus::Assigned;
        pending.remove(request_id);

        log.record(
            now,
            tick,
            DispatchEvent::Assigned {
                vehicle_id: chosen.id,
                request_id,
                pickup_eta_secs: best.pickup_eta_secs,
                trip_secs,
            },
        );
        telemetry.assignments.push(AssignmentRecord {
            vehicle_id: chosen.id,
            request_id,
            requested_at: request.requested_at,
            assigned_at: now,
            pickup_eta_secs: best.pickup_eta_secs,
            trip_secs,
        });
        tracing::debug!(
            vehicle_id = chosen.id.0,
            request_id = request_id.0,
            pickup_eta_secs = best.pickup_eta_secs,
            trip_secs,
            at = now,
            "vehicle assigned"
        );
    }
}
