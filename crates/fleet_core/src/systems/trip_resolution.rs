use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::ecs::{RequestStatus, RideRequest, Vehicle, VehicleState};
use crate::registry::Fleet;
use crate::telemetry::{CompletedTripRecord, DispatchEvent, DispatchTelemetry, EventLog};

/// Free every vehicle whose trip has ended by the current clock time.
///
/// Vehicles are visited in ascending id order. In split-phase mode a vehicle
/// first reaches its pickup; if the dropoff is also due, the trip completes in
/// the same pass.
pub fn trip_resolution_system(
    clock: Res<SimulationClock>,
    fleet: Res<Fleet>,
    mut log: ResMut<EventLog>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut vehicles: Query<&mut Vehicle>,
    mut requests: Query<&mut RideRequest>,
) {
    let now = clock.now();
    let tick = clock.ticks();

    for entity in fleet.iter() {
        let Ok(mut vehicle) = vehicles.get_mut(entity) else {
            continue;
        };

        if let VehicleState::EnRouteToPickup(trip) = vehicle.state {
            if trip.pickup_at <= now {
                match requests.get(trip.request) {
                    Ok(request) if request.id == trip.request_id => {
                        vehicle.location = request.pickup;
                        log.record(
                            now,
                            tick,
                            DispatchEvent::PickedUp {
                                vehicle_id: vehicle.id,
                                request_id: trip.request_id,
                                location: request.pickup,
                            },
                        );
                        tracing::debug!(
                            vehicle_id = vehicle.id.0,
                            request_id = trip.request_id.0,
                            at = now,
                            "vehicle reached pickup"
                        );
                    }
                    _ => tracing::trace!(
                        vehicle_id = vehicle.id.0,
                        request_id = trip.request_id.0,
                        "assigned request not found at pickup"
                    ),
                }
                vehicle.state = VehicleState::EnRouteToDropoff(trip);
            }
        }

        let Some(trip) = vehicle.trip().copied() else {
            continue;
        };
        if trip.ends_at > now {
            continue;
        }

        match requests.get_mut(trip.request) {
            Ok(mut request) if request.id == trip.request_id => {
                request.status = RequestStatus::Completed;
                vehicle.location = request.dropoff;
                log.record(
                    now,
                    tick,
                    DispatchEvent::TripCompleted {
                        vehicle_id: vehicle.id,
                        request_id: trip.request_id,
                        location: request.dropoff,
                    },
                );
                telemetry.completed_trips.push(CompletedTripRecord {
                    vehicle_id: vehicle.id,
                    request_id: trip.request_id,
                    assigned_at: trip.assigned_at,
                    ends_at: trip.ends_at,
                    resolved_at: now,
                });
                tracing::debug!(
                    vehicle_id = vehicle.id.0,
                    request_id = trip.request_id.0,
                    at = now,
                    "trip completed"
                );
            }
            // Inconsistent link: free the vehicle where it stands.
            _ => tracing::trace!(
                vehicle_id = vehicle.id.0,
                request_id = trip.request_id.0,
                "assigned request not found at completion"
            ),
        }
        vehicle.state = VehicleState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Entity, Schedule, World};

    use crate::ecs::{RequestId, Trip, VehicleId};
    use crate::geo::Location;

    fn pickup() -> Location {
        Location::new(37.72, -122.47)
    }

    fn dropoff() -> Location {
        Location::new(37.78, -122.41)
    }

    fn start() -> Location {
        Location::new(37.75, -122.44)
    }

    fn setup(now: f64, make_state: impl FnOnce(Trip) -> VehicleState) -> (World, Entity, Entity) {
        let mut world = World::new();
        let mut clock = SimulationClock::default();
        clock.advance(now);
        world.insert_resource(clock);
        world.insert_resource(EventLog::default());
        world.insert_resource(DispatchTelemetry::default());

        let mut request = RideRequest::new(RequestId(1), pickup(), dropoff(), 0.0);
        request.status = RequestStatus::Assigned;
        let request_entity = world.spawn(request).id();

        let mut vehicle = Vehicle::new(VehicleId(0), start());
        vehicle.state = make_state(Trip {
            request_id: RequestId(1),
            request: request_entity,
            assigned_at: 0.0,
            pickup_at: 20.0,
            ends_at: 30.0,
        });
        let vehicle_entity = world.spawn(vehicle).id();
        let mut fleet = Fleet::default();
        fleet.register(vehicle_entity);
        world.insert_resource(fleet);

        (world, vehicle_entity, request_entity)
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(trip_resolution_system);
        schedule.run(world);
    }

    #[test]
    fn due_trip_completes_and_moves_vehicle_to_dropoff() {
        let (mut world, vehicle_entity, request_entity) = setup(30.0, VehicleState::Busy);
        run(&mut world);

        let vehicle = world.get::<Vehicle>(vehicle_entity).expect("vehicle");
        assert!(vehicle.is_idle());
        assert_eq!(vehicle.location, dropoff());
        let request = world.get::<RideRequest>(request_entity).expect("request");
        assert_eq!(request.status, RequestStatus::Completed);

        let log = world.resource::<EventLog>();
        assert_eq!(log.len(), 1);
        assert!(matches!(
            log.entries()[0].event,
            DispatchEvent::TripCompleted { .. }
        ));
        assert_eq!(world.resource::<DispatchTelemetry>().completed_trips.len(), 1);
    }

    #[test]
    fn trip_not_yet_due_is_left_alone() {
        let (mut world, vehicle_entity, request_entity) = setup(29.0, VehicleState::Busy);
        run(&mut world);

        let vehicle = world.get::<Vehicle>(vehicle_entity).expect("vehicle");
        assert_eq!(vehicle.assigned_request_id(), Some(RequestId(1)));
        assert_eq!(vehicle.location, start());
        let request = world.get::<RideRequest>(request_entity).expect("request");
        assert_eq!(request.status, RequestStatus::Assigned);
        assert!(world.resource::<EventLog>().is_empty());
    }

    #[test]
    fn missing_request_still_frees_vehicle_in_place() {
        let (mut world, vehicle_entity, request_entity) = setup(30.0, VehicleState::Busy);
        world.despawn(request_entity);
        run(&mut world);

        let vehicle = world.get::<Vehicle>(vehicle_entity).expect("vehicle");
        assert!(vehicle.is_idle());
        assert_eq!(vehicle.location, start());
        assert!(world.resource::<EventLog>().is_empty());
        assert!(world.resource::<DispatchTelemetry>().completed_trips.is_empty());
    }

    #[test]
    fn split_phase_pickup_moves_vehicle_to_pickup() {
        let (mut world, vehicle_entity, _) = setup(25.0, VehicleState::EnRouteToPickup);
        run(&mut world);

        let vehicle = world.get::<Vehicle>(vehicle_entity).expect("vehicle");
        assert!(matches!(vehicle.state, VehicleState::EnRouteToDropoff(_)));
        assert_eq!(vehicle.location, pickup());
        let log = world.resource::<EventLog>();
        assert!(matches!(log.entries()[0].event, DispatchEvent::PickedUp { .. }));
    }

    #[test]
    fn split_phase_resolves_both_legs_in_one_tick() {
        let (mut world, vehicle_entity, request_entity) =
            setup(60.0, VehicleState::EnRouteToPickup);
        run(&mut world);

        let vehicle = world.get::<Vehicle>(vehicle_entity).expect("vehicle");
        assert!(vehicle.is_idle());
        assert_eq!(vehicle.location, dropoff());
        let request = world.get::<RideRequest>(request_entity).expect("request");
        assert_eq!(request.status, RequestStatus::Completed);
        let events: Vec<_> = world
            .resource::<EventLog>()
            .entries()
            .iter()
            .map(|e| e.event)
            .collect();
        assert!(matches!(events[0], DispatchEvent::PickedUp { .. }));
        assert!(matches!(events[1], DispatchEvent::TripCompleted { .. }));
    }
}
