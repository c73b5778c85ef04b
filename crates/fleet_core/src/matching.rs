//! Greedy nearest-ETA vehicle selection.

use bevy_ecs::prelude::Entity;

use crate::ecs::VehicleId;
use crate::geo::Location;
use crate::travel_time::TravelTimeModel;

/// An idle vehicle as seen by the assignment pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleVehicle {
    pub entity: Entity,
    pub id: VehicleId,
    pub location: Location,
}

/// The winning vehicle for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    /// Position of the winner in the idle pool slice.
    pub index: usize,
    pub vehicle_id: VehicleId,
    pub pickup_eta_secs: f64,
}

/// Evaluate the travel time from every idle vehicle to `pickup` once and
/// return the strictly fastest one.
///
/// Earlier vehicles win ties, since a later equal estimate is not an
/// improvement. Estimates that are not below infinity (NaN or infinite) never
/// win, so `None` is possible even for a non-empty pool.
///
/// With a stochastic model the result is not reproducible: each candidate is
/// scored by a fresh draw.
pub fn select_nearest_vehicle(
    model: &mut dyn TravelTimeModel,
    pickup: Location,
    idle_pool: &[IdleVehicle],
) -> Option<MatchCandidate> {
    let mut best: Option<MatchCandidate> = None;
    let mut best_eta = f64::INFINITY;

    for (index, vehicle) in idle_pool.iter().enumerate() {
        let eta = model.travel_time_secs(vehicle.location, pickup);
        if eta < best_eta {
            best_eta = eta;
            best = Some(MatchCandidate {
                index,
                vehicle_id: vehicle.id,
                pickup_eta_secs: eta,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedTravelTime;
    use crate::travel_time::ConstantSpeedTravelTime;

    fn pool(locations: &[Location]) -> Vec<IdleVehicle> {
        locations
            .iter()
            .enumerate()
            .map(|(i, location)| IdleVehicle {
                entity: Entity::from_raw(i as u32),
                id: VehicleId(i as u32),
                location: *location,
            })
            .collect()
    }

    #[test]
    fn selects_closest_vehicle() {
        let pickup = Location::new(37.75, -122.44);
        let far = Location::new(37.79, -122.39);
        let near = Location::new(37.751, -122.441);
        let mut model = ConstantSpeedTravelTime::default();
        let best = select_nearest_vehicle(&mut model, pickup, &pool(&[far, near])).expect("match");
        assert_eq!(best.index, 1);
        assert_eq!(best.vehicle_id, VehicleId(1));
    }

    #[test]
    fn first_vehicle_wins_ties() {
        let here = Location::new(37.75, -122.44);
        let mut model = ScriptedTravelTime::new([60.0, 60.0, 90.0], 0.0);
        let best =
            select_nearest_vehicle(&mut model, here, &pool(&[here, here, here])).expect("match");
        assert_eq!(best.vehicle_id, VehicleId(0));
        assert_eq!(best.pickup_eta_secs, 60.0);
    }

    #[test]
    fn scores_each_candidate_exactly_once() {
        let here = Location::new(37.75, -122.44);
        let mut model = ScriptedTravelTime::new([30.0, 10.0, 20.0], 0.0);
        let best =
            select_nearest_vehicle(&mut model, here, &pool(&[here, here, here])).expect("match");
        assert_eq!(best.vehicle_id, VehicleId(1));
        assert_eq!(model.calls(), 3);
    }

    #[test]
    fn empty_pool_has_no_match() {
        let mut model = ConstantSpeedTravelTime::default();
        assert_eq!(
            select_nearest_vehicle(&mut model, Location::new(0.0, 0.0), &[]),
            None
        );
    }

    #[test]
    fn non_finite_estimates_never_win() {
        let here = Location::new(37.75, -122.44);
        let mut model = ScriptedTravelTime::new([f64::NAN, f64::INFINITY], 0.0);
        assert_eq!(
            select_nearest_vehicle(&mut model, here, &pool(&[here, here])),
            None
        );
    }
}
