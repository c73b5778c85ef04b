//! Synthetic demand: ride requests at uniform random locations inside the city.
//!
//! The generator owns the request id counter, so requests created here and
//! requests submitted explicitly through the engine share one increasing
//! sequence.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ecs::{RequestId, RideRequest};
use crate::geo::CityBounds;

#[derive(Debug, Resource)]
pub struct DemandGenerator {
    rng: StdRng,
    bounds: CityBounds,
    last_request_id: u64,
    generated_count: usize,
}

impl DemandGenerator {
    pub fn new(bounds: CityBounds, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            bounds,
            last_request_id: 0,
            generated_count: 0,
        }
    }

    /// Number of requests created by [Self::generate] (explicit submissions excluded).
    pub fn generated_count(&self) -> usize {
        self.generated_count
    }

    /// Bernoulli trial for this tick. Independent of backlog size and fleet state;
    /// probabilities outside `[0, 1]` saturate instead of panicking.
    pub fn should_generate(&mut self, demand_probability: f64) -> bool {
        self.rng.gen::<f64>() < demand_probability
    }

    /// Allocate the next request id. Ids start at 1.
    pub fn next_request_id(&mut self) -> RequestId {
        self.last_request_id += 1;
        RequestId(self.last_request_id)
    }

    /// Create a new unassigned request. Pickup and dropoff are drawn
    /// independently and may coincide.
    pub fn generate(&mut self, now: f64) -> RideRequest {
        let id = self.next_request_id();
        let pickup = self.bounds.sample(&mut self.rng);
        let dropoff = self.bounds.sample(&mut self.rng);
        self.generated_count += 1;
        RideRequest::new(id, pickup, dropoff, now)
    }
}
