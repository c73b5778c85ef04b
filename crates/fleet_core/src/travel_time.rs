//! Travel-time estimation: the cost model the dispatcher ranks vehicles by.
//!
//! The default [StochasticTravelTime] applies synthetic weather and traffic
//! slowdowns drawn fresh on every call, so repeated estimates for the same pair
//! of locations differ. [ConstantSpeedTravelTime] is the deterministic
//! alternative used by tests and reproducible runs.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::{distance_km, Location};

/// Default free-flow speed (km/h).
pub const DEFAULT_BASE_SPEED_KMH: f64 = 40.0;

/// Weather slowdown range: 1.0 = clear, 1.5 = heavy rain.
pub const WEATHER_MULTIPLIER_RANGE: (f64, f64) = (1.0, 1.5);

/// Traffic slowdown range: 1.0 = free flow, 2.0 = heavy congestion.
pub const TRAFFIC_MULTIPLIER_RANGE: (f64, f64) = (1.0, 2.0);

/// Estimates how long a vehicle needs to drive from one location to another.
pub trait TravelTimeModel: Send + Sync {
    /// Travel time in seconds. Must be zero when `start == end`.
    fn travel_time_secs(&mut self, start: Location, end: Location) -> f64;
}

/// Multipliers applied to the base speed for one estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub weather: f64,
    pub traffic: f64,
}

impl Conditions {
    pub fn slowdown(&self) -> f64 {
        self.weather * self.traffic
    }
}

/// Convert a distance and effective speed into seconds.
pub fn secs_for_distance(distance_km: f64, speed_kmh: f64) -> f64 {
    if distance_km <= 0.0 {
        return 0.0;
    }
    distance_km / speed_kmh * 3600.0
}

/// Memoryless stochastic model: every call draws new weather and traffic
/// multipliers from the model's own RNG.
pub struct StochasticTravelTime {
    rng: StdRng,
    base_speed_kmh: f64,
}

impl StochasticTravelTime {
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_base_speed(seed, DEFAULT_BASE_SPEED_KMH)
    }

    pub fn with_base_speed(seed: Option<u64>, base_speed_kmh: f64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            base_speed_kmh,
        }
    }

    /// Draw weather then traffic, independently.
    pub fn sample_conditions(&mut self) -> Conditions {
        let (w_min, w_max) = WEATHER_MULTIPLIER_RANGE;
        let (t_min, t_max) = TRAFFIC_MULTIPLIER_RANGE;
        Conditions {
            weather: self.rng.gen_range(w_min..=w_max),
            traffic: self.rng.gen_range(t_min..=t_max),
        }
    }
}

impl TravelTimeModel for StochasticTravelTime {
    fn travel_time_secs(&mut self, start: Location, end: Location) -> f64 {
        let conditions = self.sample_conditions();
        let effective_speed_kmh = self.base_speed_kmh / conditions.slowdown();
        secs_for_distance(distance_km(start, end), effective_speed_kmh)
    }
}

/// Deterministic model: distance at a fixed speed, no weather or traffic.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSpeedTravelTime {
    pub speed_kmh: f64,
}

impl ConstantSpeedTravelTime {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }
}

impl Default for ConstantSpeedTravelTime {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_SPEED_KMH)
    }
}

impl TravelTimeModel for ConstantSpeedTravelTime {
    fn travel_time_secs(&mut self, start: Location, end: Location) -> f64 {
        secs_for_distance(distance_km(start, end), self.speed_kmh)
    }
}

/// Resource wrapper for the travel-time model trait object.
#[derive(Resource)]
pub struct TravelTimeModelResource(pub Box<dyn TravelTimeModel>);

impl TravelTimeModelResource {
    pub fn new(model: Box<dyn TravelTimeModel>) -> Self {
        Self(model)
    }
}

impl std::ops::Deref for TravelTimeModelResource {
    type Target = dyn TravelTimeModel;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl std::ops::DerefMut for TravelTimeModelResource {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}
