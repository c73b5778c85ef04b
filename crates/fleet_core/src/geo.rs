//! Geographic primitives: coordinates, city bounds and great-circle distance.
//!
//! Distance is geometric (haversine on a spherical Earth), not road-network based.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Great-circle distance between two locations in kilometres.
pub fn distance_km(a: Location, b: Location) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Rectangular city region in degrees. `min < max` is expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CityBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl CityBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// San Francisco, the default demo city.
    pub fn san_francisco() -> Self {
        Self::new(37.70, 37.80, -122.50, -122.38)
    }

    /// Draw a location uniformly inside the bounds.
    ///
    /// Interpolates instead of using `gen_range` so inverted or empty bounds
    /// produce degenerate draws rather than a panic.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Location {
        let lat = lerp(self.min_lat, self.max_lat, rng.gen::<f64>());
        let lon = lerp(self.min_lon, self.max_lon, rng.gen::<f64>());
        Location::new(lat, lon)
    }

    pub fn contains(&self, location: Location) -> bool {
        (self.min_lat..=self.max_lat).contains(&location.lat)
            && (self.min_lon..=self.max_lon).contains(&location.lon)
    }

    pub fn is_well_formed(&self) -> bool {
        self.min_lat < self.max_lat && self.min_lon < self.max_lon
    }
}

impl Default for CityBounds {
    fn default() -> Self {
        Self::san_francisco()
    }
}

fn lerp(min: f64, max: f64, t: f64) -> f64 {
    min + (max - min) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn distance_is_zero_for_identical_points() {
        let p = Location::new(37.75, -122.44);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn display_keeps_full_precision() {
        let p = Location::new(37.712345678901, -122.40000000001);
        assert_eq!(p.to_string(), "(37.712345678901, -122.40000000001)");
        assert_eq!(Location::new(37.75, -122.4).to_string(), "(37.75, -122.4)");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Location::new(37.70, -122.50);
        let b = Location::new(37.80, -122.38);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-12);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(1.0, 0.0);
        let d = distance_km(a, b);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn triangle_inequality_holds() {
        let a = Location::new(37.70, -122.50);
        let b = Location::new(37.75, -122.40);
        let c = Location::new(37.80, -122.38);
        assert!(distance_km(a, c) <= distance_km(a, b) + distance_km(b, c) + 1e-9);
    }

    #[test]
    fn samples_stay_inside_bounds() {
        let bounds = CityBounds::san_francisco();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert!(bounds.contains(bounds.sample(&mut rng)));
        }
    }

    #[test]
    fn inverted_bounds_do_not_panic() {
        let bounds = CityBounds::new(1.0, 0.0, 5.0, 5.0);
        let mut rng = StdRng::seed_from_u64(7);
        let location = bounds.sample(&mut rng);
        assert!(location.lat <= 1.0 && location.lat >= 0.0);
        assert_eq!(location.lon, 5.0);
        assert!(!bounds.is_well_formed());
    }
}
