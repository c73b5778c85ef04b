pub mod assignment;
pub mod demand_injection;
pub mod trip_resolution;
