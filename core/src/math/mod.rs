pub mod geo;
pub mod stats;
pub mod swerling;

pub use geo::GeoPosition;
pub use stats::StatsHelper;
