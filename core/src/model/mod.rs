pub mod environment;
pub mod registry;
pub mod results;
pub mod scenario;
pub mod sensor;
pub mod target;

pub use environment::{EnvironmentState, EwCondition, Obstacle, TerrainType, Weather};
pub use registry::{SensorPlacement, SensorRegistry};
pub use results::{
    CategoryScores, CoverageSummary, DetectionResult, EvaluationResult, IdentificationResult,
    RequirementOutcome, SuiteEntry, TrackUid, TrackingResult, Verdict, FALSE_ALARM_ID,
};
pub use scenario::Scenario;
pub use sensor::{AzimuthWindow, DetectionCurve, ElevationWindow, SensorCapability, SensorSite};
pub use target::{FlightPlan, SizeClass, TargetState, TargetTrack, Waypoint};
