//! Simulation and scoring core for Counter-UAS detection, tracking and
//! identification (DTI) certification.
//!
//! Scenarios run through a fixed-step sensor pipeline (terrain masking,
//! detection, fusion, track continuity, identification) and the evaluator turns
//! the raw run into named metrics, requirement verdicts and an overall score.

pub mod evaluation;
pub mod math;
pub mod model;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod terrain;

pub use evaluation::{compute_all_metrics, Evaluator, MetricKind};
pub use model::{EvaluationResult, Scenario, SuiteEntry};
pub use prelude::{ConfigurationError, DtiResult, EvaluationError, PipelineConfig};
