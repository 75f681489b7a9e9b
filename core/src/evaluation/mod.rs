pub mod catalog;
pub mod compliance;
pub mod evaluator;
pub mod metrics;

pub use catalog::{EmptyCatalog, InMemoryCatalog, RequirementCatalog};
pub use compliance::{ComplianceEngine, ScoringWeights, Threshold, ThresholdProfile};
pub use evaluator::{Evaluator, DEFAULT_PASS_SCORE};
pub use metrics::{compute_all_metrics, compute_cep50, compute_cep90, MetricCategory, MetricKind};
