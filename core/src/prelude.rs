use serde::{Deserialize, Serialize};

use crate::processing::tracking::TrackConfig;
use crate::terrain::MaskConfig;

/// Default fixed simulation step (1 Hz).
pub const DEFAULT_TIMESTEP_S: f64 = 1.0;

/// Shared configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Overrides the scenario's own timestep when set.
    pub timestep_s: Option<f64>,
    pub mask: MaskConfig,
    pub tracking: TrackConfig,
}

/// Malformed scenario input. Fatal for the scenario being evaluated.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("target {target}: waypoint {index} at t={time_s}s precedes the previous waypoint")]
    NonMonotonicWaypoints {
        target: String,
        index: usize,
        time_s: f64,
    },
    #[error("target {target}: waypoint {index} has non-finite time {time_s}")]
    NonFiniteWaypointTime {
        target: String,
        index: usize,
        time_s: f64,
    },
    #[error("target {0} has an empty flight plan")]
    EmptyFlightPlan(String),
    #[error("sensor {sensor} references unknown template {template}")]
    UnknownSensor { sensor: String, template: String },
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("invalid timing: {0}")]
    InvalidTiming(String),
    #[error("scenario has no sensors")]
    NoSensors,
}

/// Common error type for scenario evaluation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("scenario {scenario}: {source}")]
    Configuration {
        scenario: String,
        #[source]
        source: ConfigurationError,
    },
}

impl EvaluationError {
    pub fn configuration(scenario: &str, source: ConfigurationError) -> Self {
        Self::Configuration {
            scenario: scenario.to_string(),
            source,
        }
    }
}

pub type DtiResult<T> = Result<T, EvaluationError>;
