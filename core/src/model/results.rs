use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evaluation::metrics::MetricKind;
use crate::math::GeoPosition;
use crate::model::target::SizeClass;

/// Identity carried by synthesized false alarms; never a scenario target.
pub const FALSE_ALARM_ID: &str = "FALSE_ALARM";

/// Stable identifier correlating fixes of one physical target within a track segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackUid(pub u64);

impl fmt::Display for TrackUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRK-{:05}", self.0)
    }
}

/// One fused detection opportunity for a target at a timestep, or a false alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub timestamp: f64,
    pub target_id: String,
    pub detected: bool,
    /// Target inside at least one sensor's nominal range.
    pub in_coverage: bool,
    /// Fused effective probability of detection.
    pub pd: f64,
    pub latency_s: f64,
    pub position_error_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_position: Option<GeoPosition>,
    pub sensor_ids: Vec<String>,
    pub false_alarm: bool,
}

impl DetectionResult {
    pub fn is_true_detection(&self) -> bool {
        self.detected && !self.false_alarm
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingResult {
    pub target_id: String,
    pub mean_position_error_m: f64,
    pub max_position_error_m: f64,
    pub continuity_ratio: f64,
    pub update_rate_hz: f64,
    /// Re-acquisitions that had to open a new segment after a drop.
    pub drop_count: u32,
    /// Transitions into the dropped state.
    pub losses: u32,
    pub segment_count: u32,
    /// Coast episodes that ended, either by re-acquisition or by drop.
    pub coast_episodes: u32,
    /// Coasting → tracking transitions (UID kept).
    pub reacquisitions: u32,
    /// New segments established after a drop.
    pub recovered_after_drop: u32,
    pub final_uid: Option<TrackUid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationResult {
    pub target_id: String,
    pub true_size: SizeClass,
    pub attempted: bool,
    pub classification_correct: bool,
    pub carries_payload: bool,
    pub payload_identified: bool,
    pub estimated_size: Option<SizeClass>,
    /// Seconds from first acquisition to correct classification.
    pub latency_s: Option<f64>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub sensor_count: usize,
    pub target_count: usize,
    pub timesteps: u64,
    pub detectable_target_steps: u64,
    pub observation_time_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementOutcome {
    pub requirement_id: String,
    pub passed: bool,
    /// False when no threshold was registered and the requirement auto-passed.
    pub thresholded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub detection: f64,
    pub tracking: f64,
    pub identification: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[default]
    NotEvaluated,
    Pass,
    Fail,
}

/// Everything one scenario run produces. Plain data; holds no pipeline handles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scenario_code: String,
    pub scenario_name: String,
    pub seed: u64,
    pub duration_s: f64,
    pub timestep_s: f64,
    pub detections: Vec<DetectionResult>,
    pub tracking: Vec<TrackingResult>,
    pub identification: Vec<IdentificationResult>,
    pub coverage: CoverageSummary,
    pub metrics: BTreeMap<MetricKind, f64>,
    pub requirements: Vec<RequirementOutcome>,
    pub passed_requirements: Vec<String>,
    pub failed_requirements: Vec<String>,
    pub scores: CategoryScores,
    pub overall_score: f64,
    pub compliance_percentage: f64,
    pub verdict: Verdict,
}

impl EvaluationResult {
    pub fn true_detections(&self) -> impl Iterator<Item = &DetectionResult> {
        self.detections.iter().filter(|d| d.is_true_detection())
    }

    pub fn false_alarms(&self) -> impl Iterator<Item = &DetectionResult> {
        self.detections.iter().filter(|d| d.false_alarm)
    }
}

/// One slot of a suite evaluation, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SuiteEntry {
    Evaluated(Box<EvaluationResult>),
    Failed { scenario_code: String, error: String },
}

impl SuiteEntry {
    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            Self::Evaluated(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
