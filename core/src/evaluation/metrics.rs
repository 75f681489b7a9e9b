//! Aggregation of a pipeline run into named scalar metrics.
//!
//! Every metric is a pure function of the [`EvaluationResult`]; empty inputs
//! produce 0. Percentiles use linear interpolation between closest ranks with
//! `rank = p/100 · (n − 1)`, so CEP50/CEP90 of `[1, 2, …, 10]` m are 5.5 m and 9.1 m.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::StatsHelper;
use crate::model::{EvaluationResult, SizeClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Detection,
    Tracking,
    Identification,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 3] = [Self::Detection, Self::Tracking, Self::Identification];

    /// Metric whose ratio, scaled to 100, is the category score.
    pub fn headline(self) -> MetricKind {
        match self {
            Self::Detection => MetricKind::Pd,
            Self::Tracking => MetricKind::TrackContinuity,
            Self::Identification => MetricKind::Pi,
        }
    }
}

/// Fixed metric vocabulary. Serialises under its human-readable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// True detections over detectable target-timesteps.
    #[serde(rename = "Pd")]
    Pd,
    /// False alarms per hour of observation.
    #[serde(rename = "False Alarm Rate")]
    FalseAlarmRate,
    #[serde(rename = "False Alarm Count")]
    FalseAlarmCount,
    #[serde(rename = "Detection Latency Mean")]
    DetectionLatencyMean,
    #[serde(rename = "Detection Latency Std")]
    DetectionLatencyStd,
    #[serde(rename = "Detection Latency P95")]
    DetectionLatencyP95,
    #[serde(rename = "Position Error Mean")]
    PositionErrorMean,
    #[serde(rename = "Position Error Std")]
    PositionErrorStd,
    #[serde(rename = "Position Error P95")]
    PositionErrorP95,
    #[serde(rename = "CEP50")]
    Cep50,
    #[serde(rename = "CEP90")]
    Cep90,
    #[serde(rename = "Track Continuity")]
    TrackContinuity,
    #[serde(rename = "Track Update Rate")]
    TrackUpdateRate,
    #[serde(rename = "Mean Track Error")]
    MeanTrackError,
    #[serde(rename = "Max Track Error")]
    MaxTrackError,
    #[serde(rename = "Track Drops")]
    TrackDrops,
    /// Coast episodes that resumed under the same UID.
    #[serde(rename = "UID Preservation")]
    UidPreservation,
    /// Losses followed by a new track on the same target.
    #[serde(rename = "Track After Loss")]
    TrackAfterLoss,
    /// Probability of identification: targets correctly classified.
    #[serde(rename = "Pi")]
    Pi,
    /// Payload identification over targets that truly carry one.
    #[serde(rename = "Payload ID Rate")]
    PayloadIdRate,
    #[serde(rename = "Identification Latency")]
    IdentificationLatency,
    /// Birds never promoted to a UAS size class.
    #[serde(rename = "Bird Rejection Rate")]
    BirdRejectionRate,
}

impl MetricKind {
    pub const ALL: [MetricKind; 22] = [
        MetricKind::Pd,
        MetricKind::FalseAlarmRate,
        MetricKind::FalseAlarmCount,
        MetricKind::DetectionLatencyMean,
        MetricKind::DetectionLatencyStd,
        MetricKind::DetectionLatencyP95,
        MetricKind::PositionErrorMean,
        MetricKind::PositionErrorStd,
        MetricKind::PositionErrorP95,
        MetricKind::Cep50,
        MetricKind::Cep90,
        MetricKind::TrackContinuity,
        MetricKind::TrackUpdateRate,
        MetricKind::MeanTrackError,
        MetricKind::MaxTrackError,
        MetricKind::TrackDrops,
        MetricKind::UidPreservation,
        MetricKind::TrackAfterLoss,
        MetricKind::Pi,
        MetricKind::PayloadIdRate,
        MetricKind::IdentificationLatency,
        MetricKind::BirdRejectionRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Pd => "Pd",
            Self::FalseAlarmRate => "False Alarm Rate",
            Self::FalseAlarmCount => "False Alarm Count",
            Self::DetectionLatencyMean => "Detection Latency Mean",
            Self::DetectionLatencyStd => "Detection Latency Std",
            Self::DetectionLatencyP95 => "Detection Latency P95",
            Self::PositionErrorMean => "Position Error Mean",
            Self::PositionErrorStd => "Position Error Std",
            Self::PositionErrorP95 => "Position Error P95",
            Self::Cep50 => "CEP50",
            Self::Cep90 => "CEP90",
            Self::TrackContinuity => "Track Continuity",
            Self::TrackUpdateRate => "Track Update Rate",
            Self::MeanTrackError => "Mean Track Error",
            Self::MaxTrackError => "Max Track Error",
            Self::TrackDrops => "Track Drops",
            Self::UidPreservation => "UID Preservation",
            Self::TrackAfterLoss => "Track After Loss",
            Self::Pi => "Pi",
            Self::PayloadIdRate => "Payload ID Rate",
            Self::IdentificationLatency => "Identification Latency",
            Self::BirdRejectionRate => "Bird Rejection Rate",
        }
    }

    /// Case-insensitive lookup by human-readable name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn category(self) -> MetricCategory {
        match self {
            Self::Pd
            | Self::FalseAlarmRate
            | Self::FalseAlarmCount
            | Self::DetectionLatencyMean
            | Self::DetectionLatencyStd
            | Self::DetectionLatencyP95
            | Self::PositionErrorMean
            | Self::PositionErrorStd
            | Self::PositionErrorP95
            | Self::Cep50
            | Self::Cep90 => MetricCategory::Detection,
            Self::TrackContinuity
            | Self::TrackUpdateRate
            | Self::MeanTrackError
            | Self::MaxTrackError
            | Self::TrackDrops
            | Self::UidPreservation
            | Self::TrackAfterLoss => MetricCategory::Tracking,
            Self::Pi
            | Self::PayloadIdRate
            | Self::IdentificationLatency
            | Self::BirdRejectionRate => MetricCategory::Identification,
        }
    }

    /// Extracts this metric from a run.
    pub fn compute(self, result: &EvaluationResult) -> f64 {
        match self {
            Self::Pd => probability_of_detection(result),
            Self::FalseAlarmRate => {
                let hours = result.coverage.observation_time_s / 3_600.0;
                if hours > 0.0 {
                    result.false_alarms().count() as f64 / hours
                } else {
                    0.0
                }
            }
            Self::FalseAlarmCount => result.false_alarms().count() as f64,
            Self::DetectionLatencyMean => StatsHelper::mean(&latencies(result)),
            Self::DetectionLatencyStd => StatsHelper::std_dev(&latencies(result)),
            Self::DetectionLatencyP95 => StatsHelper::percentile(&latencies(result), 95.0),
            Self::PositionErrorMean => StatsHelper::mean(&position_errors(result)),
            Self::PositionErrorStd => StatsHelper::std_dev(&position_errors(result)),
            Self::PositionErrorP95 => StatsHelper::percentile(&position_errors(result), 95.0),
            Self::Cep50 => compute_cep50(&position_errors(result)),
            Self::Cep90 => compute_cep90(&position_errors(result)),
            Self::TrackContinuity => {
                let ratios: Vec<f64> = result.tracking.iter().map(|t| t.continuity_ratio).collect();
                StatsHelper::mean(&ratios)
            }
            Self::TrackUpdateRate => {
                let rates: Vec<f64> = result.tracking.iter().map(|t| t.update_rate_hz).collect();
                StatsHelper::mean(&rates)
            }
            Self::MeanTrackError => {
                let errors: Vec<f64> = result
                    .tracking
                    .iter()
                    .filter(|t| t.segment_count > 0)
                    .map(|t| t.mean_position_error_m)
                    .collect();
                StatsHelper::mean(&errors)
            }
            Self::MaxTrackError => {
                let errors: Vec<f64> = result
                    .tracking
                    .iter()
                    .map(|t| t.max_position_error_m)
                    .collect();
                StatsHelper::max(&errors)
            }
            Self::TrackDrops => result.tracking.iter().map(|t| t.drop_count as f64).sum(),
            Self::UidPreservation => {
                let episodes: u32 = result.tracking.iter().map(|t| t.coast_episodes).sum();
                let kept: u32 = result.tracking.iter().map(|t| t.reacquisitions).sum();
                held_ratio(result, kept, episodes)
            }
            Self::TrackAfterLoss => {
                let losses: u32 = result.tracking.iter().map(|t| t.losses).sum();
                let recovered: u32 = result.tracking.iter().map(|t| t.recovered_after_drop).sum();
                held_ratio(result, recovered, losses)
            }
            Self::Pi => {
                let total = result.identification.len();
                let correct = result
                    .identification
                    .iter()
                    .filter(|id| id.classification_correct)
                    .count();
                ratio(correct, total)
            }
            Self::PayloadIdRate => {
                let carriers: Vec<_> = result
                    .identification
                    .iter()
                    .filter(|id| id.carries_payload)
                    .collect();
                let identified = carriers.iter().filter(|id| id.payload_identified).count();
                ratio(identified, carriers.len())
            }
            Self::IdentificationLatency => {
                let latencies: Vec<f64> = result
                    .identification
                    .iter()
                    .filter_map(|id| id.latency_s)
                    .collect();
                StatsHelper::mean(&latencies)
            }
            Self::BirdRejectionRate => {
                let birds: Vec<_> = result
                    .identification
                    .iter()
                    .filter(|id| id.true_size == SizeClass::Bird)
                    .collect();
                let rejected = birds
                    .iter()
                    .filter(|id| id.estimated_size.map_or(true, |size| size.rank().is_none()))
                    .count();
                ratio(rejected, birds.len())
            }
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Share of at-risk events survived. With tracks but no such events nothing
/// was lost (1.0); with no tracks at all there is nothing to score (0.0).
fn held_ratio(result: &EvaluationResult, survived: u32, events: u32) -> f64 {
    if events > 0 {
        (survived as f64 / events as f64).clamp(0.0, 1.0)
    } else if result.tracking.iter().any(|t| t.segment_count > 0) {
        1.0
    } else {
        0.0
    }
}

fn probability_of_detection(result: &EvaluationResult) -> f64 {
    let detected = result
        .true_detections()
        .filter(|detection| detection.in_coverage)
        .count();
    ratio(detected, result.coverage.detectable_target_steps as usize).clamp(0.0, 1.0)
}

fn latencies(result: &EvaluationResult) -> Vec<f64> {
    result.true_detections().map(|d| d.latency_s).collect()
}

fn position_errors(result: &EvaluationResult) -> Vec<f64> {
    result.true_detections().map(|d| d.position_error_m).collect()
}

pub fn compute_cep50(radial_errors: &[f64]) -> f64 {
    StatsHelper::percentile(radial_errors, 50.0)
}

pub fn compute_cep90(radial_errors: &[f64]) -> f64 {
    StatsHelper::percentile(radial_errors, 90.0)
}

/// Every metric in declaration order.
pub fn compute_all_metrics(result: &EvaluationResult) -> BTreeMap<MetricKind, f64> {
    MetricKind::ALL
        .iter()
        .map(|kind| (*kind, kind.compute(result)))
        .collect()
}

/// Value of a metric by name; unknown names yield 0.
pub fn metric_value(result: &EvaluationResult, name: &str) -> f64 {
    let Some(kind) = MetricKind::from_name(name) else {
        return 0.0;
    };
    result
        .metrics
        .get(&kind)
        .copied()
        .unwrap_or_else(|| kind.compute(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CoverageSummary, DetectionResult, IdentificationResult, TrackingResult, FALSE_ALARM_ID,
    };

    fn detection(target_id: &str, detected: bool, error: f64) -> DetectionResult {
        DetectionResult {
            timestamp: 0.0,
            target_id: target_id.into(),
            detected,
            in_coverage: target_id != FALSE_ALARM_ID,
            pd: 0.9,
            latency_s: error / 10.0,
            position_error_m: error,
            reported_position: None,
            sensor_ids: vec!["radar".into()],
            false_alarm: target_id == FALSE_ALARM_ID,
        }
    }

    fn identification(
        true_size: SizeClass,
        correct: bool,
        carries_payload: bool,
        payload_identified: bool,
    ) -> IdentificationResult {
        IdentificationResult {
            target_id: "t".into(),
            true_size,
            attempted: true,
            classification_correct: correct,
            carries_payload,
            payload_identified,
            estimated_size: Some(if correct { true_size } else { SizeClass::C2 }),
            latency_s: correct.then_some(4.0),
            attempts: 2,
        }
    }

    #[test]
    fn category_headlines_belong_to_their_category() {
        for category in MetricCategory::ALL {
            assert_eq!(category.headline().category(), category);
        }
        let tracking = MetricKind::ALL
            .iter()
            .filter(|kind| kind.category() == MetricCategory::Tracking)
            .count();
        assert_eq!(tracking, 7);
    }

    #[test]
    fn cep_uses_linear_interpolation() {
        let errors: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!((compute_cep50(&errors) - 5.5).abs() < 1e-12);
        assert!((compute_cep90(&errors) - 9.1).abs() < 1e-12);
        assert_eq!(compute_cep50(&[]), 0.0);
    }

    #[test]
    fn empty_result_yields_zero_everywhere() {
        let metrics = compute_all_metrics(&EvaluationResult::default());
        assert_eq!(metrics.len(), MetricKind::ALL.len());
        assert!(metrics.values().all(|v| *v == 0.0));
    }

    #[test]
    fn detection_statistics_exclude_false_alarms() {
        let mut result = EvaluationResult {
            coverage: CoverageSummary {
                detectable_target_steps: 4,
                observation_time_s: 1_800.0,
                ..Default::default()
            },
            ..Default::default()
        };
        result.detections = vec![
            detection("uas-1", true, 10.0),
            detection("uas-1", true, 20.0),
            detection("uas-1", true, 30.0),
            detection("uas-1", false, 0.0),
            detection(FALSE_ALARM_ID, true, 500.0),
        ];

        let metrics = compute_all_metrics(&result);
        assert!((metrics[&MetricKind::Pd] - 0.75).abs() < 1e-12);
        assert!((metrics[&MetricKind::FalseAlarmRate] - 2.0).abs() < 1e-12);
        assert_eq!(metrics[&MetricKind::FalseAlarmCount], 1.0);
        assert!((metrics[&MetricKind::PositionErrorMean] - 20.0).abs() < 1e-12);
        assert!((metrics[&MetricKind::DetectionLatencyMean] - 2.0).abs() < 1e-12);
        assert!(metrics[&MetricKind::PositionErrorP95] <= 30.0);
    }

    #[test]
    fn payload_rate_counts_only_true_carriers() {
        let result = EvaluationResult {
            identification: vec![
                identification(SizeClass::C2, true, true, true),
                identification(SizeClass::C2, true, false, false),
                identification(SizeClass::C3, false, true, false),
                identification(SizeClass::Bird, true, false, false),
            ],
            ..Default::default()
        };
        assert!((MetricKind::PayloadIdRate.compute(&result) - 0.5).abs() < 1e-12);
        assert!((MetricKind::Pi.compute(&result) - 0.75).abs() < 1e-12);
        assert_eq!(MetricKind::BirdRejectionRate.compute(&result), 1.0);
        assert_eq!(MetricKind::IdentificationLatency.compute(&result), 4.0);
    }

    #[test]
    fn uid_preservation_is_tracked_not_proxied() {
        let track = TrackingResult {
            target_id: "uas-1".into(),
            mean_position_error_m: 5.0,
            max_position_error_m: 9.0,
            continuity_ratio: 0.6,
            update_rate_hz: 0.8,
            drop_count: 1,
            losses: 2,
            segment_count: 2,
            coast_episodes: 4,
            reacquisitions: 3,
            recovered_after_drop: 1,
            final_uid: None,
        };
        let result = EvaluationResult {
            tracking: vec![track],
            ..Default::default()
        };
        assert!((MetricKind::UidPreservation.compute(&result) - 0.75).abs() < 1e-12);
        assert!((MetricKind::TrackAfterLoss.compute(&result) - 0.5).abs() < 1e-12);
        assert_eq!(MetricKind::TrackDrops.compute(&result), 1.0);
    }

    #[test]
    fn names_round_trip_and_unknowns_default_to_zero() {
        for kind in MetricKind::ALL {
            assert_eq!(MetricKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MetricKind::from_name("cep90"), Some(MetricKind::Cep90));
        assert_eq!(metric_value(&EvaluationResult::default(), "Radar Cross Section"), 0.0);
    }

    #[test]
    fn serialises_under_human_readable_names() {
        let json = serde_json::to_string(&MetricKind::UidPreservation).unwrap();
        assert_eq!(json, "\"UID Preservation\"");
    }
}
