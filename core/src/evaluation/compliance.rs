//! Threshold profiles and requirement scoring.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::evaluation::catalog::RequirementCatalog;
use crate::evaluation::metrics::{metric_value, MetricCategory};
use crate::model::{CategoryScores, EvaluationResult, RequirementOutcome};

pub const DEFAULT_PROFILE: &str = "default";

/// Acceptance bounds on one metric. Missing bounds are open; present bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub requirement_id: String,
    pub metric_name: String,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub unit: String,
}

impl Threshold {
    pub fn between(
        requirement_id: &str,
        metric_name: &str,
        min_value: Option<f64>,
        max_value: Option<f64>,
        unit: &str,
    ) -> Self {
        Self {
            requirement_id: requirement_id.to_string(),
            metric_name: metric_name.to_string(),
            min_value,
            max_value,
            unit: unit.to_string(),
        }
    }

    pub fn at_least(requirement_id: &str, metric_name: &str, min_value: f64, unit: &str) -> Self {
        Self::between(requirement_id, metric_name, Some(min_value), None, unit)
    }

    pub fn at_most(requirement_id: &str, metric_name: &str, max_value: f64, unit: &str) -> Self {
        Self::between(requirement_id, metric_name, None, Some(max_value), unit)
    }

    pub fn accepts(&self, value: f64) -> bool {
        self.min_value.map_or(true, |min| value >= min)
            && self.max_value.map_or(true, |max| value <= max)
    }
}

/// Relative weight of each category in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub detection: f64,
    pub tracking: f64,
    pub identification: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            detection: 0.4,
            tracking: 0.35,
            identification: 0.25,
        }
    }
}

/// (requirement, metric, min, max, unit)
type ThresholdRow = (&'static str, &'static str, Option<f64>, Option<f64>, &'static str);

const DEFAULT_THRESHOLDS: &[ThresholdRow] = &[
    ("FR01", "Pd", Some(0.90), None, "ratio"),
    ("FR02", "False Alarm Rate", None, Some(6.0), "per hour"),
    ("FR03", "Detection Latency Mean", None, Some(5.0), "s"),
    ("FR04", "CEP50", None, Some(50.0), "m"),
    ("FR05", "CEP90", None, Some(100.0), "m"),
    ("FR06", "Track Continuity", Some(0.80), None, "ratio"),
    ("FR07", "Mean Track Error", None, Some(50.0), "m"),
    ("FR08", "Track Update Rate", Some(0.5), None, "Hz"),
    ("FR09", "UID Preservation", Some(0.90), None, "ratio"),
    ("FR10", "Track After Loss", Some(0.50), None, "ratio"),
    ("FR11", "Pi", Some(0.70), None, "ratio"),
    ("FR12", "Payload ID Rate", Some(0.50), None, "ratio"),
    ("FR13", "Identification Latency", None, Some(30.0), "s"),
    ("FR14", "Bird Rejection Rate", Some(0.80), None, "ratio"),
];

/// Named set of thresholds with its scoring weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub name: String,
    #[serde(default)]
    pub thresholds: BTreeMap<String, Threshold>,
    #[serde(default)]
    pub weights: ScoringWeights,
}

impl ThresholdProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            thresholds: BTreeMap::new(),
            weights: ScoringWeights::default(),
        }
    }

    /// Profile built from the built-in threshold table.
    pub fn standard() -> Self {
        let mut profile = Self::new(DEFAULT_PROFILE);
        for (id, metric, min, max, unit) in DEFAULT_THRESHOLDS {
            profile.insert(Threshold::between(id, metric, *min, *max, unit));
        }
        profile
    }

    /// Adds or overrides; returns the replaced threshold.
    pub fn insert(&mut self, threshold: Threshold) -> Option<Threshold> {
        self.thresholds.insert(threshold.requirement_id.clone(), threshold)
    }

    pub fn remove(&mut self, requirement_id: &str) -> Option<Threshold> {
        self.thresholds.remove(requirement_id)
    }

    pub fn get(&self, requirement_id: &str) -> Option<&Threshold> {
        self.thresholds.get(requirement_id)
    }
}

/// Scores runs against the active profile, falling back to the attached catalog.
pub struct ComplianceEngine {
    profiles: BTreeMap<String, ThresholdProfile>,
    active: String,
    catalog: Option<Arc<dyn RequirementCatalog>>,
}

impl ComplianceEngine {
    pub fn new() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), ThresholdProfile::standard());
        Self {
            profiles,
            active: DEFAULT_PROFILE.to_string(),
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn RequirementCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn set_catalog(&mut self, catalog: Option<Arc<dyn RequirementCatalog>>) {
        self.catalog = catalog;
    }

    pub fn add_profile(&mut self, profile: ThresholdProfile) -> Option<ThresholdProfile> {
        self.profiles.insert(profile.name.clone(), profile)
    }

    /// The active profile cannot be removed.
    pub fn remove_profile(&mut self, name: &str) -> Option<ThresholdProfile> {
        if name == self.active {
            return None;
        }
        self.profiles.remove(name)
    }

    /// Switches the active profile; false if no such profile exists.
    pub fn activate(&mut self, name: &str) -> bool {
        if self.profiles.contains_key(name) {
            self.active = name.to_string();
            true
        } else {
            false
        }
    }

    pub fn active_profile(&self) -> &ThresholdProfile {
        &self.profiles[&self.active]
    }

    pub fn profile_mut(&mut self, name: &str) -> Option<&mut ThresholdProfile> {
        self.profiles.get_mut(name)
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Adds or overrides a threshold in the active profile.
    pub fn set_threshold(&mut self, threshold: Threshold) -> Option<Threshold> {
        let active = self.active.clone();
        self.profiles.get_mut(&active)?.insert(threshold)
    }

    pub fn remove_threshold(&mut self, requirement_id: &str) -> Option<Threshold> {
        let active = self.active.clone();
        self.profiles.get_mut(&active)?.remove(requirement_id)
    }

    pub fn set_weights(&mut self, weights: ScoringWeights) {
        let active = self.active.clone();
        if let Some(profile) = self.profiles.get_mut(&active) {
            profile.weights = weights;
        }
    }

    pub fn requirements_for(&self, scenario_code: &str) -> Vec<String> {
        self.catalog
            .as_ref()
            .map(|catalog| catalog.scenario_requirement_ids(scenario_code))
            .unwrap_or_default()
    }

    pub fn threshold(&self, requirement_id: &str) -> Option<Threshold> {
        self.active_profile()
            .get(requirement_id)
            .cloned()
            .or_else(|| self.catalog.as_ref()?.threshold(requirement_id))
    }

    /// A requirement with no registered threshold passes.
    pub fn evaluate_requirement(&self, requirement_id: &str, result: &EvaluationResult) -> bool {
        self.outcome(requirement_id, result).passed
    }

    pub fn outcome(&self, requirement_id: &str, result: &EvaluationResult) -> RequirementOutcome {
        let Some(threshold) = self.threshold(requirement_id) else {
            return RequirementOutcome {
                requirement_id: requirement_id.to_string(),
                passed: true,
                thresholded: false,
                metric_name: None,
                value: None,
                min_value: None,
                max_value: None,
                unit: None,
            };
        };
        let value = metric_value(result, &threshold.metric_name);
        RequirementOutcome {
            requirement_id: requirement_id.to_string(),
            passed: threshold.accepts(value),
            thresholded: true,
            metric_name: Some(threshold.metric_name),
            value: Some(value),
            min_value: threshold.min_value,
            max_value: threshold.max_value,
            unit: Some(threshold.unit),
        }
    }

    /// Category scores on a 0-100 scale and their weighted overall score.
    pub fn score(&self, result: &EvaluationResult) -> (CategoryScores, f64) {
        let category_score = |category: MetricCategory| {
            let kind = category.headline();
            let ratio = result
                .metrics
                .get(&kind)
                .copied()
                .unwrap_or_else(|| kind.compute(result));
            100.0 * ratio.clamp(0.0, 1.0)
        };
        let scores = CategoryScores {
            detection: category_score(MetricCategory::Detection),
            tracking: category_score(MetricCategory::Tracking),
            identification: category_score(MetricCategory::Identification),
        };

        let weights = self.active_profile().weights;
        let w = [
            weights.detection.max(0.0),
            weights.tracking.max(0.0),
            weights.identification.max(0.0),
        ];
        let s = [scores.detection, scores.tracking, scores.identification];
        let total: f64 = w.iter().sum();
        let overall = if total > 0.0 {
            w.iter().zip(s).map(|(w, s)| w * s).sum::<f64>() / total
        } else {
            s.iter().sum::<f64>() / 3.0
        };
        (scores, overall)
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Passed share of evaluated requirements, in percent; 100 when none are linked.
pub fn compliance_percentage(outcomes: &[RequirementOutcome]) -> f64 {
    let passed = outcomes.iter().filter(|o| o.passed).count();
    if outcomes.is_empty() {
        100.0
    } else {
        passed as f64 / outcomes.len() as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::catalog::InMemoryCatalog;
    use crate::evaluation::metrics::MetricKind;

    fn result_with(kind: MetricKind, value: f64) -> EvaluationResult {
        let mut result = EvaluationResult::default();
        result.metrics.insert(kind, value);
        result
    }

    #[test]
    fn unthresholded_requirement_auto_passes() {
        let engine = ComplianceEngine::new();
        assert!(engine.evaluate_requirement("FR999", &EvaluationResult::default()));
        let outcome = engine.outcome("FR999", &EvaluationResult::default());
        assert!(!outcome.thresholded);
    }

    #[test]
    fn bounds_are_inclusive() {
        let engine = ComplianceEngine::new();
        assert!(engine.evaluate_requirement("FR01", &result_with(MetricKind::Pd, 0.90)));
        assert!(!engine.evaluate_requirement("FR01", &result_with(MetricKind::Pd, 0.8999)));
        assert!(engine.evaluate_requirement("FR04", &result_with(MetricKind::Cep50, 50.0)));
        assert!(!engine.evaluate_requirement("FR04", &result_with(MetricKind::Cep50, 50.5)));
    }

    #[test]
    fn thresholds_are_editable_per_profile() {
        let mut engine = ComplianceEngine::new();
        let previous = engine.set_threshold(Threshold::at_least("FR01", "Pd", 0.5, "ratio"));
        assert_eq!(previous.and_then(|t| t.min_value), Some(0.90));
        assert!(engine.evaluate_requirement("FR01", &result_with(MetricKind::Pd, 0.6)));

        engine.remove_threshold("FR01");
        assert!(engine.evaluate_requirement("FR01", &result_with(MetricKind::Pd, 0.0)));

        let mut strict = ThresholdProfile::new("strict");
        strict.insert(Threshold::at_least("FR01", "Pd", 0.99, "ratio"));
        engine.add_profile(strict);
        assert_eq!(engine.profile_names(), vec![DEFAULT_PROFILE.to_string(), "strict".to_string()]);
        if let Some(profile) = engine.profile_mut("strict") {
            profile.weights.identification = 0.0;
        }
        assert!(engine.activate("strict"));
        assert_eq!(engine.active_profile().weights.identification, 0.0);
        assert!(!engine.evaluate_requirement("FR01", &result_with(MetricKind::Pd, 0.95)));
        assert!(engine.remove_profile("strict").is_none());
        assert!(!engine.activate("missing"));
    }

    #[test]
    fn catalog_thresholds_fill_gaps() {
        let mut catalog = InMemoryCatalog::new();
        catalog.link("DTI-01", "FR01");
        catalog.link("DTI-01", "CAT-7");
        catalog.insert_threshold(Threshold::at_most("CAT-7", "Max Track Error", 20.0, "m"));
        catalog.insert_threshold(Threshold::at_least("FR01", "Pd", 0.1, "ratio"));
        let engine = ComplianceEngine::new().with_catalog(Arc::new(catalog));

        assert_eq!(engine.requirements_for("DTI-01"), vec!["FR01", "CAT-7"]);
        // Active profile wins over the catalog.
        assert!(!engine.evaluate_requirement("FR01", &result_with(MetricKind::Pd, 0.5)));
        let result = result_with(MetricKind::MaxTrackError, 25.0);
        assert!(!engine.evaluate_requirement("CAT-7", &result));
    }

    #[test]
    fn unknown_metric_names_read_as_zero() {
        let mut engine = ComplianceEngine::new();
        engine.set_threshold(Threshold::at_most("X1", "Jam Margin", 0.0, "dB"));
        let outcome = engine.outcome("X1", &EvaluationResult::default());
        assert!(outcome.passed);
        assert_eq!(outcome.value, Some(0.0));
    }

    #[test]
    fn overall_score_is_weighted_mean() {
        let mut result = EvaluationResult::default();
        result.metrics.insert(MetricKind::Pd, 1.0);
        result.metrics.insert(MetricKind::TrackContinuity, 0.5);
        result.metrics.insert(MetricKind::Pi, 0.0);
        let mut engine = ComplianceEngine::new();
        engine.set_weights(ScoringWeights {
            detection: 2.0,
            tracking: 2.0,
            identification: 0.0,
        });
        let (scores, overall) = engine.score(&result);
        assert_eq!(scores.detection, 100.0);
        assert_eq!(scores.tracking, 50.0);
        assert!((overall - 75.0).abs() < 1e-12);
    }

    #[test]
    fn compliance_is_share_of_passed() {
        let outcome = |passed| RequirementOutcome {
            requirement_id: "R".into(),
            passed,
            thresholded: true,
            metric_name: None,
            value: None,
            min_value: None,
            max_value: None,
            unit: None,
        };
        let outcomes = [outcome(true), outcome(false), outcome(true), outcome(true)];
        assert_eq!(compliance_percentage(&outcomes), 75.0);
        assert_eq!(compliance_percentage(&[]), 100.0);
    }
}
