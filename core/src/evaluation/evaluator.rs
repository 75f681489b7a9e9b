use std::sync::Arc;

use rayon::prelude::*;

use crate::evaluation::catalog::RequirementCatalog;
use crate::evaluation::compliance::{compliance_percentage, ComplianceEngine};
use crate::evaluation::metrics::compute_all_metrics;
use crate::model::{EvaluationResult, Scenario, SensorRegistry, SuiteEntry, Verdict};
use crate::prelude::{DtiResult, PipelineConfig};
use crate::processing::DtiPipeline;
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::terrain::{ElevationProvider, MaskCache, NoElevationData};

/// Overall score a run must reach, on top of passing every linked requirement.
pub const DEFAULT_PASS_SCORE: f64 = 60.0;

/// Top-level entry point: pipeline, metrics, compliance and verdict.
///
/// Shared state (mask cache, catalog, counters) is read-mostly; anything that
/// mutates thresholds or providers needs `&mut self` and so cannot overlap a
/// running suite.
pub struct Evaluator {
    registry: SensorRegistry,
    masks: MaskCache,
    elevation: Arc<dyn ElevationProvider>,
    compliance: ComplianceEngine,
    config: PipelineConfig,
    pass_score: f64,
    recorder: MetricsRecorder,
    logger: LogManager,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            registry: SensorRegistry::with_defaults(),
            masks: MaskCache::new(),
            elevation: Arc::new(NoElevationData),
            compliance: ComplianceEngine::new(),
            config: PipelineConfig::default(),
            pass_score: DEFAULT_PASS_SCORE,
            recorder: MetricsRecorder::new(),
            logger: LogManager::new("evaluator"),
        }
    }

    pub fn with_registry(mut self, registry: SensorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the elevation source; cached masks are discarded.
    pub fn with_elevation(mut self, elevation: Arc<dyn ElevationProvider>) -> Self {
        self.elevation = elevation;
        self.masks.clear();
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn RequirementCatalog>) -> Self {
        self.compliance.set_catalog(Some(catalog));
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self.masks.clear();
        self
    }

    pub fn with_pass_score(mut self, pass_score: f64) -> Self {
        self.pass_score = pass_score;
        self
    }

    pub fn compliance(&self) -> &ComplianceEngine {
        &self.compliance
    }

    pub fn compliance_mut(&mut self) -> &mut ComplianceEngine {
        &mut self.compliance
    }

    pub fn registry_mut(&mut self) -> &mut SensorRegistry {
        &mut self.registry
    }

    pub fn recorder(&self) -> &MetricsRecorder {
        &self.recorder
    }

    pub fn mask_cache(&self) -> &MaskCache {
        &self.masks
    }

    pub fn pass_score(&self) -> f64 {
        self.pass_score
    }

    pub fn evaluate(&self, scenario: &Scenario) -> DtiResult<EvaluationResult> {
        let pipeline = DtiPipeline::new(
            &self.config,
            &self.registry,
            &self.masks,
            self.elevation.as_ref(),
            &self.recorder,
        );
        let mut result = pipeline.execute(scenario).map_err(|err| {
            self.recorder.record_configuration_failure();
            self.logger.warn(&err.to_string());
            err
        })?;

        result.metrics = compute_all_metrics(&result);

        let outcomes: Vec<_> = self
            .compliance
            .requirements_for(&scenario.code)
            .iter()
            .map(|id| self.compliance.outcome(id, &result))
            .collect();
        for outcome in &outcomes {
            if outcome.passed {
                result.passed_requirements.push(outcome.requirement_id.clone());
            } else {
                result.failed_requirements.push(outcome.requirement_id.clone());
            }
        }
        result.compliance_percentage = compliance_percentage(&outcomes);
        result.requirements = outcomes;

        let (scores, overall) = self.compliance.score(&result);
        result.scores = scores;
        result.overall_score = overall;
        result.verdict = if result.failed_requirements.is_empty() && overall >= self.pass_score {
            Verdict::Pass
        } else {
            Verdict::Fail
        };

        self.recorder.record_evaluated();
        self.logger.record(&format!(
            "scenario {}: score {:.1}, {} passed / {} failed, {:?}",
            result.scenario_code,
            result.overall_score,
            result.passed_requirements.len(),
            result.failed_requirements.len(),
            result.verdict
        ));
        Ok(result)
    }

    /// Evaluates scenarios in parallel; one entry per input, in input order.
    pub fn evaluate_suite(&self, scenarios: &[Scenario]) -> Vec<SuiteEntry> {
        scenarios
            .par_iter()
            .map(|scenario| match self.evaluate(scenario) {
                Ok(result) => SuiteEntry::Evaluated(Box::new(result)),
                Err(err) => SuiteEntry::Failed {
                    scenario_code: scenario.code.clone(),
                    error: err.to_string(),
                },
            })
            .collect()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
