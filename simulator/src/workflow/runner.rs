use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use dticore::evaluation::Evaluator;
use dticore::model::{SensorRegistry, SuiteEntry, Verdict};
use dticore::telemetry::RunCounters;
use dticore::{EvaluationResult, Scenario};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One suite run as written to disk and served over HTTP.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    pub entries: Vec<SuiteEntry>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub counters: RunCounters,
}

fn entry_code(entry: &SuiteEntry) -> &str {
    match entry {
        SuiteEntry::Evaluated(result) => &result.scenario_code,
        SuiteEntry::Failed { scenario_code, .. } => scenario_code,
    }
}

impl SuiteReport {
    pub fn from_entries(entries: Vec<SuiteEntry>, counters: RunCounters) -> Self {
        let mut report = Self {
            entries,
            counters,
            ..Default::default()
        };
        report.recount();
        report
    }

    fn recount(&mut self) {
        let verdict_count = |verdict: Verdict| {
            self.entries
                .iter()
                .filter_map(SuiteEntry::result)
                .filter(|result| result.verdict == verdict)
                .count()
        };
        let passed = verdict_count(Verdict::Pass);
        let failed = verdict_count(Verdict::Fail);
        self.passed = passed;
        self.failed = failed;
        self.errored = self.entries.iter().filter(|entry| entry.is_failed()).count();
    }

    /// Replaces the entry for the same scenario code, or appends.
    pub fn upsert(&mut self, entry: SuiteEntry) {
        let code = entry_code(&entry).to_string();
        match self.entries.iter_mut().find(|existing| entry_code(existing) == code) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.recount();
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing suite report")?;
        fs::write(path, json).with_context(|| format!("writing suite report {}", path.display()))
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    evaluator: Arc<Evaluator>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        let mut registry = SensorRegistry::with_defaults();
        for (name, template) in &config.sensor_templates {
            registry.register(name, template.clone());
        }

        let mut evaluator = Evaluator::new()
            .with_registry(registry)
            .with_config(config.pipeline.clone());
        if let Some(catalog) = config.load_catalog().context("loading requirement catalog")? {
            evaluator = evaluator.with_catalog(Arc::new(catalog));
        }
        if let Some(pass_score) = config.pass_score {
            evaluator = evaluator.with_pass_score(pass_score);
        }
        for threshold in &config.thresholds {
            evaluator.compliance_mut().set_threshold(threshold.clone());
        }
        if let Some(weights) = config.weights {
            evaluator.compliance_mut().set_weights(weights);
        }

        Ok(Self {
            config,
            evaluator: Arc::new(evaluator),
        })
    }

    /// Loads and evaluates every configured scenario.
    pub fn execute(&self) -> anyhow::Result<SuiteReport> {
        let scenarios = self.config.load_scenarios().context("loading scenarios")?;
        Ok(self.execute_scenarios(&scenarios))
    }

    pub fn execute_scenarios(&self, scenarios: &[Scenario]) -> SuiteReport {
        let entries = self.evaluator.evaluate_suite(scenarios);
        SuiteReport::from_entries(entries, self.evaluator.recorder().snapshot())
    }

    pub fn evaluate(&self, scenario: &Scenario) -> anyhow::Result<EvaluationResult> {
        self.evaluator
            .evaluate(scenario)
            .with_context(|| format!("evaluating scenario {}", scenario.code))
    }

    pub fn counters(&self) -> RunCounters {
        self.evaluator.recorder().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::tests::SCENARIO_YAML;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn scenario_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SCENARIO_YAML.as_bytes()).unwrap();
        file
    }

    #[test]
    fn runner_executes_configured_suite() {
        let file = scenario_file();
        let cfg = WorkflowConfig::from_args(vec![file.path().to_path_buf()], None, None);
        let runner = Runner::new(cfg).unwrap();
        let report = runner.execute().unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.errored, 0);
        assert_eq!(report.passed + report.failed, 1);
        assert_eq!(report.counters.scenarios_evaluated, 1);
        let result = report.entries[0].result().unwrap();
        assert_eq!(result.coverage.sensor_count, 2);
        assert_eq!(result.coverage.timesteps, 30);
    }

    #[test]
    fn catalog_and_overrides_shape_the_verdict() {
        let dir = tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.yaml");
        let yaml = "\
scenarios:
  DTI-01: [FR01, X-99]
thresholds:
  - { requirement_id: X-99, metric_name: Pd, min_value: 2.0 }
";
        fs::write(&catalog_path, yaml).unwrap();
        let file = scenario_file();
        let scenarios = vec![file.path().to_path_buf()];
        let cfg = WorkflowConfig::from_args(scenarios, Some(catalog_path), None);
        let runner = Runner::new(cfg).unwrap();

        let report = runner.execute().unwrap();
        let result = report.entries[0].result().unwrap();
        assert_eq!(result.requirements.len(), 2);
        assert_eq!(result.failed_requirements, vec!["X-99".to_string()]);
        assert_eq!(result.verdict, Verdict::Fail);
    }

    #[test]
    fn report_is_written_as_json() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("reports/suite.json");
        let file = scenario_file();
        let cfg = WorkflowConfig::from_args(vec![file.path().to_path_buf()], None, None);
        let runner = Runner::new(cfg).unwrap();
        runner.execute().unwrap().write_json(&out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        let written: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(written["entries"][0]["status"], "evaluated");
        assert_eq!(written["entries"][0]["scenario_code"], "DTI-01");
    }

    #[test]
    fn configuration_errors_surface_with_context() {
        let runner = Runner::new(WorkflowConfig::default()).unwrap();
        let file = scenario_file();
        let mut scenarios = crate::workflow::config::load_scenario_file(file.path()).unwrap();
        scenarios[0].placements[0].template = "lidar".into();
        let err = runner.evaluate(&scenarios[0]).unwrap_err();
        assert!(format!("{:#}", err).contains("evaluating scenario DTI-01"));

        let mut report = runner.execute_scenarios(&scenarios);
        assert_eq!(report.errored, 1);

        scenarios[0].placements[0].template = "eo_ir".into();
        let fixed = runner.evaluate(&scenarios[0]).unwrap();
        report.upsert(SuiteEntry::Evaluated(Box::new(fixed)));
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.errored, 0);
        assert_eq!(report.passed + report.failed, 1);
    }
}
