use anyhow::Context;
use dticore::evaluation::{InMemoryCatalog, ScoringWeights, Threshold};
use dticore::model::{Scenario, SensorSite};
use dticore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Driver configuration, loaded from YAML.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Scenario files (YAML or JSON), each holding one scenario or a list.
    pub scenarios: Vec<PathBuf>,
    /// Requirement catalog file.
    pub catalog: Option<PathBuf>,
    /// Where the suite report is written as JSON.
    pub output: Option<PathBuf>,
    pub pass_score: Option<f64>,
    /// Extra thresholds applied to the active profile, overriding defaults.
    pub thresholds: Vec<Threshold>,
    pub weights: Option<ScoringWeights>,
    /// Additional sensor templates, keyed by template name.
    pub sensor_templates: BTreeMap<String, SensorSite>,
    pub pipeline: PipelineConfig,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Many(Vec<Scenario>),
    One(Box<Scenario>),
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

impl WorkflowConfig {
    /// Reads a workflow file; relative paths inside it resolve against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let mut config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;

        if let Some(base) = path_ref.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn from_args(
        scenarios: Vec<PathBuf>,
        catalog: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            scenarios,
            catalog,
            output,
            ..Default::default()
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        self.scenarios.iter_mut().for_each(resolve);
        if let Some(catalog) = self.catalog.as_mut() {
            resolve(catalog);
        }
        if let Some(output) = self.output.as_mut() {
            resolve(output);
        }
    }

    /// Every scenario across all files, in file order.
    pub fn load_scenarios(&self) -> anyhow::Result<Vec<Scenario>> {
        let mut scenarios = Vec::new();
        for path in &self.scenarios {
            scenarios.extend(load_scenario_file(path)?);
        }
        Ok(scenarios)
    }

    pub fn load_catalog(&self) -> anyhow::Result<Option<InMemoryCatalog>> {
        let Some(path) = self.catalog.as_ref() else {
            return Ok(None);
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading requirement catalog {}", path.display()))?;
        let catalog = if is_json(path) {
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing requirement catalog {}", path.display()))?
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("parsing requirement catalog {}", path.display()))?
        };
        Ok(Some(catalog))
    }
}

pub fn load_scenario_file(path: &Path) -> anyhow::Result<Vec<Scenario>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading scenario file {}", path.display()))?;
    let parsed: ScenarioFile = if is_json(path) {
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing scenario file {}", path.display()))?
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario file {}", path.display()))?
    };
    Ok(match parsed {
        ScenarioFile::Many(scenarios) => scenarios,
        ScenarioFile::One(scenario) => vec![*scenario],
    })
}
