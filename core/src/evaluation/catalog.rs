//! Requirement catalog seam.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evaluation::compliance::Threshold;

/// Static lookup tables linking scenarios to requirements and requirements to thresholds.
/// Read concurrently by suite evaluation; implementations must not mutate behind `&self`.
pub trait RequirementCatalog: Send + Sync {
    /// Requirement ids linked to a scenario code, in catalog order.
    fn scenario_requirement_ids(&self, scenario_code: &str) -> Vec<String>;

    fn threshold(&self, requirement_id: &str) -> Option<Threshold>;
}

/// Catalog that links nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCatalog;

impl RequirementCatalog for EmptyCatalog {
    fn scenario_requirement_ids(&self, _scenario_code: &str) -> Vec<String> {
        Vec::new()
    }

    fn threshold(&self, _requirement_id: &str) -> Option<Threshold> {
        None
    }
}

/// Catalog held in memory, typically deserialised from a YAML/JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryCatalog {
    /// Scenario code → linked requirement ids.
    pub scenarios: BTreeMap<String, Vec<String>>,
    pub thresholds: Vec<Threshold>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&mut self, scenario_code: &str, requirement_id: &str) {
        let ids = self.scenarios.entry(scenario_code.to_string()).or_default();
        if !ids.iter().any(|id| id == requirement_id) {
            ids.push(requirement_id.to_string());
        }
    }

    /// Adds a threshold, replacing any existing one for the same requirement.
    pub fn insert_threshold(&mut self, threshold: Threshold) {
        self.thresholds
            .retain(|existing| existing.requirement_id != threshold.requirement_id);
        self.thresholds.push(threshold);
    }
}

impl RequirementCatalog for InMemoryCatalog {
    fn scenario_requirement_ids(&self, scenario_code: &str) -> Vec<String> {
        self.scenarios.get(scenario_code).cloned().unwrap_or_default()
    }

    fn threshold(&self, requirement_id: &str) -> Option<Threshold> {
        self.thresholds
            .iter()
            .find(|threshold| threshold.requirement_id == requirement_id)
            .cloned()
    }
}
