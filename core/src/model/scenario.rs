use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::environment::EnvironmentState;
use crate::model::registry::{SensorPlacement, SensorRegistry};
use crate::model::sensor::SensorSite;
use crate::model::target::TargetTrack;
use crate::prelude::{ConfigurationError, DEFAULT_TIMESTEP_S};

/// A scripted test scenario, supplied fully formed by external generators or loaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Test-methodology code; links the scenario to its requirements.
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    pub duration_s: f64,
    #[serde(default = "default_timestep")]
    pub timestep_s: f64,
    #[serde(default)]
    pub environment: EnvironmentState,
    /// Fully specified sensors.
    #[serde(default)]
    pub sensors: Vec<SensorSite>,
    /// Sensors instantiated from registry templates.
    #[serde(default)]
    pub placements: Vec<SensorPlacement>,
    pub targets: Vec<TargetTrack>,
}

fn default_timestep() -> f64 {
    DEFAULT_TIMESTEP_S
}

impl Scenario {
    /// Structural checks that do not need the sensor registry.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.duration_s.is_finite() || self.duration_s <= 0.0 {
            return Err(ConfigurationError::InvalidTiming(format!(
                "duration must be positive, got {}",
                self.duration_s
            )));
        }
        if !self.timestep_s.is_finite() || self.timestep_s <= 0.0 {
            return Err(ConfigurationError::InvalidTiming(format!(
                "timestep must be positive, got {}",
                self.timestep_s
            )));
        }

        let mut target_ids = HashSet::new();
        for target in &self.targets {
            if !target_ids.insert(target.id.as_str()) {
                return Err(ConfigurationError::DuplicateId {
                    kind: "target",
                    id: target.id.clone(),
                });
            }
            target.flight_plan.validate(&target.id)?;
        }
        Ok(())
    }

    /// Inline sensors followed by resolved placements, in declaration order.
    pub fn resolve_sensors(
        &self,
        registry: &SensorRegistry,
    ) -> Result<Vec<SensorSite>, ConfigurationError> {
        let mut sites = self.sensors.clone();
        for placement in &self.placements {
            sites.push(registry.resolve(placement)?);
        }
        if sites.is_empty() {
            return Err(ConfigurationError::NoSensors);
        }

        let mut ids = HashSet::new();
        for site in &sites {
            if !ids.insert(site.id.as_str()) {
                return Err(ConfigurationError::DuplicateId {
                    kind: "sensor",
                    id: site.id.clone(),
                });
            }
        }
        Ok(sites)
    }
}
