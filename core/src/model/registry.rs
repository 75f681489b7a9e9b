use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::GeoPosition;
use crate::model::sensor::{AzimuthWindow, SensorCapability, SensorSite};
use crate::prelude::ConfigurationError;

/// Places a registry template at a site under a scenario-local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPlacement {
    pub id: String,
    pub template: String,
    pub position: GeoPosition,
    #[serde(default)]
    pub azimuth: Option<AzimuthWindow>,
}

/// Library of sensor templates. Lookups hand out owned copies, never references into the library.
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    templates: BTreeMap<String, SensorSite>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with one generic template per capability class.
    pub fn with_defaults() -> Self {
        let origin = GeoPosition::new(0.0, 0.0, 0.0);
        let mut registry = Self::new();

        let mut radar = SensorSite::new("radar", SensorCapability::Radar, origin, 5_000.0);
        radar.latency_mean_s = 0.5;
        radar.latency_std_s = 0.1;
        radar.position_error_std_m = 15.0;
        radar.false_alarm_rate_per_hour = 0.5;
        registry.register("radar", radar);

        let mut rf = SensorSite::new("rf", SensorCapability::Rf, origin, 3_000.0);
        rf.position_error_std_m = 60.0;
        rf.curve.reference_signature = 1.0;
        registry.register("rf", rf);

        let mut rf_plus = SensorSite::new("rf_plus", SensorCapability::RfPlus, origin, 4_000.0);
        rf_plus.position_error_std_m = 35.0;
        rf_plus.curve.reference_signature = 1.0;
        registry.register("rf_plus", rf_plus);

        let mut eo_ir = SensorSite::new("eo_ir", SensorCapability::EoIr, origin, 2_500.0);
        eo_ir.latency_mean_s = 1.5;
        eo_ir.position_error_std_m = 5.0;
        eo_ir.elevation.min_deg = -5.0;
        registry.register("eo_ir", eo_ir);

        let mut ir = SensorSite::new("ir", SensorCapability::Ir, origin, 2_000.0);
        ir.latency_mean_s = 1.2;
        ir.position_error_std_m = 8.0;
        registry.register("ir", ir);

        let mut acoustic = SensorSite::new("acoustic", SensorCapability::Acoustic, origin, 600.0);
        acoustic.latency_mean_s = 2.0;
        acoustic.latency_std_s = 0.5;
        acoustic.position_error_std_m = 40.0;
        registry.register("acoustic", acoustic);

        let mut multispectral =
            SensorSite::new("multispectral", SensorCapability::Multispectral, origin, 3_000.0);
        multispectral.latency_mean_s = 1.5;
        multispectral.position_error_std_m = 5.0;
        registry.register("multispectral", multispectral);

        registry
    }

    /// Adds or replaces a template.
    pub fn register(&mut self, name: &str, template: SensorSite) {
        self.templates.insert(name.to_string(), template);
    }

    /// Snapshot of a template.
    pub fn get(&self, name: &str) -> Option<SensorSite> {
        self.templates.get(name).cloned()
    }

    /// Builds a concrete site from a placement.
    pub fn resolve(&self, placement: &SensorPlacement) -> Result<SensorSite, ConfigurationError> {
        let mut site = self
            .get(&placement.template)
            .ok_or_else(|| ConfigurationError::UnknownSensor {
                sensor: placement.id.clone(),
                template: placement.template.clone(),
            })?;
        site.id = placement.id.clone();
        site.position = placement.position;
        if let Some(azimuth) = placement.azimuth {
            site.azimuth = azimuth;
        }
        Ok(site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_are_detached_from_the_library() {
        let registry = SensorRegistry::with_defaults();
        let mut copy = registry.get("radar").unwrap();
        copy.nominal_range_m = 1.0;
        assert_eq!(registry.get("radar").unwrap().nominal_range_m, 5_000.0);
    }

    #[test]
    fn resolve_places_template_at_site() {
        let registry = SensorRegistry::with_defaults();
        let placement = SensorPlacement {
            id: "north-radar".into(),
            template: "radar".into(),
            position: GeoPosition::new(51.0, 0.0, 30.0),
            azimuth: None,
        };
        let site = registry.resolve(&placement).unwrap();
        assert_eq!(site.id, "north-radar");
        assert_eq!(site.position.alt_m, 30.0);
        assert_eq!(site.capability, SensorCapability::Radar);
    }

    #[test]
    fn unknown_template_is_a_configuration_error() {
        let registry = SensorRegistry::new();
        let placement = SensorPlacement {
            id: "x".into(),
            template: "lidar".into(),
            position: GeoPosition::new(0.0, 0.0, 0.0),
            azimuth: None,
        };
        assert!(matches!(
            registry.resolve(&placement),
            Err(ConfigurationError::UnknownSensor { .. })
        ));
    }
}
