use serde::{Deserialize, Serialize};

use crate::math::geo::normalize_azimuth;
use crate::math::GeoPosition;

/// Sensor capability class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorCapability {
    Radar,
    Rf,
    EoIr,
    Acoustic,
    Ir,
    RfPlus,
    Multispectral,
}

impl SensorCapability {
    /// Sensors whose front end can be jammed.
    pub fn is_rf_capable(self) -> bool {
        matches!(self, Self::Radar | Self::Rf | Self::RfPlus)
    }

    /// Passive RF sensors that classify by emission fingerprint.
    pub fn is_rf_passive(self) -> bool {
        matches!(self, Self::Rf | Self::RfPlus)
    }

    pub fn is_optical(self) -> bool {
        matches!(self, Self::EoIr | Self::Ir | Self::Multispectral)
    }

    /// Two-way propagation for radar, one-way for everything else.
    pub fn default_range_exponent(self) -> f64 {
        match self {
            Self::Radar => 4.0,
            _ => 2.0,
        }
    }
}

/// Azimuth coverage, clockwise from `start_deg` to `end_deg`.
/// A span of 360° or more is full coverage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AzimuthWindow {
    pub start_deg: f64,
    pub end_deg: f64,
}

impl AzimuthWindow {
    pub fn full() -> Self {
        Self {
            start_deg: 0.0,
            end_deg: 360.0,
        }
    }

    pub fn contains(&self, azimuth_deg: f64) -> bool {
        if self.end_deg - self.start_deg >= 360.0 {
            return true;
        }
        let span = normalize_azimuth(self.end_deg - self.start_deg);
        normalize_azimuth(azimuth_deg - self.start_deg) <= span
    }
}

impl Default for AzimuthWindow {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationWindow {
    pub min_deg: f64,
    pub max_deg: f64,
}

impl ElevationWindow {
    pub fn contains(&self, elevation_deg: f64) -> bool {
        elevation_deg >= self.min_deg && elevation_deg <= self.max_deg
    }
}

impl Default for ElevationWindow {
    fn default() -> Self {
        Self {
            min_deg: -10.0,
            max_deg: 90.0,
        }
    }
}

/// Parameters of the Swerling-I detection curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionCurve {
    /// Design false-alarm probability per look.
    pub design_pfa: f64,
    /// Target signature (m² for radar) at which the nominal range gives Pd = 0.5.
    pub reference_signature: f64,
    /// Overrides the capability's range exponent.
    pub range_exponent: Option<f64>,
}

impl Default for DetectionCurve {
    fn default() -> Self {
        Self {
            design_pfa: 1e-6,
            reference_signature: 0.01,
            range_exponent: None,
        }
    }
}

/// A deployed sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSite {
    pub id: String,
    pub capability: SensorCapability,
    /// Antenna position; `alt_m` is the antenna height above sea level.
    pub position: GeoPosition,
    /// Range at which the reference signature is detected with Pd = 0.5.
    pub nominal_range_m: f64,
    #[serde(default)]
    pub azimuth: AzimuthWindow,
    #[serde(default)]
    pub elevation: ElevationWindow,
    /// Susceptibility to jamming in [0, 1].
    #[serde(default)]
    pub ew_sensitivity: f64,
    #[serde(default)]
    pub curve: DetectionCurve,
    #[serde(default = "default_latency_mean")]
    pub latency_mean_s: f64,
    #[serde(default = "default_latency_std")]
    pub latency_std_s: f64,
    #[serde(default = "default_position_error")]
    pub position_error_std_m: f64,
    #[serde(default)]
    pub false_alarm_rate_per_hour: f64,
}

fn default_latency_mean() -> f64 {
    1.0
}

fn default_latency_std() -> f64 {
    0.2
}

fn default_position_error() -> f64 {
    10.0
}

impl SensorSite {
    pub fn new(
        id: &str,
        capability: SensorCapability,
        position: GeoPosition,
        nominal_range_m: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            capability,
            position,
            nominal_range_m,
            azimuth: AzimuthWindow::full(),
            elevation: ElevationWindow::default(),
            ew_sensitivity: if capability.is_rf_capable() { 0.8 } else { 0.0 },
            curve: DetectionCurve::default(),
            latency_mean_s: default_latency_mean(),
            latency_std_s: default_latency_std(),
            position_error_std_m: default_position_error(),
            false_alarm_rate_per_hour: 0.0,
        }
    }

    pub fn range_exponent(&self) -> f64 {
        self.curve
            .range_exponent
            .unwrap_or_else(|| self.capability.default_range_exponent())
    }

    pub fn within_nominal_range(&self, position: &GeoPosition) -> bool {
        self.position.distance_to(position) <= self.nominal_range_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_azimuth_window() {
        let window = AzimuthWindow {
            start_deg: 300.0,
            end_deg: 60.0,
        };
        assert!(window.contains(330.0));
        assert!(window.contains(0.0));
        assert!(window.contains(60.0));
        assert!(!window.contains(90.0));
        assert!(!window.contains(299.0));
        assert!(AzimuthWindow::full().contains(187.0));
    }

    #[test]
    fn rf_capability_families() {
        assert!(SensorCapability::Radar.is_rf_capable());
        assert!(SensorCapability::RfPlus.is_rf_capable());
        assert!(!SensorCapability::EoIr.is_rf_capable());
        assert!(SensorCapability::Multispectral.is_optical());
        assert_eq!(SensorCapability::Radar.default_range_exponent(), 4.0);
    }

    #[test]
    fn site_range_exponent_override() {
        let origin = GeoPosition::new(0.0, 0.0, 0.0);
        let mut site = SensorSite::new("s", SensorCapability::Acoustic, origin, 500.0);
        assert_eq!(site.range_exponent(), 2.0);
        site.curve.range_exponent = Some(3.0);
        assert_eq!(site.range_exponent(), 3.0);
    }
}
