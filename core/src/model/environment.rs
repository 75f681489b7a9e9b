use serde::{Deserialize, Serialize};

use crate::math::GeoPosition;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rain,
    Fog,
    ClearNight,
    CloudyNight,
    RainNight,
}

impl Weather {
    pub fn is_night(self) -> bool {
        matches!(self, Self::ClearNight | Self::CloudyNight | Self::RainNight)
    }

    /// Daytime equivalent used for attenuation lookups.
    pub fn daylight_equivalent(self) -> Weather {
        match self {
            Self::ClearNight => Self::Clear,
            Self::CloudyNight => Self::Cloudy,
            Self::RainNight => Self::Rain,
            other => other,
        }
    }
}

/// Electronic-warfare (jamming) condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EwCondition {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl EwCondition {
    /// Jamming intensity in [0, 1].
    pub fn factor(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    #[default]
    Flat,
    Rolling,
    Urban,
    Forest,
    Coastal,
    Mountainous,
}

/// Man-made or natural obstruction standing on the terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Footprint centre; `alt_m` is the ground elevation at its base.
    pub position: GeoPosition,
    pub height_m: f64,
    pub footprint_radius_m: f64,
    #[serde(default)]
    pub kind: String,
}

impl Obstacle {
    pub fn top_m(&self) -> f64 {
        self.position.alt_m + self.height_m
    }

    pub fn covers(&self, point: &GeoPosition) -> bool {
        self.position.distance_to(point) <= self.footprint_radius_m
    }
}

/// Scenario-scoped environment; read-only while a scenario executes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub ew: EwCondition,
    #[serde(default)]
    pub terrain: TerrainType,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl EnvironmentState {
    pub fn ew_factor(&self) -> f64 {
        self.ew.factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ew_factors_are_ordered_and_bounded() {
        let factors: Vec<f64> = [
            EwCondition::None,
            EwCondition::Low,
            EwCondition::Medium,
            EwCondition::High,
        ]
        .iter()
        .map(|c| c.factor())
        .collect();
        assert!(factors.windows(2).all(|w| w[0] < w[1]));
        assert!(factors.iter().all(|f| (0.0..=1.0).contains(f)));
    }

    #[test]
    fn night_variants_map_to_daylight() {
        assert!(Weather::RainNight.is_night());
        assert_eq!(Weather::RainNight.daylight_equivalent(), Weather::Rain);
        assert!(!Weather::Fog.is_night());
    }

    #[test]
    fn obstacle_top_and_footprint() {
        let obstacle = Obstacle {
            position: GeoPosition::new(0.0, 0.0, 50.0),
            height_m: 30.0,
            footprint_radius_m: 20.0,
            kind: "building".into(),
        };
        assert_eq!(obstacle.top_m(), 80.0);
        assert!(obstacle.covers(&GeoPosition::new(0.0001, 0.0, 0.0)));
        assert!(!obstacle.covers(&GeoPosition::new(0.001, 0.0, 0.0)));
    }
}
