use log::debug;
use serde::{Deserialize, Serialize};

use crate::math::geo::normalize_azimuth;
use crate::model::{EnvironmentState, SensorSite};
use crate::terrain::elevation::ElevationProvider;

/// Mask angle of a radial with nothing above the horizon to block it.
pub const UNMASKED_ANGLE_DEG: f64 = -90.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub azimuth_buckets: usize,
    pub samples_per_radial: usize,
    /// Radials extend to `nominal_range_m × range_factor`.
    pub range_factor: f64,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            azimuth_buckets: 72,
            samples_per_radial: 100,
            range_factor: 1.5,
        }
    }
}

/// Per-sensor minimum visible elevation angle for each azimuth bucket.
///
/// Bucket `i` covers `[i·w, (i+1)·w)` degrees with `w = 360 / buckets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainMaskResult {
    pub sensor_id: String,
    pub bucket_width_deg: f64,
    pub max_range_m: f64,
    pub mask_angles_deg: Vec<f64>,
    /// Samples with neither elevation nor obstacle data.
    pub unmasked_samples: usize,
}

impl TerrainMaskResult {
    /// Mask that blocks nothing.
    pub fn unmasked(sensor_id: &str, buckets: usize) -> Self {
        let buckets = buckets.max(1);
        Self {
            sensor_id: sensor_id.to_string(),
            bucket_width_deg: 360.0 / buckets as f64,
            max_range_m: 0.0,
            mask_angles_deg: vec![UNMASKED_ANGLE_DEG; buckets],
            unmasked_samples: 0,
        }
    }

    pub fn bucket_index(&self, azimuth_deg: f64) -> usize {
        let n = self.mask_angles_deg.len().max(1);
        ((normalize_azimuth(azimuth_deg) / self.bucket_width_deg).floor() as usize).min(n - 1)
    }

    pub fn mask_angle_at(&self, azimuth_deg: f64) -> f64 {
        self.mask_angles_deg
            .get(self.bucket_index(azimuth_deg))
            .copied()
            .unwrap_or(UNMASKED_ANGLE_DEG)
    }

    /// A target is visible when its elevation angle is at or above the mask angle of its azimuth.
    pub fn is_visible(&self, azimuth_deg: f64, elevation_deg: f64) -> bool {
        elevation_deg >= self.mask_angle_at(azimuth_deg)
    }
}

/// Line-of-sight mask of `sensor` over terrain plus the environment's obstacles.
pub fn compute_mask(
    sensor: &SensorSite,
    environment: &EnvironmentState,
    elevation: &dyn ElevationProvider,
    config: &MaskConfig,
) -> TerrainMaskResult {
    let buckets = config.azimuth_buckets.max(1);
    let samples = config.samples_per_radial.max(1);
    let max_range_m = sensor.nominal_range_m.max(0.0) * config.range_factor.max(0.0);
    let bucket_width_deg = 360.0 / buckets as f64;
    let origin = sensor.position;

    let mut mask_angles_deg = vec![UNMASKED_ANGLE_DEG; buckets];
    let mut unmasked_samples = 0usize;

    for (bucket, mask_angle) in mask_angles_deg.iter_mut().enumerate() {
        let azimuth = (bucket as f64 + 0.5) * bucket_width_deg;
        for step in 1..=samples {
            let distance = max_range_m * step as f64 / samples as f64;
            let point = origin.destination(azimuth, distance);

            let ground = elevation.elevation_at(point.lat_deg, point.lon_deg);
            let obstacle_top = environment
                .obstacles
                .iter()
                .filter(|obstacle| obstacle.covers(&point))
                .map(|obstacle| obstacle.top_m())
                .reduce(f64::max);

            let height = match (ground, obstacle_top) {
                (Some(g), Some(o)) => g.max(o),
                (Some(g), None) => g,
                (None, Some(o)) => o,
                (None, None) => {
                    unmasked_samples += 1;
                    continue;
                }
            };
            *mask_angle = mask_angle.max(origin.elevation_angle(height, distance));
        }
    }

    // Obstacles narrower than the sample spacing still shadow the buckets they subtend.
    for obstacle in &environment.obstacles {
        let distance = origin.distance_to(&obstacle.position);
        if distance > max_range_m || distance <= obstacle.footprint_radius_m {
            continue;
        }
        let near_edge = (distance - obstacle.footprint_radius_m).max(1.0);
        let angle = origin.elevation_angle(obstacle.top_m(), near_edge);
        let bearing = origin.bearing_to(&obstacle.position);
        let half_width = (obstacle.footprint_radius_m / distance).atan().to_degrees();

        let first = ((bearing - half_width) / bucket_width_deg).floor() as i64;
        let last = ((bearing + half_width) / bucket_width_deg).floor() as i64;
        for k in first..=last.min(first + buckets as i64 - 1) {
            let index = k.rem_euclid(buckets as i64) as usize;
            mask_angles_deg[index] = mask_angles_deg[index].max(angle);
        }
    }

    if unmasked_samples > 0 {
        debug!(
            "sensor {}: {} terrain samples without elevation data treated as unmasked",
            sensor.id, unmasked_samples
        );
    }

    TerrainMaskResult {
        sensor_id: sensor.id.clone(),
        bucket_width_deg,
        max_range_m,
        mask_angles_deg,
        unmasked_samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::GeoPosition;
    use crate::model::{Obstacle, SensorCapability};
    use crate::terrain::elevation::{FlatTerrain, NoElevationData};

    fn sensor() -> SensorSite {
        let site = GeoPosition::new(51.0, 0.0, 20.0);
        SensorSite::new("radar", SensorCapability::Radar, site, 4_000.0)
    }

    fn tower(bearing: f64, distance: f64, height: f64) -> Obstacle {
        Obstacle {
            position: GeoPosition::new(51.0, 0.0, 0.0).destination(bearing, distance),
            height_m: height,
            footprint_radius_m: 15.0,
            kind: "tower".into(),
        }
    }

    #[test]
    fn flat_ground_below_antenna_stays_low() {
        let ground = FlatTerrain { elevation_m: 0.0 };
        let env = EnvironmentState::default();
        let mask = compute_mask(&sensor(), &env, &ground, &MaskConfig::default());
        assert_eq!(mask.mask_angles_deg.len(), 72);
        assert!(mask.mask_angles_deg.iter().all(|a| *a < 0.0));
        assert!(mask.is_visible(10.0, 0.5));
    }

    #[test]
    fn missing_elevation_degrades_to_unmasked() {
        let config = MaskConfig::default();
        let mask = compute_mask(&sensor(), &EnvironmentState::default(), &NoElevationData, &config);
        assert!(mask.mask_angles_deg.iter().all(|a| *a == UNMASKED_ANGLE_DEG));
        assert_eq!(mask.unmasked_samples, config.azimuth_buckets * config.samples_per_radial);
    }

    #[test]
    fn obstacle_raises_its_bucket_only() {
        let ground = FlatTerrain { elevation_m: 0.0 };
        let config = MaskConfig::default();
        let clear = compute_mask(&sensor(), &EnvironmentState::default(), &ground, &config);
        let env = EnvironmentState {
            obstacles: vec![tower(92.0, 500.0, 120.0)],
            ..Default::default()
        };
        let masked = compute_mask(&sensor(), &env, &ground, &config);

        let bucket = masked.bucket_index(92.0);
        assert!(masked.mask_angles_deg[bucket] > 10.0);
        assert!(!masked.is_visible(92.0, 5.0));
        assert_eq!(masked.mask_angle_at(270.0), clear.mask_angle_at(270.0));
    }

    #[test]
    fn adding_obstacles_never_lowers_a_mask_angle() {
        let ground = FlatTerrain { elevation_m: 5.0 };
        let config = MaskConfig::default();
        let mut env = EnvironmentState::default();
        let mut previous = compute_mask(&sensor(), &env, &ground, &config);
        let towers = [
            (10.0, 800.0, 40.0),
            (12.0, 300.0, 10.0),
            (200.0, 2_000.0, 80.0),
            (11.0, 1_500.0, 300.0),
        ];
        for (i, (bearing, distance, height)) in towers.into_iter().enumerate() {
            env.obstacles.push(tower(bearing, distance, height));
            let next = compute_mask(&sensor(), &env, &ground, &config);
            for (before, after) in previous.mask_angles_deg.iter().zip(&next.mask_angles_deg) {
                assert!(after >= before, "obstacle {} lowered a mask angle", i);
            }
            previous = next;
        }
    }

    #[test]
    fn obstacle_without_grid_still_masks() {
        let env = EnvironmentState {
            obstacles: vec![tower(45.0, 1_000.0, 200.0)],
            ..Default::default()
        };
        let mask = compute_mask(&sensor(), &env, &NoElevationData, &MaskConfig::default());
        assert!(mask.mask_angle_at(45.0) > 5.0);
        assert_eq!(mask.mask_angle_at(225.0), UNMASKED_ANGLE_DEG);
    }
}
