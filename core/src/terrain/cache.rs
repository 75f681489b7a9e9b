use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::model::{EnvironmentState, SensorSite};
use crate::telemetry::MetricsRecorder;
use crate::terrain::elevation::ElevationProvider;
use crate::terrain::mask::{compute_mask, MaskConfig, TerrainMaskResult};

/// Shared store of computed masks, keyed by sensor geometry, terrain and obstacles.
///
/// Entries are bound to the elevation provider of the owning evaluator; call
/// [`MaskCache::clear`] when that provider's data changes.
#[derive(Default)]
pub struct MaskCache {
    entries: RwLock<HashMap<u64, Arc<TerrainMaskResult>>>,
}

impl MaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &self,
        sensor: &SensorSite,
        environment: &EnvironmentState,
        elevation: &dyn ElevationProvider,
        config: &MaskConfig,
        recorder: &MetricsRecorder,
    ) -> Arc<TerrainMaskResult> {
        let key = fingerprint(sensor, environment, config);
        if let Ok(entries) = self.entries.read() {
            if let Some(mask) = entries.get(&key) {
                recorder.record_mask_cache_hit();
                return Arc::clone(mask);
            }
        }

        let mask = Arc::new(compute_mask(sensor, environment, elevation, config));
        recorder.record_mask_computed();
        if let Ok(mut entries) = self.entries.write() {
            entries.entry(key).or_insert_with(|| Arc::clone(&mask));
        }
        mask
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

fn hash_f64<H: Hasher>(value: f64, state: &mut H) {
    value.to_bits().hash(state);
}

/// Stable key over every input `compute_mask` reads.
fn fingerprint(sensor: &SensorSite, environment: &EnvironmentState, config: &MaskConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    sensor.id.hash(&mut hasher);
    hash_f64(sensor.position.lat_deg, &mut hasher);
    hash_f64(sensor.position.lon_deg, &mut hasher);
    hash_f64(sensor.position.alt_m, &mut hasher);
    hash_f64(sensor.nominal_range_m, &mut hasher);

    environment.terrain.hash(&mut hasher);
    environment.obstacles.len().hash(&mut hasher);
    for obstacle in &environment.obstacles {
        hash_f64(obstacle.position.lat_deg, &mut hasher);
        hash_f64(obstacle.position.lon_deg, &mut hasher);
        hash_f64(obstacle.position.alt_m, &mut hasher);
        hash_f64(obstacle.height_m, &mut hasher);
        hash_f64(obstacle.footprint_radius_m, &mut hasher);
    }

    config.azimuth_buckets.hash(&mut hasher);
    config.samples_per_radial.hash(&mut hasher);
    hash_f64(config.range_factor, &mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::GeoPosition;
    use crate::model::{Obstacle, SensorCapability};
    use crate::terrain::elevation::FlatTerrain;

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let cache = MaskCache::new();
        let recorder = MetricsRecorder::new();
        let site = GeoPosition::new(10.0, 10.0, 5.0);
        let sensor = SensorSite::new("eo", SensorCapability::EoIr, site, 1_000.0);
        let env = EnvironmentState::default();
        let config = MaskConfig {
            samples_per_radial: 10,
            ..Default::default()
        };

        let ground = FlatTerrain::default();
        let first = cache.get_or_compute(&sensor, &env, &ground, &config, &recorder);
        let second = cache.get_or_compute(&sensor, &env, &ground, &config, &recorder);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.masks_computed, 1);
        assert_eq!(snapshot.mask_cache_hits, 1);
    }

    #[test]
    fn obstacles_change_the_key() {
        let cache = MaskCache::new();
        let recorder = MetricsRecorder::new();
        let site = GeoPosition::new(10.0, 10.0, 5.0);
        let sensor = SensorSite::new("eo", SensorCapability::EoIr, site, 1_000.0);
        let mut env = EnvironmentState::default();
        let config = MaskConfig {
            samples_per_radial: 10,
            ..Default::default()
        };
        cache.get_or_compute(&sensor, &env, &FlatTerrain::default(), &config, &recorder);
        env.obstacles.push(Obstacle {
            position: GeoPosition::new(10.001, 10.0, 0.0),
            height_m: 50.0,
            footprint_radius_m: 10.0,
            kind: String::new(),
        });
        cache.get_or_compute(&sensor, &env, &FlatTerrain::default(), &config, &recorder);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
