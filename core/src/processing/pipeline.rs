//! Fixed-step scenario orchestrator.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::model::{
    CoverageSummary, EvaluationResult, Scenario, SensorRegistry, SensorSite, TargetState,
    TargetTrack,
};
use crate::prelude::{DtiResult, EvaluationError, PipelineConfig};
use crate::processing::detection::{detect, synthesize_false_alarms};
use crate::processing::fusion::fuse;
use crate::processing::identification::{classification_probability, identify, IdentificationRecord};
use crate::processing::tracking::{TrackEngine, TrackState};
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::terrain::{ElevationProvider, MaskCache, TerrainMaskResult};

const DETECTION_STREAM: u64 = 0;
const FALSE_ALARM_STREAM: u64 = 1;
const IDENTIFICATION_STREAM: u64 = 2;

fn seeded_stream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Runs one scenario against the shared resources of an evaluator.
pub struct DtiPipeline<'a> {
    config: &'a PipelineConfig,
    registry: &'a SensorRegistry,
    masks: &'a MaskCache,
    elevation: &'a dyn ElevationProvider,
    recorder: &'a MetricsRecorder,
    logger: LogManager,
}

impl<'a> DtiPipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        registry: &'a SensorRegistry,
        masks: &'a MaskCache,
        elevation: &'a dyn ElevationProvider,
        recorder: &'a MetricsRecorder,
    ) -> Self {
        Self {
            config,
            registry,
            masks,
            elevation,
            recorder,
            logger: LogManager::new("pipeline"),
        }
    }

    /// Simulates the scenario over `[0, duration)` and returns the raw result,
    /// before metrics and compliance are attached.
    pub fn execute(&self, scenario: &Scenario) -> DtiResult<EvaluationResult> {
        let configuration = |source| EvaluationError::configuration(&scenario.code, source);

        let mut checked = scenario.clone();
        if let Some(timestep_s) = self.config.timestep_s {
            checked.timestep_s = timestep_s;
        }
        checked.validate().map_err(configuration)?;
        let sensors = checked.resolve_sensors(self.registry).map_err(configuration)?;
        let timestep_s = checked.timestep_s;

        let masks: Vec<Arc<TerrainMaskResult>> = sensors
            .iter()
            .map(|sensor| {
                self.masks.get_or_compute(
                    sensor,
                    &scenario.environment,
                    self.elevation,
                    &self.config.mask,
                    self.recorder,
                )
            })
            .collect();

        self.logger.record(&format!(
            "scenario {}: {} sensors, {} targets, {:.0}s at {:.2}s steps",
            scenario.code,
            sensors.len(),
            scenario.targets.len(),
            scenario.duration_s,
            timestep_s
        ));

        for target in &scenario.targets {
            let start = target.flight_plan.start_time().unwrap_or(0.0);
            let end = target.flight_plan.end_time().unwrap_or(0.0);
            if start > 0.0 || end < scenario.duration_s - timestep_s {
                self.logger.detail(&format!(
                    "target {} present only for t in [{:.1}, {:.1}]s",
                    target.id, start, end
                ));
            }
        }

        let mut detection_rng = seeded_stream(scenario.seed, DETECTION_STREAM);
        let mut false_alarm_rng = seeded_stream(scenario.seed, FALSE_ALARM_STREAM);
        let mut identification_rng = seeded_stream(scenario.seed, IDENTIFICATION_STREAM);

        let mut tracks = TrackEngine::new(
            self.config.tracking.clone(),
            scenario.targets.iter().map(|target| target.id.as_str()),
        );
        let mut records: Vec<IdentificationRecord> =
            scenario.targets.iter().map(IdentificationRecord::new).collect();

        let mut result = EvaluationResult {
            scenario_code: scenario.code.clone(),
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            duration_s: scenario.duration_s,
            timestep_s,
            ..Default::default()
        };
        let mut coverage = CoverageSummary {
            sensor_count: sensors.len(),
            target_count: scenario.targets.len(),
            ..Default::default()
        };

        let mut step: u64 = 0;
        loop {
            let t = step as f64 * timestep_s;
            if t >= scenario.duration_s {
                break;
            }

            for (index, target) in scenario.targets.iter().enumerate() {
                let Some(state) = target.state_at(t) else {
                    tracks.update(index, t, None, None, false);
                    continue;
                };

                let looks: Vec<_> = sensors
                    .iter()
                    .zip(&masks)
                    .map(|(sensor, mask)| {
                        let env = &scenario.environment;
                        detect(sensor, target, &state, env, mask, &mut detection_rng)
                    })
                    .collect();
                let fused = fuse(&target.id, t, &looks);
                if fused.in_coverage {
                    coverage.detectable_target_steps += 1;
                }

                let fix = if fused.detected { fused.reported_position } else { None };
                let truth = Some(state.position);
                let track_state = tracks.update(index, t, fix, truth, fused.in_coverage);

                let tracking = track_state == TrackState::Tracking && fused.detected;
                if tracking && records[index].needs_attempt() {
                    let identifier =
                        best_identifier(&sensors, &fused.sensor_ids, target, &state, scenario);
                    if let Some(sensor) = identifier {
                        let env = &scenario.environment;
                        let rng = &mut identification_rng;
                        let attempt = identify(sensor, target, &state, env, rng);
                        records[index].apply(&attempt, t);
                    }
                }
                result.detections.push(fused);
            }

            for sensor in &sensors {
                result
                    .detections
                    .extend(synthesize_false_alarms(sensor, t, timestep_s, &mut false_alarm_rng));
            }
            step += 1;
        }

        coverage.timesteps = step;
        coverage.observation_time_s = step as f64 * timestep_s;
        result.coverage = coverage;
        result.tracking = tracks.results(timestep_s);
        result.identification = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let acquired_at = tracks
                    .tracker(index)
                    .and_then(|tracker| tracker.first_acquired_at());
                record.finish(acquired_at)
            })
            .collect();

        self.logger.detail(&format!(
            "scenario {}: {} steps, {} detection records",
            scenario.code,
            step,
            result.detections.len()
        ));
        Ok(result)
    }
}

/// Detecting sensor with the best classification odds; first in scenario order on ties.
fn best_identifier<'s>(
    sensors: &'s [SensorSite],
    detecting: &[String],
    target: &TargetTrack,
    state: &TargetState,
    scenario: &Scenario,
) -> Option<&'s SensorSite> {
    sensors
        .iter()
        .filter(|sensor| detecting.contains(&sensor.id))
        .map(|sensor| {
            let p = classification_probability(sensor, target, state, &scenario.environment);
            (sensor, p)
        })
        .fold(None, |best: Option<(&SensorSite, f64)>, (sensor, p)| match best {
            Some((current, best_p)) if best_p >= p => Some((current, best_p)),
            _ => Some((sensor, p)),
        })
        .map(|(sensor, _)| sensor)
}
