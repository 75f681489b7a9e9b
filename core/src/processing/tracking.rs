//! Track continuity state machine.
//!
//! One tracker per physical target. Track segments carry a UID that survives
//! coasting; a drop ends the segment and a later fix opens a new one.

use serde::{Deserialize, Serialize};

use crate::math::{GeoPosition, StatsHelper};
use crate::model::{TrackUid, TrackingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    Untracked,
    Acquired,
    Tracking,
    Coasting,
    Dropped,
}

impl TrackState {
    /// A track exists and is being maintained.
    pub fn is_held(self) -> bool {
        matches!(self, Self::Acquired | Self::Tracking | Self::Coasting)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Maximum gap between the first two fixes for an acquisition to become a track.
    pub expected_update_interval_s: f64,
    /// Maximum time since the last fix before a coasting track is dropped.
    pub coast_tolerance_s: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            expected_update_interval_s: 2.0,
            coast_tolerance_s: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackFix {
    timestamp: f64,
    position: GeoPosition,
}

#[derive(Debug, Clone)]
struct Segment {
    uid: TrackUid,
    fixes: Vec<TrackFix>,
}

impl Segment {
    /// Track position from observed fixes: interpolated between fixes, extrapolated
    /// from the last two fixes after the final one.
    fn position_at(&self, t: f64) -> Option<GeoPosition> {
        let first = self.fixes.first()?;
        let last = self.fixes.last()?;
        if t <= first.timestamp {
            return Some(first.position);
        }
        if t >= last.timestamp {
            if self.fixes.len() < 2 {
                return Some(last.position);
            }
            let previous = &self.fixes[self.fixes.len() - 2];
            let span = last.timestamp - previous.timestamp;
            if span <= 0.0 {
                return Some(last.position);
            }
            let fraction = (t - previous.timestamp) / span;
            return Some(previous.position.extrapolate(&last.position, fraction));
        }

        let upper = self.fixes.iter().position(|fix| fix.timestamp > t)?;
        let from = &self.fixes[upper - 1];
        let to = &self.fixes[upper];
        let span = to.timestamp - from.timestamp;
        let fraction = if span > 0.0 { (t - from.timestamp) / span } else { 1.0 };
        Some(from.position.interpolate(&to.position, fraction))
    }
}

#[derive(Debug, Clone)]
struct TrackStep {
    timestamp: f64,
    state: TrackState,
    segment: Option<usize>,
    truth: Option<GeoPosition>,
    in_coverage: bool,
}

/// Continuity bookkeeping for one target.
#[derive(Debug, Clone)]
pub struct TargetTracker {
    target_id: String,
    state: TrackState,
    last_fix_time: Option<f64>,
    first_acquired_at: Option<f64>,
    segments: Vec<Segment>,
    steps: Vec<TrackStep>,
    detections: u32,
    drop_count: u32,
    losses: u32,
    coast_episodes: u32,
    reacquisitions: u32,
    recovered_after_drop: u32,
    /// A counted loss is waiting for a later fix.
    pending_loss: bool,
}

impl TargetTracker {
    fn new(target_id: &str) -> Self {
        Self {
            target_id: target_id.to_string(),
            state: TrackState::Untracked,
            last_fix_time: None,
            first_acquired_at: None,
            segments: Vec::new(),
            steps: Vec::new(),
            detections: 0,
            drop_count: 0,
            losses: 0,
            coast_episodes: 0,
            reacquisitions: 0,
            recovered_after_drop: 0,
            pending_loss: false,
        }
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn uid(&self) -> Option<TrackUid> {
        if self.state.is_held() {
            self.segments.last().map(|segment| segment.uid)
        } else {
            None
        }
    }

    pub fn first_acquired_at(&self) -> Option<f64> {
        self.first_acquired_at
    }

    fn since_last_fix(&self, t: f64) -> f64 {
        self.last_fix_time.map_or(f64::INFINITY, |last| t - last)
    }

    fn result(&self, timestep_s: f64) -> TrackingResult {
        let coverage_steps = self.steps.iter().filter(|s| s.in_coverage).count();
        let held_in_coverage = self
            .steps
            .iter()
            .filter(|s| s.in_coverage && s.state.is_held())
            .count();
        let continuity_ratio = if coverage_steps == 0 {
            0.0
        } else {
            (held_in_coverage as f64 / coverage_steps as f64).clamp(0.0, 1.0)
        };

        let held_steps = self.steps.iter().filter(|s| s.state.is_held()).count();
        let held_duration = held_steps as f64 * timestep_s;
        let update_rate_hz = if held_duration > 0.0 {
            self.detections as f64 / held_duration
        } else {
            0.0
        };

        let errors: Vec<f64> = self
            .steps
            .iter()
            .filter(|s| s.state.is_held())
            .filter_map(|s| {
                let truth = s.truth?;
                let estimate = self.segments.get(s.segment?)?.position_at(s.timestamp)?;
                Some(estimate.distance_to(&truth))
            })
            .collect();

        TrackingResult {
            target_id: self.target_id.clone(),
            mean_position_error_m: StatsHelper::mean(&errors),
            max_position_error_m: StatsHelper::max(&errors),
            continuity_ratio,
            update_rate_hz,
            drop_count: self.drop_count,
            losses: self.losses,
            segment_count: self.segments.len() as u32,
            coast_episodes: self.coast_episodes,
            reacquisitions: self.reacquisitions,
            recovered_after_drop: self.recovered_after_drop,
            final_uid: self.segments.last().map(|segment| segment.uid),
        }
    }
}

/// Track engine owning every tracker of one scenario run.
pub struct TrackEngine {
    config: TrackConfig,
    trackers: Vec<TargetTracker>,
    next_uid: u64,
}

impl TrackEngine {
    pub fn new<'a>(config: TrackConfig, target_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            config,
            trackers: target_ids.into_iter().map(TargetTracker::new).collect(),
            next_uid: 1,
        }
    }

    pub fn tracker(&self, index: usize) -> Option<&TargetTracker> {
        self.trackers.get(index)
    }

    fn open_segment(&mut self, index: usize, t: f64) {
        let uid = TrackUid(self.next_uid);
        self.next_uid += 1;
        let tracker = &mut self.trackers[index];
        tracker.segments.push(Segment {
            uid,
            fixes: Vec::new(),
        });
        tracker.first_acquired_at.get_or_insert(t);
    }

    /// Advances target `index` by one timestep. `fix` is the fused reported position when detected.
    ///
    /// A coast or drop that ends while the target is absent or outside every
    /// sensor's nominal range is the normal end of a track, not a loss.
    pub fn update(
        &mut self,
        index: usize,
        t: f64,
        fix: Option<GeoPosition>,
        truth: Option<GeoPosition>,
        in_coverage: bool,
    ) -> TrackState {
        if index >= self.trackers.len() {
            return TrackState::Untracked;
        }
        let expected = self.config.expected_update_interval_s;
        let tolerance = self.config.coast_tolerance_s;
        let previous = self.trackers[index].state;
        let gap = self.trackers[index].since_last_fix(t);
        let observable = truth.is_some() && in_coverage;

        let next = match (previous, fix.is_some()) {
            (TrackState::Untracked, true) => {
                self.open_segment(index, t);
                TrackState::Acquired
            }
            (TrackState::Untracked, false) => TrackState::Untracked,
            (TrackState::Acquired, true) if gap <= expected => TrackState::Tracking,
            (TrackState::Acquired, true) => TrackState::Acquired,
            (TrackState::Acquired, false) if gap > tolerance => TrackState::Dropped,
            (TrackState::Acquired, false) => TrackState::Acquired,
            (TrackState::Tracking, true) => TrackState::Tracking,
            (TrackState::Tracking, false) if gap <= tolerance => TrackState::Coasting,
            (TrackState::Tracking, false) => TrackState::Dropped,
            (TrackState::Coasting, true) => {
                let tracker = &mut self.trackers[index];
                tracker.reacquisitions += 1;
                tracker.coast_episodes += 1;
                TrackState::Tracking
            }
            (TrackState::Coasting, false) if gap > tolerance => {
                if observable {
                    self.trackers[index].coast_episodes += 1;
                }
                TrackState::Dropped
            }
            (TrackState::Coasting, false) => TrackState::Coasting,
            (TrackState::Dropped, true) => {
                self.open_segment(index, t);
                let tracker = &mut self.trackers[index];
                tracker.drop_count += 1;
                if tracker.pending_loss {
                    tracker.recovered_after_drop += 1;
                    tracker.pending_loss = false;
                }
                TrackState::Acquired
            }
            (TrackState::Dropped, false) => TrackState::Dropped,
        };

        let tracker = &mut self.trackers[index];
        if next == TrackState::Dropped && previous != TrackState::Dropped && observable {
            tracker.losses += 1;
            tracker.pending_loss = true;
        }
        if let Some(position) = fix {
            tracker.detections += 1;
            tracker.last_fix_time = Some(t);
            if let Some(segment) = tracker.segments.last_mut() {
                segment.fixes.push(TrackFix {
                    timestamp: t,
                    position,
                });
            }
        }
        tracker.state = next;
        let segment = if next.is_held() {
            tracker.segments.len().checked_sub(1)
        } else {
            None
        };
        tracker.steps.push(TrackStep {
            timestamp: t,
            state: next,
            segment,
            truth,
            in_coverage,
        });
        next
    }

    pub fn results(&self, timestep_s: f64) -> Vec<TrackingResult> {
        self.trackers.iter().map(|tracker| tracker.result(timestep_s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(step: usize) -> GeoPosition {
        GeoPosition::new(51.0 + step as f64 * 1e-4, 0.0, 100.0)
    }

    fn run(engine: &mut TrackEngine, pattern: &[bool]) -> Vec<(TrackState, Option<TrackUid>)> {
        pattern
            .iter()
            .enumerate()
            .map(|(k, hit)| {
                let truth = position(k);
                let state = engine.update(0, k as f64, hit.then_some(truth), Some(truth), true);
                (state, engine.tracker(0).and_then(|t| t.uid()))
            })
            .collect()
    }

    #[test]
    fn perfect_detection_gives_full_continuity() {
        let mut engine = TrackEngine::new(TrackConfig::default(), ["uas-1"]);
        let states = run(&mut engine, &[true; 20]);
        assert_eq!(states[0].0, TrackState::Acquired);
        assert!(states[1..].iter().all(|(s, _)| *s == TrackState::Tracking));

        let result = &engine.results(1.0)[0];
        assert_eq!(result.continuity_ratio, 1.0);
        assert_eq!(result.drop_count, 0);
        assert_eq!(result.segment_count, 1);
        assert!((result.update_rate_hz - 1.0).abs() < 1e-12);
        assert!(result.max_position_error_m < 1e-6);
    }

    #[test]
    fn coasting_preserves_uid() {
        let mut engine = TrackEngine::new(TrackConfig::default(), ["uas-1"]);
        let states = run(&mut engine, &[true, true, true, false, false, false, true, true]);
        assert_eq!(states[3].0, TrackState::Coasting);
        assert_eq!(states[5].0, TrackState::Coasting);
        assert_eq!(states[6].0, TrackState::Tracking);
        assert_eq!(states[2].1, states[6].1);

        let result = &engine.results(1.0)[0];
        assert_eq!(result.reacquisitions, 1);
        assert_eq!(result.coast_episodes, 1);
        assert_eq!(result.continuity_ratio, 1.0);
    }

    #[test]
    fn exceeding_coast_tolerance_drops_and_new_segment_counts() {
        let config = TrackConfig {
            expected_update_interval_s: 2.0,
            coast_tolerance_s: 2.0,
        };
        let mut engine = TrackEngine::new(config, ["uas-1"]);
        let mut pattern = vec![true; 3];
        pattern.extend([false; 4]);
        pattern.extend([true; 3]);
        let states = run(&mut engine, &pattern);

        assert_eq!(states[5].0, TrackState::Dropped);
        assert_eq!(states[6].0, TrackState::Dropped);
        assert_eq!(states[7].0, TrackState::Acquired);
        assert_ne!(states[2].1, states[7].1);

        let result = &engine.results(1.0)[0];
        assert_eq!(result.drop_count, 1);
        assert_eq!(result.losses, 1);
        assert_eq!(result.segment_count, 2);
        assert_eq!(result.recovered_after_drop, 1);
        assert_eq!(result.reacquisitions, 0);
        assert!((result.continuity_ratio - 0.8).abs() < 1e-12);
    }

    #[test]
    fn track_ending_with_the_flight_plan_is_not_a_loss() {
        let mut engine = TrackEngine::new(TrackConfig::default(), ["uas-1"]);
        for k in 0..10 {
            let truth = position(k);
            engine.update(0, k as f64, Some(truth), Some(truth), true);
        }
        let mut last = TrackState::Tracking;
        for k in 10..30 {
            last = engine.update(0, k as f64, None, None, false);
        }
        assert_eq!(last, TrackState::Dropped);

        let result = &engine.results(1.0)[0];
        assert_eq!(result.coast_episodes, 0);
        assert_eq!(result.losses, 0);
        assert_eq!(result.reacquisitions, 0);
        assert_eq!(result.continuity_ratio, 1.0);
    }

    #[test]
    fn drop_outside_coverage_then_return_is_not_a_recovery() {
        let mut engine = TrackEngine::new(TrackConfig::default(), ["uas-1"]);
        for k in 0..5 {
            let truth = position(k);
            engine.update(0, k as f64, Some(truth), Some(truth), true);
        }
        for k in 5..15 {
            engine.update(0, k as f64, None, Some(position(k)), false);
        }
        let truth = position(15);
        assert_eq!(engine.update(0, 15.0, Some(truth), Some(truth), true), TrackState::Acquired);

        let result = &engine.results(1.0)[0];
        assert_eq!(result.drop_count, 1);
        assert_eq!(result.losses, 0);
        assert_eq!(result.recovered_after_drop, 0);
    }

    #[test]
    fn coast_positions_come_from_observed_fixes() {
        let segment = Segment {
            uid: TrackUid(1),
            fixes: vec![
                TrackFix {
                    timestamp: 0.0,
                    position: GeoPosition::new(0.0, 0.0, 0.0),
                },
                TrackFix {
                    timestamp: 2.0,
                    position: GeoPosition::new(0.002, 0.0, 0.0),
                },
            ],
        };
        let mid = segment.position_at(1.0).unwrap();
        assert!((mid.lat_deg - 0.001).abs() < 1e-12);
        let ahead = segment.position_at(3.0).unwrap();
        assert!((ahead.lat_deg - 0.003).abs() < 1e-12);
    }

    #[test]
    fn untracked_target_has_zero_statistics() {
        let mut engine = TrackEngine::new(TrackConfig::default(), ["uas-1"]);
        run(&mut engine, &[false; 5]);
        let result = &engine.results(1.0)[0];
        assert_eq!(result.continuity_ratio, 0.0);
        assert_eq!(result.update_rate_hz, 0.0);
        assert_eq!(result.mean_position_error_m, 0.0);
        assert_eq!(result.final_uid, None);
    }
}
