//! Classification and payload-identification simulation.

use rand::Rng;

use crate::model::{
    EnvironmentState, IdentificationResult, SensorCapability, SensorSite, SizeClass, TargetState,
    TargetTrack,
};
use crate::processing::detection::degradation_factor;

/// Targets slower than this are harder to separate from clutter and birds optically.
pub const SLOW_TARGET_MPS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentificationAttempt {
    pub classification_correct: bool,
    pub estimated_size: SizeClass,
    pub payload_identified: bool,
}

fn optical_size_factor(class: SizeClass) -> f64 {
    match class {
        SizeClass::C0 => 0.35,
        SizeClass::C1 => 0.55,
        SizeClass::C2 => 0.75,
        SizeClass::C3 => 0.85,
        SizeClass::C4 => 0.9,
        SizeClass::Bird => 0.6,
        SizeClass::Unknown => 0.4,
    }
}

fn micro_doppler_factor(class: SizeClass) -> f64 {
    match class {
        SizeClass::C0 => 0.3,
        SizeClass::C1 => 0.45,
        SizeClass::C2 => 0.6,
        SizeClass::C3 => 0.7,
        SizeClass::C4 => 0.75,
        SizeClass::Bird => 0.65,
        SizeClass::Unknown => 0.3,
    }
}

fn acoustic_factor(class: SizeClass) -> f64 {
    match class {
        SizeClass::C0 => 0.4,
        SizeClass::C1 => 0.5,
        SizeClass::C2 => 0.6,
        SizeClass::C3 => 0.65,
        SizeClass::C4 => 0.7,
        SizeClass::Bird => 0.5,
        SizeClass::Unknown => 0.3,
    }
}

/// Per-attempt probability that `sensor` classifies `target` correctly.
pub fn classification_probability(
    sensor: &SensorSite,
    target: &TargetTrack,
    state: &TargetState,
    environment: &EnvironmentState,
) -> f64 {
    let class = target.size_class;
    let base = match sensor.capability {
        // Emission fingerprinting does not care how big the airframe is.
        capability if capability.is_rf_passive() && !target.rf_emitting => 0.05,
        SensorCapability::Rf => 0.85,
        SensorCapability::RfPlus => 0.92,
        SensorCapability::Radar => micro_doppler_factor(class),
        SensorCapability::Acoustic => acoustic_factor(class),
        SensorCapability::EoIr => optical_size_factor(class),
        SensorCapability::Multispectral => (optical_size_factor(class) * 1.05).min(0.95),
        SensorCapability::Ir => optical_size_factor(class) * 0.9,
    };
    let slow_penalty = if sensor.capability.is_optical() && state.speed_mps < SLOW_TARGET_MPS {
        0.8
    } else {
        1.0
    };
    (base * slow_penalty * degradation_factor(sensor, environment)).clamp(0.0, 1.0)
}

/// Probability of recognising a carried payload once the target is correctly classified.
pub fn payload_probability(sensor: &SensorSite, environment: &EnvironmentState) -> f64 {
    let base = match sensor.capability {
        SensorCapability::EoIr => 0.6,
        SensorCapability::Multispectral => 0.7,
        SensorCapability::Ir => 0.4,
        SensorCapability::RfPlus => 0.3,
        SensorCapability::Rf => 0.2,
        SensorCapability::Radar | SensorCapability::Acoustic => 0.1,
    };
    (base * degradation_factor(sensor, environment)).clamp(0.0, 1.0)
}

/// One identification attempt. Payload recognition requires a correct classification
/// and a target that truly carries a payload.
pub fn identify<R: Rng + ?Sized>(
    sensor: &SensorSite,
    target: &TargetTrack,
    state: &TargetState,
    environment: &EnvironmentState,
    rng: &mut R,
) -> IdentificationAttempt {
    let p_class = classification_probability(sensor, target, state, environment);
    let classification_correct = rng.gen::<f64>() < p_class;

    let estimated_size = if classification_correct {
        target.size_class
    } else {
        target.size_class.confused_with(rng.gen::<bool>())
    };

    let payload_identified = classification_correct
        && target.carries_payload
        && rng.gen::<f64>() < payload_probability(sensor, environment);

    IdentificationAttempt {
        classification_correct,
        estimated_size,
        payload_identified,
    }
}

/// Accumulates attempts for one target over a run.
#[derive(Debug, Clone)]
pub struct IdentificationRecord {
    target_id: String,
    true_size: SizeClass,
    carries_payload: bool,
    attempts: u32,
    classified_at: Option<f64>,
    estimated_size: Option<SizeClass>,
    payload_identified: bool,
}

impl IdentificationRecord {
    pub fn new(target: &TargetTrack) -> Self {
        Self {
            target_id: target.id.clone(),
            true_size: target.size_class,
            carries_payload: target.carries_payload,
            attempts: 0,
            classified_at: None,
            estimated_size: None,
            payload_identified: false,
        }
    }

    /// Whether further attempts can still change the outcome.
    pub fn needs_attempt(&self) -> bool {
        self.classified_at.is_none() || (self.carries_payload && !self.payload_identified)
    }

    pub fn apply(&mut self, attempt: &IdentificationAttempt, t: f64) {
        self.attempts += 1;
        if self.classified_at.is_none() {
            self.estimated_size = Some(attempt.estimated_size);
            if attempt.classification_correct {
                self.classified_at = Some(t);
            }
        }
        self.payload_identified |= attempt.payload_identified;
    }

    pub fn finish(&self, acquired_at: Option<f64>) -> IdentificationResult {
        let latency_s = match (self.classified_at, acquired_at) {
            (Some(classified), Some(acquired)) => Some((classified - acquired).max(0.0)),
            _ => None,
        };
        IdentificationResult {
            target_id: self.target_id.clone(),
            true_size: self.true_size,
            attempted: self.attempts > 0,
            classification_correct: self.classified_at.is_some(),
            carries_payload: self.carries_payload,
            payload_identified: self.payload_identified,
            estimated_size: self.estimated_size,
            latency_s,
            attempts: self.attempts,
        }
    }
}
