//! Per-sensor detection model.
//!
//! Baseline Pd comes from the Swerling-I curve anchored at the sensor's
//! nominal range; weather, low light and jamming scale it down, while terrain
//! masking and coverage gating force it to zero. Decisions are Bernoulli
//! draws on the scenario's seeded stream.

use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

use crate::math::geo::normalize_azimuth;
use crate::math::swerling::{snr_at_range, swerling1_pd};
use crate::math::GeoPosition;
use crate::model::{
    DetectionResult, EnvironmentState, SensorCapability, SensorSite, TargetState, TargetTrack,
    Weather, FALSE_ALARM_ID,
};
use crate::terrain::TerrainMaskResult;

/// Outcome of one sensor looking at one target at one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDetection {
    pub sensor_id: String,
    pub pd: f64,
    pub detected: bool,
    pub in_nominal_range: bool,
    pub latency_s: f64,
    pub position_error_m: f64,
    pub reported_position: Option<GeoPosition>,
}

/// Sensor-relative geometry of a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookGeometry {
    pub range_m: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

pub fn look_geometry(sensor: &SensorSite, position: &GeoPosition) -> LookGeometry {
    let range_m = sensor.position.distance_to(position);
    LookGeometry {
        range_m,
        azimuth_deg: sensor.position.bearing_to(position),
        elevation_deg: sensor.position.elevation_angle(position.alt_m, range_m),
    }
}

/// Atmospheric attenuation of detection/identification performance.
pub fn weather_factor(weather: Weather, capability: SensorCapability) -> f64 {
    use SensorCapability::*;
    match (weather.daylight_equivalent(), capability) {
        (Weather::Clear, _) => 1.0,
        (Weather::Cloudy, EoIr | Multispectral) => 0.9,
        (Weather::Cloudy, Ir) => 0.85,
        (Weather::Cloudy, _) => 1.0,
        (Weather::Rain, Radar) => 0.9,
        (Weather::Rain, Rf | RfPlus) => 0.95,
        (Weather::Rain, Acoustic) => 0.7,
        (Weather::Rain, EoIr | Multispectral) => 0.7,
        (Weather::Rain, Ir) => 0.65,
        (Weather::Fog, Radar | Rf | RfPlus) => 0.98,
        (Weather::Fog, Acoustic) => 0.95,
        (Weather::Fog, EoIr) => 0.45,
        (Weather::Fog, Multispectral) => 0.5,
        (Weather::Fog, Ir) => 0.4,
        _ => 1.0,
    }
}

/// Night penalty for optical sensors; thermal channels lose little.
pub fn low_light_factor(weather: Weather, capability: SensorCapability) -> f64 {
    if !weather.is_night() {
        return 1.0;
    }
    match capability {
        SensorCapability::EoIr => 0.6,
        SensorCapability::Multispectral => 0.7,
        SensorCapability::Ir => 0.95,
        _ => 1.0,
    }
}

/// `1 − ew_factor × ew_sensitivity` for RF-capable sensors, 1 otherwise.
pub fn ew_survival(sensor: &SensorSite, environment: &EnvironmentState) -> f64 {
    if !sensor.capability.is_rf_capable() {
        return 1.0;
    }
    let jamming = environment.ew_factor().clamp(0.0, 1.0) * sensor.ew_sensitivity.clamp(0.0, 1.0);
    (1.0 - jamming).clamp(0.0, 1.0)
}

/// Combined multiplicative environmental degradation, in [0, 1].
pub fn degradation_factor(sensor: &SensorSite, environment: &EnvironmentState) -> f64 {
    let weather = environment.weather;
    (weather_factor(weather, sensor.capability)
        * low_light_factor(weather, sensor.capability)
        * ew_survival(sensor, environment))
    .clamp(0.0, 1.0)
}

/// Swerling-I Pd before environmental degradation and gating.
pub fn baseline_pd(sensor: &SensorSite, range_m: f64, signature: f64) -> f64 {
    let pfa = sensor.curve.design_pfa;
    let snr = snr_at_range(
        range_m,
        sensor.nominal_range_m,
        signature,
        sensor.curve.reference_signature,
        sensor.range_exponent(),
        pfa,
    );
    swerling1_pd(snr, pfa)
}

/// Effective Pd: baseline × degradations, zero outside coverage or below the mask.
pub fn effective_pd(
    sensor: &SensorSite,
    target: &TargetTrack,
    state: &TargetState,
    environment: &EnvironmentState,
    mask: &TerrainMaskResult,
) -> f64 {
    let look = look_geometry(sensor, &state.position);
    let in_window = sensor.azimuth.contains(look.azimuth_deg)
        && sensor.elevation.contains(look.elevation_deg);
    if !in_window {
        return 0.0;
    }
    if !mask.is_visible(look.azimuth_deg, look.elevation_deg) {
        return 0.0;
    }
    (baseline_pd(sensor, look.range_m, target.rcs_m2) * degradation_factor(sensor, environment))
        .clamp(0.0, 1.0)
}

/// Normal draw; a non-positive deviation returns the mean without consuming the stream.
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return mean;
    }
    match Normal::new(mean, std_dev) {
        Ok(normal) => normal.sample(rng),
        Err(_) => mean,
    }
}

/// Runs one sensor against one target. Always consumes one uniform for the decision.
pub fn detect<R: Rng + ?Sized>(
    sensor: &SensorSite,
    target: &TargetTrack,
    state: &TargetState,
    environment: &EnvironmentState,
    mask: &TerrainMaskResult,
    rng: &mut R,
) -> SensorDetection {
    let pd = effective_pd(sensor, target, state, environment, mask);
    let draw: f64 = rng.gen();
    let detected = pd > 0.0 && draw < pd;

    let mut result = SensorDetection {
        sensor_id: sensor.id.clone(),
        pd,
        detected,
        in_nominal_range: sensor.within_nominal_range(&state.position),
        latency_s: 0.0,
        position_error_m: 0.0,
        reported_position: None,
    };

    if detected {
        result.latency_s = gaussian(rng, sensor.latency_mean_s, sensor.latency_std_s).max(0.0);
        let north = gaussian(rng, 0.0, sensor.position_error_std_m);
        let east = gaussian(rng, 0.0, sensor.position_error_std_m);
        result.position_error_m = north.hypot(east);
        result.reported_position = Some(state.position.offset_ne(north, east));
    }
    result
}

/// Clutter/false reports from one sensor over one timestep, Poisson at the sensor's hourly rate.
pub fn synthesize_false_alarms<R: Rng + ?Sized>(
    sensor: &SensorSite,
    timestamp: f64,
    timestep_s: f64,
    rng: &mut R,
) -> Vec<DetectionResult> {
    let lambda = sensor.false_alarm_rate_per_hour.max(0.0) * timestep_s / 3_600.0;
    if lambda <= 0.0 {
        return Vec::new();
    }
    let count = match Poisson::new(lambda) {
        Ok(poisson) => poisson.sample(rng) as usize,
        Err(_) => 0,
    };

    let window = sensor.azimuth;
    let span = if window.end_deg - window.start_deg >= 360.0 {
        360.0
    } else {
        normalize_azimuth(window.end_deg - window.start_deg)
    };

    (0..count)
        .map(|_| {
            let azimuth = normalize_azimuth(window.start_deg + rng.gen::<f64>() * span);
            let range = sensor.nominal_range_m * rng.gen::<f64>().sqrt();
            let latency = gaussian(rng, sensor.latency_mean_s, sensor.latency_std_s).max(0.0);
            DetectionResult {
                timestamp,
                target_id: FALSE_ALARM_ID.to_string(),
                detected: true,
                in_coverage: false,
                pd: 0.0,
                latency_s: latency,
                position_error_m: 0.0,
                reported_position: Some(sensor.position.destination(azimuth, range)),
                sensor_ids: vec![sensor.id.clone()],
                false_alarm: true,
            }
        })
        .collect()
}
