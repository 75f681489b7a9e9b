//! Multi-sensor combination of per-sensor detections for one target.

use crate::model::DetectionResult;
use crate::processing::detection::SensorDetection;

/// Fuses every sensor's look at `target_id` into one detection opportunity.
///
/// Only sensors with non-zero Pd contribute. The reported fix comes from the
/// lowest-latency detecting sensor; on ties the first in scenario order wins.
pub fn fuse(target_id: &str, timestamp: f64, looks: &[SensorDetection]) -> DetectionResult {
    let contributing = looks.iter().filter(|look| look.pd > 0.0);

    let miss = contributing
        .clone()
        .fold(1.0, |miss: f64, look| miss * (1.0 - look.pd.clamp(0.0, 1.0)));
    let pd = (1.0 - miss).clamp(0.0, 1.0);

    let detecting: Vec<&SensorDetection> = contributing.filter(|look| look.detected).collect();
    let best = detecting
        .iter()
        .copied()
        .fold(None, |best: Option<&SensorDetection>, look| match best {
            Some(current) if current.latency_s <= look.latency_s => Some(current),
            _ => Some(look),
        });

    DetectionResult {
        timestamp,
        target_id: target_id.to_string(),
        detected: best.is_some(),
        in_coverage: looks.iter().any(|look| look.in_nominal_range),
        pd,
        latency_s: best.map_or(0.0, |look| look.latency_s),
        position_error_m: best.map_or(0.0, |look| look.position_error_m),
        reported_position: best.and_then(|look| look.reported_position),
        sensor_ids: detecting.iter().map(|look| look.sensor_id.clone()).collect(),
        false_alarm: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::GeoPosition;

    fn look(id: &str, pd: f64, detected: bool, latency_s: f64) -> SensorDetection {
        SensorDetection {
            sensor_id: id.into(),
            pd,
            detected,
            in_nominal_range: pd > 0.0,
            latency_s,
            position_error_m: latency_s * 10.0,
            reported_position: detected.then(|| GeoPosition::new(1.0, latency_s, 0.0)),
        }
    }

    #[test]
    fn any_detecting_sensor_detects() {
        let fused = fuse("uas-1", 3.0, &[look("a", 0.5, false, 0.0), look("b", 0.5, true, 2.0)]);
        assert!(fused.detected);
        assert_eq!(fused.sensor_ids, vec!["b".to_string()]);
        assert!((fused.pd - 0.75).abs() < 1e-12);
        assert_eq!(fused.timestamp, 3.0);
    }

    #[test]
    fn lowest_latency_sensor_reports() {
        let looks = [
            look("slow", 0.9, true, 2.0),
            look("fast", 0.6, true, 0.5),
            look("tie", 0.6, true, 0.5),
        ];
        let fused = fuse("uas-1", 0.0, &looks);
        assert_eq!(fused.latency_s, 0.5);
        assert_eq!(fused.position_error_m, 5.0);
        assert_eq!(fused.reported_position.map(|p| p.lon_deg), Some(0.5));
        assert_eq!(fused.sensor_ids.len(), 3);
    }

    #[test]
    fn zero_pd_sensors_never_contribute() {
        let mut spurious = look("masked", 0.0, true, 0.1);
        spurious.in_nominal_range = true;
        let fused = fuse("uas-1", 0.0, &[spurious]);
        assert!(!fused.detected);
        assert_eq!(fused.pd, 0.0);
        assert!(fused.in_coverage);
        assert!(fused.reported_position.is_none());
    }
}
