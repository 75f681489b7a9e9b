use serde::{Deserialize, Serialize};

use crate::math::GeoPosition;
use crate::prelude::ConfigurationError;

/// Target size class, ordered C0 (smallest) to C4, followed by domain-specific classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeClass {
    C0,
    C1,
    C2,
    C3,
    C4,
    Bird,
    Unknown,
}

impl SizeClass {
    pub const ORDERED: [SizeClass; 5] = [Self::C0, Self::C1, Self::C2, Self::C3, Self::C4];

    /// Position in the C0..C4 ordering; `None` for domain-specific classes.
    pub fn rank(self) -> Option<usize> {
        Self::ORDERED.iter().position(|class| *class == self)
    }

    /// Neighbouring class a misclassification lands on.
    pub fn confused_with(self, larger: bool) -> SizeClass {
        match self.rank() {
            Some(rank) if larger && rank + 1 < Self::ORDERED.len() => Self::ORDERED[rank + 1],
            Some(rank) if !larger && rank > 0 => Self::ORDERED[rank - 1],
            Some(0) => Self::C1,
            Some(_) => Self::C3,
            None if self == Self::Bird => Self::C0,
            None => Self::C1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: GeoPosition,
    pub speed_mps: f64,
    /// Elapsed scenario time at which the target reaches this waypoint.
    pub time_s: f64,
}

/// Kinematic ground-truth state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    pub timestamp: f64,
    pub position: GeoPosition,
    pub speed_mps: f64,
    pub heading_deg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub waypoints: Vec<Waypoint>,
}

impl FlightPlan {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Rejects empty plans and decreasing waypoint times.
    pub fn validate(&self, target_id: &str) -> Result<(), ConfigurationError> {
        if self.waypoints.is_empty() {
            return Err(ConfigurationError::EmptyFlightPlan(target_id.to_string()));
        }
        if let Some((index, waypoint)) = self
            .waypoints
            .iter()
            .enumerate()
            .find(|(_, waypoint)| !waypoint.time_s.is_finite())
        {
            return Err(ConfigurationError::NonFiniteWaypointTime {
                target: target_id.to_string(),
                index,
                time_s: waypoint.time_s,
            });
        }
        for (index, pair) in self.waypoints.windows(2).enumerate() {
            if pair[1].time_s < pair[0].time_s {
                return Err(ConfigurationError::NonMonotonicWaypoints {
                    target: target_id.to_string(),
                    index: index + 1,
                    time_s: pair[1].time_s,
                });
            }
        }
        Ok(())
    }

    pub fn start_time(&self) -> Option<f64> {
        self.waypoints.first().map(|wp| wp.time_s)
    }

    pub fn end_time(&self) -> Option<f64> {
        self.waypoints.last().map(|wp| wp.time_s)
    }

    /// Interpolated state at `t`; `None` outside the plan's time span.
    pub fn state_at(&self, t: f64) -> Option<TargetState> {
        let first = self.waypoints.first()?;
        let last = self.waypoints.last()?;
        if t < first.time_s || t > last.time_s {
            return None;
        }

        // Last waypoint at or before t; equal times resolve to the later waypoint.
        let index = self
            .waypoints
            .iter()
            .rposition(|wp| wp.time_s <= t)
            .unwrap_or(0);

        if index + 1 >= self.waypoints.len() {
            let heading_deg = match self.waypoints.len() {
                0 | 1 => 0.0,
                n => segment_heading(&self.waypoints[n - 2], &self.waypoints[n - 1]),
            };
            return Some(TargetState {
                timestamp: t,
                position: last.position,
                speed_mps: last.speed_mps,
                heading_deg,
            });
        }

        let from = &self.waypoints[index];
        let to = &self.waypoints[index + 1];
        let span = to.time_s - from.time_s;
        let fraction = if span > 0.0 { (t - from.time_s) / span } else { 1.0 };

        Some(TargetState {
            timestamp: t,
            position: from.position.interpolate(&to.position, fraction),
            speed_mps: from.speed_mps + (to.speed_mps - from.speed_mps) * fraction,
            heading_deg: segment_heading(from, to),
        })
    }
}

fn segment_heading(from: &Waypoint, to: &Waypoint) -> f64 {
    if from.position.distance_to(&to.position) > f64::EPSILON {
        from.position.bearing_to(&to.position)
    } else {
        0.0
    }
}

/// Ground-truth target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTrack {
    pub id: String,
    pub size_class: SizeClass,
    /// Radar cross-section (m²), also used as the generic signature proxy.
    pub rcs_m2: f64,
    #[serde(default)]
    pub carries_payload: bool,
    #[serde(default)]
    pub payload_description: Option<String>,
    #[serde(default = "default_true")]
    pub hostile: bool,
    /// Whether the target emits a control/video link RF sensors can fingerprint.
    #[serde(default = "default_true")]
    pub rf_emitting: bool,
    pub flight_plan: FlightPlan,
}

fn default_true() -> bool {
    true
}

impl TargetTrack {
    pub fn state_at(&self, t: f64) -> Option<TargetState> {
        self.flight_plan.state_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(lat: f64, time_s: f64) -> Waypoint {
        Waypoint {
            position: GeoPosition::new(lat, 0.0, 100.0),
            speed_mps: 10.0,
            time_s,
        }
    }

    #[test]
    fn interpolates_between_waypoints() {
        let plan = FlightPlan::new(vec![waypoint(0.0, 0.0), waypoint(0.01, 10.0)]);
        let state = plan.state_at(5.0).unwrap();
        assert!((state.position.lat_deg - 0.005).abs() < 1e-12);
        assert!((state.heading_deg - 0.0).abs() < 1e-9);
        assert!(plan.state_at(-1.0).is_none());
        assert!(plan.state_at(10.5).is_none());
        assert_eq!(plan.state_at(10.0).unwrap().position.lat_deg, 0.01);
    }

    #[test]
    fn equal_times_jump_to_later_waypoint() {
        let plan = FlightPlan::new(vec![
            waypoint(0.0, 0.0),
            waypoint(0.01, 5.0),
            waypoint(0.02, 5.0),
            waypoint(0.03, 10.0),
        ]);
        plan.validate("t1").unwrap();
        assert_eq!(plan.state_at(5.0).unwrap().position.lat_deg, 0.02);
    }

    #[test]
    fn non_finite_times_are_rejected_anywhere() {
        let single = FlightPlan::new(vec![waypoint(0.0, f64::NAN)]);
        assert!(matches!(
            single.validate("t1"),
            Err(ConfigurationError::NonFiniteWaypointTime { index: 0, .. })
        ));

        let leading = FlightPlan::new(vec![waypoint(0.0, f64::NAN), waypoint(0.01, 10.0)]);
        assert!(matches!(
            leading.validate("t1"),
            Err(ConfigurationError::NonFiniteWaypointTime { index: 0, .. })
        ));

        let trailing = FlightPlan::new(vec![waypoint(0.0, 0.0), waypoint(0.01, f64::INFINITY)]);
        assert!(matches!(
            trailing.validate("t1"),
            Err(ConfigurationError::NonFiniteWaypointTime { index: 1, .. })
        ));
    }

    #[test]
    fn decreasing_times_are_rejected() {
        let plan = FlightPlan::new(vec![
            waypoint(0.0, 0.0),
            waypoint(0.01, 10.0),
            waypoint(0.02, 9.0),
        ]);
        assert_eq!(
            plan.validate("t1"),
            Err(ConfigurationError::NonMonotonicWaypoints {
                target: "t1".into(),
                index: 2,
                time_s: 9.0
            })
        );
        assert!(FlightPlan::default().validate("t2").is_err());
    }

    #[test]
    fn size_class_ordering_and_confusion() {
        assert!(SizeClass::C0 < SizeClass::C4);
        assert_eq!(SizeClass::C2.confused_with(true), SizeClass::C3);
        assert_eq!(SizeClass::C4.confused_with(true), SizeClass::C3);
        assert_eq!(SizeClass::C0.confused_with(false), SizeClass::C1);
        assert_eq!(SizeClass::Bird.confused_with(true), SizeClass::C0);
    }
}
