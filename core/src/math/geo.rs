use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle and curvature math (metres).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Immutable geodetic position: latitude/longitude in degrees, altitude above sea level in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat_deg: f64,
    pub lon_deg: f64,
    #[serde(default)]
    pub alt_m: f64,
}

impl GeoPosition {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }

    /// Great-circle (haversine) ground distance in metres; altitude is ignored.
    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        let lat1 = self.lat_deg.to_radians();
        let lat2 = other.lat_deg.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.lon_deg - self.lon_deg).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Initial great-circle bearing to `other`, degrees clockwise from north in [0, 360).
    pub fn bearing_to(&self, other: &GeoPosition) -> f64 {
        let lat1 = self.lat_deg.to_radians();
        let lat2 = other.lat_deg.to_radians();
        let dlon = (other.lon_deg - self.lon_deg).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        normalize_azimuth(y.atan2(x).to_degrees())
    }

    /// Point reached after travelling `distance_m` along `bearing_deg`; altitude is carried over.
    pub fn destination(&self, bearing_deg: f64, distance_m: f64) -> GeoPosition {
        let delta = distance_m / EARTH_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let lat1 = self.lat_deg.to_radians();
        let lon1 = self.lon_deg.to_radians();

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

        GeoPosition {
            lat_deg: lat2.to_degrees(),
            lon_deg: (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
            alt_m: self.alt_m,
        }
    }

    /// Elevation angle (degrees) of a point at `height_m` ASL seen from this position,
    /// `ground_distance_m` away, including the Earth-curvature drop.
    pub fn elevation_angle(&self, height_m: f64, ground_distance_m: f64) -> f64 {
        if ground_distance_m <= f64::EPSILON {
            return if height_m >= self.alt_m { 90.0 } else { -90.0 };
        }
        let apparent = height_m - curvature_drop(ground_distance_m) - self.alt_m;
        apparent.atan2(ground_distance_m).to_degrees()
    }

    /// Linear interpolation of all three coordinates; `fraction` is clamped to [0, 1].
    pub fn interpolate(&self, other: &GeoPosition, fraction: f64) -> GeoPosition {
        let f = fraction.clamp(0.0, 1.0);
        GeoPosition {
            lat_deg: self.lat_deg + (other.lat_deg - self.lat_deg) * f,
            lon_deg: self.lon_deg + (other.lon_deg - self.lon_deg) * f,
            alt_m: self.alt_m + (other.alt_m - self.alt_m) * f,
        }
    }

    /// Linear extrapolation past `other` along the line from `self`; `fraction` may exceed 1.
    pub fn extrapolate(&self, other: &GeoPosition, fraction: f64) -> GeoPosition {
        GeoPosition {
            lat_deg: self.lat_deg + (other.lat_deg - self.lat_deg) * fraction,
            lon_deg: self.lon_deg + (other.lon_deg - self.lon_deg) * fraction,
            alt_m: self.alt_m + (other.alt_m - self.alt_m) * fraction,
        }
    }

    /// Offset by local north/east displacements in metres (small-distance approximation).
    pub fn offset_ne(&self, north_m: f64, east_m: f64) -> GeoPosition {
        let dlat = north_m / EARTH_RADIUS_M;
        let dlon = east_m / (EARTH_RADIUS_M * self.lat_deg.to_radians().cos().max(1e-9));
        GeoPosition {
            lat_deg: self.lat_deg + dlat.to_degrees(),
            lon_deg: self.lon_deg + dlon.to_degrees(),
            alt_m: self.alt_m,
        }
    }
}

/// Height lost to Earth curvature at `ground_distance_m`: d²/(2R).
pub fn curvature_drop(ground_distance_m: f64) -> f64 {
    ground_distance_m * ground_distance_m / (2.0 * EARTH_RADIUS_M)
}

/// Wrap any angle in degrees into [0, 360).
pub fn normalize_azimuth(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest signed difference `to - from` in degrees, in (-180, 180].
pub fn azimuth_difference(from: f64, to: f64) -> f64 {
    let diff = normalize_azimuth(to - from);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}
