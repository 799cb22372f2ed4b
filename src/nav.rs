//! Geodesic helpers.
//!
//! Distance, bearing and nearest-point computations on WGS84 coordinates
//! (lat/lon in degrees). Used for off-route detection, rider heading and
//! fixture matching.

use serde::{Deserialize, Serialize};

/// Earth radius in meters (WGS84 mean).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle (haversine) distance in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let (phi1, phi2) = (self.lat.to_radians(), other.lat.to_radians());
        let half_dphi = (phi2 - phi1) / 2.0;
        let half_dlambda = (other.lon - self.lon).to_radians() / 2.0;

        let h = half_dphi.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlambda.sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
    }

    /// Initial bearing towards `other` in degrees, within [0, 360).
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        let (phi1, phi2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlambda = (other.lon - self.lon).to_radians();

        let east = dlambda.sin() * phi2.cos();
        let north = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
        east.atan2(north).to_degrees().rem_euclid(360.0)
    }

    /// Point at fraction `t` of the way to `other`, interpolated linearly.
    fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        Coordinate::new(
            self.lat + t * (other.lat - self.lat),
            self.lon + t * (other.lon - self.lon),
        )
    }
}

/// Where a position lands on a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Nearest point on the path.
    pub point: Coordinate,
    /// Index of the segment containing `point`.
    pub segment_index: usize,
    /// Meters between the position and `point`.
    pub offset_m: f64,
    /// Meters along the path from its start to `point`.
    pub along_m: f64,
}

/// Project `position` onto the nearest segment of `path`.
///
/// None when the path has fewer than two points.
pub fn project_on_path(position: &Coordinate, path: &[Coordinate]) -> Option<Projection> {
    let mut travelled = 0.0;
    path.windows(2)
        .enumerate()
        .map(|(segment_index, segment)| {
            let (start, end) = (&segment[0], &segment[1]);
            let point = start.lerp(end, segment_fraction(position, start, end));
            let projection = Projection {
                point,
                segment_index,
                offset_m: position.distance_to(&point),
                along_m: travelled + start.distance_to(&point),
            };
            travelled += start.distance_to(end);
            projection
        })
        .fold(None, |best: Option<Projection>, candidate| match best {
            Some(best) if best.offset_m <= candidate.offset_m => Some(best),
            _ => Some(candidate),
        })
}

/// Fraction along `start..end` closest to `position`, clamped to the segment.
///
/// Works in a local plane with longitude scaled by the cosine of the
/// segment's mean latitude; good enough over a single street segment.
fn segment_fraction(position: &Coordinate, start: &Coordinate, end: &Coordinate) -> f64 {
    let scale = ((start.lat + end.lat) / 2.0).to_radians().cos();
    let seg = ((end.lon - start.lon) * scale, end.lat - start.lat);
    let rel = ((position.lon - start.lon) * scale, position.lat - start.lat);

    let len_sq = seg.0 * seg.0 + seg.1 * seg.1;
    if len_sq <= f64::EPSILON * f64::EPSILON {
        return 0.0;
    }
    ((rel.0 * seg.0 + rel.1 * seg.1) / len_sq).clamp(0.0, 1.0)
}
