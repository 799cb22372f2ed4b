//! Encoded polyline decoding.
//!
//! The routing backend returns geometries in the Google encoded polyline
//! format with 5 digits of precision (`geometries=polyline`).

use crate::nav::Coordinate;

const PRECISION: f64 = 1e5;

/// Decode an encoded polyline into coordinates.
///
/// Returns None on truncated or otherwise malformed input, including
/// deltas whose running sum leaves the `i64` range.
pub fn decode(encoded: &str) -> Option<Vec<Coordinate>> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat = lat.checked_add(next_value(bytes, &mut index)?)?;
        lon = lon.checked_add(next_value(bytes, &mut index)?)?;
        points.push(Coordinate::new(lat as f64 / PRECISION, lon as f64 / PRECISION));
    }

    Some(points)
}

/// Read one zig-zag encoded delta starting at `index`.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*index)?;
        if !(63..=126).contains(&byte) || shift > 60 {
            return None;
        }
        *index += 1;

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Some(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}
