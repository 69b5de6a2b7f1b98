//! Compact Position Reporting (CPR) decode for airborne positions.
//!
//! Two decode modes:
//! - Global: requires an even+odd message pair within 10 seconds, plus a
//!   reference position used to pick the longitude zone copy.
//! - Local: single message + reference position within ~180nm.
//!
//! Key constants:
//! - NZ = 15 (latitude zones per hemisphere for even frames)
//! - Nb = 17 (bits per coordinate)
//! - Dlat_even = 360 / (4 * NZ) = 6.0 degrees
//! - Dlat_odd = 360 / (4 * NZ - 1) ≈ 6.1017 degrees

use std::f64::consts::PI;
use std::time::Duration;

use log::debug;

use crate::types::{icao_to_string, AirbornePosition, CprError, Position, PositionResult};

/// Number of latitude zones per hemisphere.
const NZ: f64 = 15.0;

/// Bits per CPR coordinate.
const NB: u32 = 17;

/// Maximum CPR value (2^17 = 131072).
const CPR_MAX: f64 = (1u32 << NB) as f64;

/// Maximum time between even/odd messages for global decode.
pub const MAX_PAIR_AGE: Duration = Duration::from_millis(10_000);

/// Number of longitude zones at a given latitude (NL function).
///
/// Ranges from 1 near poles to 59 at equator.
pub fn nl(lat: f64) -> i32 {
    if lat.abs() >= 87.0 {
        return 1;
    }
    if lat == 0.0 {
        return 59;
    }

    let a = 1.0 - (PI / (2.0 * NZ)).cos();
    let b = lat.to_radians().cos().powi(2);
    (2.0 * PI / (1.0 - a / b).acos()).floor() as i32
}

/// Modulo that always returns a non-negative result.
fn modulo(x: f64, y: f64) -> f64 {
    x - y * (x / y).floor()
}

fn normalize(cpr: u32) -> f64 {
    cpr as f64 / CPR_MAX
}

/// Global CPR decode from an even/odd message pair.
///
/// The messages may be passed in either order; they are told apart by their
/// parity flag. The newer of the two determines which latitude candidate and
/// longitude zone width are used, and the final longitude is moved by whole
/// zones to the copy nearest `reference`.
pub fn try_resolve(
    a: &AirbornePosition,
    b: &AirbornePosition,
    reference: Position,
) -> Result<Position, CprError> {
    if a.cpr_odd == b.cpr_odd {
        return Err(CprError::SameParity);
    }
    let (even, odd) = if a.cpr_odd { (b, a) } else { (a, b) };

    let t_even = even.header.timestamp();
    let t_odd = odd.header.timestamp();
    let elapsed = t_even.max(t_odd) - t_even.min(t_odd);
    if elapsed > MAX_PAIR_AGE {
        return Err(CprError::StalePair {
            elapsed_ms: elapsed.as_millis(),
        });
    }

    let dlat_even = 360.0 / (4.0 * NZ); // 6.0
    let dlat_odd = 360.0 / (4.0 * NZ - 1.0); // ~6.1017

    let lat_even_cpr = normalize(even.cpr_lat);
    let lon_even_cpr = normalize(even.cpr_lon);
    let lat_odd_cpr = normalize(odd.cpr_lat);
    let lon_odd_cpr = normalize(odd.cpr_lon);

    // Latitude zone index
    let j = (59.0 * lat_even_cpr - 60.0 * lat_odd_cpr + 0.5).floor();

    let mut lat_e = dlat_even * (modulo(j, 60.0) + lat_even_cpr);
    let mut lat_o = dlat_odd * (modulo(j, 59.0) + lat_odd_cpr);

    // Southern hemisphere
    if lat_e >= 270.0 {
        lat_e -= 360.0;
    }
    if lat_o >= 270.0 {
        lat_o -= 360.0;
    }

    if nl(lat_e) != nl(lat_o) {
        return Err(CprError::ZoneMismatch);
    }

    let even_newer = t_even > t_odd;
    let (lat, lon_cpr, i) = if even_newer {
        (lat_e, lon_even_cpr, 0)
    } else {
        (lat_o, lon_odd_cpr, 1)
    };

    let nl_val = nl(lat);
    if nl_val <= 0 {
        return Err(CprError::DegenerateLatitude { nl: nl_val });
    }

    let m = (lon_even_cpr * (nl_val - 1) as f64 - lon_odd_cpr * nl_val as f64 + 0.5).floor();
    let n_lon = (nl_val - i).max(1) as f64;
    let dlon = 360.0 / n_lon;

    let mut lon = dlon * (modulo(m, n_lon) + lon_cpr);
    lon += dlon * ((reference.longitude - lon) / dlon).round();

    Ok(Position::new(lat, wrap_longitude(lon)))
}

/// Global CPR decode, reporting failure through `is_valid`.
pub fn resolve(a: &AirbornePosition, b: &AirbornePosition, reference: Position) -> PositionResult {
    let res = try_resolve(a, b, reference);
    if let Err(e) = &res {
        debug!("{}: CPR pair rejected: {e}", a.header.icao_hex());
    }
    res.into()
}

/// Local CPR decode of a single message using a reference position.
///
/// Valid when the aircraft is within ~180nm of the reference.
pub fn resolve_local(msg: &AirbornePosition, reference: Position) -> Position {
    let i = if msg.cpr_odd { 1.0 } else { 0.0 };
    let dlat = 360.0 / (4.0 * NZ - i);

    let cpr_lat_norm = normalize(msg.cpr_lat);
    let cpr_lon_norm = normalize(msg.cpr_lon);

    let ref_lat = reference.latitude;
    let ref_lon = reference.longitude;

    // Latitude zone index from reference
    let j = (ref_lat / dlat).floor() + (modulo(ref_lat, dlat) / dlat - cpr_lat_norm + 0.5).floor();
    let mut lat = dlat * (j + cpr_lat_norm);

    // Longitude zone size at this latitude
    let n_lon = (nl(lat) - i as i32).max(1);
    let dlon = 360.0 / n_lon as f64;

    // Longitude zone index from reference
    let m = (ref_lon / dlon).floor() + (modulo(ref_lon, dlon) / dlon - cpr_lon_norm + 0.5).floor();
    let lon = dlon * (m + cpr_lon_norm);

    if lat > 90.0 {
        lat -= 360.0;
    }

    let position = Position::new(lat, wrap_longitude(lon));
    debug!(
        "{}: local decode {:.5}, {:.5}",
        icao_to_string(msg.header.icao()),
        position.latitude,
        position.longitude
    );
    position
}

/// Wrap a longitude into (-180, 180].
fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = modulo(lon + 180.0, 360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
