//! Shared types, error enums, and decoded message types for squitter-core.

use std::fmt;
use std::time::Instant;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Reasons a frame produced no message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid frame length: expected {expected} bits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("non-binary value {value} at bit {index}")]
    NonBinary { index: usize, value: u8 },
    #[error("CRC validation failed")]
    CrcFailed,
    #[error("unsupported downlink format: {0}")]
    UnsupportedDf(u8),
    #[error("unsupported type code: {0}")]
    UnsupportedTypeCode(u8),
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
}

/// Reasons a CPR pair could not be resolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CprError {
    #[error("both position messages have the same CPR parity")]
    SameParity,
    #[error("position messages are {elapsed_ms} ms apart")]
    StalePair { elapsed_ms: u128 },
    #[error("even and odd latitudes fall in different longitude zone bands")]
    ZoneMismatch,
    #[error("no longitude zones at resolved latitude (NL={nl})")]
    DegenerateLatitude { nl: i32 },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

// ---------------------------------------------------------------------------
// ICAO address helpers
// ---------------------------------------------------------------------------

/// 3-byte ICAO address.
pub type Icao = [u8; 3];

/// Format ICAO address as 6-char lowercase hex string.
pub fn icao_to_string(icao: &Icao) -> String {
    format!("{:02x}{:02x}{:02x}", icao[0], icao[1], icao[2])
}

/// Parse a 6-char hex string into an ICAO address.
pub fn icao_from_hex(hex: &str) -> Option<Icao> {
    if hex.len() != 6 {
        return None;
    }
    let val = u32::from_str_radix(hex, 16).ok()?;
    Some(icao_from_u32(val))
}

/// Convert ICAO bytes to the 24-bit integer value.
pub fn icao_to_u32(icao: &Icao) -> u32 {
    ((icao[0] as u32) << 16) | ((icao[1] as u32) << 8) | (icao[2] as u32)
}

/// Build ICAO from a 24-bit integer.
pub fn icao_from_u32(val: u32) -> Icao {
    [
        ((val >> 16) & 0xFF) as u8,
        ((val >> 8) & 0xFF) as u8,
        (val & 0xFF) as u8,
    ]
}

fn serialize_icao<S: Serializer>(icao: &Icao, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&icao_to_string(icao))
}

// ---------------------------------------------------------------------------
// Flight identifier character set
// ---------------------------------------------------------------------------

/// 6-bit flight identifier alphabet. `?` marks codes with no assigned character.
pub const CALLSIGN_CHARSET: &[u8; 64] =
    b"?ABCDEFGHIJKLMNOPQRSTUVWXYZ????? ???????????????0123456789??????";

// ---------------------------------------------------------------------------
// Emitter category
// ---------------------------------------------------------------------------

/// Aircraft/vehicle class announced in identification messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmitterCategory {
    NoCategory,
    Light,
    Small,
    Large,
    HighVortexLarge,
    Heavy,
    HighPerformance,
    Rotorcraft,
    Glider,
    LighterThanAir,
    Parachutist,
    Ultralight,
    Uav,
    SpaceVehicle,
    SurfaceEmergencyVehicle,
    SurfaceServiceVehicle,
    PointObstacle,
    ClusterObstacle,
    LineObstacle,
    Unknown,
}

impl EmitterCategory {
    /// Block offset into [`CATEGORY_TABLE`] selected by the type code.
    ///
    /// TC 1 is set D, TC 2 set C, TC 3 set B, TC 4 set A.
    pub fn offset(type_code: u8) -> Option<usize> {
        match type_code {
            1 => Some(0),
            2 => Some(8),
            3 => Some(16),
            4 => Some(24),
            _ => None,
        }
    }

    /// Look up the category for a type code and 3-bit category code.
    pub fn from_codes(type_code: u8, ca: u8) -> EmitterCategory {
        match Self::offset(type_code) {
            Some(offset) if ca < 8 => CATEGORY_TABLE[offset + ca as usize],
            _ => EmitterCategory::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmitterCategory::NoCategory => "No Category",
            EmitterCategory::Light => "Light",
            EmitterCategory::Small => "Small",
            EmitterCategory::Large => "Large",
            EmitterCategory::HighVortexLarge => "High Vortex",
            EmitterCategory::Heavy => "Heavy",
            EmitterCategory::HighPerformance => "High Performance",
            EmitterCategory::Rotorcraft => "Rotorcraft",
            EmitterCategory::Glider => "Glider",
            EmitterCategory::LighterThanAir => "Lighter-than-air",
            EmitterCategory::Parachutist => "Parachutist",
            EmitterCategory::Ultralight => "Ultralight",
            EmitterCategory::Uav => "UAV",
            EmitterCategory::SpaceVehicle => "Space Vehicle",
            EmitterCategory::SurfaceEmergencyVehicle => "Surface Emergency Vehicle",
            EmitterCategory::SurfaceServiceVehicle => "Surface Service Vehicle",
            EmitterCategory::PointObstacle => "Point Obstacle",
            EmitterCategory::ClusterObstacle => "Cluster Obstacle",
            EmitterCategory::LineObstacle => "Line Obstacle",
            EmitterCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EmitterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use EmitterCategory as Ec;

/// Four 8-entry blocks (sets D, C, B, A) indexed by `offset + ca`.
#[rustfmt::skip]
pub const CATEGORY_TABLE: [EmitterCategory; 32] = [
    // Set D (TC 1): reserved apart from code 0
    Ec::NoCategory, Ec::Unknown, Ec::Unknown, Ec::Unknown,
    Ec::Unknown, Ec::Unknown, Ec::Unknown, Ec::Unknown,
    // Set C (TC 2)
    Ec::NoCategory, Ec::SurfaceEmergencyVehicle, Ec::SurfaceServiceVehicle, Ec::PointObstacle,
    Ec::ClusterObstacle, Ec::LineObstacle, Ec::Unknown, Ec::Unknown,
    // Set B (TC 3)
    Ec::NoCategory, Ec::Glider, Ec::LighterThanAir, Ec::Parachutist,
    Ec::Ultralight, Ec::Unknown, Ec::Uav, Ec::SpaceVehicle,
    // Set A (TC 4)
    Ec::NoCategory, Ec::Light, Ec::Small, Ec::Large,
    Ec::HighVortexLarge, Ec::Heavy, Ec::HighPerformance, Ec::Rotorcraft,
];

// ---------------------------------------------------------------------------
// Decoded message types
// ---------------------------------------------------------------------------

/// Fields common to every decoded message. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    #[serde(serialize_with = "serialize_icao")]
    icao: Icao,
    type_code: u8,
    #[serde(skip)]
    timestamp: Instant,
}

impl Header {
    pub(crate) fn new(icao: Icao, type_code: u8, timestamp: Instant) -> Self {
        Header {
            icao,
            type_code,
            timestamp,
        }
    }

    pub fn icao(&self) -> &Icao {
        &self.icao
    }

    /// ICAO address as 6 lowercase hex digits.
    pub fn icao_hex(&self) -> String {
        icao_to_string(&self.icao)
    }

    pub fn type_code(&self) -> u8 {
        self.type_code
    }

    /// Monotonic instant the message was decoded.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ADSB] ICAO: {} | TC: {:2}",
            icao_to_string(&self.icao),
            self.type_code
        )
    }
}

/// TC 1-4: Aircraft identification and category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    #[serde(flatten)]
    pub header: Header,
    /// Flight identifier with trailing spaces removed.
    pub callsign: String,
    pub category: EmitterCategory,
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Flight Name: {} | Category: {}",
            self.header, self.callsign, self.category
        )
    }
}

/// TC 9-18: Airborne position with barometric altitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirbornePosition {
    #[serde(flatten)]
    pub header: Header,
    pub surveillance_status: u8,
    pub nic_supplement_b: bool,
    /// `None` when the altitude code cannot be decoded.
    pub altitude_ft: Option<i32>,
    pub utc_sync: bool,
    pub cpr_odd: bool,
    pub cpr_lat: u32,
    pub cpr_lon: u32,
}

impl fmt::Display for AirbornePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;
        match self.altitude_ft {
            Some(alt) => write!(f, " | Alt: {alt} ft")?,
            None => write!(f, " | Alt: unknown")?,
        }
        write!(
            f,
            " | Frame: {} | CPR Lat: {} | CPR Lon: {}",
            if self.cpr_odd { "Odd" } else { "Even" },
            self.cpr_lat,
            self.cpr_lon
        )
    }
}

/// TC 19: Airborne velocity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Velocity {
    #[serde(flatten)]
    pub header: Header,
    pub subtype: u8,
    pub speed_kts: f64,
    /// Track angle in [0, 360).
    pub heading_deg: f64,
    pub vertical_rate_fpm: i32,
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Speed: {:.1} kn | Hdg: {:.1} deg | VRate: {} ft/min",
            self.header, self.speed_kts, self.heading_deg, self.vertical_rate_fpm
        )
    }
}

/// Union type for all decoded messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Message {
    Identification(Identification),
    AirbornePosition(AirbornePosition),
    Velocity(Velocity),
}

impl Message {
    pub fn header(&self) -> &Header {
        match self {
            Message::Identification(m) => &m.header,
            Message::AirbornePosition(m) => &m.header,
            Message::Velocity(m) => &m.header,
        }
    }

    pub fn icao(&self) -> &Icao {
        self.header().icao()
    }

    pub fn type_code(&self) -> u8 {
        self.header().type_code()
    }

    pub fn timestamp(&self) -> Instant {
        self.header().timestamp()
    }

    pub fn as_position(&self) -> Option<&AirbornePosition> {
        match self {
            Message::AirbornePosition(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Identification(m) => m.fmt(f),
            Message::AirbornePosition(m) => m.fmt(f),
            Message::Velocity(m) => m.fmt(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }
}

/// Outcome of a CPR resolution. `position` is zero and meaningless when
/// `is_valid` is false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PositionResult {
    pub position: Position,
    pub is_valid: bool,
}

impl From<std::result::Result<Position, CprError>> for PositionResult {
    fn from(res: std::result::Result<Position, CprError>) -> Self {
        match res {
            Ok(position) => PositionResult {
                position,
                is_valid: true,
            },
            Err(_) => PositionResult::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icao_roundtrip() {
        let icao = icao_from_hex("4840d6").unwrap();
        assert_eq!(icao, [0x48, 0x40, 0xD6]);
        assert_eq!(icao_to_string(&icao), "4840d6");
    }

    #[test]
    fn test_icao_zero_padded() {
        assert_eq!(icao_to_string(&icao_from_u32(0x00A1F)), "000a1f");
    }

    #[test]
    fn test_icao_to_u32() {
        assert_eq!(icao_to_u32(&[0xA0, 0x00, 0x01]), 0xA00001);
    }

    #[test]
    fn test_category_blocks() {
        assert_eq!(EmitterCategory::from_codes(4, 5), EmitterCategory::Heavy);
        assert_eq!(EmitterCategory::from_codes(4, 7), EmitterCategory::Rotorcraft);
        assert_eq!(EmitterCategory::from_codes(3, 1), EmitterCategory::Glider);
        assert_eq!(EmitterCategory::from_codes(3, 6), EmitterCategory::Uav);
        assert_eq!(
            EmitterCategory::from_codes(2, 1),
            EmitterCategory::SurfaceEmergencyVehicle
        );
        assert_eq!(EmitterCategory::from_codes(1, 0), EmitterCategory::NoCategory);
    }

    #[test]
    fn test_category_reserved_is_unknown() {
        assert_eq!(EmitterCategory::from_codes(1, 3), EmitterCategory::Unknown);
        assert_eq!(EmitterCategory::from_codes(3, 5), EmitterCategory::Unknown);
        assert_eq!(EmitterCategory::from_codes(2, 7), EmitterCategory::Unknown);
        assert_eq!(EmitterCategory::from_codes(11, 0), EmitterCategory::Unknown);
    }

    #[test]
    fn test_header_display() {
        let header = Header::new([0x48, 0x40, 0xD6], 4, Instant::now());
        assert_eq!(header.to_string(), "[ADSB] ICAO: 4840d6 | TC:  4");
    }

    #[test]
    fn test_position_result_from_error() {
        let res = PositionResult::from(Err(CprError::SameParity));
        assert!(!res.is_valid);
        assert_eq!(res.position, Position::default());
    }
}
