//! Decode DF17 frames into typed aircraft messages.
//!
//! Supported Type Codes:
//! - TC 1-4:  Aircraft identification (callsign + emitter category)
//! - TC 9-18: Airborne position (barometric alt + CPR-encoded lat/lon)
//! - TC 19:   Airborne velocity (ground speed subtypes)
//!
//! Every other Type Code yields no message. Field offsets below are
//! positions within the 56-bit ME payload.

use std::ops::Range;
use std::time::Instant;

use log::trace;

use crate::bits;
use crate::frame::{self, Frame, Payload};
use crate::types::*;

// ---------------------------------------------------------------------------
// Payload layout
// ---------------------------------------------------------------------------

const CATEGORY: Range<usize> = 5..8;
const CALLSIGN: Range<usize> = 8..56;
const CALLSIGN_CHARS: usize = 8;

const SURVEILLANCE_STATUS: Range<usize> = 5..7;
const NIC_SUPPLEMENT_B: usize = 7;
const ALTITUDE: Range<usize> = 8..20;
const UTC_SYNC: usize = 20;
const CPR_FORMAT: usize = 21;
const CPR_LAT: Range<usize> = 22..39;
const CPR_LON: Range<usize> = 39..56;

const VELOCITY_SUBTYPE: Range<usize> = 5..8;
const EW_SIGN: usize = 13;
const EW_VELOCITY: Range<usize> = 14..24;
const NS_SIGN: usize = 24;
const NS_VELOCITY: Range<usize> = 25..35;
const VR_SIGN: usize = 36;
const VERTICAL_RATE: Range<usize> = 37..46;

/// Width of the airborne position altitude field.
pub const ALTITUDE_BITS: usize = 12;

// ---------------------------------------------------------------------------
// Altitude decoding
// ---------------------------------------------------------------------------

/// Decode the 12-bit altitude field of an airborne position message.
///
/// Panics if `field` is not exactly 12 bits wide.
pub fn decode_altitude(field: &[u8]) -> Option<i32> {
    assert_eq!(
        field.len(),
        ALTITUDE_BITS,
        "altitude field must be {ALTITUDE_BITS} bits"
    );
    altitude_from_code(bits::to_int(field))
}

/// Decode a 12-bit altitude code.
///
/// Bit layout (MSB first): C1 A1 C2 A2 Q C4 A4 B1 B2 D2 B4 D4.
/// The Q-bit (index 4 from the MSB) selects the encoding:
/// - Q=1: 25-ft resolution
/// - Q=0: 100-ft Gillham gray code
pub fn altitude_from_code(alt_code: u32) -> Option<i32> {
    assert!(alt_code < 1 << ALTITUDE_BITS, "altitude code wider than 12 bits");
    if alt_code == 0 {
        return None;
    }

    let q_bit = (alt_code >> 7) & 1;

    if q_bit == 1 {
        // Drop the Q-bit: 4 bits above it, 7 below
        let n = ((alt_code >> 8) << 7) | (alt_code & 0x7F);
        Some(n as i32 * 25 - 1000)
    } else {
        decode_gillham_altitude(alt_code)
    }
}

/// 100-ft steps within a 500-ft band, indexed by the binary value of C1 C2 C4.
/// 0, 5 and 6 never occur in a valid Gillham code.
const HUNDREDS: [Option<i32>; 8] = [None, Some(1), Some(2), Some(3), Some(4), None, None, Some(5)];

/// Decode 100-ft Gillham gray code altitude.
fn decode_gillham_altitude(alt_code: u32) -> Option<i32> {
    let bit = |n: u32| (alt_code >> n) & 1;

    let (c1, a1, c2, a2) = (bit(11), bit(10), bit(9), bit(8));
    let (c4, a4, b1, b2) = (bit(6), bit(5), bit(4), bit(3));
    let (d2, b4, d4) = (bit(2), bit(1), bit(0));

    // D1 is never transmitted; the 500-ft gray code is D2 D4 A1 A2 A4 B1 B2 B4
    let five_gray = d2 << 7 | d4 << 6 | a1 << 5 | a2 << 4 | a4 << 3 | b1 << 2 | b2 << 1 | b4;
    let one_gray = c1 << 2 | c2 << 1 | c4;

    let five_hundreds = gray_to_binary(five_gray) as i32;
    let mut one_hundreds = HUNDREDS[gray_to_binary(one_gray) as usize]?;

    // Odd 500-ft bands count the 100-ft steps downward
    if five_hundreds % 2 == 1 {
        one_hundreds = 6 - one_hundreds;
    }

    Some(five_hundreds * 500 + one_hundreds * 100 - 1300)
}

/// Reflected binary (Gray) code to plain binary.
fn gray_to_binary(gray: u32) -> u32 {
    let mut bin = gray;
    let mut shift = gray >> 1;
    while shift != 0 {
        bin ^= shift;
        shift >>= 1;
    }
    bin
}

// ---------------------------------------------------------------------------
// Callsign decoding
// ---------------------------------------------------------------------------

/// Decode the 48-bit flight identifier field, trailing spaces removed.
///
/// Panics if `field` is not exactly 48 bits wide.
pub fn decode_callsign(field: &[u8]) -> String {
    assert_eq!(field.len(), CALLSIGN_CHARS * 6, "callsign field must be 48 bits");

    let callsign: String = field
        .chunks(6)
        .map(|chunk| {
            let idx = bits::to_int(chunk) as usize;
            CALLSIGN_CHARSET.get(idx).copied().unwrap_or(b'?') as char
        })
        .collect();

    callsign.trim_end_matches(' ').to_string()
}

// ---------------------------------------------------------------------------
// Message decoders
// ---------------------------------------------------------------------------

fn field(payload: &Payload, range: Range<usize>) -> u32 {
    bits::to_int(&payload[range])
}

/// Decode TC 1-4: Aircraft identification (callsign).
pub fn decode_identification(header: Header, payload: &Payload) -> Identification {
    let ca = field(payload, CATEGORY) as u8;
    let category = EmitterCategory::from_codes(header.type_code(), ca);
    let callsign = decode_callsign(&payload[CALLSIGN]);

    Identification {
        header,
        callsign,
        category,
    }
}

/// Decode TC 9-18: Airborne position.
pub fn decode_airborne_position(header: Header, payload: &Payload) -> AirbornePosition {
    AirbornePosition {
        header,
        surveillance_status: field(payload, SURVEILLANCE_STATUS) as u8,
        nic_supplement_b: payload[NIC_SUPPLEMENT_B] == 1,
        altitude_ft: decode_altitude(&payload[ALTITUDE]),
        utc_sync: payload[UTC_SYNC] == 1,
        cpr_odd: payload[CPR_FORMAT] == 1,
        cpr_lat: field(payload, CPR_LAT),
        cpr_lon: field(payload, CPR_LON),
    }
}

/// Signed velocity component: raw 0 means no data, otherwise raw - 1.
fn signed_component(sign: u8, raw: u32) -> i32 {
    let magnitude = raw.saturating_sub(1) as i32;
    if sign == 1 {
        -magnitude
    } else {
        magnitude
    }
}

/// Decode TC 19: Airborne velocity.
///
/// Only ground speed subtypes (1 and 2) carry data; other subtypes decode to
/// zero speed, heading, and vertical rate.
pub fn decode_velocity(header: Header, payload: &Payload) -> Velocity {
    let subtype = field(payload, VELOCITY_SUBTYPE) as u8;

    if !matches!(subtype, 1 | 2) {
        return Velocity {
            header,
            subtype,
            speed_kts: 0.0,
            heading_deg: 0.0,
            vertical_rate_fpm: 0,
        };
    }

    let v_ew = signed_component(payload[EW_SIGN], field(payload, EW_VELOCITY)) as f64;
    let v_ns = signed_component(payload[NS_SIGN], field(payload, NS_VELOCITY)) as f64;
    let vrate = signed_component(payload[VR_SIGN], field(payload, VERTICAL_RATE)) * 64;

    let speed = v_ew.hypot(v_ns);
    let heading = v_ew.atan2(v_ns).to_degrees().rem_euclid(360.0);

    Velocity {
        header,
        subtype,
        speed_kts: speed,
        // rem_euclid can round up to exactly 360.0 for tiny negative angles
        heading_deg: if heading >= 360.0 { 0.0 } else { heading },
        vertical_rate_fpm: vrate,
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Route a validated frame to the decoder for its Type Code.
pub fn decode_frame(frame: &Frame, timestamp: Instant) -> Result<Message> {
    let header = Header::new(frame.icao, frame.type_code, timestamp);

    match frame.type_code {
        1..=4 => Ok(Message::Identification(decode_identification(
            header,
            &frame.payload,
        ))),
        9..=18 => Ok(Message::AirbornePosition(decode_airborne_position(
            header,
            &frame.payload,
        ))),
        19 => Ok(Message::Velocity(decode_velocity(header, &frame.payload))),
        tc => Err(DecodeError::UnsupportedTypeCode(tc)),
    }
}

/// Decode a 112-bit frame, stamping the given instant.
pub fn try_decode_at(raw: &[u8], timestamp: Instant) -> Result<Message> {
    let frame = frame::parse(raw)?;
    decode_frame(&frame, timestamp)
}

/// Decode a 112-bit frame, stamping the current instant.
pub fn try_decode(raw: &[u8]) -> Result<Message> {
    try_decode_at(raw, Instant::now())
}

/// Decode a 112-bit frame with an explicit timestamp, or `None` if it is
/// malformed, corrupt beyond single-bit repair, or unsupported.
pub fn decode_at(raw: &[u8], timestamp: Instant) -> Option<Message> {
    match try_decode_at(raw, timestamp) {
        Ok(msg) => Some(msg),
        Err(e) => {
            trace!("frame dropped: {e}");
            None
        }
    }
}

/// Decode a 112-bit frame (one element per bit, each 0 or 1).
pub fn decode(raw: &[u8]) -> Option<Message> {
    decode_at(raw, Instant::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
