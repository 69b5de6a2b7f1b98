//! Validate raw bit sequences and extract the DF17 frame header.
//!
//! Responsibilities:
//! - Reject input that is not exactly 112 binary digits
//! - Validate CRC-24, repairing a single flipped bit if needed
//! - Accept only Downlink Format 17 (ADS-B extended squitter)
//! - Extract ICAO address, Type Code, and the 56-bit ME payload

use std::ops::Range;

use log::debug;

use crate::bits::{self, FRAME_BITS};
use crate::crc;
use crate::types::{icao_from_u32, icao_to_string, DecodeError, Icao, Result};

/// Downlink Format of an ADS-B extended squitter.
pub const DF_EXTENDED_SQUITTER: u8 = 17;

/// Bits in the ME (message, extended squitter) payload.
pub const PAYLOAD_BITS: usize = 56;

const DF_BITS: Range<usize> = 0..5;
const ICAO_BITS: Range<usize> = 8..32;
const TYPE_CODE_BITS: Range<usize> = 32..37;
const PAYLOAD_RANGE: Range<usize> = 32..88;

/// The 56-bit ME field, one element per bit.
pub type Payload = [u8; PAYLOAD_BITS];

/// A CRC-valid DF17 frame, split into header fields and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub df: u8,
    pub icao: Icao,
    pub type_code: u8,
    pub payload: Payload,
    /// Bit index repaired by single-bit correction, if any.
    pub corrected: Option<usize>,
}

impl Frame {
    /// Read a field of the payload, MSB first.
    pub fn field(&self, range: Range<usize>) -> u32 {
        bits::to_int(&self.payload[range])
    }
}

/// Validate and split a 112-bit frame.
pub fn parse(raw: &[u8]) -> Result<Frame> {
    if raw.len() != FRAME_BITS {
        return Err(DecodeError::InvalidLength {
            expected: FRAME_BITS,
            actual: raw.len(),
        });
    }
    bits::validate(raw)?;

    let mut frame = [0u8; FRAME_BITS];
    frame.copy_from_slice(raw);

    let fixed = crc::correct(&frame).ok_or(DecodeError::CrcFailed)?;
    let frame = fixed.bits;

    let df = bits::to_int(&frame[DF_BITS]) as u8;
    if df != DF_EXTENDED_SQUITTER {
        return Err(DecodeError::UnsupportedDf(df));
    }

    let icao = icao_from_u32(bits::to_int(&frame[ICAO_BITS]));
    let type_code = bits::to_int(&frame[TYPE_CODE_BITS]) as u8;

    if let Some(bit) = fixed.flipped {
        debug!("{}: corrected single-bit error at bit {bit}", icao_to_string(&icao));
    }

    let mut payload = [0u8; PAYLOAD_BITS];
    payload.copy_from_slice(&frame[PAYLOAD_RANGE]);

    Ok(Frame {
        df,
        icao,
        type_code,
        payload,
        corrected: fixed.flipped,
    })
}

/// Parse a 28-digit hex frame.
pub fn parse_hex(hex: &str) -> Result<Frame> {
    let raw = bits::from_hex(hex).ok_or_else(|| DecodeError::InvalidHex(hex.to_string()))?;
    parse(&raw)
}

// ---------------------------------------------------------------------------
// Test frame builder
// ---------------------------------------------------------------------------

/// Assemble a DF17 frame (CA=5) from an ICAO address and a 56-bit ME field,
/// appending correct parity.
#[cfg(test)]
pub(crate) fn build_frame(icao: u32, me: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(14);
    data.push((DF_EXTENDED_SQUITTER << 3) | 5);
    data.extend_from_slice(&icao_from_u32(icao));
    data.extend_from_slice(&me.to_be_bytes()[1..]);
    let pi = crc::parity(&data);
    data.extend_from_slice(&[(pi >> 16) as u8, (pi >> 8) as u8, pi as u8]);
    bits::from_bytes(&data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_df17_identification() {
        let frame = parse_hex("8D4840D6202CC371C32CE0576098").unwrap();
        assert_eq!(frame.df, 17);
        assert_eq!(icao_to_string(&frame.icao), "4840d6");
        assert_eq!(frame.type_code, 4);
        assert_eq!(frame.corrected, None);
    }

    #[test]
    fn test_parse_df17_position() {
        let frame = parse_hex("8D40621D58C382D690C8AC2863A7").unwrap();
        assert_eq!(icao_to_string(&frame.icao), "40621d");
        assert_eq!(frame.type_code, 11);
    }

    #[test]
    fn test_parse_df17_velocity() {
        let frame = parse_hex("8D485020994409940838175B284F").unwrap();
        assert_eq!(icao_to_string(&frame.icao), "485020");
        assert_eq!(frame.type_code, 19);
        assert_eq!(frame.field(5..8), 1);
    }

    #[test]
    fn test_parse_invalid_length() {
        assert_eq!(
            parse(&[0u8; 56]),
            Err(DecodeError::InvalidLength {
                expected: 112,
                actual: 56
            })
        );
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_parse_non_binary() {
        let mut raw = bits::from_hex("8D4840D6202CC371C32CE0576098").unwrap();
        raw[50] = 7;
        assert_eq!(
            parse(&raw),
            Err(DecodeError::NonBinary {
                index: 50,
                value: 7
            })
        );
    }

    #[test]
    fn test_parse_invalid_hex() {
        assert!(matches!(
            parse_hex("ZZZZZZZZZZZZZZZZZZZZZZZZZZZZ"),
            Err(DecodeError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_df17() {
        // DF11 all-call reply padded to 112 bits with valid DF17-style parity
        let mut data = vec![0x5D, 0x48, 0x40, 0xD6, 0, 0, 0, 0, 0, 0, 0];
        let pi = crc::parity(&data);
        data.extend_from_slice(&[(pi >> 16) as u8, (pi >> 8) as u8, pi as u8]);
        assert_eq!(
            parse(&bits::from_bytes(&data)),
            Err(DecodeError::UnsupportedDf(11))
        );
    }

    #[test]
    fn test_error_correction() {
        let mut raw = bits::from_hex("8D4840D6202CC371C32CE0576098").unwrap();
        raw[40] ^= 1;
        let frame = parse(&raw).unwrap();
        assert_eq!(frame.corrected, Some(40));
        assert_eq!(frame, Frame {
            corrected: Some(40),
            ..parse_hex("8D4840D6202CC371C32CE0576098").unwrap()
        });
    }

    #[test]
    fn test_uncorrectable() {
        let mut raw = bits::from_hex("8D4840D6202CC371C32CE0576098").unwrap();
        raw[40] ^= 1;
        raw[70] ^= 1;
        assert_eq!(parse(&raw), Err(DecodeError::CrcFailed));
    }

    #[test]
    fn test_build_frame_matches_known() {
        let raw = build_frame(0x4840D6, 0x202CC371C32CE0);
        assert_eq!(bits::to_hex(&raw), "8D4840D6202CC371C32CE0576098");
    }
}
