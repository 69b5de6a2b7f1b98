//! CRC-24 validation for extended squitter frames.
//!
//! ICAO standard polynomial: x^24 + x^23 + x^22 + ... + x^10 + x^3 + 1
//! Generator: 0xFFF409
//!
//! The first 88 bits are divided by the generator and the remainder is XOR'd
//! with the trailing 24 parity bits. A valid DF17 frame leaves remainder 0.

use crate::bits::{self, FRAME_BITS, FRAME_BYTES};

const GENERATOR: u32 = 0xFFF409;

/// Bytes covered by the polynomial division (everything before the parity field).
const DATA_BYTES: usize = FRAME_BYTES - 3;

// ---------------------------------------------------------------------------
// CRC lookup table (compile-time)
// ---------------------------------------------------------------------------

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 16;
        let mut bit = 0;
        while bit < 8 {
            crc <<= 1;
            if crc & 0x1000000 != 0 {
                crc ^= GENERATOR;
            }
            crc &= 0xFFFFFF;
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = build_crc_table();

// ---------------------------------------------------------------------------
// Core CRC functions
// ---------------------------------------------------------------------------

/// 24-bit parity a transmitter appends after `data`.
///
/// Plain polynomial division of every byte given.
pub fn parity(data: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &byte in data {
        crc = ((crc << 8) ^ CRC_TABLE[((crc >> 16) ^ byte as u32) as usize & 0xFF]) & 0xFFFFFF;
    }
    crc
}

/// CRC-24 remainder of a packed 112-bit frame. Returns 0 when valid.
pub fn crc24(data: &[u8; FRAME_BYTES]) -> u32 {
    let crc = parity(&data[..DATA_BYTES]);
    crc ^ ((data[DATA_BYTES] as u32) << 16
        | (data[DATA_BYTES + 1] as u32) << 8
        | data[DATA_BYTES + 2] as u32)
}

/// True if the frame's CRC remainder is zero.
pub fn check(frame: &[u8; FRAME_BITS]) -> bool {
    crc24(&bits::frame_bytes(frame)) == 0
}

// ---------------------------------------------------------------------------
// Single-bit error correction
// ---------------------------------------------------------------------------

/// A frame that passed CRC, possibly after repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub bits: [u8; FRAME_BITS],
    /// Index of the repaired bit, `None` if the frame was already valid.
    pub flipped: Option<usize>,
}

/// Validate a frame, retrying with each single bit flipped in turn.
///
/// The first flip that passes CRC wins. Bits 0-4 (DF field) are included.
/// Two or more bit errors are never corrected.
pub fn correct(frame: &[u8; FRAME_BITS]) -> Option<Correction> {
    let mut bytes = bits::frame_bytes(frame);
    if crc24(&bytes) == 0 {
        return Some(Correction {
            bits: *frame,
            flipped: None,
        });
    }

    for bit in 0..FRAME_BITS {
        let mask = 1 << (7 - (bit % 8));
        bytes[bit / 8] ^= mask;
        if crc24(&bytes) == 0 {
            let mut fixed = *frame;
            fixed[bit] ^= 1;
            return Some(Correction {
                bits: fixed,
                flipped: Some(bit),
            });
        }
        bytes[bit / 8] ^= mask;
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{from_hex, hex_decode};

    const VALID_FRAMES: &[&str] = &[
        "8D4840D6202CC371C32CE0576098",
        "8D40621D58C382D690C8AC2863A7",
        "8D485020994409940838175B284F",
    ];

    fn frame(hex: &str) -> [u8; FRAME_BITS] {
        from_hex(hex).unwrap().try_into().unwrap()
    }

    /// Bit-serial shift register, one shift per bit.
    fn crc24_bitwise(data: &[u8; FRAME_BYTES]) -> u32 {
        let mut crc = 0u32;
        for &byte in &data[..DATA_BYTES] {
            crc ^= (byte as u32) << 16;
            for _ in 0..8 {
                crc <<= 1;
                if crc & 0x1000000 != 0 {
                    crc ^= GENERATOR;
                }
            }
        }
        crc ^= (data[11] as u32) << 16;
        crc ^= (data[12] as u32) << 8;
        crc ^= data[13] as u32;
        crc & 0xFFFFFF
    }

    #[test]
    fn test_crc_table_entry_zero() {
        assert_eq!(CRC_TABLE[0], 0);
    }

    #[test]
    fn test_crc_table_entry_one() {
        // 0x01 reaches bit 24 on the eighth shift
        assert_eq!(CRC_TABLE[1], GENERATOR);
    }

    #[test]
    fn test_valid_df17_remainder_zero() {
        for hex in VALID_FRAMES {
            let data: [u8; FRAME_BYTES] = hex_decode(hex).unwrap().try_into().unwrap();
            assert_eq!(crc24(&data), 0, "CRC should be 0 for valid DF17: {hex}");
        }
    }

    #[test]
    fn test_table_matches_shift_register() {
        let mut data: [u8; FRAME_BYTES] = hex_decode(VALID_FRAMES[1]).unwrap().try_into().unwrap();
        for i in 0..FRAME_BYTES {
            data[i] = data[i].wrapping_mul(31).wrapping_add(i as u8);
            assert_eq!(crc24(&data), crc24_bitwise(&data));
        }
    }

    #[test]
    fn test_parity_matches_trailer() {
        let data = hex_decode(VALID_FRAMES[0]).unwrap();
        let pi = (data[11] as u32) << 16 | (data[12] as u32) << 8 | data[13] as u32;
        assert_eq!(parity(&data[..11]), pi);
    }

    #[test]
    fn test_check() {
        for hex in VALID_FRAMES {
            assert!(check(&frame(hex)));
        }
        let mut bad = frame(VALID_FRAMES[0]);
        bad[40] ^= 1;
        assert!(!check(&bad));
    }

    #[test]
    fn test_correct_already_valid() {
        let bits = frame(VALID_FRAMES[0]);
        let fixed = correct(&bits).unwrap();
        assert_eq!(fixed.flipped, None);
        assert_eq!(fixed.bits, bits);
    }

    #[test]
    fn test_correct_every_single_bit() {
        let bits = frame(VALID_FRAMES[2]);
        for i in 0..FRAME_BITS {
            let mut corrupted = bits;
            corrupted[i] ^= 1;
            let fixed = correct(&corrupted).expect("single-bit error is correctable");
            assert_eq!(fixed.flipped, Some(i));
            assert_eq!(fixed.bits, bits);
        }
    }

    #[test]
    fn test_correct_df_field() {
        let bits = frame(VALID_FRAMES[0]);
        let mut corrupted = bits;
        corrupted[0] ^= 1;
        assert_eq!(correct(&corrupted).unwrap().bits, bits);
    }

    #[test]
    fn test_double_bit_errors_rejected() {
        let bits = frame(VALID_FRAMES[1]);
        for i in 0..FRAME_BITS {
            for j in (i + 1)..FRAME_BITS {
                let mut corrupted = bits;
                corrupted[i] ^= 1;
                corrupted[j] ^= 1;
                assert!(
                    correct(&corrupted).is_none(),
                    "double flip ({i}, {j}) was miscorrected"
                );
            }
        }
    }
}
