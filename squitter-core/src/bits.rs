//! Bit-sequence helpers.
//!
//! Frames arrive as one `u8` per bit (0 or 1), most-significant bit first.

use crate::types::DecodeError;

/// Bits in a DF17 extended squitter.
pub const FRAME_BITS: usize = 112;

/// Bytes in a DF17 extended squitter.
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

/// Read a run of bits as an unsigned integer, MSB first.
///
/// Panics if the run is wider than 32 bits.
pub fn to_int(bits: &[u8]) -> u32 {
    assert!(bits.len() <= 32, "bit field of {} bits exceeds u32", bits.len());
    bits.iter().fold(0u32, |n, &b| (n << 1) | (b & 1) as u32)
}

/// Check that every element is 0 or 1.
pub fn validate(bits: &[u8]) -> Result<(), DecodeError> {
    match bits.iter().position(|&b| b > 1) {
        Some(index) => Err(DecodeError::NonBinary {
            index,
            value: bits[index],
        }),
        None => Ok(()),
    }
}

/// Pack bits into bytes, MSB first. Trailing bits short of a byte are zero-padded.
pub fn to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &b)| byte | ((b & 1) << (7 - i)))
        })
        .collect()
}

/// Pack a full frame into its 14 bytes.
pub fn frame_bytes(bits: &[u8; FRAME_BITS]) -> [u8; FRAME_BYTES] {
    let mut bytes = [0u8; FRAME_BYTES];
    for (i, &b) in bits.iter().enumerate() {
        bytes[i / 8] |= (b & 1) << (7 - (i % 8));
    }
    bytes
}

/// Expand bytes into one element per bit, MSB first.
pub fn from_bytes(data: &[u8]) -> Vec<u8> {
    data.iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect()
}

/// Expand a hex string into bits. Case-insensitive, must be even length.
pub fn from_hex(hex: &str) -> Option<Vec<u8>> {
    hex_decode(hex).map(|data| from_bytes(&data))
}

/// Parse a string of `0`/`1` characters.
pub fn from_binary_str(s: &str) -> Option<Vec<u8>> {
    s.trim()
        .bytes()
        .map(|c| match c {
            b'0' => Some(0),
            b'1' => Some(1),
            _ => None,
        })
        .collect()
}

/// Render bits as a hex string (uppercase).
pub fn to_hex(bits: &[u8]) -> String {
    hex_encode(&to_bytes(bits))
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| Some((hex_digit(pair[0])? << 4) | hex_digit(pair[1])?))
        .collect()
}

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
