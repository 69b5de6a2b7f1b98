//! Read frame captures from text files.
//!
//! One frame per line, in any of:
//! - plain hex (28 digits), as produced by `rtl_adsb` and similar tools
//! - dump1090 raw format (`*hex;`)
//! - 112 characters of `0`/`1`

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use squitter_core::bits::{self, FRAME_BITS};

/// Hex digits in a 112-bit frame.
const FRAME_HEX_DIGITS: usize = FRAME_BITS / 4;

/// A frame read from a capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// 1-based line number in the source file.
    pub line: usize,
    pub bits: Vec<u8>,
}

/// Reads frames from a capture file.
pub struct FrameReader {
    path: PathBuf,
}

impl FrameReader {
    pub fn new(path: &Path) -> Self {
        FrameReader {
            path: path.to_path_buf(),
        }
    }

    /// Read all frames, skipping blank lines and comments. Lines that don't
    /// hold a frame are logged and skipped.
    pub fn read_all(&self) -> std::io::Result<Vec<RawFrame>> {
        let content = fs::read_to_string(&self.path)?;
        let mut frames = Vec::new();

        for (i, line) in content.lines().enumerate() {
            match clean_line(line) {
                Line::Frame(bits) => frames.push(RawFrame { line: i + 1, bits }),
                Line::Invalid => warn!("{}:{}: not a 112-bit frame", self.path.display(), i + 1),
                Line::Skip => {}
            }
        }

        Ok(frames)
    }
}

/// Classification of one line of a capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank or comment.
    Skip,
    Frame(Vec<u8>),
    Invalid,
}

/// Extract frame bits from a line.
pub fn clean_line(line: &str) -> Line {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Line::Skip;
    }
    match parse_frame_text(line) {
        Some(bits) => Line::Frame(bits),
        None => Line::Invalid,
    }
}

/// Parse one frame in hex, dump1090, or binary-digit form.
pub fn parse_frame_text(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    let text = text
        .strip_prefix('*')
        .and_then(|t| t.strip_suffix(';'))
        .unwrap_or(text);

    match text.len() {
        FRAME_BITS => bits::from_binary_str(text),
        FRAME_HEX_DIGITS => bits::from_hex(text),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const KLM: &str = "8D4840D6202CC371C32CE0576098";

    #[test]
    fn test_parse_plain_hex() {
        let bits = parse_frame_text(KLM).unwrap();
        assert_eq!(bits.len(), FRAME_BITS);
        assert_eq!(bits::to_hex(&bits), KLM);
    }

    #[test]
    fn test_parse_dump1090() {
        assert_eq!(parse_frame_text(&format!("*{KLM};")), parse_frame_text(KLM));
    }

    #[test]
    fn test_parse_lowercase() {
        assert_eq!(
            parse_frame_text(&KLM.to_lowercase()),
            parse_frame_text(KLM)
        );
    }

    #[test]
    fn test_parse_binary_digits() {
        let binary: String = parse_frame_text(KLM)
            .unwrap()
            .iter()
            .map(|b| if *b == 1 { '1' } else { '0' })
            .collect();
        assert_eq!(parse_frame_text(&binary), parse_frame_text(KLM));
    }

    #[test]
    fn test_parse_rejects_short_frames() {
        assert!(parse_frame_text("02E197C845AC82").is_none());
        assert!(parse_frame_text("8D4840").is_none());
    }

    #[test]
    fn test_clean_line_comment_and_blank() {
        assert_eq!(clean_line("# comment"), Line::Skip);
        assert_eq!(clean_line("   "), Line::Skip);
        assert_eq!(clean_line("not a frame"), Line::Invalid);
        assert!(matches!(clean_line(KLM), Line::Frame(_)));
    }

    #[test]
    fn test_read_all() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# capture").unwrap();
        writeln!(file, "{KLM}").unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "*8D40621D58C382D690C8AC2863A7;").unwrap();

        let frames = FrameReader::new(file.path()).read_all().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].line, 2);
        assert_eq!(frames[1].line, 5);
    }
}
