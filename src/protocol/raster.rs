//! # Raster Line Encoding
//!
//! Every transmitted raster line covers the full 128-dot print head, even
//! when the installed tape is narrower. The scanline is shifted so that its
//! dots land in the printable window of the tape, then PackBits-compressed
//! and length-prefixed.
//!
//! ## Margin Handling
//!
//! The scanline is treated as one big-endian integer and shifted left by the
//! tape's right margin. Serializing the result into the 16-byte head buffer
//! realizes the left margin implicitly (leading zero bytes).
//!
//! ```text
//! 24mm tape (no margins):   [ ................ 128 dots ................ ]
//! 12mm tape:                [ 29 blank ][ ....... 70 dots ....... ][ 29 ]
//! ```
//!
//! ## Wire Format
//!
//! | Bytes | Meaning |
//! |-------|---------|
//! | 2 | payload length, little-endian |
//! | n | payload (PackBits or raw) |
//!
//! The raster-transfer marker `G` is prepended by [`super::commands::raster_line`].

use tracing::trace;

use super::packbits;
use super::tables::TapeInfo;
use crate::error::{PtouchError, Result};
use crate::printer::PrinterConfig;

/// Print head width in dots
pub const HEAD_DOTS: u32 = PrinterConfig::PT_P700.head_dots as u32;

/// Print head width in bytes
pub const HEAD_BYTES: usize = PrinterConfig::PT_P700.head_bytes as usize;

/// # Encoded Raster Line
///
/// Length prefix plus payload, ready to follow a raster-transfer marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLine {
    pub length_prefix: u16,
    pub payload: Vec<u8>,
}

impl EncodedLine {
    fn new(payload: Vec<u8>) -> Result<Self> {
        let length_prefix =
            u16::try_from(payload.len()).map_err(|_| PtouchError::EncodingOverflow(payload.len()))?;
        Ok(Self {
            length_prefix,
            payload,
        })
    }

    /// Prefix and payload as they go on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.payload.len());
        out.extend(self.length_prefix.to_le_bytes());
        out.extend(&self.payload);
        out
    }
}

/// Place a scanline into the 16-byte head buffer.
///
/// The line's bytes are read as a big-endian integer and shifted left by
/// `tape.right_margin`. Bits pushed past the head width are dropped and the
/// buffer is zero-extended on the left.
///
/// ## Example
///
/// ```
/// use ptouch::protocol::{raster, tables};
///
/// let tape = tables::tape_info(18).unwrap().unwrap(); // 8 dot margins
/// let head = raster::pad_line(&[0xFF; 14], &tape);
/// assert_eq!(head[0], 0x00);
/// assert_eq!(head[15], 0x00);
/// assert_eq!(&head[1..15], &[0xFF; 14]);
/// ```
pub fn pad_line(line: &[u8], tape: &TapeInfo) -> [u8; HEAD_BYTES] {
    let value = line
        .iter()
        .fold(0u128, |acc, &b| acc.wrapping_shl(8) | u128::from(b));

    value
        .checked_shl(u32::from(tape.right_margin))
        .unwrap_or(0)
        .to_be_bytes()
}

/// Encode one scanline as a PackBits-compressed raster line.
///
/// ## Errors
///
/// `EncodingOverflow` if the payload does not fit the 16-bit length prefix.
///
/// ## Example
///
/// ```
/// use ptouch::protocol::{raster, tables};
///
/// let tape = tables::tape_info(24).unwrap().unwrap();
/// let line = raster::encode_line(&[0u8; 16], &tape).unwrap();
/// assert_eq!(line.to_bytes(), vec![0x02, 0x00, 0xF1, 0x00]);
/// ```
pub fn encode_line(line: &[u8], tape: &TapeInfo) -> Result<EncodedLine> {
    let padded = pad_line(line, tape);
    let compressed = packbits::encode(&padded);
    trace!(?padded, ?compressed, "encoded raster line");
    EncodedLine::new(compressed)
}

/// Encode one scanline without compression (compression mode off).
pub fn encode_line_uncompressed(line: &[u8], tape: &TapeInfo) -> Result<EncodedLine> {
    EncodedLine::new(pad_line(line, tape).to_vec())
}

/// Reverse [`encode_line`]: unpack the payload and shift the head buffer
/// back by the right margin.
///
/// Returns `(padded, unshifted)`: the 16-byte head buffer as transmitted and
/// the same buffer shifted right by `tape.right_margin`.
pub fn decode_line(line: &EncodedLine, tape: &TapeInfo) -> Result<([u8; HEAD_BYTES], [u8; HEAD_BYTES])> {
    let unpacked = packbits::decode(&line.payload)?;
    let padded: [u8; HEAD_BYTES] = unpacked.as_slice().try_into().map_err(|_| {
        PtouchError::MalformedPayload(format!(
            "raster line unpacks to {} bytes, expected {}",
            unpacked.len(),
            HEAD_BYTES
        ))
    })?;

    let unshifted = u128::from_be_bytes(padded)
        .checked_shr(u32::from(tape.right_margin))
        .unwrap_or(0)
        .to_be_bytes();

    Ok((padded, unshifted))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tables::{tape_info, TAPE_WIDTHS};
    use pretty_assertions::assert_eq;

    fn tape(code: u8) -> TapeInfo {
        tape_info(code).unwrap().unwrap()
    }

    #[test]
    fn test_head_buffer_matches_printer() {
        let config = PrinterConfig::PT_P700;
        assert_eq!(HEAD_DOTS, u32::from(config.head_dots));
        assert_eq!(pad_line(&[0xFF], &tape(24)).len(), usize::from(config.head_bytes));
        assert_eq!(HEAD_BYTES * 8, HEAD_DOTS as usize);
    }

    #[test]
    fn test_blank_line_is_single_run() {
        let line = encode_line(&[0u8; 16], &tape(24)).unwrap();
        assert_eq!(line.length_prefix, 2);
        assert_eq!(line.payload, vec![0xF1, 0x00]);
    }

    #[test]
    fn test_full_width_no_shift() {
        let row: Vec<u8> = (0..16).collect();
        assert_eq!(pad_line(&row, &tape(24)).to_vec(), row);
    }

    #[test]
    fn test_12mm_margin_shift() {
        // 70 dots = 9 bytes, last 2 bits padding
        let row = [0xFFu8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC];
        let padded = pad_line(&row, &tape(12));
        let value = u128::from_be_bytes(padded);

        // 70 set dots starting after 29 dots of right margin + 2 padding bits
        assert_eq!(value.count_ones(), 70);
        assert_eq!(value.trailing_zeros(), 29 + 2);
        assert_eq!(value.leading_zeros(), 128 - 29 - 72);
    }

    #[test]
    fn test_overlong_line_is_truncated() {
        let mut row = vec![0xAAu8; 17];
        row[0] = 0xFF;
        let padded = pad_line(&row, &tape(24));
        assert_eq!(padded, [0xAA; 16]);
    }

    #[test]
    fn test_prefix_is_little_endian() {
        let row: Vec<u8> = (1..=16).collect();
        let line = encode_line(&row, &tape(24)).unwrap();
        // all distinct: one literal packet of 16 bytes
        assert_eq!(line.length_prefix, 17);
        assert_eq!(&line.to_bytes()[..3], &[17, 0, 15]);
    }

    #[test]
    fn test_uncompressed_line() {
        let line = encode_line_uncompressed(&[0x80], &tape(24)).unwrap();
        assert_eq!(line.length_prefix, 16);
        assert_eq!(line.payload[15], 0x80);
    }

    #[test]
    fn test_round_trip_all_tapes() {
        let rows: [&[u8]; 4] = [
            &[0x00],
            &[0x81, 0x42, 0x24, 0x18],
            &[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A],
            &[0xFF; 16],
        ];

        for (_, info) in TAPE_WIDTHS {
            let Some(t) = info else { continue };
            for row in rows {
                let line = encode_line(row, t).unwrap();
                let (padded, unshifted) = decode_line(&line, t).unwrap();
                assert_eq!(padded, pad_line(row, t));

                let expected = u128::from_be_bytes(pad_line(row, t))
                    .checked_shr(u32::from(t.right_margin))
                    .unwrap_or(0);
                assert_eq!(u128::from_be_bytes(unshifted), expected);
            }
        }
    }

    #[test]
    fn test_decode_line_wrong_size() {
        let line = EncodedLine::new(vec![0xF0, 0x00]).unwrap();
        assert!(matches!(
            decode_line(&line, &tape(24)),
            Err(PtouchError::MalformedPayload(_))
        ));
    }
}
