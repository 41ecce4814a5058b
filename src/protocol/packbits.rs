//! # PackBits Compression
//!
//! Byte-oriented run-length coding (the TIFF "PackBits" scheme) used by the
//! printer's compressed raster mode (`M 02`).
//!
//! ## Packet Format
//!
//! Each packet starts with a signed header byte `n`:
//!
//! | Header | Meaning |
//! |--------|---------|
//! | 0 ..= 127 | copy the next `n + 1` bytes literally |
//! | -127 ..= -1 | repeat the next byte `1 - n` times |
//! | -128 | no-op |
//!
//! So a line of sixteen `00` bytes packs to `F1 00`.

use crate::error::{PtouchError, Result};

/// Maximum bytes covered by one packet
const MAX_PACKET: usize = 128;

/// Compress `data` into PackBits packets.
///
/// Runs of two or more identical bytes become repeat packets; everything
/// else is gathered into literal packets.
///
/// ## Example
///
/// ```
/// use ptouch::protocol::packbits;
///
/// assert_eq!(packbits::encode(&[0u8; 16]), vec![0xF1, 0x00]);
/// assert_eq!(packbits::encode(&[1, 2, 3]), vec![0x02, 1, 2, 3]);
/// ```
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_PACKET + 1);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(MAX_PACKET)
            .take_while(|&&b| b == data[i])
            .count();

        if run >= 2 {
            flush_literal(&mut out, &data[literal_start..i]);
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
            if i - literal_start == MAX_PACKET {
                flush_literal(&mut out, &data[literal_start..i]);
                literal_start = i;
            }
        }
    }
    flush_literal(&mut out, &data[literal_start..]);

    out
}

fn flush_literal(out: &mut Vec<u8>, literal: &[u8]) {
    if literal.is_empty() {
        return;
    }
    out.push((literal.len() - 1) as u8);
    out.extend_from_slice(literal);
}

/// Expand PackBits packets back into raw bytes.
///
/// ## Errors
///
/// `MalformedPayload` if a packet header promises more bytes than remain.
pub fn decode(packed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < packed.len() {
        let header = packed[i] as i8;
        i += 1;

        match header {
            -128 => {}
            0..=127 => {
                let len = header as usize + 1;
                let literal = packed.get(i..i + len).ok_or_else(|| {
                    PtouchError::MalformedPayload(format!(
                        "literal packet of {} bytes truncated at offset {}",
                        len, i
                    ))
                })?;
                out.extend_from_slice(literal);
                i += len;
            }
            _ => {
                let count = (1 - header as isize) as usize;
                let byte = *packed.get(i).ok_or_else(|| {
                    PtouchError::MalformedPayload(format!("repeat packet missing byte at offset {}", i))
                })?;
                out.extend(std::iter::repeat_n(byte, count));
                i += 1;
            }
        }
    }

    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_empty() {
        assert!(encode(&[]).is_empty());
    }

    #[test]
    fn test_encode_single_byte() {
        assert_eq!(encode(&[0xAB]), vec![0x00, 0xAB]);
    }

    #[test]
    fn test_encode_all_zero_line_is_one_run() {
        assert_eq!(encode(&[0u8; 16]), vec![0xF1, 0x00]);
    }

    #[test]
    fn test_encode_mixed() {
        let data = [0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA];
        // Example from the TIFF 6.0 specification, minus its final literal
        assert_eq!(
            encode(&data),
            vec![0xFE, 0xAA, 0x02, 0x80, 0x00, 0x2A, 0xFD, 0xAA]
        );
    }

    #[test]
    fn test_encode_long_run_splits() {
        let data = vec![0x55u8; 300];
        let packed = encode(&data);
        assert_eq!(packed, vec![0x81, 0x55, 0x81, 0x55, 0xD5, 0x55]);
        assert_eq!(decode(&packed).unwrap(), data);
    }

    #[test]
    fn test_encode_long_literal_splits() {
        let data: Vec<u8> = (0..200u32).map(|i| i as u8).collect();
        let packed = encode(&data);
        assert_eq!(packed[0], 0x7F);
        assert_eq!(decode(&packed).unwrap(), data);
    }

    #[test]
    fn test_decode_noop_header() {
        assert_eq!(decode(&[0x80, 0x00, 0x07]).unwrap(), vec![0x07]);
    }

    #[test]
    fn test_decode_truncated_literal() {
        assert!(matches!(
            decode(&[0x03, 0x01]),
            Err(PtouchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_truncated_repeat() {
        assert!(matches!(
            decode(&[0xF1]),
            Err(PtouchError::MalformedPayload(_))
        ));
    }
}
