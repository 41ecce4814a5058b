//! # P-Touch Raster Commands
//!
//! This module implements the raster command set understood by the Brother
//! PT-P700 label printer.
//!
//! ## Protocol Overview
//!
//! Commands are one-directional byte sequences; the printer never
//! acknowledges an individual command. State is observed separately through
//! 32-byte status frames (see [`super::status`]).
//!
//! A print job is a fixed sequence:
//!
//! 1. Reset preamble (clears any half-received command)
//! 2. Raster mode select
//! 3. Mode settings (various, advanced, margin, compression)
//! 4. Raster lines for a page, then the end-of-page marker
//! 5. Next-page marker between pages, end-of-job marker after the last
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

use super::raster::EncodedLine;

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// FF (Form Feed) - Print the page and wait for the next one
pub const FF: u8 = 0x0C;

/// SUB - Print the page with feeding; ends the job
pub const SUB: u8 = 0x1A;

/// Raster-transfer marker (`G`)
pub const RASTER_TRANSFER: u8 = b'G';

/// Zero raster line (`Z`), used as the end-of-page marker
pub const END_OF_PAGE: u8 = b'Z';

/// Number of NUL bytes in the reset preamble
pub const RESET_PREAMBLE_LEN: usize = 100;

// ============================================================================
// INITIALIZATION COMMANDS
// ============================================================================

/// # Reset Preamble (100 × NUL, ESC @)
///
/// Flushes any partially received command with a run of NUL bytes, then
/// initializes the printer.
///
/// ## Protocol Details
///
/// | Format | Bytes |
/// |--------|-------|
/// | Hex    | 00 × 100, 1B 40 |
///
/// ## Example
///
/// ```
/// use ptouch::protocol::commands;
///
/// let reset = commands::reset();
/// assert_eq!(reset.len(), 102);
/// assert_eq!(&reset[100..], &[0x1B, 0x40]);
/// ```
pub fn reset() -> Vec<u8> {
    let mut data = vec![0u8; RESET_PREAMBLE_LEN];
    data.extend([ESC, b'@']);
    data
}

/// # Status Information Request (ESC i S)
///
/// Asks the printer to send one 32-byte status frame.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC i S |
/// | Hex    | 1B 69 53 |
#[inline]
pub fn status_request() -> Vec<u8> {
    vec![ESC, b'i', b'S']
}

// ============================================================================
// MODE COMMANDS
// ============================================================================

/// # Switch to Raster Mode (ESC i a 1)
///
/// Must precede every other mode command; without it the printer
/// interprets the following bytes in its default mode.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC i a 1 |
/// | Hex    | 1B 69 61 01 |
#[inline]
pub fn raster_mode() -> Vec<u8> {
    vec![ESC, b'i', b'a', 0x01]
}

/// # Various Mode Settings (ESC i M n)
///
/// | Bit | Meaning |
/// |-----|---------|
/// | 6 | Auto cut after each label |
/// | 7 | Mirror printing |
///
/// ## Example
///
/// ```
/// use ptouch::protocol::commands;
///
/// assert_eq!(commands::various_mode(true, false), vec![0x1B, 0x69, 0x4D, 0x40]);
/// ```
pub fn various_mode(autocut: bool, mirror: bool) -> Vec<u8> {
    vec![ESC, b'i', b'M', pack_flags(&[(6, autocut), (7, mirror)])]
}

/// # Advanced Mode Settings (ESC i K n)
///
/// | Bit | Meaning |
/// |-----|---------|
/// | 3 | No chain printing (feed and cut after the last copy) |
/// | 4 | Special tape (no cutting) |
/// | 7 | No buffer clearing when printing |
pub fn advanced_mode(no_chain_printing: bool, special_tape: bool, no_buffer_clearing: bool) -> Vec<u8> {
    vec![
        ESC,
        b'i',
        b'K',
        pack_flags(&[
            (3, no_chain_printing),
            (4, special_tape),
            (7, no_buffer_clearing),
        ]),
    ]
}

/// # Specify Margin Amount (ESC i d n1 n2)
///
/// Feed amount before and after the label, in dots.
///
/// ## Example
///
/// ```
/// use ptouch::protocol::commands;
///
/// assert_eq!(commands::margin(14), vec![0x1B, 0x69, 0x64, 0x0E, 0x00]);
/// ```
pub fn margin(dots: u16) -> Vec<u8> {
    let mut data = vec![ESC, b'i', b'd'];
    data.extend(u16_le(dots));
    data
}

/// # Select Compression Mode (M n)
///
/// Bit 1 enables PackBits ("TIFF") compression of raster lines.
///
/// | Format | Bytes |
/// |--------|-------|
/// | Hex    | 4D 02 (compressed) / 4D 00 (raw) |
pub fn compression_mode(packbits: bool) -> Vec<u8> {
    vec![b'M', pack_flags(&[(1, packbits)])]
}

// ============================================================================
// RASTER AND PAGE COMMANDS
// ============================================================================

/// # Raster Graphics Transfer (G n1 n2 data)
///
/// One encoded raster line behind the transfer marker.
pub fn raster_line(line: &EncodedLine) -> Vec<u8> {
    let mut data = Vec::with_capacity(3 + line.payload.len());
    data.push(RASTER_TRANSFER);
    data.extend(line.to_bytes());
    data
}

/// # End of Page (Z)
#[inline]
pub fn end_of_page() -> Vec<u8> {
    vec![END_OF_PAGE]
}

/// # Print Command (FF)
///
/// Prints the page; more pages follow.
#[inline]
pub fn next_page() -> Vec<u8> {
    vec![FF]
}

/// # Print Command with Feeding (SUB)
///
/// Prints the last page and finishes the job.
#[inline]
pub fn end_of_job() -> Vec<u8> {
    vec![SUB]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Pack `(bit, value)` pairs into one flag byte; unnamed bits are 0.
///
/// ## Example
///
/// ```
/// use ptouch::protocol::commands::pack_flags;
///
/// assert_eq!(pack_flags(&[(6, true), (7, false)]), 0x40);
/// ```
pub fn pack_flags(bits: &[(u8, bool)]) -> u8 {
    bits.iter()
        .filter(|(_, set)| *set)
        .fold(0u8, |byte, (bit, _)| byte | (1 << bit))
}

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ## Example
///
/// ```
/// use ptouch::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================
