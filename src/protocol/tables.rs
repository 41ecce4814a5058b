//! # Protocol Lookup Tables
//!
//! Static tables translating the raw codes found in a status frame into
//! typed values. Every table is a `static` slice: built at compile time,
//! never mutated.
//!
//! ## Tape Geometry
//!
//! The print head is 128 dots wide regardless of the installed tape.
//! Narrower tapes print in the middle of the head, so every width has a
//! blank margin on both sides:
//!
//! ```text
//! 12mm tape:
//! ├─ 29 dots ─┼──── 70 dots printable ────┼─ 29 dots ─┤
//! │  margin   │                           │  margin   │
//! └────────────────── 128 dot head ──────────────────┘
//! ```

use serde::Serialize;

use crate::error::{PtouchError, Result};

// ============================================================================
// TAPE GEOMETRY
// ============================================================================

/// # Tape Geometry
///
/// Dot geometry of one tape width, keyed by the media width code the
/// printer reports at status frame offset 10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TapeInfo {
    /// Blank dots before the printable area
    pub left_margin: u16,

    /// Printable width in dots
    pub printarea_width: u16,

    /// Blank dots after the printable area
    pub right_margin: u16,

    /// Nominal tape width in millimeters
    pub nominal_width_mm: f32,
}

impl TapeInfo {
    const fn new(left_margin: u16, printarea_width: u16, right_margin: u16, width: f32) -> Self {
        Self {
            left_margin,
            printarea_width,
            right_margin,
            nominal_width_mm: width,
        }
    }

    /// Bytes needed to hold one scanline of the printable area
    #[inline]
    pub fn line_bytes(&self) -> usize {
        (self.printarea_width as usize).div_ceil(8)
    }
}

/// Media width code → tape geometry. Code 0 is the "no media" entry.
pub static TAPE_WIDTHS: &[(u8, Option<TapeInfo>)] = &[
    (0, None),
    (4, Some(TapeInfo::new(52, 24, 52, 3.5))),
    (6, Some(TapeInfo::new(48, 32, 48, 6.0))),
    (9, Some(TapeInfo::new(39, 50, 39, 9.0))),
    (12, Some(TapeInfo::new(29, 70, 29, 12.0))),
    (18, Some(TapeInfo::new(8, 112, 8, 18.0))),
    (24, Some(TapeInfo::new(0, 128, 0, 24.0))),
];

/// Look up the geometry for a media width code.
///
/// Returns `Ok(None)` for the no-media code and `UnknownTapeWidth` for codes
/// missing from the table.
///
/// ## Example
///
/// ```
/// use ptouch::protocol::tables::tape_info;
///
/// let tape = tape_info(12).unwrap().unwrap();
/// assert_eq!(tape.printarea_width, 70);
/// assert!(tape_info(0).unwrap().is_none());
/// assert!(tape_info(7).is_err());
/// ```
pub fn tape_info(code: u8) -> Result<Option<TapeInfo>> {
    TAPE_WIDTHS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, info)| *info)
        .ok_or(PtouchError::UnknownTapeWidth(code))
}

// ============================================================================
// ERROR BITS
// ============================================================================

/// Error conditions reported in the two error bytes of a status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceError {
    NoMedia,
    CutterJam,
    WeakBattery,
    HighVoltageAdapter,
    ReplaceMedia,
    CoverOpen,
    Overheating,
}

impl DeviceError {
    /// Human-readable description
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NoMedia => "no media",
            Self::CutterJam => "cutter jam",
            Self::WeakBattery => "weak battery",
            Self::HighVoltageAdapter => "high-voltage adapter",
            Self::ReplaceMedia => "replace media",
            Self::CoverOpen => "cover open",
            Self::Overheating => "overheating",
        }
    }
}

/// Bit position within `error_1 | error_2 << 8` → error condition.
/// Positions not listed are unused by the device.
pub static ERROR_BITS: &[(u32, DeviceError)] = &[
    (0, DeviceError::NoMedia),
    (2, DeviceError::CutterJam),
    (3, DeviceError::WeakBattery),
    (6, DeviceError::HighVoltageAdapter),
    (8, DeviceError::ReplaceMedia),
    (12, DeviceError::CoverOpen),
    (13, DeviceError::Overheating),
];

// ============================================================================
// STATUS TYPE
// ============================================================================

/// Why the printer sent a status frame (offset 18).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusType {
    StatusReply,
    PrintingDone,
    ErrorOccurred,
    TurnedOff,
    Notification,
    PhaseChange,
    /// Code missing from the table, raw value retained
    Unrecognized(u8),
}

static STATUS_TYPES: &[(u8, StatusType)] = &[
    (0x00, StatusType::StatusReply),
    (0x01, StatusType::PrintingDone),
    (0x02, StatusType::ErrorOccurred),
    (0x04, StatusType::TurnedOff),
    (0x05, StatusType::Notification),
    (0x06, StatusType::PhaseChange),
];

impl StatusType {
    pub fn from_code(code: u8) -> Self {
        STATUS_TYPES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, t)| *t)
            .unwrap_or(Self::Unrecognized(code))
    }

    /// Raw code as it appears on the wire
    pub fn code(&self) -> u8 {
        match self {
            Self::Unrecognized(raw) => *raw,
            known => STATUS_TYPES
                .iter()
                .find(|(_, t)| t == known)
                .map(|(c, _)| *c)
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// MEDIA TYPE
// ============================================================================

/// Installed media kind (offset 11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    NoMedia,
    LaminatedTape,
    NonLaminatedTape,
    HeatShrink,
    Incompatible,
    /// Code missing from the table, raw value retained
    Unrecognized(u8),
}

static MEDIA_TYPES: &[(u8, MediaType)] = &[
    (0x00, MediaType::NoMedia),
    (0x01, MediaType::LaminatedTape),
    (0x02, MediaType::NonLaminatedTape),
    (0x11, MediaType::HeatShrink),
    (0xFF, MediaType::Incompatible),
];

impl MediaType {
    pub fn from_code(code: u8) -> Self {
        MEDIA_TYPES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, t)| *t)
            .unwrap_or(Self::Unrecognized(code))
    }

    /// Raw code as it appears on the wire
    pub fn code(&self) -> u8 {
        match self {
            Self::Unrecognized(raw) => *raw,
            known => MEDIA_TYPES
                .iter()
                .find(|(_, t)| t == known)
                .map(|(c, _)| *c)
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
