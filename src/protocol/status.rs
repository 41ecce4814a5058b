//! # Status Frames
//!
//! The printer reports its state as a fixed 32-byte frame, either as the
//! reply to a status request (`ESC i S`) or unsolicited while a job is
//! running (phase changes, completion, errors).
//!
//! ## Frame Layout
//!
//! | Offset | Field | Width |
//! |--------|-------|-------|
//! | 0 | Print head mark | 4 |
//! | 4 | Model code | 4 |
//! | 8 | Error information 1 | 1 |
//! | 9 | Error information 2 | 1 |
//! | 10 | Media width | 1 |
//! | 11 | Media type | 1 |
//! | 15 | Mode | 1 |
//! | 17 | Media length | 1 |
//! | 18 | Status type | 1 |
//! | 19 | Phase type | 1 |
//! | 20 | Phase number (high) | 1 |
//! | 21 | Phase number (low) | 1 |
//! | 22 | Notification number | 1 |
//! | 26 | Hardware settings | 1 |
//!
//! Bytes not listed are reserved.

use serde::Serialize;

use super::tables::{self, DeviceError, MediaType, StatusType, TapeInfo, ERROR_BITS};
use crate::error::{PtouchError, Result};

/// Size of every status frame in bytes
pub const FRAME_LEN: usize = 32;

/// A raw status frame as read from the device
pub type StatusFrame = [u8; FRAME_LEN];

pub const OFFSET_PRINTHEAD_MARK: usize = 0;
pub const OFFSET_MODEL_CODE: usize = 4;
pub const OFFSET_ERROR_1: usize = 8;
pub const OFFSET_ERROR_2: usize = 9;
pub const OFFSET_MEDIA_WIDTH: usize = 10;
pub const OFFSET_MEDIA_TYPE: usize = 11;
pub const OFFSET_MODE: usize = 15;
pub const OFFSET_MEDIA_LENGTH: usize = 17;
pub const OFFSET_STATUS_TYPE: usize = 18;
pub const OFFSET_PHASE_TYPE: usize = 19;
pub const OFFSET_PHASE_NUMBER_HI: usize = 20;
pub const OFFSET_PHASE_NUMBER_LO: usize = 21;
pub const OFFSET_NOTIFY_NUMBER: usize = 22;
pub const OFFSET_HARDWARE_SETTINGS: usize = 26;

// ============================================================================
// ERROR FLAGS
// ============================================================================

/// Named error flags decoded from the two error bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErrorFlags {
    pub no_media: bool,
    pub cutter_jam: bool,
    pub weak_battery: bool,
    pub hv_adapter: bool,
    pub replace_media: bool,
    pub cover_open: bool,
    pub overheating: bool,
}

impl ErrorFlags {
    /// Decode flags from error byte 1 (low) and error byte 2 (high).
    pub fn from_bytes(error_1: u8, error_2: u8) -> Self {
        let value = u16::from(error_1) | (u16::from(error_2) << 8);
        let mut flags = Self::default();

        for (bit, error) in ERROR_BITS {
            if value & (1 << bit) != 0 {
                *flags.flag_mut(*error) = true;
            }
        }

        flags
    }

    fn flag_mut(&mut self, error: DeviceError) -> &mut bool {
        match error {
            DeviceError::NoMedia => &mut self.no_media,
            DeviceError::CutterJam => &mut self.cutter_jam,
            DeviceError::WeakBattery => &mut self.weak_battery,
            DeviceError::HighVoltageAdapter => &mut self.hv_adapter,
            DeviceError::ReplaceMedia => &mut self.replace_media,
            DeviceError::CoverOpen => &mut self.cover_open,
            DeviceError::Overheating => &mut self.overheating,
        }
    }

    fn is_set(&self, error: DeviceError) -> bool {
        match error {
            DeviceError::NoMedia => self.no_media,
            DeviceError::CutterJam => self.cutter_jam,
            DeviceError::WeakBattery => self.weak_battery,
            DeviceError::HighVoltageAdapter => self.hv_adapter,
            DeviceError::ReplaceMedia => self.replace_media,
            DeviceError::CoverOpen => self.cover_open,
            DeviceError::Overheating => self.overheating,
        }
    }

    /// True if any error flag is set
    pub fn any(&self) -> bool {
        ERROR_BITS.iter().any(|(_, e)| self.is_set(*e))
    }

    /// All set flags, in bit order
    pub fn active(&self) -> Vec<DeviceError> {
        ERROR_BITS
            .iter()
            .map(|(_, e)| *e)
            .filter(|e| self.is_set(*e))
            .collect()
    }
}

impl std::fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.active();
        if active.is_empty() {
            return write!(f, "no errors");
        }
        let names: Vec<&str> = active.iter().map(|e| e.describe()).collect();
        write!(f, "{}", names.join(", "))
    }
}

// ============================================================================
// STATUS
// ============================================================================

/// # Decoded Printer Status
///
/// Built fresh from each 32-byte frame and never modified afterwards.
///
/// ## Example
///
/// ```
/// use ptouch::protocol::status::{Status, FRAME_LEN};
///
/// let mut frame = [0u8; FRAME_LEN];
/// frame[10] = 24; // 24mm tape
/// let status = Status::decode(&frame).unwrap();
/// assert!(status.ready());
/// assert_eq!(status.tape.unwrap().printarea_width, 128);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub printhead_mark: [u8; 4],
    pub model_code: [u8; 4],
    pub error_1: u8,
    pub error_2: u8,
    pub media_width: u8,
    pub media_type: MediaType,
    pub mode: u8,
    pub media_length: u8,
    pub status_type: StatusType,
    pub phase_type: u8,
    pub phase_number: u16,
    pub notify_number: u8,
    pub hardware_settings: u8,

    /// Flags derived from `error_1` / `error_2`
    pub errors: ErrorFlags,

    /// Geometry of the installed tape, `None` when no media is reported
    pub tape: Option<TapeInfo>,
}

impl Status {
    /// Decode a status frame.
    ///
    /// ## Errors
    ///
    /// - `NoResponse` for an empty read
    /// - `InvalidResponse` for any length other than 32
    /// - `UnknownTapeWidth` if the media width code is not in the tape table
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let frame: &StatusFrame = match frame.len() {
            0 => return Err(PtouchError::NoResponse),
            FRAME_LEN => frame
                .try_into()
                .map_err(|_| PtouchError::InvalidResponse(frame.len()))?,
            n => return Err(PtouchError::InvalidResponse(n)),
        };

        let word = |offset: usize| -> [u8; 4] {
            [
                frame[offset],
                frame[offset + 1],
                frame[offset + 2],
                frame[offset + 3],
            ]
        };

        let error_1 = frame[OFFSET_ERROR_1];
        let error_2 = frame[OFFSET_ERROR_2];
        let media_width = frame[OFFSET_MEDIA_WIDTH];

        Ok(Self {
            printhead_mark: word(OFFSET_PRINTHEAD_MARK),
            model_code: word(OFFSET_MODEL_CODE),
            error_1,
            error_2,
            media_width,
            media_type: MediaType::from_code(frame[OFFSET_MEDIA_TYPE]),
            mode: frame[OFFSET_MODE],
            media_length: frame[OFFSET_MEDIA_LENGTH],
            status_type: StatusType::from_code(frame[OFFSET_STATUS_TYPE]),
            phase_type: frame[OFFSET_PHASE_TYPE],
            phase_number: u16::from_be_bytes([
                frame[OFFSET_PHASE_NUMBER_HI],
                frame[OFFSET_PHASE_NUMBER_LO],
            ]),
            notify_number: frame[OFFSET_NOTIFY_NUMBER],
            hardware_settings: frame[OFFSET_HARDWARE_SETTINGS],
            errors: ErrorFlags::from_bytes(error_1, error_2),
            tape: tables::tape_info(media_width)?,
        })
    }

    /// True if the device reports no error condition
    pub fn ready(&self) -> bool {
        !self.errors.any()
    }

    /// Phase change into the receiving (editing) state, i.e. the printer
    /// accepts data for the next page.
    pub fn is_receiving(&self) -> bool {
        self.status_type == StatusType::PhaseChange
            && self.phase_type == 0
            && self.phase_number == 0
    }

    /// The printer finished the job
    pub fn is_done(&self) -> bool {
        self.status_type == StatusType::PrintingDone
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame_with(media_width: u8) -> StatusFrame {
        let mut frame = [0u8; FRAME_LEN];
        frame[0..4].copy_from_slice(&[0x80, 0x20, b'B', b'0']);
        frame[4..8].copy_from_slice(&[0x67, 0x30, 0x00, 0x00]);
        frame[OFFSET_MEDIA_WIDTH] = media_width;
        frame
    }

    #[test]
    fn test_decode_empty_is_no_response() {
        assert!(matches!(Status::decode(&[]), Err(PtouchError::NoResponse)));
    }

    #[test]
    fn test_decode_short_is_invalid() {
        for len in 1..FRAME_LEN {
            let data = vec![0u8; len];
            assert!(matches!(
                Status::decode(&data),
                Err(PtouchError::InvalidResponse(n)) if n == len
            ));
        }
    }

    #[test]
    fn test_decode_long_is_invalid() {
        let data = [0u8; 33];
        assert!(matches!(
            Status::decode(&data),
            Err(PtouchError::InvalidResponse(33))
        ));
    }

    #[test]
    fn test_decode_fields() {
        let mut frame = frame_with(12);
        frame[OFFSET_MEDIA_TYPE] = 0x01;
        frame[OFFSET_MODE] = 0x40;
        frame[OFFSET_MEDIA_LENGTH] = 0x00;
        frame[OFFSET_STATUS_TYPE] = 0x06;
        frame[OFFSET_PHASE_TYPE] = 0x01;
        frame[OFFSET_PHASE_NUMBER_HI] = 0x12;
        frame[OFFSET_PHASE_NUMBER_LO] = 0x34;
        frame[OFFSET_NOTIFY_NUMBER] = 0x03;
        frame[OFFSET_HARDWARE_SETTINGS] = 0x7F;

        let status = Status::decode(&frame).unwrap();
        assert_eq!(status.printhead_mark, [0x80, 0x20, b'B', b'0']);
        assert_eq!(status.model_code, [0x67, 0x30, 0x00, 0x00]);
        assert_eq!(status.media_type, MediaType::LaminatedTape);
        assert_eq!(status.mode, 0x40);
        assert_eq!(status.status_type, StatusType::PhaseChange);
        assert_eq!(status.phase_type, 0x01);
        assert_eq!(status.phase_number, 0x1234);
        assert_eq!(status.notify_number, 0x03);
        assert_eq!(status.hardware_settings, 0x7F);
    }

    #[test]
    fn test_decode_12mm_tape() {
        let status = Status::decode(&frame_with(12)).unwrap();
        let tape = status.tape.unwrap();
        assert_eq!(tape.left_margin, 29);
        assert_eq!(tape.printarea_width, 70);
        assert_eq!(tape.right_margin, 29);
        assert_eq!(tape.nominal_width_mm, 12.0);
    }

    #[test]
    fn test_decode_no_media_entry() {
        let status = Status::decode(&frame_with(0)).unwrap();
        assert_eq!(status.tape, None);
    }

    #[test]
    fn test_decode_unknown_tape_width() {
        assert!(matches!(
            Status::decode(&frame_with(10)),
            Err(PtouchError::UnknownTapeWidth(10))
        ));
    }

    #[test]
    fn test_decode_unknown_codes_are_kept() {
        let mut frame = frame_with(24);
        frame[OFFSET_STATUS_TYPE] = 0x09;
        frame[OFFSET_MEDIA_TYPE] = 0x05;

        let status = Status::decode(&frame).unwrap();
        assert_eq!(status.status_type, StatusType::Unrecognized(0x09));
        assert_eq!(status.media_type, MediaType::Unrecognized(0x05));
    }

    #[test]
    fn test_ready_tracks_documented_bits_only() {
        for bit in 0..16u32 {
            let value = 1u16 << bit;
            let mut frame = frame_with(24);
            frame[OFFSET_ERROR_1] = value as u8;
            frame[OFFSET_ERROR_2] = (value >> 8) as u8;

            let status = Status::decode(&frame).unwrap();
            let documented = ERROR_BITS.iter().any(|(b, _)| *b == bit);
            assert_eq!(status.ready(), !documented, "bit {}", bit);
        }
    }

    #[test]
    fn test_error_flags_named() {
        // cover open (bit 12) + weak battery (bit 3)
        let flags = ErrorFlags::from_bytes(0b0000_1000, 0b0001_0000);
        assert!(flags.weak_battery);
        assert!(flags.cover_open);
        assert!(!flags.no_media);
        assert!(flags.any());
        assert_eq!(
            flags.active(),
            vec![DeviceError::WeakBattery, DeviceError::CoverOpen]
        );
        assert_eq!(flags.to_string(), "weak battery, cover open");
    }

    #[test]
    fn test_error_flags_none() {
        let flags = ErrorFlags::from_bytes(0, 0);
        assert!(!flags.any());
        assert_eq!(flags.to_string(), "no errors");
    }

    #[test]
    fn test_receiving_and_done() {
        let mut frame = frame_with(24);
        frame[OFFSET_STATUS_TYPE] = 0x06;
        assert!(Status::decode(&frame).unwrap().is_receiving());

        frame[OFFSET_PHASE_NUMBER_LO] = 0x01;
        assert!(!Status::decode(&frame).unwrap().is_receiving());

        frame[OFFSET_STATUS_TYPE] = 0x01;
        assert!(Status::decode(&frame).unwrap().is_done());
    }
}
