//! # Simulated Printer
//!
//! An in-memory stand-in for a PT-P700, used by `ptouch print --simulate`
//! and by the controller tests.
//!
//! The simulator records every write and reacts to the commands that
//! matter for job supervision:
//!
//! | Command | Reaction |
//! |---------|----------|
//! | `ESC i S` | queue a status reply |
//! | reset preamble | back to the idle state |
//! | `FF` (next page) | queue "printing" then "receiving" phase changes |
//! | `SUB` (end of job) | queue "printing" phase change then "printing done" |
//!
//! Reads hand out one queued frame at a time. A truncated chunk is followed
//! by an empty read, the way a device behaves when it has nothing more to
//! say before the read timeout.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Transport;
use crate::error::Result;
use crate::protocol::commands::{self, ESC, FF, RASTER_TRANSFER, SUB};
use crate::protocol::status::*;
use crate::protocol::tables::{MediaType, StatusType};

/// Phase type reported while the printer accepts data
pub const PHASE_EDITING: u8 = 0x00;

/// Phase type reported while the printer is printing
pub const PHASE_PRINTING: u8 = 0x01;

/// # Simulated PT-P700
///
/// ## Example
///
/// ```
/// use ptouch::transport::{SimulatedPrinter, Transport};
/// use ptouch::protocol::{commands, Status};
///
/// let mut printer = SimulatedPrinter::new(12);
/// printer.write_all(&commands::status_request()).unwrap();
///
/// let frame = ptouch::transport::read_frame(&mut printer).unwrap();
/// let status = Status::decode(&frame).unwrap();
/// assert_eq!(status.tape.unwrap().printarea_width, 70);
/// ```
#[derive(Debug)]
pub struct SimulatedPrinter {
    media_width: u8,
    media_type: MediaType,
    error_1: u8,
    error_2: u8,
    stall_page_advance: bool,
    stall_completion: bool,
    partial_frames: Option<usize>,

    status_type: StatusType,
    phase_type: u8,
    queue: VecDeque<Vec<u8>>,
    just_delivered: bool,

    writes: Vec<Vec<u8>>,
    reads: Arc<AtomicUsize>,
}

impl SimulatedPrinter {
    /// Idle printer with laminated tape of the given media width code.
    pub fn new(media_width: u8) -> Self {
        Self {
            media_width,
            media_type: if media_width == 0 {
                MediaType::NoMedia
            } else {
                MediaType::LaminatedTape
            },
            error_1: 0,
            error_2: 0,
            stall_page_advance: false,
            stall_completion: false,
            partial_frames: None,
            status_type: StatusType::StatusReply,
            phase_type: PHASE_EDITING,
            queue: VecDeque::new(),
            just_delivered: false,
            writes: Vec::new(),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report the given error bytes in every frame.
    pub fn with_errors(mut self, error_1: u8, error_2: u8) -> Self {
        self.error_1 = error_1;
        self.error_2 = error_2;
        self
    }

    /// Never return to the receiving state after a next-page marker.
    pub fn stall_page_advance(mut self) -> Self {
        self.stall_page_advance = true;
        self
    }

    /// Never report completion after the end-of-job marker.
    pub fn stall_completion(mut self) -> Self {
        self.stall_completion = true;
        self
    }

    /// Precede every phase notification with a frame cut to `len` bytes.
    pub fn with_partial_frames(mut self, len: usize) -> Self {
        self.partial_frames = Some(len.min(FRAME_LEN - 1));
        self
    }

    /// Queue raw bytes to be handed out by the next read, e.g. a truncated
    /// frame.
    pub fn inject(&mut self, bytes: Vec<u8>) {
        self.queue.push_back(bytes);
    }

    /// Every write received, one entry per `write_all` call
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// All written bytes concatenated
    pub fn written_bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Number of writes equal to `command`
    pub fn count(&self, command: &[u8]) -> usize {
        self.writes.iter().filter(|w| w.as_slice() == command).count()
    }

    /// Number of raster-transfer writes
    pub fn raster_lines(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| w.first() == Some(&RASTER_TRANSFER))
            .count()
    }

    /// Shared counter of read calls, readable while the printer is borrowed
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    /// Build a frame describing the current device state.
    pub fn frame(&self, status_type: StatusType, phase_type: u8, phase_number: u16) -> StatusFrame {
        let mut frame = [0u8; FRAME_LEN];
        frame[OFFSET_PRINTHEAD_MARK..OFFSET_PRINTHEAD_MARK + 4].copy_from_slice(&[0x80, 0x20, b'B', b'0']);
        frame[OFFSET_MODEL_CODE..OFFSET_MODEL_CODE + 4].copy_from_slice(&[0x67, 0x30, 0x00, 0x00]);
        frame[OFFSET_ERROR_1] = self.error_1;
        frame[OFFSET_ERROR_2] = self.error_2;
        frame[OFFSET_MEDIA_WIDTH] = self.media_width;
        frame[OFFSET_MEDIA_TYPE] = self.media_type.code();
        frame[OFFSET_STATUS_TYPE] = status_type.code();
        frame[OFFSET_PHASE_TYPE] = phase_type;
        frame[OFFSET_PHASE_NUMBER_HI..=OFFSET_PHASE_NUMBER_LO].copy_from_slice(&phase_number.to_be_bytes());
        frame
    }

    fn notify(&mut self, status_type: StatusType, phase_type: u8) {
        self.status_type = status_type;
        self.phase_type = phase_type;
        let frame = self.frame(status_type, phase_type, 0);
        if let Some(len) = self.partial_frames {
            self.queue.push_back(frame[..len].to_vec());
        }
        self.queue.push_back(frame.to_vec());
    }

    fn handle(&mut self, data: &[u8]) {
        if data == commands::status_request().as_slice() {
            self.queue.clear();
            let reply = self.frame(self.status_type, self.phase_type, 0);
            self.queue.push_back(reply.to_vec());
        } else if data.len() > commands::RESET_PREAMBLE_LEN && data.ends_with(&[ESC, b'@']) {
            self.status_type = StatusType::StatusReply;
            self.phase_type = PHASE_EDITING;
            self.queue.clear();
        } else if data == [FF] {
            self.notify(StatusType::PhaseChange, PHASE_PRINTING);
            if !self.stall_page_advance {
                self.notify(StatusType::PhaseChange, PHASE_EDITING);
            }
        } else if data == [SUB] {
            self.notify(StatusType::PhaseChange, PHASE_PRINTING);
            if !self.stall_completion {
                self.notify(StatusType::PrintingDone, PHASE_PRINTING);
            }
        }
    }
}

impl Transport for SimulatedPrinter {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.handle(data);
        self.writes.push(data.to_vec());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if self.just_delivered {
            self.just_delivered = false;
            return Ok(0);
        }

        let Some(mut chunk) = self.queue.pop_front() else {
            return Ok(0);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.queue.push_front(chunk);
        } else {
            self.just_delivered = n < FRAME_LEN;
        }
        Ok(n)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::read_frame;

    fn status_of(printer: &mut SimulatedPrinter) -> Status {
        Status::decode(&read_frame(printer).unwrap()).unwrap()
    }

    #[test]
    fn test_status_reply() {
        let mut printer = SimulatedPrinter::new(24).with_errors(0x00, 0x10);
        printer.write_all(&commands::status_request()).unwrap();

        let status = status_of(&mut printer);
        assert_eq!(status.status_type, StatusType::StatusReply);
        assert!(status.errors.cover_open);
        assert_eq!(status.media_type, MediaType::LaminatedTape);
    }

    #[test]
    fn test_next_page_sequence() {
        let mut printer = SimulatedPrinter::new(24);
        printer.write_all(&commands::next_page()).unwrap();

        let printing = status_of(&mut printer);
        assert_eq!(printing.status_type, StatusType::PhaseChange);
        assert!(!printing.is_receiving());
        assert!(status_of(&mut printer).is_receiving());
        assert!(read_frame(&mut printer).unwrap().is_empty());
    }

    #[test]
    fn test_end_of_job_sequence() {
        let mut printer = SimulatedPrinter::new(24);
        printer.write_all(&commands::end_of_job()).unwrap();

        assert!(!status_of(&mut printer).is_done());
        assert!(status_of(&mut printer).is_done());

        // a later status request still reports completion
        printer.write_all(&commands::status_request()).unwrap();
        assert!(status_of(&mut printer).is_done());
    }

    #[test]
    fn test_stalled_completion() {
        let mut printer = SimulatedPrinter::new(24).stall_completion();
        printer.write_all(&commands::end_of_job()).unwrap();

        assert!(!status_of(&mut printer).is_done());
        assert!(read_frame(&mut printer).unwrap().is_empty());
    }

    #[test]
    fn test_injected_short_frame_is_delivered_alone() {
        let mut printer = SimulatedPrinter::new(24);
        printer.inject(vec![0x80; 10]);
        printer.write_all(&commands::next_page()).unwrap();

        assert_eq!(read_frame(&mut printer).unwrap().len(), 10);
        assert_eq!(read_frame(&mut printer).unwrap().len(), FRAME_LEN);
    }

    #[test]
    fn test_partial_frames_precede_notifications() {
        let mut printer = SimulatedPrinter::new(24).with_partial_frames(12);
        printer.write_all(&commands::end_of_job()).unwrap();

        assert_eq!(read_frame(&mut printer).unwrap().len(), 12);
        assert!(!status_of(&mut printer).is_done());
        assert_eq!(read_frame(&mut printer).unwrap().len(), 12);
        assert!(status_of(&mut printer).is_done());
    }

    #[test]
    fn test_records_writes() {
        let mut printer = SimulatedPrinter::new(24);
        printer.write_all(&commands::reset()).unwrap();
        printer.write_all(&[RASTER_TRANSFER, 0x02, 0x00, 0xF1, 0x00]).unwrap();
        printer.write_all(&commands::end_of_page()).unwrap();

        assert_eq!(printer.writes().len(), 3);
        assert_eq!(printer.raster_lines(), 1);
        assert_eq!(printer.count(&commands::end_of_page()), 1);
        assert_eq!(printer.read_counter().load(Ordering::SeqCst), 0);
    }
}
