//! # Printer Transport Layer
//!
//! This module provides the byte-stream backends the job controller talks
//! to.
//!
//! ## Available Transports
//!
//! - [`serial`]: raw-mode character device (`/dev/usb/lp0`, `/dev/ttyACM0`, ...)
//! - [`simulated`]: in-memory PT-P700 for dry runs and tests
//!
//! ## Read Semantics
//!
//! `read` must not block indefinitely: the status poller holds the
//! transport lock while reading, so a read with nothing to deliver returns
//! `Ok(0)` after a short timeout.

pub mod serial;
pub mod simulated;

pub use serial::SerialTransport;
pub use simulated::SimulatedPrinter;

use crate::error::Result;
use crate::protocol::status::{StatusFrame, FRAME_LEN};

/// A bidirectional byte stream to the printer.
pub trait Transport: Send {
    /// Write all of `data`, in order.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes. `Ok(0)` means nothing arrived before
    /// the transport's read timeout.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

/// Read one status frame.
///
/// Keeps reading until 32 bytes have arrived or a read returns nothing.
/// Returns the bytes actually received, which may be fewer than 32.
pub fn read_frame<T: Transport + ?Sized>(transport: &mut T) -> Result<Vec<u8>> {
    let mut frame: StatusFrame = [0; FRAME_LEN];
    let mut filled = 0;

    while filled < FRAME_LEN {
        let n = transport.read(&mut frame[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(frame[..filled].to_vec())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Hands out pre-recorded chunks, one per read.
    struct Chunks(VecDeque<Vec<u8>>);

    impl Transport for Chunks {
        fn write_all(&mut self, _data: &[u8]) -> Result<()> {
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let Some(chunk) = self.0.pop_front() else {
                return Ok(0);
            };
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_read_frame_joins_partial_reads() {
        let mut transport = Chunks(VecDeque::from([vec![1u8; 10], vec![2u8; 22]]));
        let frame = read_frame(&mut transport).unwrap();
        assert_eq!(frame.len(), 32);
        assert_eq!(frame[9], 1);
        assert_eq!(frame[10], 2);
    }

    #[test]
    fn test_read_frame_stops_on_timeout() {
        let mut transport = Chunks(VecDeque::from([vec![7u8; 5]]));
        assert_eq!(read_frame(&mut transport).unwrap(), vec![7u8; 5]);
    }

    #[test]
    fn test_read_frame_empty() {
        let mut transport = Chunks(VecDeque::new());
        assert!(read_frame(&mut transport).unwrap().is_empty());
    }
}
