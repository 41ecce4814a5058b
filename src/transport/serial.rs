//! # Serial / USB Character Device Transport
//!
//! This module talks to the printer through a character device: the
//! kernel's USB printer class node (`/dev/usb/lp0`) or a serial/ACM tty.
//!
//! ## TTY Configuration
//!
//! When the device is a terminal it is switched to raw mode so binary
//! raster data passes through unmodified:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)
//! - **Read timeout**: VMIN = 0, VTIME = 1 (a read returns after 100ms
//!   with whatever arrived, possibly nothing)
//!
//! Non-terminal nodes (USB printer class) are used as they are; the kernel
//! driver applies its own read timeout.
//!
//! ## Chunked Writes
//!
//! Large writes are split into 4096-byte chunks with a short pause between
//! them so the printer's receive buffer keeps up.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::Transport;
use crate::error::{PtouchError, Result};

/// Default device path (Linux USB printer class)
pub const DEFAULT_DEVICE: &str = "/dev/usb/lp0";

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// Read timeout in deciseconds (termios VTIME)
const READ_TIMEOUT_DECISECONDS: u8 = 1;

/// # Serial Printer Transport
///
/// ## Example
///
/// ```no_run
/// use ptouch::transport::{SerialTransport, Transport};
/// use ptouch::protocol::commands;
///
/// let mut transport = SerialTransport::open("/dev/usb/lp0")?;
/// transport.write_all(&commands::reset())?;
///
/// # Ok::<(), ptouch::error::PtouchError>(())
/// ```
pub struct SerialTransport {
    file: File,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl SerialTransport {
    /// Open the printer device for reading and writing.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need root or the lp group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| PtouchError::Transport(format!("Failed to open {}: {}", path.display(), e)))?;

        configure_tty_raw(file.as_raw_fd())?;
        debug!(device = %path.display(), "opened printer device");

        Ok(Self {
            file,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Open with default device path (/dev/usb/lp0)
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_DEVICE)
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks. Default is 2ms.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if data.len() <= self.chunk_size {
            self.file
                .write_all(data)
                .map_err(|e| PtouchError::Transport(format!("Write failed: {}", e)))?;
        } else {
            for chunk in data.chunks(self.chunk_size) {
                self.file
                    .write_all(chunk)
                    .map_err(|e| PtouchError::Transport(format!("Write failed: {}", e)))?;

                if !self.chunk_delay.is_zero() {
                    thread::sleep(self.chunk_delay);
                }
            }
        }

        self.file
            .flush()
            .map_err(|e| PtouchError::Transport(format!("Flush failed: {}", e)))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_timed(&mut self.file, buf).map_err(|e| PtouchError::Transport(format!("Read failed: {}", e)))
    }
}

/// Read once, retrying on EINTR. A timeout reads as `Ok(0)`.
fn read_timed<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(&e) => return Ok(0),
            other => return other,
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// Configure a file descriptor for raw TTY mode with a short read timeout.
///
/// Devices that are not terminals (`ENOTTY`) are left untouched.
///
/// Note: IXON/IXOFF/IXANY disable XON/XOFF software flow control. This is critical
/// because 0x11 (XON/DC1) and 0x13 (XOFF/DC3) can appear in binary raster data.
#[cfg(unix)]
fn configure_tty_raw(fd: i32) -> Result<()> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ENOTTY) {
            debug!("device is not a terminal, skipping tty setup");
            return Ok(());
        }
        return Err(PtouchError::Transport(format!("tcgetattr failed: {}", err)));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;

    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    // Return from read after 100ms even when no byte arrived
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = READ_TIMEOUT_DECISECONDS;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(PtouchError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_fd: i32) -> Result<()> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device_path() {
        assert_eq!(DEFAULT_DEVICE, "/dev/usb/lp0");
    }

    #[test]
    fn test_open_missing_device() {
        let err = SerialTransport::open("/nonexistent/ptouch0").err().unwrap();
        assert!(matches!(err, PtouchError::Transport(_)));
    }

    #[test]
    fn test_timeout_kinds() {
        assert!(is_timeout(&io::Error::from(ErrorKind::TimedOut)));
        assert!(is_timeout(&io::Error::from(ErrorKind::WouldBlock)));
        assert!(!is_timeout(&io::Error::from(ErrorKind::BrokenPipe)));
        assert!(!is_timeout(&io::Error::from(ErrorKind::Interrupted)));
    }

    /// Replays a script of read outcomes.
    struct Scripted(Vec<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.remove(0) {
                Ok(bytes) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Err(e) => Err(e),
            }
        }
    }

    #[test]
    fn test_read_retries_after_interrupt() {
        let mut reader = Scripted(vec![
            Err(io::Error::from(ErrorKind::Interrupted)),
            Err(io::Error::from(ErrorKind::Interrupted)),
            Ok(vec![0x80, 0x20, b'B']),
        ]);
        let mut buf = [0u8; 32];
        assert_eq!(read_timed(&mut reader, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[0x80, 0x20, b'B']);
    }

    #[test]
    fn test_read_timeout_is_empty() {
        let mut reader = Scripted(vec![Err(io::Error::from(ErrorKind::WouldBlock))]);
        let mut buf = [0u8; 32];
        assert_eq!(read_timed(&mut reader, &mut buf).unwrap(), 0);

        let mut reader = Scripted(vec![Err(io::Error::from(ErrorKind::BrokenPipe))]);
        assert!(read_timed(&mut reader, &mut buf).is_err());
    }

    #[test]
    fn test_regular_file_is_not_a_tty() {
        let path = std::env::temp_dir().join(format!("ptouch-transport-{}", std::process::id()));
        std::fs::write(&path, [0x80u8, 0x20]).unwrap();

        let mut transport = SerialTransport::open(&path).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(transport.read(&mut buf).unwrap(), 0);

        std::fs::remove_file(&path).unwrap();
    }

    // Note: Most transport tests require actual hardware.
}
