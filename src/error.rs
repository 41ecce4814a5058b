//! # Error Types
//!
//! This module defines the error type used throughout the ptouch library.
//!
//! ## Taxonomy
//!
//! | Kind | Variants |
//! |------|----------|
//! | Transport | `Transport`, `NoResponse`, `InvalidResponse`, `Io` |
//! | Protocol | `UnknownTapeWidth`, `EncodingOverflow`, `MalformedPayload` |
//! | Readiness | `PrinterNotReady`, `EmptyJob` |
//! | Timing | `PageAdvanceTimeout`, `PrintCompletionTimeout` |

use thiserror::Error;

/// Main error type for ptouch operations
#[derive(Debug, Error)]
pub enum PtouchError {
    /// Transport-level errors (open, write, read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The printer did not answer a status request
    #[error("No response from printer")]
    NoResponse,

    /// The printer answered with a frame of the wrong size
    #[error("Invalid response from printer ({0} bytes, expected 32)")]
    InvalidResponse(usize),

    /// Media width code with no entry in the tape table
    #[error("Unknown tape width code {0:#04x}")]
    UnknownTapeWidth(u8),

    /// Compressed raster line does not fit the 16-bit length prefix
    #[error("Encoded raster line too long ({0} bytes)")]
    EncodingOverflow(usize),

    /// Compressed payload could not be unpacked
    #[error("Malformed raster payload: {0}")]
    MalformedPayload(String),

    /// Device reports an error condition before the job starts
    #[error("Printer is not ready: {0}")]
    PrinterNotReady(String),

    /// A job must contain at least one page
    #[error("Print job has no pages")]
    EmptyJob,

    /// The printer did not reach the receiving state after a page
    #[error("Printer did not reach receiving state for page {page}")]
    PageAdvanceTimeout { page: usize },

    /// The printer did not report completion after the last page
    #[error("Printer did not reach printing complete state")]
    PrintCompletionTimeout,

    /// Image loading or conversion error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate
pub type Result<T, E = PtouchError> = std::result::Result<T, E>;
