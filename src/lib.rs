//! # ptouch - Brother PT-P700 Label Printer Library
//!
//! ptouch drives a Brother P-Touch P700 label printer over a serial or USB
//! printer-class character device. It provides:
//!
//! - **Protocol implementation**: raster command builders, status frame
//!   decoding, PackBits line encoding
//! - **Job supervision**: a controller that streams pages while a
//!   background thread tracks the printer's phase
//! - **Transport**: raw character devices, plus an in-memory simulator
//! - **Label images**: any image file converted to a tape-sized bitmap
//!
//! ## Quick Start
//!
//! ```no_run
//! use ptouch::{
//!     label,
//!     printer::{Job, LabelPrinter},
//!     transport::SerialTransport,
//! };
//!
//! // Open connection to printer
//! let mut transport = SerialTransport::open("/dev/usb/lp0")?;
//! let mut printer = LabelPrinter::new(&mut transport);
//!
//! // Size the label for the installed tape
//! let status = printer.get_status()?;
//! let tape = status.tape.expect("no tape installed");
//! let bitmap = label::load("label.png", &tape, label::DEFAULT_THRESHOLD)?;
//!
//! // Print two copies and wait for the printer to finish
//! let job = Job::from_bitmap(&bitmap, 2)?;
//! let status = printer.print(&job)?;
//! assert!(status.is_done());
//!
//! # Ok::<(), ptouch::error::PtouchError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Command builders, status decoding, line encoding |
//! | [`printer`] | Configuration, job model, job controller |
//! | [`transport`] | Communication backends |
//! | [`label`] | Image file to bitmap conversion |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Brother PT-P700 (180 DPI, 128-dot head, 3.5mm to 24mm TZe tape).

pub mod error;
pub mod label;
pub mod printer;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use error::PtouchError;
pub use printer::{Job, LabelPrinter, PrinterConfig};
pub use transport::{SerialTransport, SimulatedPrinter};
