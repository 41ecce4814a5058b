//! # P-Touch Raster Protocol Implementation
//!
//! This module provides the low-level pieces of the PT-P700 raster protocol.
//!
//! ## Module Structure
//!
//! - [`tables`]: Tape geometry and status code tables
//! - [`status`]: 32-byte status frame decoding
//! - [`packbits`]: PackBits run-length compression
//! - [`raster`]: Margin-adjusted raster line encoding
//! - [`commands`]: Command byte builders
//!
//! ## Usage Example
//!
//! ```
//! use ptouch::protocol::{commands, raster, tables};
//!
//! let tape = tables::tape_info(24).unwrap().unwrap();
//!
//! let mut data = Vec::new();
//! data.extend(commands::reset());
//! data.extend(commands::raster_mode());
//! data.extend(commands::compression_mode(true));
//!
//! // One blank raster line
//! let line = raster::encode_line(&[0u8; 16], &tape).unwrap();
//! data.extend(commands::raster_line(&line));
//!
//! data.extend(commands::end_of_page());
//! data.extend(commands::end_of_job());
//!
//! // Send `data` to printer via transport...
//! ```

pub mod commands;
pub mod packbits;
pub mod raster;
pub mod status;
pub mod tables;

pub use raster::{encode_line, EncodedLine};
pub use status::{ErrorFlags, Status};
pub use tables::{DeviceError, MediaType, StatusType, TapeInfo};
