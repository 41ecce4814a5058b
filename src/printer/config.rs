//! # Printer Configuration
//!
//! This module defines the hardware specification of the supported label
//! printer and the per-job settings sent during mode configuration.
//!
//! ## Supported Printers
//!
//! | Model | Head (dots) | Resolution | Tapes |
//! |-------|-------------|------------|-------|
//! | PT-P700 | 128 | 180 DPI | 3.5mm – 24mm |
//!
//! ## Usage
//!
//! ```
//! use ptouch::printer::{JobOptions, PrinterConfig};
//!
//! let config = PrinterConfig::PT_P700;
//! println!("Head width: {} dots ({} bytes)", config.head_dots, config.head_bytes);
//!
//! let options = JobOptions { mirror: true, ..JobOptions::default() };
//! assert!(options.autocut);
//! ```

use std::time::Duration;

use serde::Serialize;

/// # Printer Configuration
///
/// Hardware characteristics of a P-Touch label printer.
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4
///
/// For PT-P700:
///   dots_per_mm = 180 / 25.4 ≈ 7.09
///   head width  = 128 dots ≈ 18mm (24mm tape minus its borders)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PrinterConfig {
    /// Printer model name
    pub name: &'static str,

    /// Print head width in dots
    pub head_dots: u16,

    /// Print head width in bytes (head_dots / 8)
    pub head_bytes: u16,

    /// Resolution in dots per inch
    pub dpi: u16,
}

impl PrinterConfig {
    /// # Brother PT-P700 Configuration
    ///
    /// | Property | Value |
    /// |----------|-------|
    /// | Print head | 128 dots |
    /// | Resolution | 180 DPI |
    /// | Interface | USB (printer class) |
    /// | Cutter | Auto-cutter |
    pub const PT_P700: Self = Self {
        name: "Brother PT-P700",
        head_dots: 128,
        head_bytes: 16,
        dpi: 180,
    };

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Convert dots to millimeters
    #[inline]
    pub fn dots_to_mm(&self, dots: u16) -> f32 {
        dots as f32 / self.dots_per_mm()
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::PT_P700
    }
}

// ============================================================================
// JOB OPTIONS
// ============================================================================

/// # Job Options
///
/// Mode flags written during configuration, before the first raster line.
///
/// The defaults cut after every label, feed and cut once after the last
/// copy, and compress raster lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobOptions {
    /// Cut after each label
    pub autocut: bool,

    /// Mirror the label horizontally
    pub mirror: bool,

    /// Chain printing: skip the feed and cut after the last copy
    pub chain_printing: bool,

    /// Special tape that must not be cut
    pub special_tape: bool,

    /// Keep the expansion buffer between prints
    pub no_buffer_clearing: bool,

    /// Feed before and after the label, in dots
    pub margin: u16,

    /// PackBits-compress raster lines
    pub compression: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            autocut: true,
            mirror: false,
            chain_printing: false,
            special_tape: false,
            no_buffer_clearing: false,
            margin: 14,
            compression: true,
        }
    }
}

// ============================================================================
// TIMINGS
// ============================================================================

/// # Print Timings
///
/// | Setting | Default |
/// |---------|---------|
/// | Status poll interval | 100ms |
/// | Page advance deadline | 20s |
/// | Completion deadline | 20s |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintTimings {
    /// Interval between status reads and between condition checks
    pub poll_interval: Duration,

    /// Deadline for the receiving state after a next-page marker
    pub page_advance_timeout: Duration,

    /// Deadline for printing-done after the end-of-job marker
    pub completion_timeout: Duration,
}

impl Default for PrintTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            page_advance_timeout: Duration::from_secs(20),
            completion_timeout: Duration::from_secs(20),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pt_p700_dimensions() {
        let config = PrinterConfig::PT_P700;
        assert_eq!(config.head_dots, 128);
        assert_eq!(config.head_dots, config.head_bytes * 8);
    }

    #[test]
    fn test_dots_to_mm() {
        let config = PrinterConfig::PT_P700;
        // 12mm tape printable area is 70 dots ≈ 9.9mm
        assert!((config.dots_to_mm(70) - 9.88).abs() < 0.05);
        assert!((config.dots_to_mm(config.head_dots) - 18.06).abs() < 0.05);
    }

    #[test]
    fn test_default_options() {
        let options = JobOptions::default();
        assert!(options.autocut);
        assert!(!options.mirror);
        assert!(!options.chain_printing);
        assert_eq!(options.margin, 14);
        assert!(options.compression);
    }

    #[test]
    fn test_default_timings() {
        let timings = PrintTimings::default();
        assert_eq!(timings.poll_interval, Duration::from_millis(100));
        assert_eq!(timings.page_advance_timeout, Duration::from_secs(20));
        assert_eq!(timings.completion_timeout, Duration::from_secs(20));
    }
}
