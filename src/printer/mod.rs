//! # Printer Module
//!
//! Everything above the wire format: hardware constants, job options, the
//! job model and the controller that supervises a print.
//!
//! ## Modules
//!
//! - [`config`]: PT-P700 hardware specifications, job options, timings
//! - [`clock`]: injectable time source for polling and deadlines
//! - [`job`]: bitmaps, pages and jobs
//! - [`controller`]: the job state machine and status poller

pub mod clock;
pub mod config;
pub mod controller;
pub mod job;

pub use clock::{Clock, SimulatedClock, SystemClock};
pub use config::{JobOptions, PrintTimings, PrinterConfig};
pub use controller::{dry_run, JobState, LabelPrinter};
pub use job::{Bitmap, Job, Page};
