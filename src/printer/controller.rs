//! # Job Controller
//!
//! Drives one print job from reset to completion while a background thread
//! keeps reading the printer's status frames.
//!
//! ## Job Sequence
//!
//! ```text
//! Disconnected ──connect──▶ Connected ──configure──▶ ModeConfigured
//!                                                         │
//!        ┌────────────────────────────────────────────────┘
//!        ▼
//!   Printing(1) ──FF──▶ AwaitingAdvance(1) ──receiving──▶ Printing(2) ...
//!        │
//!   last page ──SUB──▶ AwaitingCompletion ──printing done──▶ Done
//!
//! Any failure ──▶ Error
//! ```
//!
//! ## Concurrency
//!
//! Exactly two threads touch the printer during `print`:
//!
//! - the caller, writing commands and waiting on phase conditions
//! - a scoped status poller, reading 32-byte frames every poll interval
//!
//! Both go through one transport mutex, so reads never interleave with a
//! half-written command. The latest decoded status sits behind a second
//! mutex: the poller is its only writer during a job, the caller its only
//! reader. The poller is stopped and joined before `print` returns, on
//! every path.
//!
//! A failed read stops the poller and is handed to the caller, which
//! aborts the job with that error at its next status check. Short and
//! empty reads are not failures; they are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::clock::{Clock, SystemClock};
use super::config::{JobOptions, PrintTimings};
use super::job::{Job, Page};
use crate::error::{PtouchError, Result};
use crate::protocol::commands;
use crate::protocol::raster::{encode_line, encode_line_uncompressed};
use crate::protocol::status::{Status, FRAME_LEN};
use crate::protocol::tables::TapeInfo;
use crate::transport::{read_frame, Transport};

/// Where the controller is in the job sequence.
///
/// Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Disconnected,
    Connected,
    ModeConfigured,
    Printing { page: usize },
    AwaitingAdvance { page: usize },
    AwaitingCompletion,
    Done,
    Error,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// LINK
// ============================================================================

/// The transport plus the most recent status, shared between the caller
/// and the poller.
struct Link<'t, T: Transport + ?Sized> {
    io: Mutex<&'t mut T>,
    current: Mutex<Option<Status>>,
    /// First read error seen by the poller, not yet reported
    failure: Mutex<Option<PtouchError>>,
}

impl<T: Transport + ?Sized> Link<'_, T> {
    fn send(&self, data: &[u8]) -> Result<()> {
        lock(&self.io).write_all(data)
    }

    /// Send a marker after which only fresh frames may satisfy a wait.
    fn send_marker(&self, data: &[u8]) -> Result<()> {
        let mut io = lock(&self.io);
        *lock(&self.current) = None;
        io.write_all(data)
    }

    fn current(&self) -> Option<Status> {
        lock(&self.current).clone()
    }

    fn fail(&self, error: PtouchError) {
        lock(&self.failure).get_or_insert(error);
    }

    fn take_failure(&self) -> Option<PtouchError> {
        lock(&self.failure).take()
    }

    fn store(&self, status: Status) {
        let mut current = lock(&self.current);
        if current.as_ref().map(|s| s.status_type) != Some(status.status_type) {
            debug!(
                status_type = ?status.status_type,
                phase_type = status.phase_type,
                phase_number = status.phase_number,
                "printer status changed"
            );
        }
        *current = Some(status);
    }

    fn query_status(&self) -> Result<Status> {
        let frame = {
            let mut io = lock(&self.io);
            io.write_all(&commands::status_request())?;
            read_frame(&mut **io)?
        };
        let status = Status::decode(&frame)?;
        self.store(status.clone());
        Ok(status)
    }

    /// One poller iteration: read a frame, keep it if it is complete.
    ///
    /// Only transport errors are returned; partial and undecodable frames
    /// are dropped.
    fn poll_once(&self) -> Result<()> {
        let frame = read_frame(&mut **lock(&self.io))?;

        if frame.len() != FRAME_LEN {
            trace!(len = frame.len(), "discarding partial status read");
            return Ok(());
        }

        match Status::decode(&frame) {
            Ok(status) => self.store(status),
            Err(e) => debug!(error = %e, "discarding undecodable status frame"),
        }
        Ok(())
    }

    fn configure(&self, options: &JobOptions) -> Result<()> {
        for command in configure_commands(options) {
            self.send(&command)?;
        }
        Ok(())
    }
}

/// Mode configuration in transmission order, raster mode first.
fn configure_commands(options: &JobOptions) -> Vec<Vec<u8>> {
    vec![
        commands::raster_mode(),
        commands::various_mode(options.autocut, options.mirror),
        commands::advanced_mode(
            !options.chain_printing,
            options.special_tape,
            options.no_buffer_clearing,
        ),
        commands::margin(options.margin),
        commands::compression_mode(options.compression),
    ]
}

// ============================================================================
// STATUS POLLER
// ============================================================================

/// Background status reader, alive for one `print` call.
///
/// Dropping the poller raises the stop flag and joins the thread, so an
/// early return or a panic in the caller cannot leave it running.
struct StatusPoller<'scope> {
    stop: &'scope AtomicBool,
    handle: Option<ScopedJoinHandle<'scope, ()>>,
}

impl<'scope> StatusPoller<'scope> {
    fn spawn<'env, T: Transport + ?Sized>(
        scope: &'scope Scope<'scope, 'env>,
        link: &'scope Link<'_, T>,
        clock: &'scope dyn Clock,
        interval: Duration,
        stop: &'scope AtomicBool,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("ptouch-status".to_string())
            .spawn_scoped(scope, move || {
                trace!("status poller started");
                while !stop.load(Ordering::Acquire) {
                    if let Err(e) = link.poll_once() {
                        warn!(error = %e, "status read failed, stopping poller");
                        link.fail(e);
                        break;
                    }
                    clock.idle(interval);
                }
                trace!("status poller stopped");
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for StatusPoller<'_> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("status poller panicked");
            }
        }
    }
}

// ============================================================================
// LABEL PRINTER
// ============================================================================

/// # Label Printer
///
/// Job controller for one printer. Borrows the transport for its lifetime;
/// runs one job at a time.
///
/// ## Example
///
/// ```
/// use ptouch::printer::{Bitmap, Job, LabelPrinter};
/// use ptouch::transport::SimulatedPrinter;
///
/// let mut device = SimulatedPrinter::new(24);
/// let mut printer = LabelPrinter::new(&mut device);
///
/// let job = Job::from_bitmap(&Bitmap::new(128, 8), 1)?;
/// let status = printer.print(&job)?;
/// assert!(status.is_done());
/// # Ok::<(), ptouch::error::PtouchError>(())
/// ```
pub struct LabelPrinter<'t, T: Transport + ?Sized> {
    link: Link<'t, T>,
    state: JobState,
    options: JobOptions,
    timings: PrintTimings,
    clock: Arc<dyn Clock>,
}

impl<'t, T: Transport + ?Sized> LabelPrinter<'t, T> {
    /// Controller with default options, timings and the system clock.
    pub fn new(transport: &'t mut T) -> Self {
        Self {
            link: Link {
                io: Mutex::new(transport),
                current: Mutex::new(None),
                failure: Mutex::new(None),
            },
            state: JobState::Disconnected,
            options: JobOptions::default(),
            timings: PrintTimings::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timings(mut self, timings: PrintTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Most recent status seen, from a query or the poller
    pub fn current_status(&self) -> Option<Status> {
        self.link.current()
    }

    /// Request and decode one status frame.
    pub fn get_status(&self) -> Result<Status> {
        self.link.query_status()
    }

    /// Send the reset preamble.
    pub fn connect(&mut self) -> Result<()> {
        let result = self.link.send(&commands::reset());
        self.advance(result, JobState::Connected)?;
        info!("connected");
        Ok(())
    }

    /// Send the mode configuration, raster mode first.
    pub fn configure(&mut self) -> Result<()> {
        let result = self.link.configure(&self.options);
        self.advance(result, JobState::ModeConfigured)
    }

    fn advance(&mut self, result: Result<()>, next: JobState) -> Result<()> {
        self.state = match result {
            Ok(()) => next,
            Err(_) => JobState::Error,
        };
        result
    }

    /// Print a job and wait for the printer to finish it.
    ///
    /// ## Errors
    ///
    /// - `PrinterNotReady` if the printer reports an error or no tape;
    ///   nothing but the status request is written in that case
    /// - `PageAdvanceTimeout` / `PrintCompletionTimeout` if the printer
    ///   does not reach the expected phase in time
    /// - transport and encoding errors, including a status read failing
    ///   while the job runs
    ///
    /// Returns a status queried after the job completed.
    pub fn print(&mut self, job: &Job) -> Result<Status> {
        let status = self.get_status().inspect_err(|_| self.state = JobState::Error)?;
        let tape = match (status.ready(), status.tape) {
            (true, Some(tape)) => tape,
            (false, _) => {
                self.state = JobState::Error;
                return Err(PtouchError::PrinterNotReady(status.errors.to_string()));
            }
            (true, None) => {
                self.state = JobState::Error;
                return Err(PtouchError::PrinterNotReady("no tape installed".to_string()));
            }
        };

        let pages = encode_job(job, &tape, self.options.compression)
            .inspect_err(|_| self.state = JobState::Error)?;

        info!(
            pages = pages.len(),
            lines = job.line_count(),
            tape_mm = tape.nominal_width_mm,
            "starting print"
        );
        self.connect()?;

        let Self {
            link,
            state,
            options,
            timings,
            clock,
        } = self;
        let link = &*link;
        let clock: &dyn Clock = &**clock;
        let stop = AtomicBool::new(false);
        link.take_failure();

        let result = thread::scope(|scope| {
            let _poller = StatusPoller::spawn(scope, link, clock, timings.poll_interval, &stop)?;

            let mut run = JobRun {
                link,
                state,
                clock,
                timings: *timings,
            };
            link.configure(options)?;
            *run.state = JobState::ModeConfigured;
            run.transmit(&pages)
        });

        if let Err(e) = result {
            self.state = JobState::Error;
            return Err(e);
        }

        info!("print finished");
        let status = self.get_status().inspect_err(|_| self.state = JobState::Error)?;
        self.state = JobState::Done;
        Ok(status)
    }
}

// ============================================================================
// FOREGROUND
// ============================================================================

/// The caller's half of a running job.
struct JobRun<'a, 't, T: Transport + ?Sized> {
    link: &'a Link<'t, T>,
    state: &'a mut JobState,
    clock: &'a dyn Clock,
    timings: PrintTimings,
}

impl<T: Transport + ?Sized> JobRun<'_, '_, T> {
    fn transmit(&mut self, pages: &[Vec<Vec<u8>>]) -> Result<()> {
        for (i, lines) in pages.iter().enumerate() {
            let page = i + 1;
            *self.state = JobState::Printing { page };

            for line in lines {
                self.link.send(line)?;
            }
            self.link.send(&commands::end_of_page())?;
            debug!(page, lines = lines.len(), "page sent");

            if page < pages.len() {
                *self.state = JobState::AwaitingAdvance { page };
                self.link.send_marker(&commands::next_page())?;
                if !self.wait_for(Status::is_receiving, self.timings.page_advance_timeout)? {
                    warn!(page, "timed out waiting for receiving state");
                    return Err(PtouchError::PageAdvanceTimeout { page });
                }
            }
        }

        *self.state = JobState::AwaitingCompletion;
        self.link.send_marker(&commands::end_of_job())?;
        info!("end of job sent");

        if !self.wait_for(Status::is_done, self.timings.completion_timeout)? {
            warn!("timed out waiting for printing done");
            return Err(PtouchError::PrintCompletionTimeout);
        }
        Ok(())
    }

    /// Poll the shared status until `condition` holds or `timeout` passes.
    ///
    /// Returns `Ok(false)` on timeout and the poller's error if it failed.
    fn wait_for(&self, condition: fn(&Status) -> bool, timeout: Duration) -> Result<bool> {
        let deadline = self.clock.now() + timeout;
        loop {
            if let Some(e) = self.link.take_failure() {
                return Err(e);
            }
            if self.link.current().is_some_and(|s| condition(&s)) {
                return Ok(true);
            }
            self.clock.sleep(self.timings.poll_interval);
            if self.clock.now() > deadline {
                return Ok(false);
            }
        }
    }
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode every page into raster-transfer commands.
fn encode_job(job: &Job, tape: &TapeInfo, compression: bool) -> Result<Vec<Vec<Vec<u8>>>> {
    job.pages()
        .iter()
        .map(|page| encode_page(page, tape, compression))
        .collect()
}

fn encode_page(page: &Page, tape: &TapeInfo, compression: bool) -> Result<Vec<Vec<u8>>> {
    if let Some(line) = page.lines.iter().find(|l| l.len() > tape.line_bytes()) {
        warn!(
            line_bytes = line.len(),
            tape_bytes = tape.line_bytes(),
            "scanline wider than the tape's printable area"
        );
    }

    page.lines
        .iter()
        .map(|line| {
            let encoded = if compression {
                encode_line(line, tape)?
            } else {
                encode_line_uncompressed(line, tape)?
            };
            Ok(commands::raster_line(&encoded))
        })
        .collect()
}

/// The exact byte stream `print` writes for `job`, minus status requests.
///
/// ## Example
///
/// ```
/// use ptouch::printer::{controller, Bitmap, Job, JobOptions};
/// use ptouch::protocol::tables::tape_info;
///
/// let tape = tape_info(24)?.unwrap();
/// let job = Job::from_bitmap(&Bitmap::new(128, 1), 1)?;
/// let bytes = controller::dry_run(&job, &tape, &JobOptions::default())?;
/// assert_eq!(bytes.last(), Some(&0x1A));
/// # Ok::<(), ptouch::error::PtouchError>(())
/// ```
pub fn dry_run(job: &Job, tape: &TapeInfo, options: &JobOptions) -> Result<Vec<u8>> {
    let pages = encode_job(job, tape, options.compression)?;

    let mut out = commands::reset();
    out.extend(configure_commands(options).concat());

    for (i, lines) in pages.iter().enumerate() {
        for line in lines {
            out.extend(line);
        }
        out.extend(commands::end_of_page());
        if i + 1 < pages.len() {
            out.extend(commands::next_page());
        }
    }
    out.extend(commands::end_of_job());

    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================
