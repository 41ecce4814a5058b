//! # Clocks
//!
//! The job controller never calls `Instant::now` or `thread::sleep`
//! directly. It goes through a [`Clock`], so deadlines can be exercised in
//! simulated time.
//!
//! - [`SystemClock`]: real monotonic time, real sleeps
//! - [`SimulatedClock`]: virtual time advanced by `sleep`

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Source of monotonic time and sleeping, shared by the foreground job
/// and the status poller.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);

    /// Pause a background loop. Unlike `sleep`, this never moves simulated
    /// time, so only the foreground's waits count against its deadlines.
    fn idle(&self, duration: Duration) {
        self.sleep(duration);
    }
}

/// Wall clock backed by `std::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// # Simulated Clock
///
/// Virtual time that only moves when somebody sleeps. Every `sleep` advances
/// the shared time by the requested duration and then yields for `pace` of
/// real time, giving the other thread a chance to run. `idle` only yields.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use ptouch::printer::clock::{Clock, SimulatedClock};
///
/// let clock = SimulatedClock::new();
/// let start = clock.now();
/// clock.sleep(Duration::from_secs(20));
/// assert_eq!(clock.now() - start, Duration::from_secs(20));
/// ```
#[derive(Debug)]
pub struct SimulatedClock {
    now: Mutex<Instant>,
    pace: Duration,
}

impl SimulatedClock {
    /// Real time yielded per simulated sleep
    pub const DEFAULT_PACE: Duration = Duration::from_millis(1);

    pub fn new() -> Self {
        Self::with_pace(Self::DEFAULT_PACE)
    }

    pub fn with_pace(pace: Duration) -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            pace,
        }
    }

    /// Move virtual time forward without sleeping
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += duration;
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        self.idle(duration);
    }

    fn idle(&self, _duration: Duration) {
        if self.pace.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(self.pace);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
