//! Capabilities the clock borrows from its host: delayed callbacks and a monotonic clock.

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::SchedulerError;

/// Opaque identifier for a scheduled tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A "run once after a delay" timer with best-effort cancellation.
///
/// When a timer expires the host hands its id back to
/// [`ClockEngine::on_tick_fired`](super::ClockEngine::on_tick_fired). The host must not block
/// in `schedule_after`; waiting is the host's business.
pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timer. Cancelling a timer that already fired, or is about to, may
    /// fail or silently do nothing; callers must tolerate a late delivery either way.
    fn cancel(&mut self, timer: TimerId) -> Result<(), SchedulerError>;
}

/// Monotonic time source, immune to wall-clock adjustments.
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// [`TimeSource`] backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
