//! Deterministic host for driving the clock by hand: time only moves when told to, and
//! timers only fire when the caller pops them.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::host::{Scheduler, TimeSource, TimerId};
use crate::error::SchedulerError;

/// Time source that only advances on [`ManualTime::advance`]. Clones share one timeline.
#[derive(Clone, Debug)]
pub struct ManualTime {
    now: Rc<Cell<Instant>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self { now: Rc::new(Cell::new(Instant::now())) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Scheduler that queues timers instead of waiting on them.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: VecDeque<(TimerId, Duration)>,
    scheduled: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest pending timer, as if it had just expired.
    pub fn fire_next(&mut self) -> Option<TimerId> {
        self.pending.pop_front().map(|(id, _)| id)
    }

    /// Delay requested for the oldest pending timer.
    pub fn next_delay(&self) -> Option<Duration> {
        self.pending.front().map(|&(_, delay)| delay)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn scheduled_total(&self) -> u64 {
        self.scheduled
    }

    pub fn cancelled_total(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId::new(self.next_id);
        self.pending.push_back((id, delay));
        self.scheduled += 1;
        id
    }

    fn cancel(&mut self, timer: TimerId) -> Result<(), SchedulerError> {
        let idx = self
            .pending
            .iter()
            .position(|&(id, _)| id == timer)
            .ok_or(SchedulerError::NotPending(timer))?;
        self.pending.remove(idx);
        self.cancelled += 1;
        Ok(())
    }
}
