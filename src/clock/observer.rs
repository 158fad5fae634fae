//! Notifications emitted by the clock.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::Side;
use crate::types::Units;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// A side's displayed balance changed (reset, reconfigure, or a completed tick).
    Tick { side: Side, remaining: Units },
    /// A press handed the move to `side`.
    Switch(Side),
    /// `side` ran out of time.
    Flag(Side),
}

impl fmt::Display for ClockEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockEvent::Tick { side, remaining } => write!(f, "tick {side} {remaining}"),
            ClockEvent::Switch(side) => write!(f, "switch {side}"),
            ClockEvent::Flag(side) => write!(f, "flag {side}"),
        }
    }
}

/// Receives clock events. Called synchronously after the state change it reports.
pub trait ClockObserver {
    fn notify(&mut self, event: ClockEvent);
}

impl<F: FnMut(ClockEvent)> ClockObserver for F {
    fn notify(&mut self, event: ClockEvent) {
        self(event)
    }
}

/// Shared, clonable record of every event, for hosts that poll instead of react.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<ClockEvent>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<ClockEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl ClockObserver for EventLog {
    fn notify(&mut self, event: ClockEvent) {
        self.0.borrow_mut().push(event);
    }
}
