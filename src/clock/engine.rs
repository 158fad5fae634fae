use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::host::{Scheduler, TimeSource, TimerId};
use super::observer::{ClockEvent, ClockObserver};
use super::side::Side;
use crate::error::ClockError;
use crate::types::{ClockConfig, Rounding, TimeControl, Units};

/// Point-in-time copy of the clock state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub white: Units,
    pub black: Units,
    pub increment: Units,
    pub active: Option<Side>,
    pub to_move: Side,
    pub flagged: Option<Side>,
}

/// Two-sided countdown clock with increment and flag detection.
///
/// The engine never waits. Every control call runs to completion and, when a side is
/// running, leaves exactly one tick scheduled with the host. The host hands expired
/// timers back through [`ClockEngine::on_tick_fired`]; the engine measures real elapsed
/// time against a monotonic anchor on each tick, so a late tick costs the right amount.
pub struct ClockEngine<S: Scheduler, T: TimeSource, O: ClockObserver> {
    remaining: [Units; 2],
    increment: Units,
    active: Option<Side>,
    to_move: Side,
    flagged: Option<Side>,
    last_tick: Option<Instant>,
    pending: Option<TimerId>,
    unit: Duration,
    rounding: Rounding,
    scheduler: S,
    time: T,
    observer: O,
}

impl<S: Scheduler, T: TimeSource, O: ClockObserver> ClockEngine<S, T, O> {
    /// Build an idle clock with White to move. Nothing is emitted until the first control call.
    pub fn new(config: &ClockConfig, scheduler: S, time: T, observer: O) -> Result<Self, ClockError> {
        config.validate()?;
        let control = config.control.validate()?;

        Ok(Self {
            remaining: [control.white, control.black],
            increment: control.increment,
            active: None,
            to_move: Side::White,
            flagged: None,
            last_tick: None,
            pending: None,
            unit: config.unit(),
            rounding: config.rounding,
            scheduler,
            time,
            observer,
        })
    }

    /// Stop the clock and load a fresh time control with White to move.
    pub fn reset(&mut self, control: TimeControl) -> Result<(), ClockError> {
        let control = control.validate()?;

        self.cancel_schedule();
        self.remaining = [control.white, control.black];
        self.increment = control.increment;
        self.active = None;
        self.to_move = Side::White;
        self.flagged = None;
        self.last_tick = None;

        info!(white = control.white, black = control.black, increment = control.increment, "clock reset");
        self.emit_balances();
        Ok(())
    }

    /// Run the countdown for the side to move. Restarts the tick cadence if already running.
    pub fn start(&mut self) {
        let side = self.to_move;
        self.active = Some(side);
        self.flagged = None;
        self.restart_ticks();
        debug!(%side, "clock started");
    }

    /// Stop the running side without charging the partial unit since the last tick.
    pub fn pause(&mut self) {
        let Some(side) = self.active.take() else {
            return;
        };
        self.to_move = side;
        self.cancel_schedule();
        debug!(%side, "clock paused");
    }

    /// A move was completed: credit the mover, hand the move over and run the opponent.
    ///
    /// The mover is the running side, or the side to move when the clock is stopped, so
    /// the first press of a game both ends White's move and starts Black's clock.
    pub fn press(&mut self) {
        let mover = self.active.unwrap_or(self.to_move);
        let balance = &mut self.remaining[mover.to_index()];
        *balance = balance.saturating_add(self.increment);

        let next = !mover;
        self.to_move = next;
        self.active = Some(next);
        self.flagged = None;
        debug!(%mover, balance = self.remaining[mover.to_index()], %next, "clock pressed");

        self.observer.notify(ClockEvent::Switch(next));
        self.restart_ticks();
    }

    /// Stop the clock and hand the move to `side`. Balances are left as they are.
    pub fn set_side_to_move(&mut self, side: Side) {
        self.pause();
        self.to_move = side;
        debug!(%side, "side to move set");
    }

    /// Replace balances and increment mid-game. Running state and schedule are left alone.
    pub fn reconfigure(&mut self, control: TimeControl) -> Result<(), ClockError> {
        let control = control.validate()?;

        self.remaining = [control.white, control.black];
        self.increment = control.increment;

        info!(white = control.white, black = control.black, increment = control.increment, "clock reconfigured");
        self.emit_balances();
        Ok(())
    }

    /// Entry point for an expired timer.
    ///
    /// Ticks that arrive after a pause, reset, press or flag are discarded: host cancellation
    /// is best-effort and a timer may already be on its way back when it is cancelled.
    pub fn on_tick_fired(&mut self, timer: TimerId) {
        let Some(side) = self.active else {
            trace!(%timer, "discarding tick fired while stopped");
            self.pending = None;
            return;
        };
        if self.pending != Some(timer) {
            trace!(%timer, "discarding superseded tick");
            return;
        }
        self.pending = None;

        let now = self.time.now();
        let anchor = self.last_tick.unwrap_or(now);
        let elapsed = now.saturating_duration_since(anchor);
        let (units, consumed) = elapsed_units(elapsed, self.unit, self.rounding);

        let anchor = match self.rounding {
            Rounding::Nearest => now,
            Rounding::Carry => anchor + consumed,
        };
        self.last_tick = Some(anchor);

        if units == 0 && !elapsed.is_zero() && self.rounding == Rounding::Nearest {
            warn!(%side, elapsed_ms = elapsed.as_millis() as u64, "tick rounded to zero units; elapsed time absorbed");
        }

        let balance = &mut self.remaining[side.to_index()];
        *balance = balance.saturating_sub(units);
        let remaining = *balance;
        debug!(%side, units, remaining, elapsed_ms = elapsed.as_millis() as u64, "tick");

        self.observer.notify(ClockEvent::Tick { side, remaining });

        if remaining == 0 {
            self.active = None;
            self.to_move = side;
            self.flagged = Some(side);
            self.cancel_schedule();
            info!(%side, "flag fell");
            self.observer.notify(ClockEvent::Flag(side));
            return;
        }

        let delay = match self.rounding {
            Rounding::Nearest => self.unit,
            // land the next tick on the next whole-unit boundary
            Rounding::Carry => self.unit.saturating_sub(now.saturating_duration_since(anchor)),
        };
        self.pending = Some(self.scheduler.schedule_after(delay));
    }

    pub fn remaining(&self, side: Side) -> Units {
        self.remaining[side.to_index()]
    }

    pub fn increment(&self) -> Units {
        self.increment
    }

    /// Side whose countdown is running, if any.
    pub fn active_side(&self) -> Option<Side> {
        self.active
    }

    pub fn side_to_move(&self) -> Side {
        self.to_move
    }

    /// Side whose flag fell in the last countdown, until the next start/press/reset.
    pub fn flagged(&self) -> Option<Side> {
        self.flagged
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            white: self.remaining(Side::White),
            black: self.remaining(Side::Black),
            increment: self.increment,
            active: self.active,
            to_move: self.to_move,
            flagged: self.flagged,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn restart_ticks(&mut self) {
        self.cancel_schedule();
        self.last_tick = Some(self.time.now());
        self.pending = Some(self.scheduler.schedule_after(self.unit));
    }

    fn cancel_schedule(&mut self) {
        if let Some(timer) = self.pending.take()
            && let Err(err) = self.scheduler.cancel(timer)
        {
            trace!(%timer, %err, "ignoring failed cancellation");
        }
    }

    fn emit_balances(&mut self) {
        for side in Side::ALL {
            let remaining = self.remaining[side.to_index()];
            self.observer.notify(ClockEvent::Tick { side, remaining });
        }
    }
}

impl<S: Scheduler, T: TimeSource, O: ClockObserver> Drop for ClockEngine<S, T, O> {
    fn drop(&mut self) {
        self.cancel_schedule();
    }
}

/// Whole units to charge for `elapsed`, and the span of time those units cover.
fn elapsed_units(elapsed: Duration, unit: Duration, rounding: Rounding) -> (Units, Duration) {
    let unit_ns = unit.as_nanos().max(1);
    let elapsed_ns = elapsed.as_nanos();

    let whole = match rounding {
        Rounding::Nearest => (elapsed_ns * 2 + unit_ns) / (unit_ns * 2),
        Rounding::Carry => elapsed_ns / unit_ns,
    };
    let units = Units::try_from(whole).unwrap_or(Units::MAX);
    let consumed = unit.saturating_mul(u32::try_from(units).unwrap_or(u32::MAX));
    (units, consumed)
}
