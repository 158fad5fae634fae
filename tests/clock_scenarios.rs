use std::time::Duration;

use proptest::prelude::*;

use flagfall::clock::{ClockEngine, ClockEvent, EventLog, ManualScheduler, ManualTime, Side};
use flagfall::{ClockConfig, TimeControl};

type Clock = ClockEngine<ManualScheduler, ManualTime, EventLog>;

fn new_clock(control: TimeControl) -> (Clock, ManualTime, EventLog) {
    let time = ManualTime::new();
    let log = EventLog::new();
    let config = ClockConfig { control, ..Default::default() };
    let mut clock = ClockEngine::new(&config, ManualScheduler::new(), time.clone(), log.clone()).unwrap();
    clock.reset(control).unwrap();
    (clock, time, log)
}

/// Let `millis` pass and deliver the pending tick, if there is one.
fn advance(clock: &mut Clock, time: &ManualTime, millis: u64) {
    time.advance(Duration::from_millis(millis));
    if let Some(timer) = clock.scheduler_mut().fire_next() {
        clock.on_tick_fired(timer);
    }
}

fn tick(side: Side, remaining: u64) -> ClockEvent {
    ClockEvent::Tick { side, remaining }
}

#[test]
fn blitz_game_walkthrough() {
    let (mut clock, time, log) = new_clock(TimeControl::new(180, 180, 2));
    assert_eq!(log.take(), vec![tick(Side::White, 180), tick(Side::Black, 180)]);

    clock.start();
    advance(&mut clock, &time, 1000);
    assert_eq!(log.take(), vec![tick(Side::White, 179)]);

    clock.press();
    assert_eq!(log.take(), vec![ClockEvent::Switch(Side::Black)]);
    assert_eq!(clock.remaining(Side::White), 181);
    assert_eq!(clock.active_side(), Some(Side::Black));

    advance(&mut clock, &time, 1000);
    assert_eq!(log.take(), vec![tick(Side::Black, 179)]);

    clock.reconfigure(TimeControl::new(60, 60, 0)).unwrap();
    assert_eq!(log.take(), vec![tick(Side::White, 60), tick(Side::Black, 60)]);
    assert_eq!(clock.active_side(), Some(Side::Black));
}

#[test]
fn flag_with_in_flight_tick() {
    let (mut clock, time, log) = new_clock(TimeControl::new(1, 60, 0));
    log.take();
    clock.start();

    let timer = clock.scheduler_mut().fire_next().unwrap();
    time.advance(Duration::from_millis(1000));
    clock.on_tick_fired(timer);
    assert_eq!(log.take(), vec![tick(Side::White, 0), ClockEvent::Flag(Side::White)]);
    assert_eq!(clock.active_side(), None);

    // the same timer delivered twice, as a racing host might
    clock.on_tick_fired(timer);
    time.advance(Duration::from_millis(5000));
    assert!(clock.scheduler_mut().fire_next().is_none());
    assert!(log.is_empty());
}

#[test]
fn many_pause_resume_cycles_lose_no_turns() {
    let (mut clock, time, log) = new_clock(TimeControl::new(600, 600, 0));
    clock.press(); // black to run
    log.take();

    for _ in 0..50 {
        advance(&mut clock, &time, 1000);
        clock.pause();
        time.advance(Duration::from_secs(30));
        clock.start();
    }

    assert_eq!(clock.active_side(), Some(Side::Black));
    assert_eq!(clock.remaining(Side::Black), 550);
    assert_eq!(clock.remaining(Side::White), 600);
    assert!(log.take().iter().all(|e| matches!(e, ClockEvent::Tick { side: Side::Black, .. })));
}

#[test]
fn long_game_tracks_wall_clock_under_jitter() {
    let (mut clock, time, _log) = new_clock(TimeControl::new(600, 600, 0));
    clock.start();

    // deliveries alternate early and late but average one unit
    let mut elapsed = 0;
    for i in 0..120 {
        let jitter = if i % 2 == 0 { 1300 } else { 700 };
        advance(&mut clock, &time, jitter);
        elapsed += jitter;
    }
    assert_eq!(elapsed, 120_000);
    assert_eq!(clock.remaining(Side::White), 480);
}

#[derive(Clone, Debug)]
enum Op {
    Start,
    Pause,
    Press,
    Wait(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Pause),
        Just(Op::Press),
        (0u64..4000).prop_map(Op::Wait),
    ]
}

proptest! {
    #[test]
    fn balances_never_negative_and_flags_fire_once(
        base in 0i64..8,
        increment in 0i64..3,
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let (mut clock, time, log) = new_clock(TimeControl::new(base, base, increment));
        log.take();

        for op in ops {
            match op {
                Op::Start => clock.start(),
                Op::Pause => clock.pause(),
                Op::Press => clock.press(),
                Op::Wait(ms) => advance(&mut clock, &time, ms),
            }

            let events = log.take();
            let flags: Vec<Side> = events
                .iter()
                .filter_map(|e| match e { ClockEvent::Flag(side) => Some(*side), _ => None })
                .collect();
            prop_assert!(flags.len() <= 1);
            if let Some(side) = flags.first() {
                // the flag is the last event and nothing follows until a new start/press
                prop_assert_eq!(events.last(), Some(&ClockEvent::Flag(*side)));
                prop_assert_eq!(clock.active_side(), None);
                prop_assert_eq!(clock.remaining(*side), 0);
            }

            // a stopped clock has nothing outstanding, a running one exactly one tick
            prop_assert_eq!(clock.has_pending_tick(), clock.is_running());
            prop_assert_eq!(clock.scheduler().pending(), usize::from(clock.is_running()));
        }
    }

    #[test]
    fn press_is_identical_from_paused_and_running(
        base in 1i64..600,
        increment in 0i64..30,
        first_runs in any::<bool>(),
    ) {
        let (mut paused, _t1, paused_log) = new_clock(TimeControl::new(base, base, increment));
        let (mut running, _t2, running_log) = new_clock(TimeControl::new(base, base, increment));
        if first_runs {
            paused.press();
            running.press();
        }
        paused.pause();
        running.start();

        paused.press();
        running.press();
        prop_assert_eq!(paused.snapshot(), running.snapshot());
        prop_assert_eq!(paused_log.take(), running_log.take());
    }
}
