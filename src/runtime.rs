//! Tokio host for the clock: timers are sleeping tasks that report back over a channel, and a
//! single loop serializes commands and expired timers onto one `GameSession`.

use std::collections::HashMap;
use std::io::{self, BufRead};
use std::thread;
use std::time::{Duration, Instant};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::{ClockEngine, ClockEvent, Scheduler, TimeSource, TimerId};
use crate::error::SchedulerError;
use crate::session::{GameSession, Reply};
use crate::types::ClockConfig;

/// [`Scheduler`] that spawns one sleeping task per timer on the current tokio runtime.
pub struct TokioScheduler {
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
    fired: UnboundedSender<TimerId>,
}

impl TokioScheduler {
    /// Returns the scheduler and the channel on which expired timer ids arrive.
    pub fn new() -> (Self, UnboundedReceiver<TimerId>) {
        let (fired, expired) = mpsc::unbounded_channel();
        let scheduler = Self { next_id: 0, tasks: HashMap::new(), fired };
        (scheduler, expired)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerId {
        self.tasks.retain(|_, task| !task.is_finished());

        self.next_id += 1;
        let id = TimerId::new(self.next_id);
        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired.send(id);
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, timer: TimerId) -> Result<(), SchedulerError> {
        match self.tasks.remove(&timer) {
            Some(task) if !task.is_finished() => {
                task.abort();
                Ok(())
            }
            // already fired; its id may still be sitting in the channel
            _ => Err(SchedulerError::NotPending(timer)),
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}

/// [`TimeSource`] reading tokio's clock, so paused test time drives the engine too.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTime;

impl TimeSource for TokioTime {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Read stdin lines on a dedicated thread. The channel closes at EOF.
pub fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Drive a game session from command lines until `quit` or the command channel closes.
///
/// Clock events are written as they are produced, ahead of the reply to the command that
/// caused them.
pub async fn run<W>(mut commands: UnboundedReceiver<String>, mut output: W, config: &ClockConfig) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let (scheduler, mut timers) = TokioScheduler::new();
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let clock = ClockEngine::new(config, scheduler, TokioTime, move |event: ClockEvent| {
        let _ = events_tx.send(event);
    })?;
    let mut session = GameSession::new(clock, config.control);
    session.new_game(None)?;
    write_events(&mut events, &mut output).await?;

    loop {
        tokio::select! {
            line = commands.recv() => {
                let Some(line) = line else { break };
                let reply = session.handle_line(line.trim());
                write_events(&mut events, &mut output).await?;
                match reply {
                    Ok(Reply::Quit) => break,
                    Ok(Reply::Text(text)) => write_line(&mut output, &text).await?,
                    Ok(Reply::Silent) => {}
                    Err(err) => {
                        warn!(command = %line.trim(), %err, "command failed");
                        write_line(&mut output, &format!("error {err}")).await?;
                    }
                }
            }
            Some(timer) = timers.recv() => {
                debug!(%timer, "timer expired");
                session.on_timer(timer);
                write_events(&mut events, &mut output).await?;
            }
        }
    }

    output.flush().await?;
    Ok(())
}

async fn write_events<W: AsyncWrite + Unpin>(
    events: &mut UnboundedReceiver<ClockEvent>,
    output: &mut W,
) -> io::Result<()> {
    while let Ok(event) = events.try_recv() {
        write_line(output, &event.to_string()).await?;
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeControl;

    fn config(control: TimeControl) -> ClockConfig {
        ClockConfig { control, ..Default::default() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_delivers_after_delay() {
        let (mut scheduler, mut expired) = TokioScheduler::new();
        let id = scheduler.schedule_after(Duration::from_secs(1));

        let start = tokio::time::Instant::now();
        assert_eq!(expired.recv().await, Some(id));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_cancel() {
        let (mut scheduler, mut expired) = TokioScheduler::new();
        let id = scheduler.schedule_after(Duration::from_secs(1));
        assert!(scheduler.cancel(id).is_ok());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(expired.try_recv().is_err());
        assert_eq!(scheduler.cancel(id), Err(SchedulerError::NotPending(id)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_not_pending() {
        let (mut scheduler, mut expired) = TokioScheduler::new();
        let id = scheduler.schedule_after(Duration::from_millis(10));
        assert_eq!(expired.recv().await, Some(id));
        tokio::task::yield_now().await;
        assert_eq!(scheduler.cancel(id), Err(SchedulerError::NotPending(id)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_ticks_on_tokio_host() {
        let (scheduler, mut expired) = TokioScheduler::new();
        let mut log = Vec::new();
        let mut clock = ClockEngine::new(
            &config(TimeControl::new(3, 3, 0)),
            scheduler,
            TokioTime,
            |event: ClockEvent| log.push(event),
        )
        .unwrap();

        clock.start();
        while let Some(timer) = expired.recv().await {
            clock.on_tick_fired(timer);
            if !clock.is_running() {
                break;
            }
        }
        drop(clock);

        assert_eq!(
            log,
            vec![
                ClockEvent::Tick { side: crate::clock::Side::White, remaining: 2 },
                ClockEvent::Tick { side: crate::clock::Side::White, remaining: 1 },
                ClockEvent::Tick { side: crate::clock::Side::White, remaining: 0 },
                ClockEvent::Flag(crate::clock::Side::White),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_until_flag() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("start".to_string()).unwrap();
        tx.send("bogus".to_string()).unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let _ = tx.send("status".to_string());
            let _ = tx.send("quit".to_string());
        });

        let mut out: Vec<u8> = Vec::new();
        run(rx, &mut out, &config(TimeControl::new(2, 2, 0))).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "tick white 2",
                "tick black 2",
                "error Unknown command: bogus",
                "tick white 1",
                "tick white 0",
                "flag white",
                "white 0 black 2 inc 0 active none tomove white flagged white",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_ends_when_commands_close() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        let mut out: Vec<u8> = Vec::new();
        run(rx, &mut out, &ClockConfig::default()).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "tick white 180\ntick black 180\n");
    }
}
