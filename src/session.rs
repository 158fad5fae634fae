use shakmaty::san::{ParseSanError, SanPlus};
use shakmaty::{Chess, Position};
use tracing::{info, warn};

use crate::clock::{ClockEngine, ClockObserver, Scheduler, Side, TimeSource, TimerId};
use crate::error::SessionError;
use crate::notation;
use crate::types::TimeControl;

/// Outcome of one command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print beyond the clock events the command produced.
    Silent,
    Text(String),
    Quit,
}

/// A game in progress: the board, its move list for undo, and the clock.
///
/// The board decides which moves are legal; the clock only hears about completed moves
/// through `press`.
pub struct GameSession<S: Scheduler, T: TimeSource, O: ClockObserver> {
    position: Chess,
    history: Vec<Chess>,
    moves: Vec<String>,
    clock: ClockEngine<S, T, O>,
    default_control: TimeControl,
}

impl<S: Scheduler, T: TimeSource, O: ClockObserver> GameSession<S, T, O> {
    pub fn new(clock: ClockEngine<S, T, O>, default_control: TimeControl) -> Self {
        Self {
            position: Chess::default(),
            history: Vec::new(),
            moves: Vec::new(),
            clock,
            default_control,
        }
    }

    pub fn clock(&self) -> &ClockEngine<S, T, O> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut ClockEngine<S, T, O> {
        &mut self.clock
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Moves played so far, as entered.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Finished by checkmate, stalemate, insufficient material, or a fallen flag.
    pub fn is_over(&self) -> bool {
        self.clock.flagged().is_some() || self.position.is_game_over()
    }

    /// Forward an expired timer to the clock.
    pub fn on_timer(&mut self, timer: TimerId) {
        self.clock.on_tick_fired(timer);
    }

    /// Fresh board and clock. Uses the session default when `control` is `None`.
    pub fn new_game(&mut self, control: Option<TimeControl>) -> Result<(), SessionError> {
        let control = control.unwrap_or(self.default_control);
        self.clock.reset(control)?;
        self.position = Chess::default();
        self.history.clear();
        self.moves.clear();
        info!(%control, "new game");
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> Result<Reply, SessionError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            return Ok(Reply::Silent);
        };

        match command {
            "new" => {
                let control = tokens.get(1).map(|tc| tc.parse::<TimeControl>()).transpose()?;
                self.new_game(control)?;
                Ok(Reply::Silent)
            }
            "start" => {
                self.ensure_in_progress()?;
                self.clock.start();
                Ok(Reply::Silent)
            }
            "pause" => {
                self.clock.pause();
                Ok(Reply::Silent)
            }
            "press" => {
                self.ensure_in_progress()?;
                self.clock.press();
                Ok(Reply::Silent)
            }
            "move" | "m" => {
                let san = tokens.get(1).ok_or(SessionError::MissingArgument("move"))?;
                self.play_san(san)?;
                Ok(Reply::Silent)
            }
            "say" => {
                if tokens.len() < 2 {
                    return Err(SessionError::MissingArgument("say"));
                }
                let san = notation::spoken_to_san(&tokens[1..].join(" "))?;
                self.play_san(&san)?;
                Ok(Reply::Text(format!("heard {san}")))
            }
            "undo" => {
                self.undo()?;
                Ok(Reply::Silent)
            }
            "tc" => {
                let control: TimeControl = tokens.get(1).ok_or(SessionError::MissingArgument("tc"))?.parse()?;
                self.clock.reconfigure(control)?;
                Ok(Reply::Silent)
            }
            "status" => Ok(Reply::Text(self.status_line())),
            "moves" => Ok(Reply::Text(self.moves.join(" "))),
            "d" | "print" => Ok(Reply::Text(self.board_line())),
            "quit" => {
                self.clock.pause();
                Ok(Reply::Quit)
            }
            other => Err(SessionError::UnknownCommand(other.to_string())),
        }
    }

    /// Play a SAN move on the board and press the clock for the mover.
    pub fn play_san(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_in_progress()?;

        let illegal = |reason: String| SessionError::IllegalMove { san: text.to_string(), reason };
        let san: SanPlus = text.parse().map_err(|e: ParseSanError| illegal(e.to_string()))?;
        let mv = san.san.to_move(&self.position).map_err(|e| illegal(e.to_string()))?;

        let mover = Side::from(self.position.turn());
        if mover != self.clock.side_to_move() {
            warn!(%mover, clock = %self.clock.side_to_move(), "board turn and clock disagree");
        }

        let mut next = self.position.clone();
        next.play_unchecked(&mv);
        self.history.push(std::mem::replace(&mut self.position, next));
        self.moves.push(text.to_string());
        self.clock.press();

        if self.position.is_game_over() {
            self.clock.pause();
            info!(moves = self.moves.len(), "game over on the board");
        }
        Ok(())
    }

    /// Take back the last move. The clock stops with the move handed back to the board's
    /// side to move; balances, including any increment already credited, are kept.
    pub fn undo(&mut self) -> Result<(), SessionError> {
        let previous = self.history.pop().ok_or(SessionError::NothingToUndo)?;
        self.position = previous;
        self.moves.pop();
        self.clock.set_side_to_move(Side::from(self.position.turn()));
        Ok(())
    }

    pub fn status_line(&self) -> String {
        let snap = self.clock.snapshot();
        let active = snap.active.map_or_else(|| "none".to_string(), |side| side.to_string());
        let mut line = format!(
            "white {} black {} inc {} active {} tomove {}",
            snap.white, snap.black, snap.increment, active, snap.to_move
        );
        if let Some(side) = snap.flagged {
            line.push_str(&format!(" flagged {side}"));
        }
        line
    }

    fn board_line(&self) -> String {
        format!("{} {}", self.position.board(), self.position.turn().char())
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.is_over() {
            return Err(SessionError::GameOver);
        }
        Ok(())
    }
}
