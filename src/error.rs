//! Error types for the clock, its host and the game session

use thiserror::Error;

use crate::clock::{Side, TimerId};

/// Configuration errors rejected by the clock control API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("{side} time must not be negative (got {value})")]
    NegativeTime { side: Side, value: i64 },

    #[error("Increment must not be negative (got {value})")]
    NegativeIncrement { value: i64 },

    #[error("Invalid time control: {0:?} (expected W+I or W/B+I)")]
    InvalidTimeControl(String),

    #[error("Clock unit must be longer than zero")]
    InvalidUnit,
}

/// Errors reported by a host scheduler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Timer {0} is no longer pending")]
    NotPending(TimerId),
}

/// Errors from normalizing spoken move text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("Nothing was said")]
    Empty,

    #[error("Word {0:?} is not in the move vocabulary")]
    UnknownWord(String),
}

/// Errors from handling a session command
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("Notation error: {0}")]
    Notation(#[from] NotationError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command {0} needs an argument")]
    MissingArgument(&'static str),

    #[error("Illegal move {san}: {reason}")]
    IllegalMove { san: String, reason: String },

    #[error("No moves to undo")]
    NothingToUndo,

    #[error("Game is over")]
    GameOver,
}

/// Errors loading a clock configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Clock(#[from] ClockError),

    #[error("Unknown rounding policy: {0}")]
    UnknownRounding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_error_display() {
        let error = ClockError::NegativeTime { side: Side::Black, value: -7 };
        assert!(error.to_string().contains("black"));
        assert!(error.to_string().contains("-7"));

        let error = ClockError::NegativeIncrement { value: -2 };
        assert!(error.to_string().contains("-2"));
    }

    #[test]
    fn test_error_conversion() {
        let session: SessionError = ClockError::InvalidUnit.into();
        assert!(matches!(session, SessionError::Clock(ClockError::InvalidUnit)));

        let session: SessionError = NotationError::Empty.into();
        assert!(matches!(session, SessionError::Notation(NotationError::Empty)));

        let config: ConfigError = ClockError::InvalidUnit.into();
        assert!(matches!(config, ConfigError::Clock(_)));
    }

    #[test]
    fn test_scheduler_error_names_timer() {
        let error = SchedulerError::NotPending(TimerId::new(42));
        assert!(error.to_string().contains("42"));
    }
}
