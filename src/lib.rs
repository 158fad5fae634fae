//! # flagfall
//!
//! A two-sided chess clock that never blocks its caller. The [`clock::ClockEngine`] keeps
//! both balances, applies the increment on every press, corrects for late timer delivery and
//! reports ticks, switches and flag falls. Waiting is left to the host: anything that can run
//! a callback after a delay (see [`clock::Scheduler`]) can drive it. [`runtime`] provides a
//! tokio host and [`session`] pairs the clock with a board for a playable terminal game.

pub mod clock;
pub mod error;
pub mod logging;
pub mod notation;
pub mod runtime;
pub mod session;
pub mod types;

pub use clock::{ClockEngine, ClockEvent, ClockObserver, Scheduler, Side, TimeSource, TimerId};
pub use error::{ClockError, ConfigError, SessionError};
pub use types::{ClockConfig, Rounding, TimeControl};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
