use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Side;
use crate::error::{ClockError, ConfigError};

/// Balances and increments are counted in whole clock units.
pub type Units = u64;

pub const DEFAULT_BASE_UNITS: i64 = 180;
pub const DEFAULT_INCREMENT_UNITS: i64 = 2;
pub const DEFAULT_UNIT_MS: u64 = 1000;

/// Starting balances and per-move increment, in clock units.
///
/// Fields are signed so that a negative value coming from a config file or a
/// command line is rejected by [`TimeControl::validate`] instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    pub white: i64,
    pub black: i64,
    pub increment: i64,
}

impl TimeControl {
    pub fn new(white: i64, black: i64, increment: i64) -> Self {
        Self { white, black, increment }
    }

    pub fn symmetric(base: i64, increment: i64) -> Self {
        Self::new(base, base, increment)
    }

    /// Check every field and convert to unsigned units.
    pub fn validate(&self) -> Result<ValidTimeControl, ClockError> {
        let white = non_negative_time(Side::White, self.white)?;
        let black = non_negative_time(Side::Black, self.black)?;
        let increment = Units::try_from(self.increment)
            .map_err(|_| ClockError::NegativeIncrement { value: self.increment })?;
        Ok(ValidTimeControl { white, black, increment })
    }
}

fn non_negative_time(side: Side, value: i64) -> Result<Units, ClockError> {
    Units::try_from(value).map_err(|_| ClockError::NegativeTime { side, value })
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::symmetric(DEFAULT_BASE_UNITS, DEFAULT_INCREMENT_UNITS)
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.white == self.black {
            write!(f, "{}+{}", self.white, self.increment)
        } else {
            write!(f, "{}/{}+{}", self.white, self.black, self.increment)
        }
    }
}

/// Parses `"180+2"` or `"180/150+2"`. A missing `+I` means no increment.
impl FromStr for TimeControl {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClockError::InvalidTimeControl(s.to_string());

        let (base, increment) = match s.trim().split_once('+') {
            Some((base, inc)) => (base, inc.trim().parse::<i64>().map_err(|_| invalid())?),
            None => (s.trim(), 0),
        };

        let control = match base.split_once('/') {
            Some((white, black)) => TimeControl::new(
                white.trim().parse().map_err(|_| invalid())?,
                black.trim().parse().map_err(|_| invalid())?,
                increment,
            ),
            None => TimeControl::symmetric(base.trim().parse().map_err(|_| invalid())?, increment),
        };

        control.validate()?;
        Ok(control)
    }
}

/// A time control whose fields are known to be non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidTimeControl {
    pub white: Units,
    pub black: Units,
    pub increment: Units,
}


/// How elapsed real time is converted to whole units on each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Round to the nearest unit (half up) and re-anchor at the tick instant.
    /// Sub-half-unit intervals are absorbed.
    #[default]
    Nearest,
    /// Take whole elapsed units and carry the remainder into the next tick.
    Carry,
}

impl FromStr for Rounding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Rounding::Nearest),
            "carry" => Ok(Rounding::Carry),
            other => Err(ConfigError::UnknownRounding(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub control: TimeControl,
    /// Length of one clock unit in milliseconds; also the tick cadence.
    pub unit_ms: u64,
    pub rounding: Rounding,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            control: TimeControl::default(),
            unit_ms: DEFAULT_UNIT_MS,
            rounding: Rounding::default(),
        }
    }
}

impl ClockConfig {
    pub fn unit(&self) -> Duration {
        Duration::from_millis(self.unit_ms)
    }

    pub fn validate(&self) -> Result<(), ClockError> {
        if self.unit_ms == 0 {
            return Err(ClockError::InvalidUnit);
        }
        self.control.validate()?;
        Ok(())
    }

    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ClockConfig = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(path = %path.as_ref().display(), control = %config.control, "loaded clock config");
        Ok(config)
    }
}
