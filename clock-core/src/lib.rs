//! Pure chess clock logic library with no platform dependencies.
//! Testable on host, driven by whatever front-end owns the tick source.

use std::fmt;

mod clock;
mod ticker;
mod time_control;

pub use clock::{
    export_record, ChessClock, ClockConfig, ClockState, PerSide, SideConfig, TickOutcome,
    EXPORT_FILE_NAME,
};
pub use ticker::{ManualTicker, Ticker, MAX_TICK_MS, TICK_MS};
pub use time_control::{
    parse_seconds, presets, DelayType, Preset, PresetCategory, TimeControl, PRESETS,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::White, Side::Black];

    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClockError {
    EmptyToken,
    MissingSeparator(String),
    InvalidMinutes(String),
    InvalidIncrement(String),
    ZeroStartTime(String),
    InvalidNumber(String),
    UnknownDelayType(String),
    TickPeriodOutOfRange(u64),
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::EmptyToken => write!(f, "time control is empty"),
            ClockError::MissingSeparator(t) => {
                write!(f, "time control {:?} must look like minutes+seconds", t)
            }
            ClockError::InvalidMinutes(t) => write!(f, "invalid minutes in {:?}", t),
            ClockError::InvalidIncrement(t) => write!(f, "invalid increment in {:?}", t),
            ClockError::ZeroStartTime(t) => write!(f, "time control {:?} starts at zero", t),
            ClockError::InvalidNumber(t) => {
                write!(f, "{:?} is not a non-negative whole number", t)
            }
            ClockError::UnknownDelayType(t) => {
                write!(f, "unknown delay type {:?} (none, bronstein, fischer)", t)
            }
            ClockError::TickPeriodOutOfRange(ms) => {
                write!(f, "tick period {} ms is outside 1..={} ms", ms, MAX_TICK_MS)
            }
        }
    }
}

impl std::error::Error for ClockError {}

/// Format milliseconds as "MM:SS.D" (tenths, truncated)
pub fn format_clock(ms: u64) -> String {
    let total_secs = ms / 1000;
    let tenths = (ms % 1000) / 100;
    let m = total_secs / 60;
    let s = total_secs % 60;
    format!("{:02}:{:02}.{}", m, s, tenths)
}
