use std::ops::{Index, IndexMut};

use crate::ticker::{Ticker, MAX_TICK_MS, TICK_MS};
use crate::time_control::{DelayType, TimeControl};
use crate::{ClockError, Side};

pub const EXPORT_FILE_NAME: &str = "clock.pgn";

/// One value per side, indexed by `Side`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PerSide<T>([T; 2]);

impl<T> PerSide<T> {
    pub fn new(white: T, black: T) -> Self {
        Self([white, black])
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        &self.0[side.index()]
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        &mut self.0[side.index()]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SideConfig {
    pub time_control: TimeControl,
    pub increment_sec: u32,
}

impl SideConfig {
    /// Increment taken from the token itself.
    pub fn from_time_control(time_control: TimeControl) -> Self {
        Self {
            time_control,
            increment_sec: time_control.increment_sec,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ClockConfig {
    pub white: SideConfig,
    pub black: SideConfig,
    pub delay_type: DelayType,
    pub delay_seconds: u32,
    pub tick_ms: u64,
}

impl ClockConfig {
    pub fn uniform(time_control: TimeControl) -> Self {
        let side = SideConfig::from_time_control(time_control);
        Self {
            white: side,
            black: side,
            delay_type: DelayType::None,
            delay_seconds: 0,
            tick_ms: TICK_MS,
        }
    }

    pub fn side(&self, side: Side) -> &SideConfig {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    pub fn validate(&self) -> Result<(), ClockError> {
        if !(1..=MAX_TICK_MS).contains(&self.tick_ms) {
            return Err(ClockError::TickPeriodOutOfRange(self.tick_ms));
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::uniform(TimeControl::new(10, 0))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    /// Nothing is counting down.
    Idle,
    Running(Side),
    /// This tick flagged the side; the clock is now stopped.
    Timeout(Side),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockState {
    pub running: bool,
    pub current: Option<Side>,
    pub time_control: PerSide<TimeControl>,
    pub remaining_ms: PerSide<u64>,
    pub increment_sec: PerSide<u32>,
    pub delay_seconds: u32,
    pub delay_type: DelayType,
    pub move_count: u32,
    pub timeout_side: Option<Side>,
    delay_spent_ms: PerSide<u64>,
}

impl ClockState {
    pub fn from_config(config: &ClockConfig) -> Self {
        let white = config.side(Side::White);
        let black = config.side(Side::Black);
        Self {
            running: false,
            current: None,
            time_control: PerSide::new(white.time_control, black.time_control),
            remaining_ms: PerSide::new(
                white.time_control.start_ms(),
                black.time_control.start_ms(),
            ),
            increment_sec: PerSide::new(white.increment_sec, black.increment_sec),
            delay_seconds: config.delay_seconds,
            delay_type: config.delay_type,
            move_count: 0,
            timeout_side: None,
            delay_spent_ms: PerSide::default(),
        }
    }

    pub fn remaining(&self, side: Side) -> u64 {
        self.remaining_ms[side]
    }

    pub fn delay_spent(&self, side: Side) -> u64 {
        self.delay_spent_ms[side]
    }

    pub fn is_paused(&self) -> bool {
        !self.running && self.current.is_some()
    }

    /// Running and current move together; a timeout leaves both cleared.
    pub fn is_consistent(&self) -> bool {
        let phase_ok = match (self.running, self.current) {
            (true, Some(_)) | (false, None) => true,
            // paused
            (false, Some(_)) => self.timeout_side.is_none(),
            (true, None) => false,
        };
        let timeout_ok = match self.timeout_side {
            Some(side) => !self.running && self.current.is_none() && self.remaining_ms[side] == 0,
            None => true,
        };
        phase_ok && timeout_ok
    }

    fn delay_budget_ms(&self) -> u64 {
        self.delay_seconds as u64 * 1000
    }
}

/// Text written to `EXPORT_FILE_NAME`.
pub fn export_record(state: &ClockState) -> String {
    format!(
        "[TimeControl \"{}\"]\n[Moves \"{}\"]\n",
        state.time_control[Side::White],
        state.move_count
    )
}

/// Controller owning the clock state and its single tick driver.
pub struct ChessClock<T: Ticker> {
    config: ClockConfig,
    state: ClockState,
    ticker: T,
}

impl<T: Ticker> ChessClock<T> {
    pub fn new(config: ClockConfig, ticker: T) -> Result<Self, ClockError> {
        config.validate()?;
        Ok(Self {
            state: ClockState::from_config(&config),
            config,
            ticker,
        })
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    /// Start `side`'s clock, ending the other side's turn if it had one.
    /// Returns false when the press is ignored.
    pub fn press(&mut self, side: Side) -> bool {
        if self.state.timeout_side.is_some() {
            return false;
        }
        match self.state.current {
            Some(active) if active == side => {
                if self.state.running {
                    return false;
                }
                return self.resume();
            }
            Some(active) => self.end_turn(active),
            None => {}
        }
        self.begin_turn(side);
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.running || self.state.timeout_side.is_some() {
            return TickOutcome::Idle;
        }
        let side = match self.state.current {
            Some(side) => side,
            None => return TickOutcome::Idle,
        };
        let tick_ms = self.config.tick_ms;

        if self.state.delay_type == DelayType::Bronstein
            && self.state.delay_spent_ms[side] < self.state.delay_budget_ms()
        {
            self.state.delay_spent_ms[side] += tick_ms;
            return TickOutcome::Running(side);
        }

        if self.state.remaining_ms[side] <= tick_ms {
            self.state.remaining_ms[side] = 0;
            self.ticker.cancel();
            self.state.running = false;
            self.state.current = None;
            self.state.timeout_side = Some(side);
            return TickOutcome::Timeout(side);
        }
        self.state.remaining_ms[side] -= tick_ms;
        TickOutcome::Running(side)
    }

    pub fn pause(&mut self) -> bool {
        if !self.state.running {
            return false;
        }
        self.ticker.cancel();
        self.state.running = false;
        true
    }

    /// Continue the paused side's turn. No end-of-turn adjustment is made and
    /// the delay already spent this turn stays spent.
    pub fn resume(&mut self) -> bool {
        if self.state.running || self.state.timeout_side.is_some() || self.state.current.is_none() {
            return false;
        }
        self.state.running = true;
        self.restart_driver();
        true
    }

    pub fn reset(&mut self) {
        self.ticker.cancel();
        self.state = ClockState::from_config(&self.config);
    }

    /// Replace the configuration and reset to its starting values.
    pub fn configure(&mut self, config: ClockConfig) -> Result<(), ClockError> {
        config.validate()?;
        self.config = config;
        self.reset();
        Ok(())
    }

    pub fn export(&self) -> String {
        export_record(&self.state)
    }

    fn end_turn(&mut self, side: Side) {
        let credit_ms = match self.state.delay_type {
            DelayType::Fischer => self.state.increment_sec[side] as u64 * 1000,
            // Ticks inside the delay window never reach remaining_ms, so the
            // refund of min(spent, budget) is already in place.
            DelayType::Bronstein | DelayType::None => 0,
        };
        self.state.remaining_ms[side] += credit_ms;
        if side == Side::Black {
            self.state.move_count += 1;
        }
    }

    fn begin_turn(&mut self, side: Side) {
        self.state.current = Some(side);
        self.state.delay_spent_ms[side] = 0;
        self.state.running = true;
        self.restart_driver();
    }

    fn restart_driver(&mut self) {
        self.ticker.cancel();
        self.ticker.start(self.config.tick_ms);
    }
}
