/// Default tick period in milliseconds.
pub const TICK_MS: u64 = 10;

/// Longest tick period a clock accepts.
pub const MAX_TICK_MS: u64 = 1000;

/// Handle to the periodic source that drives `ChessClock::tick`.
///
/// The clock owns exactly one ticker and always cancels it before starting
/// it again, so an implementation only ever has one live driver. Ticks that
/// belong to a cancelled driver must not reach the clock.
pub trait Ticker {
    fn start(&mut self, period_ms: u64);
    fn cancel(&mut self);
}

/// Ticker with no time source of its own; the owner calls `tick` by hand.
#[derive(Debug, Default, Clone)]
pub struct ManualTicker {
    active: bool,
    period_ms: u64,
    starts: u32,
    cancels: u32,
    // Start called while a driver was still active.
    overlaps: u32,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }

    pub fn cancels(&self) -> u32 {
        self.cancels
    }

    pub fn overlaps(&self) -> u32 {
        self.overlaps
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, period_ms: u64) {
        if self.active {
            self.overlaps += 1;
        }
        self.active = true;
        self.period_ms = period_ms;
        self.starts += 1;
    }

    fn cancel(&mut self) {
        self.active = false;
        self.cancels += 1;
    }
}
