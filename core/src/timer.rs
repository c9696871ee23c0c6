use std::time::{Duration, Instant};

/// Timers count down at 60 units per second of wall-clock time.
pub const TIMER_HZ: u64 = 60;

/// A countdown timer evaluated lazily from elapsed wall-clock time.
///
/// The value written by `set` is kept alongside the instant it was written,
/// and `refresh` derives the current value as
/// `max(0, set - floor(60 * elapsed_seconds))`. The start instant only moves
/// on `set`, so refreshing at any rate never accumulates rounding drift.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    set_value: u8,
    started: Instant,
    value: u8,
}

impl Timer {
    pub fn new(now: Instant) -> Timer {
        Timer {
            set_value: 0,
            started: now,
            value: 0,
        }
    }

    pub fn set(&mut self, value: u8, now: Instant) {
        self.set_value = value;
        self.started = now;
        self.value = value;
    }

    /// Recompute the cached value for `now` and return it
    pub fn refresh(&mut self, now: Instant) -> u8 {
        let elapsed = now.saturating_duration_since(self.started);
        let ticks = ticks_in(elapsed);
        self.value = (self.set_value as u64).saturating_sub(ticks) as u8;
        self.value
    }

    /// Value as of the last `set` or `refresh`
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.value > 0
    }

    #[cfg(test)]
    pub(crate) fn rewind(&mut self, by: Duration) {
        self.started = self
            .started
            .checked_sub(by)
            .expect("test clock rewound before process start");
    }
}

// floor(60 * elapsed) in integer nanoseconds
fn ticks_in(elapsed: Duration) -> u64 {
    (elapsed.as_nanos() * TIMER_HZ as u128 / 1_000_000_000) as u64
}
