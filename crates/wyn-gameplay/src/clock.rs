//! Frame clock.
//!
//! The host engine feeds its timestep into a [`FrameClock`] once per frame;
//! gameplay code only ever reads it through the [`GameClock`] trait.
//! All values are in milliseconds.

use serde::{Deserialize, Serialize};

/// Read-only view of frame timing.
pub trait GameClock {
    /// Host timestamp of the current frame (ms).
    fn now(&self) -> f64;

    /// Time since the previous frame (ms). May be zero or negative on
    /// paused or degenerate frames.
    fn delta(&self) -> f64;

    /// Monotonically increasing frame counter.
    fn frame(&self) -> u64;

    /// Cumulative elapsed time (ms); the base for invincibility windows.
    fn elapsed(&self) -> f64;
}

impl<T: GameClock + ?Sized> GameClock for &T {
    fn now(&self) -> f64 {
        (**self).now()
    }

    fn delta(&self) -> f64 {
        (**self).delta()
    }

    fn frame(&self) -> u64 {
        (**self).frame()
    }

    fn elapsed(&self) -> f64 {
        (**self).elapsed()
    }
}

/// Clock driven by the host's per-frame `(time, delta)` callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    now: f64,
    delta: f64,
    frame: u64,
    elapsed: f64,
}

impl FrameClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock whose delta is preset, without advancing any frame.
    ///
    /// Useful for fixed-step drivers that never call [`FrameClock::refresh`].
    #[must_use]
    pub fn with_delta(delta: f64) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    /// Capture the current frame's time values.
    ///
    /// Called by the host at the top of its frame callback.
    pub fn refresh(&mut self, time: f64, delta: f64) {
        self.now = time;
        self.delta = delta;
        self.frame += 1;
        self.elapsed += delta;
    }

    /// Advance by `delta` ms, deriving `now` from the elapsed time.
    pub fn tick(&mut self, delta: f64) {
        let time = self.now + delta;
        self.refresh(time, delta);
    }

    /// Override the frame delta without advancing time.
    pub fn set_delta(&mut self, delta: f64) {
        self.delta = delta;
    }

    /// Override the cumulative elapsed time.
    pub fn set_elapsed(&mut self, elapsed: f64) {
        self.elapsed = elapsed;
    }
}

impl GameClock for FrameClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn delta(&self) -> f64 {
        self.delta
    }

    fn frame(&self) -> u64 {
        self.frame
    }

    fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_accumulates() {
        let mut clock = FrameClock::new();
        clock.refresh(100.0, 16.0);
        clock.refresh(116.0, 16.0);

        assert_eq!(clock.now(), 116.0);
        assert_eq!(clock.delta(), 16.0);
        assert_eq!(clock.frame(), 2);
        assert_eq!(clock.elapsed(), 32.0);
    }

    #[test]
    fn test_tick() {
        let mut clock = FrameClock::new();
        clock.tick(10.0);
        clock.tick(5.0);
        assert_eq!(clock.now(), 15.0);
        assert_eq!(clock.elapsed(), 15.0);
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn test_with_delta_does_not_advance() {
        let clock = FrameClock::with_delta(16.67);
        assert_eq!(clock.delta(), 16.67);
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_negative_delta_tolerated() {
        let mut clock = FrameClock::new();
        clock.refresh(0.0, -5.0);
        assert_eq!(clock.elapsed(), -5.0);
    }
}
