//! Fixed-step tick clock
//!
//! The host calls [`FixedStep::advance`] with elapsed wall time and runs the
//! returned number of engine ticks.

use std::time::Duration;

/// Converts wall-clock time into whole logic ticks.
#[derive(Debug, Clone)]
pub struct FixedStep {
    /// Length of one tick
    step: Duration,
    /// Time not yet consumed by a tick
    accumulator: Duration,
    /// Upper bound of ticks produced by a single advance
    max_ticks_per_advance: u32,
    /// Ticks produced since creation
    total_ticks: u64,
}

impl FixedStep {
    /// Default cap on ticks produced by one `advance` call.
    const DEFAULT_MAX_TICKS: u32 = 8;

    /// Create a clock with the given tick length.
    ///
    /// A zero step is raised to one millisecond.
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.max(Duration::from_millis(1)),
            accumulator: Duration::ZERO,
            max_ticks_per_advance: Self::DEFAULT_MAX_TICKS,
            total_ticks: 0,
        }
    }

    /// Set how many ticks a single `advance` may produce
    #[must_use]
    pub fn with_max_ticks(mut self, max: u32) -> Self {
        self.max_ticks_per_advance = max.max(1);
        self
    }

    /// Length of one tick
    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    /// Total ticks produced so far
    #[must_use]
    pub const fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Add elapsed time and return how many ticks are due.
    ///
    /// When more than the cap is due the surplus time is dropped, so a long
    /// stall does not trigger a burst of catch-up ticks.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_ticks_per_advance {
            self.accumulator -= self.step;
            ticks += 1;
        }

        if self.accumulator >= self.step {
            log::debug!(
                "Dropping {:?} of backlog after {} ticks",
                self.accumulator,
                ticks
            );
            self.accumulator = Duration::ZERO;
        }

        self.total_ticks += u64::from(ticks);
        ticks
    }

    /// Whole ticks covering `duration`, rounded up, never less than one.
    #[must_use]
    pub fn ticks_for(duration: Duration, step: Duration) -> u32 {
        let step_nanos = step.as_nanos().max(1);
        let ticks = duration.as_nanos().div_ceil(step_nanos);
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates() {
        let mut clock = FixedStep::new(Duration::from_millis(10));

        assert_eq!(clock.advance(Duration::from_millis(4)), 0);
        assert_eq!(clock.advance(Duration::from_millis(7)), 1);
        assert_eq!(clock.advance(Duration::from_millis(19)), 2);
        assert_eq!(clock.total_ticks(), 3);
    }

    #[test]
    fn test_advance_caps_backlog() {
        let mut clock = FixedStep::new(Duration::from_millis(10)).with_max_ticks(3);

        assert_eq!(clock.advance(Duration::from_secs(1)), 3);
        // Backlog was dropped
        assert_eq!(clock.advance(Duration::ZERO), 0);
    }

    #[test]
    fn test_ticks_for_rounds_up() {
        let step = Duration::from_millis(16);
        assert_eq!(FixedStep::ticks_for(Duration::from_millis(15), step), 1);
        assert_eq!(FixedStep::ticks_for(Duration::from_millis(16), step), 1);
        assert_eq!(FixedStep::ticks_for(Duration::from_millis(17), step), 2);
        assert_eq!(FixedStep::ticks_for(Duration::ZERO, step), 1);
    }
}
