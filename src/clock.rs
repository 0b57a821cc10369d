//! Fixed-timestep accumulator.
//!
//! The host ticks at whatever rate the terminal allows and hands each game the
//! measured elapsed time. Physics constants in the arcade games are tuned per
//! 1/60 s step, so `FixedStep` turns a variable `dt` into a whole number of
//! steps and carries the remainder into the next frame.

use std::time::Duration;

/// One physics step of the arcade games.
pub const SIXTIETH: Duration = Duration::from_micros(16_667);

/// Longer gaps (suspended terminal, debugger) are clamped to this.
const MAX_FRAME: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
        }
    }

    /// Feeds elapsed time and returns the number of whole steps to simulate.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt.min(MAX_FRAME);
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_step_frames_accumulate() {
        let mut fs = FixedStep::new(Duration::from_millis(100));
        for _ in 0..6 {
            assert_eq!(fs.advance(Duration::from_millis(16)), 0);
        }
        // 96ms + 16ms = 112ms -> one step, 12ms carried
        assert_eq!(fs.advance(Duration::from_millis(16)), 1);
        assert_eq!(fs.advance(Duration::from_millis(88)), 1);
    }

    #[test]
    fn several_steps_in_one_frame() {
        let mut fs = FixedStep::new(Duration::from_millis(100));
        assert_eq!(fs.advance(Duration::from_millis(350)), 3);
        assert_eq!(fs.advance(Duration::from_millis(50)), 1);
    }

    #[test]
    fn long_gap_is_clamped() {
        let mut fs = FixedStep::new(Duration::from_millis(100));
        assert_eq!(fs.advance(Duration::from_secs(10)), 5);
    }

    #[test]
    fn sixty_frames_make_a_second() {
        let mut fs = FixedStep::new(SIXTIETH);
        let total: u32 = (0..60).map(|_| fs.advance(SIXTIETH)).sum();
        assert_eq!(total, 60);
    }
}
