//! Frame pacing for the tick loop

use std::time::{Duration, Instant};

/// Admits at most one tick per frame interval.
///
/// Leftover time past the interval is carried into the next frame so the
/// average rate stays at the target even when callers poll unevenly.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameLimiter {
    pub fn new(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 30.0 };
        Self {
            interval: Duration::from_nanos((1e9 / fps as f64).round() as u64),
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a tick should run at `now`. The first call always runs.
    pub fn should_run(&mut self, now: Instant) -> bool {
        let Some(last) = self.last else {
            self.last = Some(now);
            return true;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            return false;
        }

        let carry = Duration::from_nanos(
            (elapsed.as_nanos() % self.interval.as_nanos().max(1)) as u64,
        );
        self.last = Some(now - carry);
        true
    }

    /// Time left until the next tick is admitted
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }
}
