//! Time-based opacity transitions.
//!
//! [`OpacityAnimation`] is a pure step function: feed it a timestamp, get the
//! value for that frame. Scheduling lives elsewhere.

use std::time::Duration;

pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(300);

/// Quadratic ease-in-out: accelerates until `t = 0.5`, then decelerates.
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// An eased transition of a value in `[0, 1]` from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpacityAnimation {
    start: Duration,
    from: f32,
    to: f32,
    duration: Duration,
}

impl OpacityAnimation {
    pub fn new(start: Duration, from: f32, to: f32, duration: Duration) -> Self {
        Self {
            start,
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            duration,
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    /// Linear progress in `[0, 1]`. Timestamps before the start count as 0.
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// The eased value at `now`.
    pub fn sample(&self, now: Duration) -> f32 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to;
        }
        let eased = ease_in_out_quad(progress);
        (self.from + (self.to - self.from) * eased).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, now: Duration) -> bool {
        self.progress(now) >= 1.0
    }
}
