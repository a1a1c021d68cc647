//! Brightness ramps for the LEDs.
//!
//! The generators are pure: they return the values only.  Pacing comes from
//! [`TransitionTiming`] and is applied by whoever drives the values out.

use std::time::Duration;

/// Linear ramp of `steps + 1` values from `from` to `to`.  The last value is
/// exactly `to`.  Zero steps is a jump straight to `to`.
pub fn fade(from: f32, to: f32, steps: u32) -> Vec<f32> {
    let mut values = Vec::with_capacity(steps as usize + 1);
    for n in 0..steps {
        values.push(from + (to - from) * n as f32 / steps as f32);
    }
    values.push(to);
    values
}

/// `fade(from, to)` followed by `fade(to, from)`.
pub fn pulse(from: f32, to: f32, steps: u32) -> Vec<f32> {
    let mut values = fade(from, to, steps);
    values.extend(fade(to, from, steps));
    values
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionTiming {
    /// Total time of a fade.
    pub duration: Duration,
    /// Steps of a fade.  A pulse takes half as many each way.
    pub steps: u32,
}

impl TransitionTiming {
    /// No sleeping at all.  Transitions complete as soon as they are driven.
    pub const INSTANT: TransitionTiming = TransitionTiming {
        duration: Duration::ZERO,
        steps: 1,
    };

    pub fn step_delay(&self) -> Duration {
        if self.steps == 0 {
            Duration::ZERO
        } else {
            self.duration / self.steps
        }
    }

    pub fn fade(&self, from: f32, to: f32) -> Vec<f32> {
        fade(from, to, self.steps)
    }

    pub fn pulse(&self, from: f32, to: f32) -> Vec<f32> {
        pulse(from, to, self.steps / 2)
    }
}

#[cfg(test)]
pub(crate) fn assert_values_approx(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-6, "{:?} vs {:?}", actual, expected);
    }
}
