use serde::{Deserialize, Serialize};

/// Easing curve applied to tween progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Quadratic ease-out, `1 - (1 - t)^2`
    #[default]
    Power1Out,
    /// Cubic ease-in-out
    Power2InOut,
}

impl Easing {
    /// Map linear progress in [0, 1] to eased progress
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Timed animation of one value from `from` to `to`
///
/// Times are absolute seconds on the frame clock. The value holds at
/// `from` until `start + delay` and at `to` after `start + delay + duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start: f64,
    pub delay: f64,
    pub duration: f64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, start: f64, delay: f64, duration: f64, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            delay,
            duration,
            easing,
        }
    }

    /// Time the value starts changing
    pub fn begins_at(&self) -> f64 {
        self.start + self.delay
    }

    /// Time the value reaches `to`
    pub fn ends_at(&self) -> f64 {
        self.begins_at() + self.duration
    }

    /// Linear progress in [0, 1] at `now`
    pub fn progress(&self, now: f64) -> f32 {
        if now >= self.ends_at() {
            return 1.0;
        }
        if now <= self.begins_at() || self.duration <= 0.0 {
            return 0.0;
        }
        ((now - self.begins_at()) / self.duration) as f32
    }

    pub fn value_at(&self, now: f64) -> f32 {
        let eased = self.easing.apply(self.progress(now));
        self.from + (self.to - self.from) * eased
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now >= self.ends_at()
    }
}
