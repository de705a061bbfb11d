use std::fmt;

use crate::core::tween::Easing;

/// Transform override applied to the loading bar while assets load
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarTransform {
    ScaleX(f32),
}

impl fmt::Display for BarTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarTransform::ScaleX(ratio) => write!(f, "scaleX({})", ratio),
        }
    }
}

/// Edge the bar grows from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarAnchor {
    Left,
    Right,
}

/// What to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarDisplay {
    pub scale: f32,
    pub anchor: BarAnchor,
}

/// Loading bar state
///
/// While loading, the bar's width follows the transform override. Once
/// ended, the override is cleared and the bar collapses toward its right
/// edge over `collapse_seconds`, after which nothing is drawn.
#[derive(Debug, Clone)]
pub struct LoadingBar {
    transform: Option<BarTransform>,
    ended_at: Option<f64>,
    collapse_seconds: f64,
}

impl LoadingBar {
    pub fn new(collapse_seconds: f64) -> Self {
        Self {
            transform: None,
            ended_at: None,
            collapse_seconds,
        }
    }

    /// Set the bar width to `ratio` of the screen, unclamped
    pub fn set_progress(&mut self, ratio: f32) {
        self.transform = Some(BarTransform::ScaleX(ratio));
    }

    /// Mark the bar ended and drop the transform override
    pub fn end(&mut self, now: f64) {
        if self.ended_at.is_none() {
            self.ended_at = Some(now);
        }
        self.transform = None;
    }

    pub fn transform(&self) -> Option<BarTransform> {
        self.transform
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn display(&self, now: f64) -> Option<BarDisplay> {
        match self.ended_at {
            None => {
                let scale = match self.transform {
                    Some(BarTransform::ScaleX(ratio)) => ratio,
                    None => 0.0,
                };
                Some(BarDisplay {
                    scale,
                    anchor: BarAnchor::Left,
                })
            }
            Some(ended_at) => {
                let t = if self.collapse_seconds > 0.0 {
                    ((now - ended_at) / self.collapse_seconds) as f32
                } else {
                    1.0
                };
                if t >= 1.0 {
                    return None;
                }
                Some(BarDisplay {
                    scale: 1.0 - Easing::Power2InOut.apply(t),
                    anchor: BarAnchor::Right,
                })
            }
        }
    }
}
