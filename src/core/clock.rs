use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic source of elapsed seconds since the scene started
pub trait TimeSource {
    fn elapsed(&self) -> f64;
}

/// Wall-clock time source backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    start: Instant,
}

impl SystemTime {
    /// Create a source whose zero is now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTime {
    fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Virtual time source, advanced by hand
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the clock under test owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<f64>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time in seconds
    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl TimeSource for ManualTime {
    fn elapsed(&self) -> f64 {
        self.now.get()
    }
}

/// Timing for one tick of the frame loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub number: u64,
    pub elapsed: f64,
    pub delta: f64,
}

/// Frame clock - tracks elapsed time and the delta between ticks
pub struct FrameClock {
    source: Box<dyn TimeSource>,
    previous: f64,
    frame_number: u64,
}

impl FrameClock {
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        Self {
            source,
            previous: 0.0,
            frame_number: 0,
        }
    }

    /// Clock driven by wall-clock time
    pub fn system() -> Self {
        Self::new(Box::new(SystemTime::new()))
    }

    /// Current elapsed time without advancing the clock
    pub fn now(&self) -> f64 {
        self.source.elapsed()
    }

    /// Read elapsed time, compute delta and advance
    pub fn tick(&mut self) -> FrameTime {
        let elapsed = self.source.elapsed();
        // A well-behaved source never goes backwards; clamp anyway so delta stays >= 0
        let delta = (elapsed - self.previous).max(0.0);
        self.previous = elapsed.max(self.previous);

        let frame = FrameTime {
            number: self.frame_number,
            elapsed,
            delta,
        };
        self.frame_number += 1;
        frame
    }

    /// Elapsed time recorded by the last tick
    pub fn previous(&self) -> f64 {
        self.previous
    }
}
