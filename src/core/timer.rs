/// Throttled timer - minimum interval between fires
#[derive(Debug, Clone, Copy)]
pub struct Throttled {
    min_interval: f32,
    time_since_last: f32,
}

impl Throttled {
    /// Create throttled timer with minimum interval
    pub fn new(min_interval: f32) -> Self {
        Self {
            min_interval,
            time_since_last: 0.0,
        }
    }

    /// Accumulate delta, returns the time since the last fire when it fires
    pub fn try_tick(&mut self, delta: f32) -> Option<f32> {
        self.time_since_last += delta;

        if self.time_since_last >= self.min_interval {
            let window = self.time_since_last;
            self.time_since_last = 0.0;
            Some(window)
        } else {
            None
        }
    }
}

/// Frames-per-second counter refreshed once per interval
#[derive(Debug, Clone, Copy)]
pub struct FpsCounter {
    timer: Throttled,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new(update_interval: f32) -> Self {
        Self {
            timer: Throttled::new(update_interval),
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count one frame
    pub fn tick(&mut self, delta: f32) {
        self.frames += 1;
        if let Some(window) = self.timer.try_tick(delta) {
            self.fps = self.frames as f32 / window;
            log::trace!("FPS: {:.1}", self.fps);
            self.frames = 0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_enforces_minimum() {
        let mut timer = Throttled::new(0.1);

        assert_eq!(timer.try_tick(0.05), None);
        assert_eq!(timer.try_tick(0.06), Some(0.11));
        assert_eq!(timer.try_tick(0.05), None);
    }

    #[test]
    fn fps_counter_averages_over_interval() {
        let mut counter = FpsCounter::new(1.0);
        assert_eq!(counter.fps(), 0.0);

        for _ in 0..60 {
            counter.tick(1.0 / 60.0);
        }
        // Float accumulation may land one frame short of the boundary
        counter.tick(1.0 / 60.0);

        assert!((counter.fps() - 60.0).abs() < 2.0);
    }
}
