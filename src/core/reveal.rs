use serde::{Deserialize, Serialize};

use super::tween::{Easing, Tween};
use crate::loading::LoadingBar;

/// Schedule of the post-load reveal, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTimings {
    /// Wait between load completion and the reveal starting
    pub hold: f64,
    /// Extra wait before the overlay starts fading
    pub fade_delay: f64,
    pub fade_duration: f64,
    pub easing: Easing,
}

impl Default for RevealTimings {
    fn default() -> Self {
        Self {
            hold: 0.5,
            fade_delay: 1.0,
            fade_duration: 3.0,
            easing: Easing::Power1Out,
        }
    }
}

/// Milestones of the reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// Loading finished
    Completed,
    /// Bar marked ended and its transform cleared; fade scheduled
    BarEnded,
    /// Overlay opacity starts to drop
    FadeStarted,
    /// Overlay fully transparent
    FadeFinished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Waiting,
    Holding { completed_at: f64 },
    Fading { tween: Tween, started: bool },
    Done,
}

/// Timed transitions that run after every asset has loaded
///
/// Driven by whatever clock the caller advances it with. Each milestone is
/// recorded with the time it was observed, once.
#[derive(Debug, Clone)]
pub struct RevealSequence {
    timings: RevealTimings,
    phase: Phase,
    fired: Vec<(RevealEvent, f64)>,
}

impl RevealSequence {
    pub fn new(timings: RevealTimings) -> Self {
        Self {
            timings,
            phase: Phase::Waiting,
            fired: Vec::new(),
        }
    }

    /// Begin the sequence; repeated calls are ignored
    pub fn start(&mut self, now: f64) {
        if self.phase != Phase::Waiting {
            log::warn!("Reveal already started, ignoring second completion");
            return;
        }
        self.phase = Phase::Holding { completed_at: now };
        self.fired.push((RevealEvent::Completed, now));
    }

    /// Advance to `now`, updating the bar and overlay opacity
    pub fn advance(&mut self, now: f64, bar: &mut LoadingBar, overlay_alpha: &mut f32) {
        if let Phase::Holding { completed_at } = self.phase {
            let hold_until = completed_at + self.timings.hold;
            if now < hold_until {
                return;
            }
            // Scheduled from the hold deadline, not the frame that observed it,
            // starting from whatever opacity the overlay has right now
            let tween = Tween::new(
                *overlay_alpha,
                0.0,
                hold_until,
                self.timings.fade_delay,
                self.timings.fade_duration,
                self.timings.easing,
            );
            bar.end(now);
            self.fired.push((RevealEvent::BarEnded, now));
            log::debug!("Reveal: bar ended, fade scheduled at {:.3}s", tween.begins_at());
            self.phase = Phase::Fading {
                tween,
                started: false,
            };
        }

        if let Phase::Fading { tween, started } = &mut self.phase {
            *overlay_alpha = tween.value_at(now);

            if !*started && now > tween.begins_at() {
                *started = true;
                self.fired.push((RevealEvent::FadeStarted, now));
            }
            if tween.is_finished(now) {
                if !*started {
                    self.fired.push((RevealEvent::FadeStarted, now));
                }
                self.fired.push((RevealEvent::FadeFinished, now));
                log::info!("Reveal finished at {:.3}s", now);
                self.phase = Phase::Done;
            }
        }
    }

    /// Milestones observed so far, in order
    pub fn fired(&self) -> &[(RevealEvent, f64)] {
        &self.fired
    }

    /// Time a milestone was observed, if it has fired
    pub fn fired_at(&self, event: RevealEvent) -> Option<f64> {
        self.fired
            .iter()
            .find(|(fired, _)| *fired == event)
            .map(|(_, at)| *at)
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::Waiting
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(seq: &mut RevealSequence, times: &[f64]) -> (LoadingBar, f32) {
        let mut bar = LoadingBar::new(1.5);
        bar.set_progress(1.0);
        let mut alpha = 1.0;
        for &t in times {
            seq.advance(t, &mut bar, &mut alpha);
        }
        (bar, alpha)
    }

    #[test]
    fn nothing_happens_before_start() {
        let mut seq = RevealSequence::new(RevealTimings::default());
        let (bar, alpha) = run(&mut seq, &[0.0, 5.0, 10.0]);
        assert!(!bar.is_ended());
        assert_eq!(alpha, 1.0);
        assert!(seq.fired().is_empty());
    }

    #[test]
    fn bar_ends_after_hold() {
        let mut seq = RevealSequence::new(RevealTimings::default());
        seq.start(2.0);

        let (bar, alpha) = run(&mut seq, &[2.1, 2.4]);
        assert!(!bar.is_ended());
        assert_eq!(alpha, 1.0);

        let (bar, alpha) = run(&mut seq, &[2.5]);
        assert!(bar.is_ended());
        assert_eq!(bar.transform(), None);
        assert_eq!(alpha, 1.0);
        assert_eq!(seq.fired_at(RevealEvent::BarEnded), Some(2.5));
    }

    #[test]
    fn full_schedule_fires_once_each() {
        let mut seq = RevealSequence::new(RevealTimings::default());
        seq.start(0.0);
        seq.start(0.2);

        let mut bar = LoadingBar::new(1.5);
        let mut alpha = 1.0;
        let mut t = 0.0;
        while t <= 6.0 {
            seq.advance(t, &mut bar, &mut alpha);
            if t <= 1.5 {
                assert_eq!(alpha, 1.0, "opacity must hold until 1.5s, t={}", t);
            }
            t += 0.125;
        }

        assert_eq!(alpha, 0.0);
        assert!(seq.is_done());

        let events: Vec<_> = seq.fired().iter().map(|(e, _)| *e).collect();
        assert_eq!(
            events,
            vec![
                RevealEvent::Completed,
                RevealEvent::BarEnded,
                RevealEvent::FadeStarted,
                RevealEvent::FadeFinished,
            ]
        );
        assert_eq!(seq.fired_at(RevealEvent::BarEnded), Some(0.5));
        assert_eq!(seq.fired_at(RevealEvent::FadeFinished), Some(4.5));
    }

    #[test]
    fn opacity_strictly_between_during_fade() {
        let mut seq = RevealSequence::new(RevealTimings::default());
        seq.start(0.0);
        let (_, alpha) = run(&mut seq, &[0.5, 3.0]);
        assert!(alpha > 0.0 && alpha < 1.0);
    }

    #[test]
    fn large_jump_still_records_every_milestone() {
        let mut seq = RevealSequence::new(RevealTimings::default());
        seq.start(0.0);
        let (bar, alpha) = run(&mut seq, &[10.0]);

        assert!(bar.is_ended());
        assert_eq!(alpha, 0.0);
        assert_eq!(seq.fired().len(), 4);
        assert_eq!(seq.fired_at(RevealEvent::FadeFinished), Some(10.0));
    }
}
