//! Timer bookkeeping for a running session
//!
//! The session owns exactly one [`TimerSet`] while it is running. The set holds
//! the three timer processes (physics frame clock, wind generator, leaf
//! spawner); dropping it cancels all of them at once.

use super::leaves::LeafSpawner;
use super::wind::WindGenerator;
use crate::tuning::Tuning;

/// One-shot countdown in simulated milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration_ms: u64,
    remaining_ms: u64,
}

impl Countdown {
    /// Durations are at least 1ms so a re-armed countdown always waits
    pub fn new(duration_ms: u64) -> Self {
        let duration_ms = duration_ms.max(1);
        Self {
            duration_ms,
            remaining_ms: duration_ms,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Consume `elapsed_ms`; returns the unused overflow once the countdown fires
    pub fn advance(&mut self, elapsed_ms: u64) -> Option<u64> {
        if elapsed_ms >= self.remaining_ms {
            let overflow = elapsed_ms - self.remaining_ms;
            self.remaining_ms = 0;
            Some(overflow)
        } else {
            self.remaining_ms -= elapsed_ms;
            None
        }
    }
}

/// Measured time since the previous frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDelta {
    /// First frame after start or resume, nothing elapsed yet
    Rebased,
    /// Normal frame
    Elapsed(u64),
    /// Gap too long to integrate (app suspended mid-frame)
    Gap(u64),
}

impl FrameDelta {
    /// Simulated time to integrate for this frame
    pub fn simulated_ms(&self) -> u64 {
        match self {
            FrameDelta::Elapsed(ms) => *ms,
            FrameDelta::Rebased | FrameDelta::Gap(_) => 0,
        }
    }
}

/// Physics tick clock using measured deltas
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last_ms: Option<u64>,
    max_gap_ms: u64,
}

impl FrameClock {
    pub fn new(max_gap_ms: u64) -> Self {
        Self {
            last_ms: None,
            max_gap_ms,
        }
    }

    /// Start measuring from `now_ms`
    pub fn rebase(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }

    /// Forget the last frame so the next one rebases
    pub fn suspend(&mut self) {
        self.last_ms = None;
    }

    pub fn tick(&mut self, now_ms: u64) -> FrameDelta {
        let Some(last) = self.last_ms else {
            self.last_ms = Some(now_ms);
            return FrameDelta::Rebased;
        };
        // A clock that steps backwards counts as zero elapsed
        let delta = now_ms.saturating_sub(last);
        self.last_ms = Some(now_ms.max(last));
        if delta > self.max_gap_ms {
            FrameDelta::Gap(delta)
        } else {
            FrameDelta::Elapsed(delta)
        }
    }
}

/// Run state shared by the session's timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Running,
    Suspended,
}

/// The timer processes of one running session
#[derive(Debug, Clone)]
pub struct TimerSet {
    /// Incremented by the session on every start, used in logs
    pub generation: u64,
    pub frame: FrameClock,
    pub wind: WindGenerator,
    pub leaves: LeafSpawner,
    status: TimerStatus,
}

impl TimerSet {
    pub fn start(generation: u64, now_ms: u64, wind_seed: u64, leaf_seed: u64, tuning: &Tuning) -> Self {
        let mut frame = FrameClock::new(tuning.max_frame_gap_ms);
        frame.rebase(now_ms);
        Self {
            generation,
            frame,
            wind: WindGenerator::new(wind_seed, tuning),
            leaves: LeafSpawner::new(leaf_seed, tuning),
            status: TimerStatus::Running,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// Stop all timers from advancing; returns false if already suspended
    pub fn suspend(&mut self) -> bool {
        if self.status == TimerStatus::Suspended {
            return false;
        }
        self.status = TimerStatus::Suspended;
        self.frame.suspend();
        true
    }

    /// Continue from where the timers left off, measuring from `now_ms`
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.status == TimerStatus::Running {
            return false;
        }
        self.status = TimerStatus::Running;
        self.frame.rebase(now_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_overflow() {
        let mut timer = Countdown::new(100);
        assert_eq!(timer.advance(60), None);
        assert_eq!(timer.remaining_ms(), 40);
        assert_eq!(timer.advance(50), Some(10));
        assert_eq!(timer.remaining_ms(), 0);
    }

    #[test]
    fn test_frame_clock_measures_actual_delta() {
        let mut clock = FrameClock::new(250);
        assert_eq!(clock.tick(1000), FrameDelta::Rebased);
        assert_eq!(clock.tick(1016), FrameDelta::Elapsed(16));
        assert_eq!(clock.tick(1039), FrameDelta::Elapsed(23));
    }

    #[test]
    fn test_frame_clock_gap_is_not_integrated() {
        let mut clock = FrameClock::new(250);
        clock.rebase(0);
        let delta = clock.tick(5000);
        assert_eq!(delta, FrameDelta::Gap(5000));
        assert_eq!(delta.simulated_ms(), 0);
        // Measuring resumes from the gap's end
        assert_eq!(clock.tick(5016), FrameDelta::Elapsed(16));
    }

    #[test]
    fn test_frame_clock_backwards_step() {
        let mut clock = FrameClock::new(250);
        clock.rebase(100);
        assert_eq!(clock.tick(90), FrameDelta::Elapsed(0));
        assert_eq!(clock.tick(116), FrameDelta::Elapsed(16));
    }

    #[test]
    fn test_timer_set_suspend_is_idempotent() {
        let mut timers = TimerSet::start(1, 0, 1, 2, &Tuning::default());
        assert!(timers.suspend());
        assert!(!timers.suspend());
        assert_eq!(timers.status(), TimerStatus::Suspended);
        assert!(timers.resume(10_000));
        assert!(!timers.resume(10_000));
        assert_eq!(timers.frame.tick(10_016), FrameDelta::Elapsed(16));
    }
}
