//! Demo autopilot
//!
//! Plays the game for attract mode and headless runs: predicts where the tilt
//! is heading and taps against it, with a cooldown so it stays beatable.

use crate::sim::{Phase, SessionState, Side};

#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Seconds of velocity to look ahead
    pub lookahead_secs: f32,
    /// Predicted tilt that triggers a corrective tap
    pub margin: f32,
    /// Minimum time between taps
    pub cooldown_ms: u64,
    last_tap_ms: Option<u64>,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            lookahead_secs: 0.25,
            margin: 3.0,
            cooldown_ms: 120,
            last_tap_ms: None,
        }
    }
}

impl Autopilot {
    /// Side to tap at `now_ms`, if any
    pub fn decide(&mut self, state: &SessionState, now_ms: u64) -> Option<Side> {
        if !matches!(state.phase, Phase::Warmup | Phase::Playing) {
            return None;
        }
        if let Some(last) = self.last_tap_ms {
            if now_ms.saturating_sub(last) < self.cooldown_ms {
                return None;
            }
        }

        let predicted = state.angle + state.angular_velocity() * self.lookahead_secs;
        let side = if state.phase == Phase::Warmup {
            // Break warmup straight away, pushing against the initial velocity
            Side::of(state.angular_velocity()).opposite()
        } else if predicted.abs() >= self.margin {
            Side::of(predicted).opposite()
        } else {
            return None;
        };

        self.last_tap_ms = Some(now_ms);
        Some(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(angle: f32, velocity: f32) -> SessionState {
        SessionState {
            phase: Phase::Playing,
            angle,
            angular_velocity: velocity,
            ..Default::default()
        }
    }

    #[test]
    fn test_taps_against_tilt() {
        let mut pilot = Autopilot::default();
        assert_eq!(pilot.decide(&playing(5.0, 4.0), 0), Some(Side::Left));
        assert_eq!(pilot.decide(&playing(-5.0, -4.0), 1000), Some(Side::Right));
    }

    #[test]
    fn test_respects_cooldown_and_margin() {
        let mut pilot = Autopilot::default();
        assert_eq!(pilot.decide(&playing(0.5, 0.0), 0), None);
        assert!(pilot.decide(&playing(8.0, 0.0), 0).is_some());
        assert_eq!(pilot.decide(&playing(8.0, 0.0), 50), None);
        assert!(pilot.decide(&playing(8.0, 0.0), 200).is_some());
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut pilot = Autopilot::default();
        assert_eq!(pilot.decide(&SessionState::default(), 0), None);
    }
}
