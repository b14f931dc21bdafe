//! Balance physics
//!
//! Pure state update: (state, elapsed seconds, taps) -> new angle/velocity or
//! a fall. Order within one step:
//! 1. Drift bias plus wind acceleration
//! 2. Damping
//! 3. Queued tap impulses, undamped so each tap moves velocity by exactly
//!    `tap_strength`
//! 4. Angle integration and fall check

use super::state::{Phase, SessionState, Side};
use crate::tuning::Tuning;

/// Result of one physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Physics did not run (warmup, pause, idle, game over)
    Frozen,
    /// Chicken is still on the fence
    Balanced { angle: f32, velocity: f32 },
    /// `|angle| >= fall_threshold`
    Fell { angle: f32, velocity: f32 },
}

/// Apply tap impulses; left taps push negative, right taps positive
pub fn apply_taps(velocity: f32, taps: &[Side], tap_strength: f32) -> f32 {
    taps.iter()
        .fold(velocity, |v, side| v + side.sign() * tap_strength)
}

/// Velocity change from drift and wind for one tick (before damping)
///
/// The sway term is applied once per tick; only the wind term scales with dt.
#[inline]
pub fn drift_impulse(drift: Side, wind_force: f32, sway_strength: f32, dt_secs: f32) -> f32 {
    sway_strength * drift.sign() + wind_force * dt_secs
}

/// Whether an angle ends the run
#[inline]
pub fn is_fall(angle: f32, fall_threshold: f32) -> bool {
    angle.abs() >= fall_threshold
}

/// Advance the balance by one measured step
pub fn advance(state: &SessionState, dt_secs: f32, taps: &[Side], tuning: &Tuning) -> StepOutcome {
    if state.phase != Phase::Playing {
        return StepOutcome::Frozen;
    }

    let mut velocity = state.angular_velocity
        + drift_impulse(
            state.drift,
            state.wind.force(),
            tuning.sway_strength,
            dt_secs,
        );
    velocity *= tuning.damping;
    velocity = apply_taps(velocity, taps, tuning.tap_strength);

    let angle = state.angle + velocity * dt_secs;

    if is_fall(angle, tuning.fall_threshold) {
        StepOutcome::Fell { angle, velocity }
    } else {
        StepOutcome::Balanced { angle, velocity }
    }
}
