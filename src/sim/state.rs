//! Session state and core simulation types
//!
//! A [`SessionState`] is an immutable snapshot: every tick builds a new one
//! from the previous value and replaces it wholesale.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::persistence::SkinId;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Phase {
    /// Menu preview, no timers running
    #[default]
    Idle,
    /// Grace period after start, physics frozen
    Warmup,
    /// Active gameplay
    Playing,
    /// Suspended by the player or by app backgrounding
    Paused,
    /// Run ended, state frozen until restart
    GameOver,
}

impl Phase {
    /// Whether taps count in this phase
    pub fn accepts_taps(&self) -> bool {
        matches!(self, Phase::Warmup | Phase::Playing)
    }
}

/// Left or right, used for taps, drift bias, gust direction and falls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Left pushes the angle negative, right positive
    #[inline]
    pub fn sign(&self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn from_bool(right: bool) -> Self {
        if right { Side::Right } else { Side::Left }
    }

    /// Side of a signed value (zero counts as right)
    pub fn of(value: f32) -> Self {
        Self::from_bool(value >= 0.0)
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A tap already classified by the view layer
pub type TapSide = Side;

/// Wind as seen by the physics step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Wind {
    pub active: bool,
    /// `None` while calm
    pub direction: Option<Side>,
    pub strength: f32,
}

impl Wind {
    pub const CALM: Wind = Wind {
        active: false,
        direction: None,
        strength: 0.0,
    };

    pub fn gust(direction: Side, strength: f32) -> Self {
        Self {
            active: true,
            direction: Some(direction),
            strength,
        }
    }

    /// Signed acceleration applied to angular velocity (degrees/s²)
    pub fn force(&self) -> f32 {
        match (self.active, self.direction) {
            (true, Some(dir)) => self.strength * dir.sign(),
            _ => 0.0,
        }
    }

    /// Direction as -1, 0 or +1
    pub fn direction_sign(&self) -> i8 {
        match self.direction {
            Some(Side::Left) => -1,
            Some(Side::Right) => 1,
            None => 0,
        }
    }
}

/// A falling decorative leaf (positions are screen fractions)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafParticle {
    pub pos: Vec2,
    /// Fall speed in fractions per second
    pub speed: f32,
    /// Degrees, kept in [0, 360)
    pub rotation: f32,
}

/// Cosmetic marker at a tap location (raw view coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RippleMarker {
    pub id: u64,
    pub pos: Vec2,
    pub side: Side,
    pub age_ms: u64,
}

/// Persisted preferences mirrored into the snapshot for the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceView {
    pub selected_skin: SkinId,
    pub music_enabled: bool,
    pub sfx_enabled: bool,
}

impl Default for PreferenceView {
    fn default() -> Self {
        Self {
            selected_skin: SkinId::White,
            music_enabled: true,
            sfx_enabled: true,
        }
    }
}

/// Chicken artwork to show for a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChickenPose {
    Calm,
    Nervous,
    Fallen,
}

/// Complete session snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    /// Tilt in degrees, 0 = upright
    pub angle: f32,
    pub(crate) angular_velocity: f32,
    /// Per-session lean bias
    pub drift: Side,
    pub wind: Wind,
    /// Play time, excluding warmup and pauses
    pub survival_time_ms: u64,
    /// Always `survival_time_ms / points_interval`
    pub session_points: u32,
    /// Points banked by the previous game over
    pub last_session_points: u32,
    /// Lifetime points
    pub total_points: u32,
    /// Lifetime best survival time
    pub best_time_ms: u64,
    /// Warmup time consumed so far
    pub warmup_elapsed_ms: u64,
    /// Whether the first tap already cancelled warmup
    pub warmup_cancelled: bool,
    /// Phase to return to on resume (set only while paused)
    pub resume_phase: Option<Phase>,
    /// Which way the chicken fell (set only in game over)
    pub fall_side: Option<Side>,
    /// The finished run strictly beat the previous best (game over only)
    pub new_best: bool,
    pub leaves: Vec<LeafParticle>,
    pub ripples: Vec<RippleMarker>,
    pub preferences: PreferenceView,
    /// Published snapshot counter
    pub tick: u64,
}

impl SessionState {
    /// Resting menu-preview state
    pub fn idle(total_points: u32, best_time_ms: u64, preferences: PreferenceView) -> Self {
        Self {
            phase: Phase::Idle,
            angle: 0.0,
            angular_velocity: 0.0,
            drift: Side::Right,
            wind: Wind::CALM,
            survival_time_ms: 0,
            session_points: 0,
            last_session_points: 0,
            total_points,
            best_time_ms,
            warmup_elapsed_ms: 0,
            warmup_cancelled: false,
            resume_phase: None,
            fall_side: None,
            new_best: false,
            leaves: Vec::new(),
            ripples: Vec::new(),
            preferences,
            tick: 0,
        }
    }

    /// Angular velocity (engine-internal, exposed for diagnostics)
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn pose(&self, tilt_for_change: f32) -> ChickenPose {
        if self.is_game_over() {
            ChickenPose::Fallen
        } else if self.angle.abs() >= tilt_for_change {
            ChickenPose::Nervous
        } else {
            ChickenPose::Calm
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle(0, 0, PreferenceView::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_force_sign() {
        assert_eq!(Wind::CALM.force(), 0.0);
        assert_eq!(Wind::gust(Side::Left, 12.0).force(), -12.0);
        assert_eq!(Wind::gust(Side::Right, 20.0).force(), 20.0);
        assert_eq!(Wind::gust(Side::Left, 12.0).direction_sign(), -1);
    }

    #[test]
    fn test_phase_tap_acceptance() {
        assert!(Phase::Warmup.accepts_taps());
        assert!(Phase::Playing.accepts_taps());
        assert!(!Phase::Paused.accepts_taps());
        assert!(!Phase::GameOver.accepts_taps());
        assert!(!Phase::Idle.accepts_taps());
    }

    #[test]
    fn test_pose() {
        let mut state = SessionState::default();
        assert_eq!(state.pose(15.0), ChickenPose::Calm);
        state.angle = -16.0;
        assert_eq!(state.pose(15.0), ChickenPose::Nervous);
        state.phase = Phase::GameOver;
        assert_eq!(state.pose(15.0), ChickenPose::Fallen);
    }
}
