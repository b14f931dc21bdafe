//! Chicken Balance - a tap-to-balance fence game
//!
//! Core modules:
//! - `sim`: Balance physics, wind gusts, ambient leaves and timer bookkeeping
//! - `session`: Game session state machine (idle, warmup, playing, paused, game over)
//! - `score`: Survival time to points conversion and end-of-run persistence
//! - `persistence`: Player profile storage (best time, points, skins, audio flags)
//! - `audio`: Audio cue interface consumed by the session
//! - `runtime`: Threaded session runner with a snapshot stream
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod clock;
pub mod persistence;
pub mod runtime;
pub mod score;
pub mod session;
pub mod sim;
pub mod tuning;

pub use session::GameSession;
pub use sim::{Phase, SessionState, Side, TapSide};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Absolute tilt (degrees) at or beyond which the chicken falls
    pub const FALL_THRESHOLD: f32 = 20.0;
    /// Tilt at which the view swaps to the "nervous" chicken pose
    pub const TILT_FOR_CHANGE: f32 = 15.0;
    /// Velocity impulse per tap (degrees/s)
    pub const TAP_STRENGTH: f32 = 5.2;
    /// Constant drift added to velocity every tick
    pub const SWAY_STRENGTH: f32 = 0.3;
    /// Per-tick velocity damping
    pub const DAMPING: f32 = 0.995;

    /// Initial velocity magnitude range (sign is random)
    pub const INITIAL_VELOCITY_MIN: f32 = 10.0;
    pub const INITIAL_VELOCITY_MAX: f32 = 14.0;

    /// Wind gust strength range (degrees/s²)
    pub const WIND_STRENGTH_MIN: f32 = 12.0;
    pub const WIND_STRENGTH_MAX: f32 = 25.0;
    /// Calm period between gusts (ms)
    pub const WIND_WAIT_MIN_MS: u64 = 4000;
    pub const WIND_WAIT_MAX_MS: u64 = 9000;
    /// Gust duration (ms)
    pub const GUST_DURATION_MIN_MS: u64 = 2500;
    pub const GUST_DURATION_MAX_MS: u64 = 4000;

    /// Grace period after session start with frozen physics
    pub const WARMUP_MS: u64 = 2000;
    /// Survival time per point (2 points per second)
    pub const POINTS_INTERVAL_MS: u64 = 500;

    /// Nominal physics tick interval
    pub const TICK_INTERVAL_MS: u64 = 16;
    /// Frame gaps longer than this are treated as a pause boundary
    pub const MAX_FRAME_GAP_MS: u64 = 250;

    /// Leaf spawn interval (ms) and batch size
    pub const LEAF_SPAWN_MIN_MS: u64 = 3000;
    pub const LEAF_SPAWN_MAX_MS: u64 = 8000;
    pub const LEAF_BATCH_MIN: u32 = 1;
    pub const LEAF_BATCH_MAX: u32 = 3;
    /// Leaf fall speed range (screen fractions per second)
    pub const LEAF_SPEED_MIN: f32 = 0.125;
    pub const LEAF_SPEED_MAX: f32 = 0.375;
    /// Horizontal leaf drift per unit of wind strength (fractions per second)
    pub const LEAF_WIND_FACTOR: f32 = 62.5 / 300.0;
    /// Leaves spawn just above the top edge and are dropped below this
    pub const LEAF_SPAWN_Y: f32 = -0.1;
    pub const LEAF_DESPAWN_Y: f32 = 1.1;

    /// How long a tap ripple stays visible
    pub const RIPPLE_LIFETIME_MS: u64 = 1000;
}

/// Survival time formatted as `S.mm` seconds for HUD text
pub fn format_survival_time(ms: u64) -> String {
    format!("{}.{:02}", ms / 1000, (ms % 1000) / 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_survival_time() {
        assert_eq!(format_survival_time(0), "0.00");
        assert_eq!(format_survival_time(8342), "8.34");
        assert_eq!(format_survival_time(61_005), "61.00");
    }
}
