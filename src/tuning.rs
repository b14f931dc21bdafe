//! Data-driven game balance
//!
//! Every gameplay constant lives here so a JSON file can rebalance the game
//! without a rebuild. Missing fields fall back to [`crate::consts`].

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors produced while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Inclusive numeric range stored as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: Copy + PartialOrd> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn range(&self) -> RangeInclusive<T> {
        self.min..=self.max
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Gameplay balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Absolute tilt (degrees) that ends the run
    pub fall_threshold: f32,
    /// Tilt at which the chicken looks nervous
    pub tilt_for_change: f32,
    /// Velocity impulse per tap
    pub tap_strength: f32,
    /// Constant drift per tick
    pub sway_strength: f32,
    /// Per-tick velocity multiplier
    pub damping: f32,
    /// Initial velocity magnitude (sign is random)
    pub initial_velocity: Span<f32>,

    /// Gust strength
    pub wind_strength: Span<f32>,
    /// Calm period between gusts (ms)
    pub wind_wait_ms: Span<u64>,
    /// Gust duration (ms)
    pub gust_duration_ms: Span<u64>,

    /// Frozen-physics grace period at session start
    pub warmup_ms: u64,
    /// Survival time per point
    pub points_interval_ms: u64,
    /// Frame gaps above this are a pause boundary
    pub max_frame_gap_ms: u64,

    /// Leaf spawn interval (ms)
    pub leaf_spawn_ms: Span<u64>,
    /// Leaves per spawn
    pub leaf_batch: Span<u32>,
    /// Leaf fall speed (fractions per second)
    pub leaf_speed: Span<f32>,

    /// Tap ripple lifetime
    pub ripple_lifetime_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            fall_threshold: FALL_THRESHOLD,
            tilt_for_change: TILT_FOR_CHANGE,
            tap_strength: TAP_STRENGTH,
            sway_strength: SWAY_STRENGTH,
            damping: DAMPING,
            initial_velocity: Span::new(INITIAL_VELOCITY_MIN, INITIAL_VELOCITY_MAX),

            wind_strength: Span::new(WIND_STRENGTH_MIN, WIND_STRENGTH_MAX),
            wind_wait_ms: Span::new(WIND_WAIT_MIN_MS, WIND_WAIT_MAX_MS),
            gust_duration_ms: Span::new(GUST_DURATION_MIN_MS, GUST_DURATION_MAX_MS),

            warmup_ms: WARMUP_MS,
            points_interval_ms: POINTS_INTERVAL_MS,
            max_frame_gap_ms: MAX_FRAME_GAP_MS,

            leaf_spawn_ms: Span::new(LEAF_SPAWN_MIN_MS, LEAF_SPAWN_MAX_MS),
            leaf_batch: Span::new(LEAF_BATCH_MIN, LEAF_BATCH_MAX),
            leaf_speed: Span::new(LEAF_SPEED_MIN, LEAF_SPEED_MAX),

            ripple_lifetime_ms: RIPPLE_LIFETIME_MS,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Load tuning from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, TuningError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No tuning file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: &str| Err(TuningError::Invalid(msg.to_string()));

        if !(self.fall_threshold > 0.0) {
            return invalid("fall_threshold must be positive");
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return invalid("damping must be in (0, 1]");
        }
        let magnitudes = [
            self.tap_strength,
            self.sway_strength,
            self.initial_velocity.max,
            self.wind_strength.min,
            self.wind_strength.max,
            self.leaf_speed.min,
            self.leaf_speed.max,
        ];
        if !magnitudes.iter().all(|v| v.is_finite()) {
            return invalid("strengths and speeds must be finite");
        }
        if self.points_interval_ms == 0 {
            return invalid("points_interval_ms must be non-zero");
        }
        if self.max_frame_gap_ms == 0 {
            return invalid("max_frame_gap_ms must be non-zero");
        }
        if !self.initial_velocity.is_ordered() || self.initial_velocity.min < 0.0 {
            return invalid("initial_velocity must be a non-negative ordered range");
        }
        if !self.wind_strength.is_ordered() {
            return invalid("wind_strength range is inverted");
        }
        if !self.wind_wait_ms.is_ordered() || self.wind_wait_ms.min == 0 {
            return invalid("wind_wait_ms must be a non-zero ordered range");
        }
        if !self.gust_duration_ms.is_ordered() || self.gust_duration_ms.min == 0 {
            return invalid("gust_duration_ms must be a non-zero ordered range");
        }
        if !self.leaf_spawn_ms.is_ordered() || self.leaf_spawn_ms.min == 0 {
            return invalid("leaf_spawn_ms must be a non-zero ordered range");
        }
        if !self.leaf_batch.is_ordered() || !self.leaf_speed.is_ordered() {
            return invalid("leaf ranges are inverted");
        }
        Ok(())
    }
}
