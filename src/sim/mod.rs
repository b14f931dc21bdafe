//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of platform and
//! collaborator dependencies:
//! - Time is passed in, never read
//! - Seeded RNG only
//! - Snapshots are replaced, never shared mutably

pub mod balance;
pub mod leaves;
pub mod state;
pub mod timer;
pub mod wind;

pub use balance::{StepOutcome, advance, apply_taps, is_fall};
pub use leaves::{LeafSpawner, update_leaves};
pub use state::{
    ChickenPose, LeafParticle, Phase, PreferenceView, RippleMarker, SessionState, Side, TapSide,
    Wind,
};
pub use timer::{Countdown, FrameClock, FrameDelta, TimerSet, TimerStatus};
pub use wind::{WindEvent, WindGenerator, WindPhase};
