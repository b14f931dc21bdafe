//! Game session state machine
//!
//! `Idle → Warmup → Playing ⇄ Paused → GameOver → (restart) → Warmup`
//!
//! [`GameSession`] is the single writer of [`SessionState`]. Every mutation goes
//! through one of its methods; the three timer processes (frame clock, wind,
//! leaves) live in one [`TimerSet`] owned by the session and are advanced only
//! from [`GameSession::tick`]. Collaborator calls (storage, audio) are side
//! effects whose failures never reach the simulation.

pub mod autopilot;
pub mod snapshots;

use std::panic::{self, AssertUnwindSafe};

use glam::Vec2;
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio::AudioCues;
use crate::clock::Clock;
use crate::persistence::{Persistence, PurchaseOutcome, SkinId, StoreError, purchase_skin};
use crate::score::{self, FinalScore};
use crate::sim::{
    FrameDelta, Phase, PreferenceView, RippleMarker, SessionState, Side, StepOutcome, TimerSet,
    WindEvent, balance, update_leaves,
};
use crate::tuning::Tuning;

pub use autopilot::Autopilot;
pub use snapshots::{SNAPSHOT_BUFFER, Subscription};

use snapshots::SnapshotFeed;

/// Faulted ticks that keep their queued taps before the taps are dropped
const MAX_TAP_RETRIES: u32 = 1;

/// What a call to [`GameSession::tick`] did
#[derive(Debug, Clone, PartialEq)]
pub enum TickResult {
    /// No running session (idle or game over)
    Stopped,
    /// Paused, timers suspended
    Suspended,
    /// A new snapshot was published
    Advanced,
    /// The chicken fell on this tick
    GameOver(FinalScore),
    /// The tick failed internally and was discarded
    Faulted,
}

/// Pure part of a tick, computed from copies so a fault changes nothing
struct Step {
    state: SessionState,
    timers: TimerSet,
    wind_events: Vec<WindEvent>,
    taps_consumed: bool,
    fell: bool,
}

/// One balancing session plus its collaborators
pub struct GameSession<P, A, C> {
    tuning: Tuning,
    state: SessionState,
    timers: Option<TimerSet>,
    pending_taps: Vec<Side>,
    /// Consecutive ticks discarded by [`GameSession::tick`]
    faulted_ticks: u32,
    rng: Pcg32,
    generation: u64,
    next_ripple_id: u64,
    last_score: Option<FinalScore>,
    snapshots: SnapshotFeed,
    persistence: P,
    audio: A,
    clock: C,
}

impl<P, A, C> GameSession<P, A, C>
where
    P: Persistence,
    A: AudioCues,
    C: Clock,
{
    /// Create an idle session, reading the stored profile once
    pub fn new(tuning: Tuning, persistence: P, mut audio: A, clock: C, seed: u64) -> Self {
        let profile = persistence.profile();
        audio.set_music_enabled(profile.music_enabled);
        audio.set_sfx_enabled(profile.sfx_enabled);
        let preferences = PreferenceView {
            selected_skin: profile.selected_skin,
            music_enabled: profile.music_enabled,
            sfx_enabled: profile.sfx_enabled,
        };

        let mut session = Self {
            tuning,
            state: SessionState::idle(profile.points, profile.best_time_ms, preferences),
            timers: None,
            pending_taps: Vec::new(),
            faulted_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            generation: 0,
            next_ripple_id: 1,
            last_score: None,
            snapshots: SnapshotFeed::new(),
            persistence,
            audio,
            clock,
        };
        session.audio.start_menu_music();
        session
    }

    /// Current snapshot
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Timers of the running session, if any
    pub fn timers(&self) -> Option<&TimerSet> {
        self.timers.as_ref()
    }

    /// Number of sessions started so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Score of the most recent game over
    pub fn last_score(&self) -> Option<FinalScore> {
        self.last_score
    }

    /// Receive a snapshot on every published change, starting with the current one
    pub fn subscribe(&mut self) -> Subscription {
        self.snapshots.subscribe(&self.state)
    }

    fn publish(&mut self) {
        self.state.tick += 1;
        self.snapshots.publish(&self.state);
    }

    // === Lifecycle ===

    /// Start a fresh run (from idle, game over, or mid-run)
    pub fn start_session(&mut self) {
        self.cancel_timers();
        self.generation += 1;

        let profile = self.persistence.profile();
        let sign = Side::from_bool(self.rng.random_bool(0.5));
        let magnitude = self.rng.random_range(self.tuning.initial_velocity.range());
        let drift = Side::from_bool(self.rng.random_bool(0.5));

        let mut state = SessionState::idle(
            profile.points,
            self.state.best_time_ms.max(profile.best_time_ms),
            self.state.preferences,
        );
        state.phase = Phase::Warmup;
        state.angular_velocity = sign.sign() * magnitude;
        state.drift = drift;
        state.tick = self.state.tick;
        self.state = state;

        self.pending_taps.clear();
        self.faulted_ticks = 0;
        let now = self.clock.now_ms();
        let wind_seed = self.rng.next_u64();
        let leaf_seed = self.rng.next_u64();
        self.timers = Some(TimerSet::start(
            self.generation,
            now,
            wind_seed,
            leaf_seed,
            &self.tuning,
        ));

        log::info!(
            "Session {} started (drift {:?}, initial velocity {:.1})",
            self.generation,
            drift,
            self.state.angular_velocity
        );
        self.audio.start_game_music();
        self.publish();
    }

    /// Abandon the current run and start over
    pub fn restart_session(&mut self) {
        self.start_session();
    }

    /// Return to the resting menu-preview state
    pub fn go_idle(&mut self) {
        self.cancel_timers();
        self.pending_taps.clear();

        let profile = self.persistence.profile();
        let mut state = SessionState::idle(
            profile.points,
            self.state.best_time_ms.max(profile.best_time_ms),
            self.state.preferences,
        );
        state.tick = self.state.tick;
        self.state = state;

        log::info!("Session idle");
        self.audio.start_menu_music();
        self.publish();
    }

    /// Suspend a running session; returns false if there was nothing to pause
    pub fn pause(&mut self) -> bool {
        let phase = self.state.phase;
        if !matches!(phase, Phase::Warmup | Phase::Playing) {
            return false;
        }
        if let Some(timers) = self.timers.as_mut() {
            timers.suspend();
        }
        self.state.resume_phase = Some(phase);
        self.state.phase = Phase::Paused;
        log::info!("Session {} paused", self.generation);
        self.publish();
        true
    }

    /// App went to the background; identical to [`Self::pause`]
    pub fn background(&mut self) -> bool {
        log::debug!("App backgrounded");
        self.pause()
    }

    /// Continue a paused session where it left off
    pub fn resume(&mut self) -> bool {
        if self.state.phase != Phase::Paused {
            return false;
        }
        let now = self.clock.now_ms();
        if let Some(timers) = self.timers.as_mut() {
            timers.resume(now);
        }
        self.state.phase = self.state.resume_phase.take().unwrap_or(Phase::Playing);
        log::info!("Session {} resumed", self.generation);
        self.publish();
        true
    }

    // === Input ===

    pub fn on_tap_left(&mut self, x: f32, y: f32) -> bool {
        self.on_tap(Side::Left, x, y)
    }

    pub fn on_tap_right(&mut self, x: f32, y: f32) -> bool {
        self.on_tap(Side::Right, x, y)
    }

    /// Queue a classified tap for the next tick; ignored unless warming up or playing
    pub fn on_tap(&mut self, side: Side, x: f32, y: f32) -> bool {
        if !self.state.phase.accepts_taps() {
            return false;
        }
        if self.state.phase == Phase::Warmup {
            self.state.phase = Phase::Playing;
            self.state.warmup_cancelled = true;
            log::debug!("First tap ended warmup");
        }

        self.pending_taps.push(side);
        self.state.ripples.push(RippleMarker {
            id: self.next_ripple_id,
            pos: Vec2::new(x, y),
            side,
            age_ms: 0,
        });
        self.next_ripple_id += 1;

        self.audio.play_tap_sound();
        self.publish();
        true
    }

    // === Preferences ===

    pub fn set_music_enabled(&mut self, enabled: bool) {
        if let Err(e) = self.persistence.set_music_enabled(enabled) {
            log::warn!("Failed to store music preference: {}", e);
        }
        self.audio.set_music_enabled(enabled);
        self.state.preferences.music_enabled = enabled;
        self.publish();
    }

    pub fn set_sfx_enabled(&mut self, enabled: bool) {
        if let Err(e) = self.persistence.set_sfx_enabled(enabled) {
            log::warn!("Failed to store sfx preference: {}", e);
        }
        self.audio.set_sfx_enabled(enabled);
        self.state.preferences.sfx_enabled = enabled;
        self.publish();
    }

    /// Select an owned skin; returns false for locked skins
    pub fn select_skin(&mut self, id: SkinId) -> bool {
        if !self.persistence.profile().is_unlocked(id) {
            return false;
        }
        if let Err(e) = self.persistence.set_selected_skin(id) {
            log::warn!("Failed to store selected skin: {}", e);
        }
        self.state.preferences.selected_skin = id;
        self.publish();
        true
    }

    /// Buy a skin with lifetime points and select it
    pub fn purchase_skin(&mut self, id: SkinId) -> Result<PurchaseOutcome, StoreError> {
        let outcome = purchase_skin(&mut self.persistence, id)?;
        if outcome == PurchaseOutcome::Purchased {
            let profile = self.persistence.profile();
            self.state.total_points = profile.points;
            self.state.preferences.selected_skin = profile.selected_skin;
            self.publish();
        }
        Ok(outcome)
    }

    // === Simulation ===

    /// Advance the running session to the clock's current time
    pub fn tick(&mut self) -> TickResult {
        let now = self.clock.now_ms();
        let Some(timers) = self.timers.as_mut() else {
            return TickResult::Stopped;
        };
        if self.state.phase == Phase::Paused {
            return TickResult::Suspended;
        }

        let delta = timers.frame.tick(now);
        if let FrameDelta::Gap(ms) = delta {
            log::debug!("Frame gap of {}ms treated as a pause boundary", ms);
        }
        let elapsed_ms = delta.simulated_ms();

        let taps = std::mem::take(&mut self.pending_taps);
        let result = {
            let state = &self.state;
            let timers = &*timers;
            let tuning = &self.tuning;
            panic::catch_unwind(AssertUnwindSafe(|| {
                step(state, timers, elapsed_ms, &taps, tuning)
            }))
        };

        let step = match result {
            Ok(Some(step)) => step,
            Ok(None) => {
                log::warn!("Discarding tick with non-finite physics state");
                return self.discard_tick(taps);
            }
            Err(_) => {
                log::warn!("Discarding tick after internal panic");
                return self.discard_tick(taps);
            }
        };
        self.faulted_ticks = 0;

        if !step.taps_consumed {
            self.pending_taps = taps;
        }

        for event in &step.wind_events {
            match event {
                WindEvent::GustStarted { .. } => self.audio.play_wind_ambience(),
                WindEvent::GustEnded { .. } => self.audio.stop_wind_ambience(),
            }
        }

        self.state = step.state;
        self.timers = Some(step.timers);
        if step.fell {
            let score = self.enter_game_over();
            return TickResult::GameOver(score);
        }

        self.publish();
        TickResult::Advanced
    }

    /// Leave the state untouched; taps get one retry, then they are dropped
    fn discard_tick(&mut self, taps: Vec<Side>) -> TickResult {
        self.faulted_ticks += 1;
        if taps.is_empty() {
            return TickResult::Faulted;
        }
        if self.faulted_ticks > MAX_TAP_RETRIES {
            log::warn!("Dropping {} taps after {} failed ticks", taps.len(), self.faulted_ticks);
        } else {
            self.pending_taps = taps;
        }
        TickResult::Faulted
    }

    fn enter_game_over(&mut self) -> FinalScore {
        self.cancel_timers();
        self.pending_taps.clear();

        let score = score::finalize(&mut self.persistence, &self.state);
        self.state.best_time_ms = score.best_time_ms;
        self.state.total_points = score.total_points;
        self.state.last_session_points = score.session_points;
        self.state.new_best = score.new_best;
        self.last_score = Some(score);

        log::info!(
            "Session {} over after {}ms: {} points{}",
            self.generation,
            score.survival_time_ms,
            score.session_points,
            if score.new_best { " (new best)" } else { "" }
        );
        self.audio.play_fall_sound();
        self.publish();
        score
    }

    /// Drop every timer of the current run
    fn cancel_timers(&mut self) {
        if let Some(timers) = self.timers.take() {
            log::debug!("Cancelled timers of session {}", timers.generation);
            if timers.wind.wind().active {
                self.audio.stop_wind_ambience();
            }
        }
    }
}

/// Compute the next snapshot without touching the live session
fn step(
    prev: &SessionState,
    timers: &TimerSet,
    elapsed_ms: u64,
    taps: &[Side],
    tuning: &Tuning,
) -> Option<Step> {
    let mut timers = timers.clone();
    let mut next = prev.clone();
    let elapsed_secs = elapsed_ms as f32 / 1000.0;

    // Warmup consumes time first; only the overflow is play time
    let mut play_ms = elapsed_ms;
    if next.phase == Phase::Warmup {
        let remaining = tuning.warmup_ms.saturating_sub(next.warmup_elapsed_ms);
        if elapsed_ms >= remaining {
            next.warmup_elapsed_ms = tuning.warmup_ms;
            next.phase = Phase::Playing;
            play_ms = elapsed_ms - remaining;
        } else {
            next.warmup_elapsed_ms += elapsed_ms;
            play_ms = 0;
        }
    }

    let wind_events = timers.wind.advance(elapsed_ms);
    next.wind = timers.wind.wind();

    next.leaves = update_leaves(&prev.leaves, next.wind, elapsed_secs);
    next.leaves.extend(timers.leaves.advance(elapsed_ms));

    for ripple in &mut next.ripples {
        ripple.age_ms += elapsed_ms;
    }
    next.ripples.retain(|r| r.age_ms < tuning.ripple_lifetime_ms);

    let outcome = if play_ms > 0 {
        balance::advance(&next, play_ms as f32 / 1000.0, taps, tuning)
    } else {
        StepOutcome::Frozen
    };

    let (taps_consumed, fell) = match outcome {
        StepOutcome::Frozen => (false, false),
        StepOutcome::Balanced { angle, velocity } | StepOutcome::Fell { angle, velocity } => {
            if !angle.is_finite() || !velocity.is_finite() {
                return None;
            }
            next.angle = angle;
            next.angular_velocity = velocity;
            next.survival_time_ms += play_ms;
            next.session_points = score::session_points(next.survival_time_ms, tuning.points_interval_ms);

            let fell = matches!(outcome, StepOutcome::Fell { .. });
            if fell {
                next.phase = Phase::GameOver;
                next.fall_side = Some(Side::of(angle));
            }
            (true, fell)
        }
    };

    Some(Step {
        state: next,
        timers,
        wind_events,
        taps_consumed,
        fell,
    })
}
