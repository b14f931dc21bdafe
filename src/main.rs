//! Chicken Balance entry point
//!
//! Headless native demo: runs the session on its own thread and lets the
//! autopilot play a few rounds, logging cues and results.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use std::path::Path;
    use std::time::Duration;

    use anyhow::Context;
    use chicken_balance::audio::{CueGate, LogAudio};
    use chicken_balance::clock::{Clock, SystemClock};
    use chicken_balance::consts::TICK_INTERVAL_MS;
    use chicken_balance::persistence::{JsonFileStore, WriteBehind, default_profile_path};
    use chicken_balance::runtime::SessionHandle;
    use chicken_balance::session::Autopilot;
    use chicken_balance::{GameSession, Phase, Side, Tuning, format_survival_time};

    env_logger::init();
    log::info!("Chicken Balance (native) starting...");

    let rounds: u32 = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid round count {:?}", arg))?,
        None => 3,
    };

    let tuning = Tuning::load_or_default(Path::new("chicken-balance.json"))?;
    let profile_path = default_profile_path()?;
    log::info!("Profile at {}", profile_path.display());
    let store = WriteBehind::spawn(JsonFileStore::open(profile_path));

    let clock = SystemClock::new();
    let seed = u64::from(std::process::id()) ^ clock.now_ms();
    let session = GameSession::new(
        tuning,
        store,
        CueGate::new(LogAudio, true, true),
        SystemClock::new(),
        seed,
    );
    let handle = SessionHandle::spawn(session, Duration::from_millis(TICK_INTERVAL_MS))?;
    let snapshots = handle
        .subscribe()
        .context("session thread stopped before subscribing")?;

    let mut pilot = Autopilot::default();
    let mut played = 0;
    handle.start_session();

    for state in snapshots {
        if state.phase == Phase::GameOver {
            played += 1;
            log::info!(
                "Round {}: fell {:?} after {}s, +{} points (best {}s, total {})",
                played,
                state.fall_side,
                format_survival_time(state.survival_time_ms),
                state.last_session_points,
                format_survival_time(state.best_time_ms),
                state.total_points,
            );
            if played >= rounds {
                break;
            }
            pilot = Autopilot::default();
            handle.restart_session();
            continue;
        }

        match pilot.decide(&state, clock.now_ms()) {
            Some(Side::Left) => {
                handle.on_tap_left(0.25, 0.5);
            }
            Some(Side::Right) => {
                handle.on_tap_right(0.75, 0.5);
            }
            None => {}
        }
    }

    handle.shutdown();
    log::info!("Played {} round(s)", played);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; the host page drives it
}
