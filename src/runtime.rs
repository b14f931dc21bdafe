//! Threaded session runner
//!
//! Moves a [`GameSession`] onto its own thread. The view talks to it through a
//! [`SessionHandle`]; commands are queued and applied in order between ticks,
//! so the session stays the only writer of its state.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::audio::AudioCues;
use crate::clock::Clock;
use crate::persistence::{Persistence, SkinId};
use crate::session::{GameSession, Subscription, TickResult};

/// Requests sent to the session thread
#[derive(Debug)]
pub enum Command {
    Start,
    Restart,
    Pause,
    Resume,
    Background,
    GoIdle,
    TapLeft { x: f32, y: f32 },
    TapRight { x: f32, y: f32 },
    SetMusic(bool),
    SetSfx(bool),
    SelectSkin(SkinId),
    Subscribe(Sender<Subscription>),
    Shutdown,
}

/// Handle to a session running on its own thread
pub struct SessionHandle {
    tx: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Spawn the session thread, ticking every `tick_interval`
    pub fn spawn<P, A, C>(
        session: GameSession<P, A, C>,
        tick_interval: Duration,
    ) -> std::io::Result<Self>
    where
        P: Persistence + Send + 'static,
        A: AudioCues + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("game-session".into())
            .spawn(move || {
                SessionRunner::new(session, rx, tick_interval).run();
            })?;
        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn start_session(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn restart_session(&self) -> bool {
        self.send(Command::Restart)
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(Command::Resume)
    }

    pub fn background(&self) -> bool {
        self.send(Command::Background)
    }

    pub fn go_idle(&self) -> bool {
        self.send(Command::GoIdle)
    }

    pub fn on_tap_left(&self, x: f32, y: f32) -> bool {
        self.send(Command::TapLeft { x, y })
    }

    pub fn on_tap_right(&self, x: f32, y: f32) -> bool {
        self.send(Command::TapRight { x, y })
    }

    pub fn set_music_enabled(&self, enabled: bool) -> bool {
        self.send(Command::SetMusic(enabled))
    }

    pub fn set_sfx_enabled(&self, enabled: bool) -> bool {
        self.send(Command::SetSfx(enabled))
    }

    pub fn select_skin(&self, id: SkinId) -> bool {
        self.send(Command::SelectSkin(id))
    }

    /// Snapshot stream, starting with the current state
    pub fn subscribe(&self) -> Option<Subscription> {
        let (reply_tx, reply_rx) = mpsc::channel();
        if !self.send(Command::Subscribe(reply_tx)) {
            return None;
        }
        reply_rx.recv().ok()
    }

    /// Stop the session thread and wait for it
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Session thread panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns a session on the runner thread
pub struct SessionRunner<P, A, C> {
    session: GameSession<P, A, C>,
    commands: Receiver<Command>,
    tick_interval: Duration,
}

impl<P, A, C> SessionRunner<P, A, C>
where
    P: Persistence,
    A: AudioCues,
    C: Clock,
{
    pub fn new(
        session: GameSession<P, A, C>,
        commands: Receiver<Command>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            session,
            commands,
            tick_interval,
        }
    }

    /// Apply commands and tick until shut down; returns the session
    pub fn run(mut self) -> GameSession<P, A, C> {
        let mut next_tick = Instant::now() + self.tick_interval;
        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match self.commands.recv_timeout(wait) {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => self.apply(command),
                Err(RecvTimeoutError::Timeout) => {
                    if let TickResult::GameOver(score) = self.session.tick() {
                        log::debug!("Runner observed game over: {:?}", score);
                    }
                    next_tick += self.tick_interval;
                    // Don't replay missed ticks after a stall; the frame clock measures real time
                    let now = Instant::now();
                    if next_tick < now {
                        next_tick = now + self.tick_interval;
                    }
                }
            }
        }
        self.session.go_idle();
        log::debug!("Session thread stopped");
        self.session
    }

    fn apply(&mut self, command: Command) {
        let session = &mut self.session;
        match command {
            Command::Start => session.start_session(),
            Command::Restart => session.restart_session(),
            Command::Pause => {
                session.pause();
            }
            Command::Resume => {
                session.resume();
            }
            Command::Background => {
                session.background();
            }
            Command::GoIdle => session.go_idle(),
            Command::TapLeft { x, y } => {
                session.on_tap_left(x, y);
            }
            Command::TapRight { x, y } => {
                session.on_tap_right(x, y);
            }
            Command::SetMusic(enabled) => session.set_music_enabled(enabled),
            Command::SetSfx(enabled) => session.set_sfx_enabled(enabled),
            Command::SelectSkin(id) => {
                session.select_skin(id);
            }
            Command::Subscribe(reply) => {
                let _ = reply.send(session.subscribe());
            }
            Command::Shutdown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCue, NullAudio, RecordingAudio};
    use crate::clock::{ManualClock, SystemClock};
    use crate::persistence::MemoryStore;
    use crate::sim::Phase;
    use crate::tuning::Tuning;

    fn spawn() -> SessionHandle {
        let session = GameSession::new(
            Tuning::default(),
            MemoryStore::new(),
            NullAudio,
            SystemClock::new(),
            7,
        );
        SessionHandle::spawn(session, Duration::from_millis(16)).unwrap()
    }

    #[test]
    fn test_commands_reach_session_in_order() {
        let handle = spawn();
        let mut rx = handle.subscribe().unwrap();
        assert_eq!(rx.recv().unwrap().phase, Phase::Idle);

        handle.start_session();
        handle.pause();
        handle.pause();
        handle.resume();

        assert_eq!(rx.recv().unwrap().phase, Phase::Warmup);
        // Ticks may interleave with more Warmup snapshots
        assert!(rx.by_ref().any(|s| s.phase == Phase::Paused));
        assert!(rx.by_ref().any(|s| s.phase == Phase::Warmup));
        handle.shutdown();
    }

    #[test]
    fn test_ticks_advance_warmup() {
        let handle = spawn();
        let mut rx = handle.subscribe().unwrap();
        handle.start_session();
        let state = rx
            .find(|s| s.phase == Phase::Warmup && s.warmup_elapsed_ms > 0)
            .unwrap();
        assert_eq!(state.angle, 0.0);
        handle.shutdown();
    }

    #[test]
    fn test_runner_drains_queued_commands_before_shutdown() {
        let session = GameSession::new(
            Tuning::default(),
            MemoryStore::new(),
            RecordingAudio::default(),
            ManualClock::new(0),
            7,
        );
        let (tx, rx) = mpsc::channel();
        for command in [
            Command::Start,
            Command::TapLeft { x: 0.1, y: 0.5 },
            Command::SetSfx(false),
            Command::Shutdown,
        ] {
            tx.send(command).unwrap();
        }

        let session = SessionRunner::new(session, rx, Duration::from_secs(60)).run();
        let cues = &session.audio().cues;
        let start = cues.iter().position(|c| *c == AudioCue::GameMusic).unwrap();
        let tap = cues.iter().position(|c| *c == AudioCue::Tap).unwrap();
        let sfx_off = cues
            .iter()
            .position(|c| *c == AudioCue::SfxEnabled(false))
            .unwrap();
        assert!(start < tap && tap < sfx_off);
        assert_eq!(session.state().phase, Phase::Idle);
        assert!(!session.state().preferences.sfx_enabled);
    }
}
