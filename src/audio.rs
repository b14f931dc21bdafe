//! Audio cues
//!
//! The session only ever says *what* should be heard. [`CueGate`] turns those
//! cues into concrete output for a backend while honoring the music/sfx
//! toggles; mixing and playback belong to the backend.

/// Cue requested by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    Tap,
    Fall,
    WindStart,
    WindStop,
    MenuMusic,
    GameMusic,
    MusicEnabled(bool),
    SfxEnabled(bool),
}

/// Audio collaborator interface consumed by the session
pub trait AudioCues {
    fn play_tap_sound(&mut self);
    fn play_fall_sound(&mut self);
    fn play_wind_ambience(&mut self);
    fn stop_wind_ambience(&mut self);
    fn start_menu_music(&mut self);
    fn start_game_music(&mut self);
    fn set_music_enabled(&mut self, enabled: bool);
    fn set_sfx_enabled(&mut self, enabled: bool);

    /// Dispatch a cue value to the matching method
    fn cue(&mut self, cue: AudioCue) {
        match cue {
            AudioCue::Tap => self.play_tap_sound(),
            AudioCue::Fall => self.play_fall_sound(),
            AudioCue::WindStart => self.play_wind_ambience(),
            AudioCue::WindStop => self.stop_wind_ambience(),
            AudioCue::MenuMusic => self.start_menu_music(),
            AudioCue::GameMusic => self.start_game_music(),
            AudioCue::MusicEnabled(enabled) => self.set_music_enabled(enabled),
            AudioCue::SfxEnabled(enabled) => self.set_sfx_enabled(enabled),
        }
    }
}

/// Looping music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Menu,
    Game,
}

/// Concrete output for a playback backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOutput {
    TapSfx,
    FallSfx,
    /// Start (true) or fade out (false) the wind loop
    WindLoop(bool),
    /// Switch music to a track, or silence it
    Music(Option<Track>),
}

/// Playback device behind a [`CueGate`]
pub trait AudioBackend {
    fn output(&mut self, output: AudioOutput);
}

/// Applies the music/sfx toggles and remembers which track should be playing
#[derive(Debug)]
pub struct CueGate<B> {
    backend: B,
    music_enabled: bool,
    sfx_enabled: bool,
    /// Track the current screen wants, even while music is off
    intended_track: Option<Track>,
    playing_track: Option<Track>,
    wind_playing: bool,
}

impl<B: AudioBackend> CueGate<B> {
    pub fn new(backend: B, music_enabled: bool, sfx_enabled: bool) -> Self {
        Self {
            backend,
            music_enabled,
            sfx_enabled,
            intended_track: None,
            playing_track: None,
            wind_playing: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn playing_track(&self) -> Option<Track> {
        self.playing_track
    }

    pub fn is_wind_playing(&self) -> bool {
        self.wind_playing
    }

    fn switch_music(&mut self, track: Track) {
        self.intended_track = Some(track);
        self.sync_music();
    }

    fn sync_music(&mut self) {
        let want = if self.music_enabled {
            self.intended_track
        } else {
            None
        };
        if want != self.playing_track {
            self.playing_track = want;
            self.backend.output(AudioOutput::Music(want));
        }
    }

    fn stop_wind(&mut self) {
        if self.wind_playing {
            self.wind_playing = false;
            self.backend.output(AudioOutput::WindLoop(false));
        }
    }
}

impl<B: AudioBackend> AudioCues for CueGate<B> {
    fn play_tap_sound(&mut self) {
        if self.sfx_enabled {
            self.backend.output(AudioOutput::TapSfx);
        }
    }

    fn play_fall_sound(&mut self) {
        if self.sfx_enabled {
            self.backend.output(AudioOutput::FallSfx);
        }
    }

    fn play_wind_ambience(&mut self) {
        if self.sfx_enabled && !self.wind_playing {
            self.wind_playing = true;
            self.backend.output(AudioOutput::WindLoop(true));
        }
    }

    fn stop_wind_ambience(&mut self) {
        self.stop_wind();
    }

    fn start_menu_music(&mut self) {
        self.switch_music(Track::Menu);
    }

    fn start_game_music(&mut self) {
        self.switch_music(Track::Game);
    }

    fn set_music_enabled(&mut self, enabled: bool) {
        self.music_enabled = enabled;
        self.sync_music();
    }

    fn set_sfx_enabled(&mut self, enabled: bool) {
        self.sfx_enabled = enabled;
        if !enabled {
            self.stop_wind();
        }
    }
}

/// Backend that only logs what it would play
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioBackend for LogAudio {
    fn output(&mut self, output: AudioOutput) {
        log::debug!("Audio: {:?}", output);
    }
}

/// Silent cue sink
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioCues for NullAudio {
    fn play_tap_sound(&mut self) {}
    fn play_fall_sound(&mut self) {}
    fn play_wind_ambience(&mut self) {}
    fn stop_wind_ambience(&mut self) {}
    fn start_menu_music(&mut self) {}
    fn start_game_music(&mut self) {}
    fn set_music_enabled(&mut self, _enabled: bool) {}
    fn set_sfx_enabled(&mut self, _enabled: bool) {}
}

/// Records every cue it receives, for tests and replays
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub cues: Vec<AudioCue>,
}

impl RecordingAudio {
    pub fn count(&self, cue: AudioCue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }
}

impl AudioCues for RecordingAudio {
    fn play_tap_sound(&mut self) {
        self.cues.push(AudioCue::Tap);
    }
    fn play_fall_sound(&mut self) {
        self.cues.push(AudioCue::Fall);
    }
    fn play_wind_ambience(&mut self) {
        self.cues.push(AudioCue::WindStart);
    }
    fn stop_wind_ambience(&mut self) {
        self.cues.push(AudioCue::WindStop);
    }
    fn start_menu_music(&mut self) {
        self.cues.push(AudioCue::MenuMusic);
    }
    fn start_game_music(&mut self) {
        self.cues.push(AudioCue::GameMusic);
    }
    fn set_music_enabled(&mut self, enabled: bool) {
        self.cues.push(AudioCue::MusicEnabled(enabled));
    }
    fn set_sfx_enabled(&mut self, enabled: bool) {
        self.cues.push(AudioCue::SfxEnabled(enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Outputs(Vec<AudioOutput>);

    impl AudioBackend for Outputs {
        fn output(&mut self, output: AudioOutput) {
            self.0.push(output);
        }
    }

    #[test]
    fn test_sfx_gated_by_toggle() {
        let mut gate = CueGate::new(Outputs::default(), true, false);
        gate.play_tap_sound();
        gate.play_fall_sound();
        gate.play_wind_ambience();
        assert!(gate.backend().0.is_empty());

        gate.set_sfx_enabled(true);
        gate.play_tap_sound();
        assert_eq!(gate.backend().0, vec![AudioOutput::TapSfx]);
    }

    #[test]
    fn test_music_intent_survives_toggle() {
        let mut gate = CueGate::new(Outputs::default(), false, true);
        gate.start_game_music();
        assert_eq!(gate.playing_track(), None);

        gate.set_music_enabled(true);
        assert_eq!(gate.playing_track(), Some(Track::Game));

        gate.start_menu_music();
        gate.set_music_enabled(false);
        assert_eq!(
            gate.backend().0,
            vec![
                AudioOutput::Music(Some(Track::Game)),
                AudioOutput::Music(Some(Track::Menu)),
                AudioOutput::Music(None),
            ]
        );
    }

    #[test]
    fn test_wind_loop_start_stop_once() {
        let mut gate = CueGate::new(Outputs::default(), true, true);
        gate.play_wind_ambience();
        gate.play_wind_ambience();
        assert!(gate.is_wind_playing());
        gate.stop_wind_ambience();
        gate.stop_wind_ambience();
        assert_eq!(
            gate.backend().0,
            vec![AudioOutput::WindLoop(true), AudioOutput::WindLoop(false)]
        );
    }

    #[test]
    fn test_disabling_sfx_stops_wind() {
        let mut gate = CueGate::new(Outputs::default(), true, true);
        gate.play_wind_ambience();
        gate.set_sfx_enabled(false);
        assert!(!gate.is_wind_playing());
    }

    #[test]
    fn test_recording_cue_dispatch() {
        let mut audio = RecordingAudio::default();
        audio.cue(AudioCue::Tap);
        audio.cue(AudioCue::MusicEnabled(false));
        assert_eq!(audio.cues, vec![AudioCue::Tap, AudioCue::MusicEnabled(false)]);
        assert_eq!(audio.count(AudioCue::Tap), 1);
    }
}
