//! Sound cue mapping
//!
//! The simulation only emits [`GameEvent`]s; this module decides which named
//! cue the audio backend should play and how loud. Playback itself lives in
//! the host.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundCue {
    /// Run started
    GameStart,
    /// Obstacle hit
    Crash,
    PowerUpCollected,
    LevelUp,
    /// Invincibility shield raised
    Shield,
    SpeedIncrease,
    GameOver,
    QuizCorrect,
}

impl SoundCue {
    /// Cue for an event, if the event is audible
    pub fn for_event(event: &GameEvent) -> Option<SoundCue> {
        match event {
            GameEvent::Started { .. } => Some(SoundCue::GameStart),
            GameEvent::Crashed => Some(SoundCue::Crash),
            GameEvent::PowerUpCollected { .. } => Some(SoundCue::PowerUpCollected),
            GameEvent::LevelUp { .. } => Some(SoundCue::LevelUp),
            GameEvent::InvincibilityStarted { .. } => Some(SoundCue::Shield),
            GameEvent::SpeedIncreased { .. } => Some(SoundCue::SpeedIncrease),
            GameEvent::GameOver { .. } => Some(SoundCue::GameOver),
            GameEvent::QuizAnswered { correct: true, .. } => Some(SoundCue::QuizCorrect),
            _ => None,
        }
    }

    /// Asset name the audio backend loads for this cue
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::GameStart => "gameStart",
            SoundCue::Crash => "crash",
            SoundCue::PowerUpCollected => "powerUpCollected",
            SoundCue::LevelUp => "levelUp",
            SoundCue::Shield => "shield",
            SoundCue::SpeedIncrease => "speedIncrease",
            SoundCue::GameOver => "gameOver",
            SoundCue::QuizCorrect => "quizCorrect",
        }
    }
}

/// Engine loop playback rate for a road speed
pub fn engine_pitch(speed: f32) -> f32 {
    if speed < 0.6 {
        1.0
    } else if speed < 1.0 {
        1.5
    } else {
        2.0
    }
}

/// Volume state for cue playback
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMixer {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AudioMixer {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            music_volume: settings.music_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Effective one-shot volume
    pub fn sfx_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Effective music/engine volume
    pub fn music_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Cues to play for a batch of events, skipping everything when silent
    pub fn cues(&self, events: &[GameEvent]) -> Vec<(SoundCue, f32)> {
        let gain = self.sfx_gain();
        if gain <= 0.0 {
            return Vec::new();
        }
        events
            .iter()
            .filter_map(SoundCue::for_event)
            .map(|cue| (cue, gain))
            .collect()
    }
}
