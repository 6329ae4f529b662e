//! Browser bindings
//!
//! The JS side owns rendering, audio playback and DOM; it forwards raw key and
//! swipe input, calls `frame` once per animation frame and reads back a JSON
//! snapshot plus the events and sound cues produced since the last call.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::audio::{AudioMixer, SoundCue, engine_pitch};
use crate::consts::LEADERBOARD_LIMIT;
use crate::leaderboard::{Leaderboard, MemoryLeaderboard, report_score};
use crate::settings::Settings;
use crate::sim::{self, GameEvent, GameState, InputEvent, InputLatch, TickInput};

/// Minimum horizontal swipe (CSS pixels) that counts as a lane change
const SWIPE_THRESHOLD: f32 = 30.0;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

#[derive(Serialize)]
struct Outbox<'a> {
    events: &'a [GameEvent],
    cues: Vec<(SoundCue, f32)>,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        log::warn!("Failed to serialize for JS: {err}");
        "null".to_string()
    })
}

/// Game instance holding all browser-side state
#[wasm_bindgen]
pub struct WebGame {
    state: GameState,
    settings: Settings,
    leaderboard: MemoryLeaderboard,
    mixer: AudioMixer,
    latch: InputLatch,
    left_held: bool,
    right_held: bool,
    input: TickInput,
    accumulator: f32,
    last_time: Option<f64>,
    outbox: Vec<GameEvent>,
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let seed = (js_sys::Date::now() as u64) ^ ((js_sys::Math::random() * 2f64.powi(53)) as u64);
        let settings = Settings::load();
        let mut state = GameState::new(seed);
        state.set_username(&settings.username);
        log::info!("Turbo Racer ready (seed {seed})");

        WebGame {
            state,
            mixer: AudioMixer::from_settings(&settings),
            settings,
            leaderboard: MemoryLeaderboard::load(),
            latch: InputLatch::new(),
            left_held: false,
            right_held: false,
            input: TickInput::default(),
            accumulator: 0.0,
            last_time: None,
            outbox: Vec::new(),
        }
    }

    /// Returns false for a blank name
    pub fn set_username(&mut self, name: &str) -> bool {
        if !self.settings.set_username(name) {
            return false;
        }
        self.state.set_username(&self.settings.username);
        self.settings.save();
        true
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        self.mixer.set_muted(muted);
        self.settings.save();
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.input.autopilot = on;
    }

    pub fn key_down(&mut self, key: &str) {
        match key {
            "ArrowLeft" | "a" | "A" => self.left_held = true,
            "ArrowRight" | "d" | "D" => self.right_held = true,
            "Enter" | " " => {
                self.input.events.push(InputEvent::Confirm);
                return;
            }
            _ => return,
        }
        self.input
            .events
            .extend(self.latch.update(self.left_held, self.right_held));
    }

    pub fn key_up(&mut self, key: &str) {
        match key {
            "ArrowLeft" | "a" | "A" => self.left_held = false,
            "ArrowRight" | "d" | "D" => self.right_held = false,
            _ => return,
        }
        self.input
            .events
            .extend(self.latch.update(self.left_held, self.right_held));
    }

    /// Completed horizontal swipe of `dx` pixels
    pub fn swipe(&mut self, dx: f32) {
        if dx <= -SWIPE_THRESHOLD {
            self.input.events.push(InputEvent::LaneLeft);
        } else if dx >= SWIPE_THRESHOLD {
            self.input.events.push(InputEvent::LaneRight);
        }
    }

    /// Tap: start or restart
    pub fn tap(&mut self) {
        self.input.events.push(InputEvent::Confirm);
    }

    /// Advance to `time_ms` (requestAnimationFrame timestamp); returns ticks run
    pub fn frame(&mut self, time_ms: f64) -> u32 {
        let dt = match self.last_time {
            Some(last) => ((time_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(time_ms);

        let ticks = crate::run_frame(&mut self.state, &mut self.accumulator, dt, &mut self.input);
        self.pump_events();
        ticks
    }

    pub fn answer_quiz(&mut self, option: usize) -> Result<bool, JsValue> {
        let correct = sim::answer_quiz(&mut self.state, option)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.pump_events();
        Ok(correct)
    }

    pub fn abandon_quiz(&mut self) -> Result<(), JsValue> {
        sim::abandon_quiz(&mut self.state).map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.pump_events();
        Ok(())
    }

    pub fn set_show_facts(&mut self, show: bool) {
        self.settings.show_facts = show;
        self.settings.save();
    }

    pub fn snapshot_json(&self) -> String {
        let snapshot = self.state.snapshot();
        if self.settings.show_facts {
            to_json(&snapshot)
        } else {
            to_json(&snapshot.without_facts())
        }
    }

    /// Events and sound cues since the last call
    pub fn take_events_json(&mut self) -> String {
        let events = std::mem::take(&mut self.outbox);
        let outbox = Outbox {
            cues: self.mixer.cues(&events),
            events: &events,
        };
        to_json(&outbox)
    }

    pub fn leaderboard_json(&self) -> String {
        match self.leaderboard.fetch_top_scores(LEADERBOARD_LIMIT) {
            Ok(entries) => to_json(&entries),
            Err(err) => {
                log::warn!("Leaderboard unavailable: {err}");
                "[]".to_string()
            }
        }
    }

    /// Leaderboard position `score` would take, for the "new high score" banner
    pub fn potential_rank(&self, score: u64) -> usize {
        self.leaderboard.potential_rank(score)
    }

    pub fn engine_pitch(&self) -> f32 {
        engine_pitch(self.state.progression.current_speed)
    }

    pub fn music_gain(&self) -> f32 {
        self.mixer.music_gain()
    }

    /// Move session events to the outbox, submitting finalized scores
    fn pump_events(&mut self) {
        for event in self.state.drain_events() {
            if let GameEvent::ScoreFinalized { username, score } = &event {
                if report_score(&mut self.leaderboard, username, *score) {
                    if let Err(err) = self.leaderboard.save() {
                        log::warn!("Leaderboard not persisted: {err}");
                    }
                }
            }
            self.outbox.push(event);
        }
    }
}
