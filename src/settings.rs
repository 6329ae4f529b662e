//! Player settings and preferences
//!
//! Persisted separately from the leaderboard in LocalStorage.

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name submitted with scores; a run cannot start without one
    pub username: String,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music and engine loop volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === HUD ===
    /// Show the knowledge-meter fact popups
    pub show_facts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,

            show_facts: true,
        }
    }
}

impl Settings {
    /// Set the player name; returns false if it is blank
    pub fn set_username(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.username = name.to_string();
        true
    }

    pub fn has_username(&self) -> bool {
        !self.username.trim().is_empty()
    }

    /// Clamp volumes into range (after loading hand-edited data)
    pub fn sanitize(&mut self) {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "turbo_racer_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(mut settings) = serde_json::from_str::<Settings>(&json) {
                    settings.sanitize();
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Settings not saved: LocalStorage rejected the write");
                } else {
                    log::info!("Settings saved");
                }
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
