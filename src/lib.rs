//! Turbo Racer - a three-lane arcade racer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, collisions, progression, phases)
//! - `tuning`: Data-driven game balance
//! - `leaderboard`: Score submission collaborator
//! - `audio`: Event to sound-cue mapping
//! - `settings`: Player preferences
//! - `web`: Browser bindings (wasm32 only)

pub mod audio;
pub mod error;
pub mod leaderboard;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{ConfigError, LeaderboardError, SessionError};
pub use leaderboard::{Leaderboard, MemoryLeaderboard, ScoreEntry};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Leaderboard rows shown to the player
    pub const LEADERBOARD_LIMIT: usize = 10;
}

/// Step a session through one rendered frame with a fixed-timestep accumulator
///
/// Returns the number of ticks run. The first tick consumes the edge events in
/// `input`; when the frame is too short for a tick they stay queued for the
/// next frame. Later substeps only carry the autopilot flag.
pub fn run_frame(
    state: &mut sim::GameState,
    accumulator: &mut f32,
    frame_dt: f32,
    input: &mut sim::TickInput,
) -> u32 {
    use consts::{MAX_SUBSTEPS, SIM_DT};

    *accumulator += frame_dt.clamp(0.0, 0.1);
    let mut substeps = 0;
    while *accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        sim::tick(state, input);
        input.events.clear();
        *accumulator -= SIM_DT;
        substeps += 1;
    }
    if substeps == MAX_SUBSTEPS {
        // Drop the backlog instead of spiralling
        *accumulator = 0.0;
    }
    substeps
}
