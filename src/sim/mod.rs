//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per frame, no wall-clock time
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, audio or network dependencies

pub mod collision;
pub mod progression;
pub mod quiz;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Aabb, Collision, resolve_collisions};
pub use progression::{CollectOutcome, Progression, collect_power_up};
pub use quiz::{Question, QuizSession};
pub use spawn::{SpawnDecision, SpawnOutcome, Visibility, try_spawn};
pub use state::{
    Entity, EntityKind, EntitySet, GameEvent, GamePhase, GameState, Lane, NoticeKind,
    Notification, Player, Snapshot, SpawnTracking,
};
pub use tick::{
    InputEvent, InputLatch, TickInput, abandon_quiz, answer_quiz, restart, start, tick,
};
