//! Game state and core simulation types
//!
//! Everything a run needs lives in [`GameState`]; it is created once at startup
//! and handed by reference to every simulation call.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::progression::Progression;
use super::quiz::{self, Question, QuizSession};
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// Title screen, waiting for Confirm
    Intro,
    /// Active gameplay
    Running,
    /// Run ended, score finalized
    GameOver,
    /// Bonus quiz after a high-scoring run
    QuizActive,
    /// Quiz answered, score finalized
    QuizComplete,
}

/// One of the three lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Lane {
    Left,
    #[default]
    Center,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    pub fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Center => 1,
            Lane::Right => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Lane> {
        Self::ALL.get(index).copied()
    }

    /// Lane to the left, if any
    pub fn left(self) -> Option<Lane> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// Lane to the right, if any
    pub fn right(self) -> Option<Lane> {
        Self::from_index(self.index() + 1)
    }

    /// Lateral offset of the lane center
    pub fn offset(self, tuning: &Tuning) -> f32 {
        tuning.lane_positions[self.index()]
    }
}

/// What an entity does to the player on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Obstacle,
    PowerUp,
}

/// An obstacle or power-up travelling toward the player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub lane: Lane,
    /// Longitudinal position; grows as the entity approaches (player at 0)
    pub z: f32,
    pub created_at_tick: u64,
    /// Cosmetic rotation, power-ups only
    pub spin: f32,
}

/// Live entities, kept in spawn order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct EntitySet {
    entities: Vec<Entity>,
    #[serde(skip)]
    next_id: u32,
}

impl EntitySet {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an entity and return its ID
    pub fn spawn(&mut self, kind: EntityKind, lane: Lane, z: f32, tick: u64) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.entities.push(Entity {
            id,
            kind,
            lane,
            z,
            created_at_tick: tick,
            spin: 0.0,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn remove(&mut self, index: usize) -> Entity {
        self.entities.remove(index)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Move every entity toward the player
    pub fn advance(&mut self, distance: f32, power_up_spin: f32) {
        for entity in &mut self.entities {
            entity.z += distance;
            if entity.kind == EntityKind::PowerUp {
                entity.spin = (entity.spin + power_up_spin) % std::f32::consts::TAU;
            }
        }
    }

    /// Drop entities that passed the player; returns how many were removed
    pub fn prune(&mut self, despawn_z: f32) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| e.z <= despawn_z);
        before - self.entities.len()
    }
}

impl<'a> IntoIterator for &'a EntitySet {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// The player's bike
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub lane: Lane,
    /// Eased lateral position; collisions use this, not the lane center
    pub lateral_offset: f32,
    /// Invincibility lasts while `time_ticks` is below this
    pub invincible_until_tick: Option<u64>,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            lane: Lane::Center,
            lateral_offset: Lane::Center.offset(tuning),
            invincible_until_tick: None,
        }
    }

    pub fn is_invincible(&self, now: u64) -> bool {
        self.invincible_until_tick.is_some_and(|until| now < until)
    }

    /// Ease toward the current lane's offset
    pub fn follow_lane(&mut self, tuning: &Tuning) {
        let target = self.lane.offset(tuning);
        self.lateral_offset += (target - self.lateral_offset) * tuning.lane_follow;
    }
}

/// Fairness bookkeeping for the spawn scheduler
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpawnTracking {
    pub last_spawned_kind: Option<EntityKind>,
    pub obstacles_since_last_power_up: u32,
    /// `None` until the first spawn of a run
    pub last_spawn_tick: Option<u64>,
}

/// On-screen notice with a tick-based expiry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NoticeKind,
    pub expires_at_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NoticeKind {
    SpeedUp { multiplier: f32 },
    Fact { index: u32 },
    Invincibility { secs: f32 },
}

/// Events for presentation, audio and persistence adapters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    Started { generation: u32 },
    UsernameRequired,
    LaneChanged { lane: Lane },
    PowerUpCollected { score: u64, meter_fill: f32 },
    /// Obstacle passed through while invincible
    ShieldAbsorbed,
    LevelUp { level: u32 },
    FactUnlocked { index: u32 },
    InvincibilityStarted { until_tick: u64 },
    InvincibilityEnded,
    SpeedIncreased { multiplier: f32 },
    Crashed,
    GameOver { score: u64 },
    QuizStarted { questions: usize },
    QuizAnswered { correct: bool, bonus: u64 },
    QuizComplete {
        correct_answers: u32,
        bonus: u64,
        score: u64,
    },
    /// Final score of a run; the host forwards it to the leaderboard
    ScoreFinalized { username: String, score: u64 },
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Session seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Bumped on every restart
    pub(crate) generation: u32,
    /// Running ticks of the current run
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub player: Player,
    pub progression: Progression,
    pub spawn_tracking: SpawnTracking,
    pub entities: EntitySet,
    pub notifications: Vec<Notification>,
    pub quiz: Option<QuizSession>,
    pub question_bank: Vec<Question>,
    pub username: String,
    /// Best finalized score across runs
    pub best_score: u64,
    /// Crashes since the player last reached a milestone
    pub recent_deaths: u32,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a session with default tuning and the built-in question bank
    pub fn new(seed: u64) -> Self {
        let bank = quiz::default_bank().unwrap_or_else(|err| {
            log::warn!("Built-in quiz bank unreadable, quiz disabled: {err}");
            Vec::new()
        });
        Self::with_config(seed, Tuning::default(), bank)
    }

    pub fn with_config(seed: u64, tuning: Tuning, question_bank: Vec<Question>) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            generation: 0,
            time_ticks: 0,
            phase: GamePhase::Intro,
            player: Player::new(&tuning),
            progression: Progression::new(&tuning),
            spawn_tracking: SpawnTracking::default(),
            entities: EntitySet::new(),
            notifications: Vec::new(),
            quiz: None,
            question_bank,
            username: String::new(),
            best_score: 0,
            recent_deaths: 0,
            events: Vec::new(),
            tuning,
        }
    }

    pub fn set_username(&mut self, name: &str) {
        self.username = name.trim().to_string();
    }

    /// Session generation; deferred work started in an older generation is stale
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_current(&self, generation: u32) -> bool {
        self.generation == generation
    }

    pub fn is_invincible(&self) -> bool {
        self.player.is_invincible(self.time_ticks)
    }

    /// Reset everything that belongs to a single run
    pub(crate) fn reset_run(&mut self) {
        self.time_ticks = 0;
        self.player = Player::new(&self.tuning);
        self.progression = Progression::new(&self.tuning);
        self.spawn_tracking = SpawnTracking::default();
        self.entities.clear();
        self.notifications.clear();
        self.quiz = None;
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn notify(&mut self, kind: NoticeKind, secs: f32) {
        let expires_at_tick = self.time_ticks + crate::tuning::secs_to_ticks(secs);
        self.notifications.push(Notification {
            kind,
            expires_at_tick,
        });
    }

    /// Read-only view for renderers
    pub fn snapshot(&self) -> Snapshot<'_> {
        let quiz = self.quiz.as_ref().and_then(|session| {
            let question = session.current_question(&self.question_bank)?;
            Some(QuizView {
                number: session.answered() + 1,
                total: session.len(),
                prompt: &question.prompt,
                options: &question.options,
            })
        });
        Snapshot {
            phase: self.phase,
            generation: self.generation,
            tick: self.time_ticks,
            player: &self.player,
            invincible: self.is_invincible(),
            entities: self.entities.as_slice(),
            progression: &self.progression,
            meter_fill: self.progression.meter_fill(),
            notifications: self.notifications.iter().collect(),
            quiz,
            best_score: self.best_score,
        }
    }
}

/// Serializable frame view handed to the renderer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub generation: u32,
    pub tick: u64,
    pub player: &'a Player,
    pub invincible: bool,
    pub entities: &'a [Entity],
    pub progression: &'a Progression,
    pub meter_fill: f32,
    pub notifications: Vec<&'a Notification>,
    pub quiz: Option<QuizView<'a>>,
    pub best_score: u64,
}

impl Snapshot<'_> {
    /// Drop fact popups for players who turned them off
    pub fn without_facts(mut self) -> Self {
        self.notifications
            .retain(|n| !matches!(n.kind, NoticeKind::Fact { .. }));
        self
    }
}

#[derive(Debug, Serialize)]
pub struct QuizView<'a> {
    pub number: usize,
    pub total: usize,
    pub prompt: &'a str,
    pub options: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_neighbours() {
        assert_eq!(Lane::Left.left(), None);
        assert_eq!(Lane::Left.right(), Some(Lane::Center));
        assert_eq!(Lane::Center.left(), Some(Lane::Left));
        assert_eq!(Lane::Right.right(), None);
    }

    #[test]
    fn test_entity_set_advance_and_prune() {
        let mut set = EntitySet::new();
        set.spawn(EntityKind::Obstacle, Lane::Left, 9.5, 0);
        set.spawn(EntityKind::PowerUp, Lane::Right, -50.0, 0);

        set.advance(1.0, 0.01);
        assert_eq!(set.prune(10.0), 1);
        assert_eq!(set.len(), 1);

        let power_up = set.get(0).expect("power-up survives");
        assert_eq!(power_up.kind, EntityKind::PowerUp);
        assert!((power_up.z - -49.0).abs() < 1e-6);
        assert!(power_up.spin > 0.0);
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut set = EntitySet::new();
        let a = set.spawn(EntityKind::Obstacle, Lane::Left, -100.0, 0);
        let b = set.spawn(EntityKind::Obstacle, Lane::Left, -100.0, 0);
        set.clear();
        let c = set.spawn(EntityKind::Obstacle, Lane::Left, -100.0, 0);
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn test_invincibility_window() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        assert!(!player.is_invincible(0));
        player.invincible_until_tick = Some(10);
        assert!(player.is_invincible(9));
        assert!(!player.is_invincible(10));
    }

    #[test]
    fn test_player_eases_toward_lane() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.lane = Lane::Right;
        player.follow_lane(&tuning);
        assert!((player.lateral_offset - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_can_hide_facts() {
        let mut state = GameState::new(8);
        state.notify(NoticeKind::Fact { index: 0 }, 5.0);
        state.notify(NoticeKind::SpeedUp { multiplier: 1.35 }, 3.0);
        assert_eq!(state.snapshot().notifications.len(), 2);

        let snapshot = state.snapshot().without_facts();
        assert_eq!(snapshot.notifications.len(), 1);
        assert!(matches!(
            snapshot.notifications[0].kind,
            NoticeKind::SpeedUp { .. }
        ));
    }

    #[test]
    fn test_new_session_starts_in_intro() {
        let state = GameState::new(7);
        assert_eq!(state.phase, GamePhase::Intro);
        assert_eq!(state.progression.score, 1);
        assert!(state.entities.is_empty());
        assert!(!state.question_bank.is_empty());
    }
}
