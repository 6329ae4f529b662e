//! Fixed timestep simulation tick
//!
//! Core game loop and phase state machine. One call advances the session by
//! one frame; timed effects are expiry ticks checked here, never callbacks.

use super::collision::{Collision, resolve_collisions};
use super::progression::collect_power_up;
use super::quiz::QuizSession;
use super::spawn::try_spawn;
use super::state::{EntityKind, GameEvent, GamePhase, GameState, Lane};
use crate::error::SessionError;

/// Normalized player input; keyboard and touch both map to these
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    LaneLeft,
    LaneRight,
    /// Start, or restart after a finished run
    Confirm,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Edge events captured since the previous tick, in order
    pub events: Vec<InputEvent>,
    /// Demo mode - the bike steers itself
    pub autopilot: bool,
}

impl TickInput {
    pub fn with(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            autopilot: false,
        }
    }
}

/// Turns held-key state into one lane event per press
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    held: bool,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current held state of the steering keys
    pub fn update(&mut self, left_held: bool, right_held: bool) -> Option<InputEvent> {
        if !left_held && !right_held {
            self.held = false;
            return None;
        }
        if self.held {
            return None;
        }
        self.held = true;
        if left_held {
            Some(InputEvent::LaneLeft)
        } else {
            Some(InputEvent::LaneRight)
        }
    }
}

/// Lookahead used by the autopilot when judging a lane
const AUTOPILOT_LOOKAHEAD: f32 = 45.0;

/// Pick a lane step for demo play: dodge the nearest obstacle, chase power-ups
fn autopilot_event(state: &GameState) -> Option<InputEvent> {
    let tuning = &state.tuning;
    let player = &state.player;
    // Wait until the previous lane change has mostly settled
    if (player.lateral_offset - player.lane.offset(tuning)).abs() > 1.0 {
        return None;
    }

    let reach = tuning.player_half_extents.y + tuning.obstacle_half_extents.y;
    let lane_score = |lane: Lane| -> f32 {
        let mut score = 0.0;
        for entity in &state.entities {
            if entity.lane != lane || entity.z < -AUTOPILOT_LOOKAHEAD || entity.z > reach {
                continue;
            }
            let closeness = 1.0 - (-entity.z).max(0.0) / AUTOPILOT_LOOKAHEAD;
            match entity.kind {
                EntityKind::Obstacle => score -= 10.0 * (1.0 + closeness),
                EntityKind::PowerUp => score += 1.0 + closeness,
            }
        }
        score
    };

    let here = lane_score(player.lane);
    let candidates = [
        (player.lane.left(), InputEvent::LaneLeft),
        (player.lane.right(), InputEvent::LaneRight),
    ];
    candidates
        .into_iter()
        .filter_map(|(lane, event)| lane.map(|l| (lane_score(l), event)))
        .filter(|(score, _)| *score > here)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, event)| event)
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    let mut steering = Vec::new();
    for &event in &input.events {
        match event {
            InputEvent::Confirm => handle_confirm(state),
            lane => steering.push(lane),
        }
    }

    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;
    expire_effects(state);

    if input.autopilot {
        steering.extend(autopilot_event(state));
    }
    for event in steering {
        let next = match event {
            InputEvent::LaneLeft => state.player.lane.left(),
            InputEvent::LaneRight => state.player.lane.right(),
            InputEvent::Confirm => None,
        };
        if let Some(lane) = next {
            state.player.lane = lane;
            state.emit(GameEvent::LaneChanged { lane });
        }
    }
    state.player.follow_lane(&state.tuning);

    let distance = state.progression.current_speed * state.tuning.movement_factor;
    state
        .entities
        .advance(distance, state.tuning.power_up_spin);
    state.entities.prune(state.tuning.spawn.despawn_z);

    let invincible = state.is_invincible();
    let collisions = resolve_collisions(
        &mut state.entities,
        &state.player,
        invincible,
        &state.tuning,
    );
    for collision in collisions {
        match collision {
            Collision::PowerUpCollected { .. } => collect_power_up(state),
            Collision::ShieldAbsorbed { .. } => state.emit(GameEvent::ShieldAbsorbed),
            Collision::Crashed { .. } => end_run(state),
        }
    }

    if state.phase == GamePhase::Running {
        try_spawn(state);
    }
}

fn handle_confirm(state: &mut GameState) {
    match state.phase {
        GamePhase::Intro => {
            if let Err(err) = start(state) {
                log::info!("Cannot start yet: {err}");
            }
        }
        GamePhase::GameOver | GamePhase::QuizComplete => restart(state),
        GamePhase::Running | GamePhase::QuizActive => {}
    }
}

fn expire_effects(state: &mut GameState) {
    let now = state.time_ticks;
    if state.player.invincible_until_tick.is_some_and(|until| now >= until) {
        state.player.invincible_until_tick = None;
        state.emit(GameEvent::InvincibilityEnded);
    }
    state.notifications.retain(|n| n.expires_at_tick > now);
}

/// Leave the intro and begin the first run
pub fn start(state: &mut GameState) -> Result<(), SessionError> {
    if state.phase != GamePhase::Intro {
        return Err(SessionError::WrongPhase {
            expected: GamePhase::Intro,
            actual: state.phase,
        });
    }
    if state.username.is_empty() {
        state.emit(GameEvent::UsernameRequired);
        return Err(SessionError::UsernameRequired);
    }
    state.reset_run();
    state.phase = GamePhase::Running;
    log::info!("Run started for {}", state.username);
    state.emit(GameEvent::Started {
        generation: state.generation,
    });
    Ok(())
}

/// Reset every run-scoped value and go straight back to Running
pub fn restart(state: &mut GameState) {
    state.generation = state.generation.wrapping_add(1);
    state.reset_run();
    state.phase = GamePhase::Running;
    log::info!("Restarted (generation {})", state.generation);
    state.emit(GameEvent::Started {
        generation: state.generation,
    });
}

/// Crash: end the run and branch to the quiz or straight to finalization
fn end_run(state: &mut GameState) {
    let score = state.progression.score;
    state.phase = GamePhase::GameOver;
    state.recent_deaths += 1;
    log::info!("Crashed with score {score} at tick {}", state.time_ticks);
    state.emit(GameEvent::Crashed);
    state.emit(GameEvent::GameOver { score });

    if score <= state.tuning.quiz_threshold {
        finalize(state);
        return;
    }

    match QuizSession::draw(
        state.question_bank.len(),
        state.tuning.quiz_questions,
        &mut state.rng,
    ) {
        Ok(quiz) => {
            state.emit(GameEvent::QuizStarted {
                questions: quiz.len(),
            });
            state.quiz = Some(quiz);
            state.phase = GamePhase::QuizActive;
        }
        Err(err) => {
            log::warn!("Skipping quiz: {err}");
            finalize(state);
        }
    }
}

fn quiz_phase_error(state: &GameState) -> SessionError {
    SessionError::WrongPhase {
        expected: GamePhase::QuizActive,
        actual: state.phase,
    }
}

/// Answer the current quiz question; returns whether it was correct
pub fn answer_quiz(state: &mut GameState, option: usize) -> Result<bool, SessionError> {
    if state.phase != GamePhase::QuizActive {
        return Err(quiz_phase_error(state));
    }
    let bonus_per = state.tuning.quiz_bonus;
    let quiz = state
        .quiz
        .as_mut()
        .ok_or(SessionError::EmptyQuestionBank)?;
    let correct = quiz.answer(&state.question_bank, option, bonus_per)?;
    let (bonus, finished) = (quiz.bonus(), quiz.is_finished());

    state.emit(GameEvent::QuizAnswered { correct, bonus });
    if finished {
        complete_quiz(state);
    }
    Ok(correct)
}

/// Leave the quiz early, keeping the bonus earned so far
pub fn abandon_quiz(state: &mut GameState) -> Result<(), SessionError> {
    if state.phase != GamePhase::QuizActive {
        return Err(quiz_phase_error(state));
    }
    complete_quiz(state);
    Ok(())
}

fn complete_quiz(state: &mut GameState) {
    let (correct_answers, bonus) = state
        .quiz
        .as_ref()
        .map_or((0, 0), |q| (q.correct_answers(), q.bonus()));
    state.progression.score += bonus;
    state.phase = GamePhase::QuizComplete;
    let score = state.progression.score;
    log::info!("Quiz complete: {correct_answers} correct, +{bonus}, final score {score}");
    state.emit(GameEvent::QuizComplete {
        correct_answers,
        bonus,
        score,
    });
    finalize(state);
}

fn finalize(state: &mut GameState) {
    let score = state.progression.score;
    state.best_score = state.best_score.max(score);
    let username = state.username.clone();
    state.emit(GameEvent::ScoreFinalized { username, score });
}
