//! End-to-end session scenarios driven through the public tick API

use turbo_racer::leaderboard::{Leaderboard, MemoryLeaderboard, report_score};
use turbo_racer::sim::{
    self, EntityKind, GameEvent, GamePhase, GameState, InputEvent, Lane, TickInput,
};

fn running(seed: u64) -> GameState {
    let mut state = GameState::new(seed);
    state.set_username("rider");
    sim::start(&mut state).expect("username is set");
    state.drain_events();
    state
}

/// Put an entity right on top of the bike and advance one tick
fn hit(state: &mut GameState, kind: EntityKind) -> u32 {
    let lane = state.player.lane;
    let id = state.entities.spawn(kind, lane, 0.0, state.time_ticks);
    sim::tick(state, &TickInput::default());
    id
}

fn correct_option(state: &GameState) -> usize {
    let quiz = state.quiz.as_ref().expect("quiz running");
    quiz.current_question(&state.question_bank)
        .expect("question left")
        .correct
}

#[test]
fn three_power_ups_reach_first_milestone() {
    let mut state = running(11);
    for _ in 0..3 {
        hit(&mut state, EntityKind::PowerUp);
    }

    let progression = &state.progression;
    assert_eq!(progression.score, 4);
    assert_eq!(progression.knowledge_level, 2);
    assert_eq!(progression.milestone_threshold, 5);
    assert_eq!(progression.power_ups_toward_milestone, 0);
    assert!(state.is_invincible());

    let events = state.drain_events();
    assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
    assert!(events.contains(&GameEvent::FactUnlocked { index: 0 }));
    assert_eq!(state.notifications.len(), 2);
}

#[test]
fn crash_ends_run_and_removes_obstacle() {
    let mut state = running(12);
    let id = hit(&mut state, EntityKind::Obstacle);

    assert_eq!(state.phase, GamePhase::GameOver);
    assert!(state.entities.iter().all(|e| e.id != id));
    assert_eq!(state.recent_deaths, 1);

    let events = state.drain_events();
    assert!(events.contains(&GameEvent::Crashed));
    assert!(events.contains(&GameEvent::GameOver { score: 1 }));
    assert!(events.contains(&GameEvent::ScoreFinalized {
        username: "rider".into(),
        score: 1
    }));
}

#[test]
fn speed_increases_once_at_ten_power_ups() {
    let mut state = running(13);
    for _ in 0..9 {
        hit(&mut state, EntityKind::PowerUp);
    }
    assert_eq!(state.progression.speed_multiplier, 1.0);

    hit(&mut state, EntityKind::PowerUp);
    let multiplier = 1.0 + state.tuning.speed_increment;
    assert!((state.progression.speed_multiplier - multiplier).abs() < 1e-6);
    assert!((state.progression.current_speed - state.tuning.speed_for(multiplier)).abs() < 1e-6);

    let speed_ups = state
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::SpeedIncreased { .. }))
        .count();
    assert_eq!(speed_ups, 1);
}

#[test]
fn quiz_adds_bonus_for_correct_answers() {
    let mut state = running(14);
    state.progression.score = 16;
    hit(&mut state, EntityKind::Obstacle);
    assert_eq!(state.phase, GamePhase::QuizActive);
    assert!(state.snapshot().quiz.is_some());

    for round in 0..3 {
        let correct = correct_option(&state);
        let option = if round < 2 { correct } else { (correct + 1) % 3 };
        assert_eq!(sim::answer_quiz(&mut state, option), Ok(round < 2));
    }

    assert_eq!(state.phase, GamePhase::QuizComplete);
    assert_eq!(state.progression.score, 26);
    assert_eq!(state.best_score, 26);
    assert!(
        state
            .events()
            .contains(&GameEvent::QuizComplete {
                correct_answers: 2,
                bonus: 10,
                score: 26
            })
    );
}

#[test]
fn quiz_not_offered_at_threshold() {
    let mut state = running(15);
    state.progression.score = state.tuning.quiz_threshold;
    hit(&mut state, EntityKind::Obstacle);
    assert_eq!(state.phase, GamePhase::GameOver);
    assert!(state.quiz.is_none());
}

#[test]
fn restart_resets_run_but_keeps_best_score() {
    let mut state = running(16);
    for _ in 0..12 {
        hit(&mut state, EntityKind::PowerUp);
    }
    // Invincibility from the milestones would absorb the crash
    state.player.invincible_until_tick = None;
    state.entities.spawn(EntityKind::Obstacle, Lane::Left, -150.0, 0);
    hit(&mut state, EntityKind::Obstacle);
    assert_eq!(state.phase, GamePhase::GameOver);
    let generation = state.generation();

    sim::restart(&mut state);
    assert_eq!(state.phase, GamePhase::Running);
    assert_eq!(state.progression.score, 1);
    assert_eq!(state.progression.speed_multiplier, 1.0);
    assert_eq!(state.progression.knowledge_level, 1);
    assert!(state.entities.is_empty());
    assert!(!state.is_invincible());
    assert_eq!(state.best_score, 13);
    assert!(!state.is_current(generation));
}

#[test]
fn invincible_bike_scores_and_survives() {
    let mut state = running(17);
    state.player.invincible_until_tick = Some(1_000);
    let lane = state.player.lane;
    state.entities.spawn(EntityKind::Obstacle, lane, 0.0, 0);
    state.entities.spawn(EntityKind::PowerUp, lane, 0.0, 0);
    sim::tick(&mut state, &TickInput::default());

    assert_eq!(state.phase, GamePhase::Running);
    assert_eq!(state.progression.score, 2);
    let events = state.drain_events();
    assert!(events.contains(&GameEvent::ShieldAbsorbed));
    assert!(!events.contains(&GameEvent::Crashed));
}

#[test]
fn confirm_restarts_after_game_over() {
    let mut state = running(18);
    hit(&mut state, EntityKind::Obstacle);
    state.drain_events();

    sim::tick(&mut state, &TickInput::with([InputEvent::Confirm]));
    assert_eq!(state.phase, GamePhase::Running);
    assert_eq!(state.time_ticks, 1);
    assert!(matches!(
        state.drain_events().first(),
        Some(GameEvent::Started { generation: 1 })
    ));
}

#[test]
fn finalized_scores_reach_the_leaderboard() {
    let mut board = MemoryLeaderboard::new();
    for seed in [21, 22] {
        let mut state = running(seed);
        for _ in 0..seed % 20 {
            hit(&mut state, EntityKind::PowerUp);
        }
        state.player.invincible_until_tick = None;
        hit(&mut state, EntityKind::Obstacle);
        for event in state.drain_events() {
            if let GameEvent::ScoreFinalized { username, score } = event {
                assert!(report_score(&mut board, &username, score));
            }
        }
    }

    let top = board.fetch_top_scores(10).expect("in-memory board");
    let scores: Vec<u64> = top.iter().map(|e| e.score).collect();
    assert_eq!(scores, [3, 2]);
}

#[test]
fn same_seed_same_session() {
    let play = |seed: u64| {
        let mut state = running(seed);
        let input = TickInput {
            events: Vec::new(),
            autopilot: true,
        };
        for _ in 0..1_500 {
            if state.phase != GamePhase::Running {
                break;
            }
            sim::tick(&mut state, &input);
        }
        serde_json::to_string(&state.snapshot()).expect("snapshot serializes")
    };
    assert_eq!(play(99), play(99));
}
