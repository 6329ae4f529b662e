//! Turbo Racer entry point
//!
//! The browser build is driven from JS through `turbo_racer::web::WebGame`.
//! Natively this runs a few headless autopilot runs and prints the board.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use turbo_racer::audio::{AudioMixer, engine_pitch};
    use turbo_racer::consts::LEADERBOARD_LIMIT;
    use turbo_racer::leaderboard::{Leaderboard, MemoryLeaderboard, report_score};
    use turbo_racer::sim::{self, GameEvent, GamePhase, GameState, InputEvent, TickInput};

    const RUNS: u32 = 3;
    /// Stop a run that outlives this many ticks (about five minutes)
    const MAX_TICKS: u64 = 60 * 60 * 5;

    pub fn run(seed: u64) {
        log::info!("Turbo Racer demo (seed {seed})");
        let mut state = GameState::new(seed);
        state.set_username("autopilot");
        let mut board = MemoryLeaderboard::new();
        let mixer = AudioMixer::default();

        if let Err(err) = sim::start(&mut state) {
            log::error!("Demo could not start: {err}");
            return;
        }

        let autopilot = TickInput {
            events: Vec::new(),
            autopilot: true,
        };
        let mut runs = 0;
        while runs < RUNS {
            match state.phase {
                GamePhase::Running if state.time_ticks >= MAX_TICKS => {
                    log::info!("Run survived {MAX_TICKS} ticks, stopping");
                    break;
                }
                GamePhase::Running => sim::tick(&mut state, &autopilot),
                GamePhase::QuizActive => answer_next(&mut state),
                GamePhase::GameOver | GamePhase::QuizComplete => {
                    runs += 1;
                    if runs < RUNS {
                        sim::tick(&mut state, &TickInput::with([InputEvent::Confirm]));
                    }
                }
                GamePhase::Intro => break,
            }

            let events = state.drain_events();
            for (cue, gain) in mixer.cues(&events) {
                log::debug!("cue {} at {gain:.2}", cue.name());
            }
            for event in &events {
                match event {
                    GameEvent::ScoreFinalized { username, score } => {
                        let rank = board.potential_rank(*score);
                        if report_score(&mut board, username, *score) && rank == 1 {
                            log::info!("New high score: {score}");
                        }
                    }
                    GameEvent::LevelUp { level } => log::info!(
                        "Level {level} at speed {:.2} (engine pitch {})",
                        state.progression.current_speed,
                        engine_pitch(state.progression.current_speed)
                    ),
                    _ => {}
                }
            }
        }

        match board.fetch_top_scores(LEADERBOARD_LIMIT) {
            Ok(top) => {
                println!("Top scores:");
                for (rank, entry) in top.iter().enumerate() {
                    println!("{:>2}. {:<12} {}", rank + 1, entry.username, entry.score);
                }
            }
            Err(err) => log::warn!("Leaderboard unavailable: {err}"),
        }
        println!("Best score: {}", state.best_score);
    }

    /// Answer correctly on every other question so both outcomes show up
    fn answer_next(state: &mut GameState) {
        let option = state.quiz.as_ref().and_then(|quiz| {
            let question = quiz.current_question(&state.question_bank)?;
            Some(if quiz.answered() % 2 == 0 {
                question.correct
            } else {
                (question.correct + 1) % question.options.len()
            })
        });
        let answered = match option {
            Some(option) => sim::answer_quiz(state, option).map(|_| ()),
            None => sim::abandon_quiz(state),
        };
        if let Err(err) = answered {
            log::error!("Quiz stuck, abandoning: {err}");
            if let Err(err) = sim::abandon_quiz(state) {
                log::error!("{err}");
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(rand::random);
    demo::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::wasm_start, this is just to satisfy the compiler
}
