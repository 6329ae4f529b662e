//! Score, knowledge meter and speed progression

use serde::Serialize;

use super::state::{GameEvent, GameState, NoticeKind};
use crate::tuning::Tuning;

/// Per-run progression counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub score: u64,
    pub power_ups_collected: u32,
    pub power_ups_toward_milestone: u32,
    pub milestone_threshold: u32,
    pub knowledge_level: u32,
    pub speed_multiplier: f32,
    pub base_speed: f32,
    /// Always `min(base_speed * speed_multiplier, max_speed)`
    pub current_speed: f32,
    /// Facts unlocked this run; also the index of the next fact
    pub facts_unlocked: u32,
}

/// What a single collection triggered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectOutcome {
    pub milestone: bool,
    pub speed_up: bool,
}

impl Progression {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: tuning.initial_score,
            power_ups_collected: 0,
            power_ups_toward_milestone: 0,
            milestone_threshold: tuning.initial_milestone_threshold,
            knowledge_level: 1,
            speed_multiplier: 1.0,
            base_speed: tuning.base_speed,
            current_speed: tuning.speed_for(1.0),
            facts_unlocked: 0,
        }
    }

    /// Knowledge meter fill in `[0, 1]`
    pub fn meter_fill(&self) -> f32 {
        if self.milestone_threshold == 0 {
            return 1.0;
        }
        (self.power_ups_toward_milestone as f32 / self.milestone_threshold as f32).clamp(0.0, 1.0)
    }

    /// Count one power-up and apply milestone and speed rules
    pub fn record_power_up(&mut self, tuning: &Tuning) -> CollectOutcome {
        let mut outcome = CollectOutcome::default();

        self.score += 1;
        self.power_ups_collected += 1;
        self.power_ups_toward_milestone += 1;

        if self.power_ups_toward_milestone >= self.milestone_threshold {
            self.knowledge_level += 1;
            self.power_ups_toward_milestone = 0;
            self.milestone_threshold += tuning.milestone_step;
            self.facts_unlocked += 1;
            outcome.milestone = true;
        }

        if self.power_ups_collected.is_multiple_of(tuning.speed_up_every) {
            self.speed_multiplier += tuning.speed_increment;
            self.current_speed = tuning.speed_for(self.speed_multiplier);
            outcome.speed_up = true;
        }

        outcome
    }
}

/// Apply a collected power-up to the session
pub fn collect_power_up(state: &mut GameState) {
    let outcome = state.progression.record_power_up(&state.tuning);
    let progression = &state.progression;
    let collected = GameEvent::PowerUpCollected {
        score: progression.score,
        meter_fill: progression.meter_fill(),
    };
    state.emit(collected);

    if outcome.milestone {
        let level = state.progression.knowledge_level;
        let fact = state.progression.facts_unlocked - 1;
        let until_tick = state.time_ticks + state.tuning.invincibility_ticks();
        state.player.invincible_until_tick = Some(until_tick);
        state.recent_deaths = 0;

        log::info!("Knowledge level {level} reached, invincible until tick {until_tick}");
        state.emit(GameEvent::LevelUp { level });
        state.emit(GameEvent::FactUnlocked { index: fact });
        state.emit(GameEvent::InvincibilityStarted { until_tick });

        let (fact_secs, bonus_secs, shield_secs) = (
            state.tuning.fact_notice_secs,
            state.tuning.bonus_notice_secs,
            state.tuning.invincibility_secs,
        );
        state.notify(NoticeKind::Fact { index: fact }, fact_secs);
        state.notify(NoticeKind::Invincibility { secs: shield_secs }, bonus_secs);
    }

    if outcome.speed_up {
        let multiplier = state.progression.speed_multiplier;
        log::info!(
            "Speed increased to {multiplier:.2}x ({:.2})",
            state.progression.current_speed
        );
        state.emit(GameEvent::SpeedIncreased { multiplier });
        let secs = state.tuning.speed_notice_secs;
        state.notify(NoticeKind::SpeedUp { multiplier }, secs);
    }
}
