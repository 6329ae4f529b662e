//! Data-driven game balance
//!
//! Every gameplay constant lives here so variants of the game differ by data,
//! not by code. Documents are JSON; missing fields fall back to the defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::SIM_DT;
use crate::error::ConfigError;

/// Convert a duration in seconds to whole simulation ticks
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs / SIM_DT).round().max(0.0) as u64
}

/// Spawn scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Entities past this depth have passed the player and are removed
    pub despawn_z: f32,
    /// Far edge of the visibility window used for density counts
    pub visible_far_z: f32,
    /// Nearest depth a new entity may appear at
    pub spawn_near_z: f32,
    /// Depth span behind `spawn_near_z` that spawns are drawn from
    pub spawn_depth_range: f32,
    /// The depth span shrinks by `min(speed_multiplier, this)`
    pub max_depth_speed_factor: f32,
    /// Depth granularity for "same row" occupancy checks
    pub bucket_size: f32,

    pub base_spawn_chance: f32,
    /// Spawn chance while fewer than `min_visible_entities` are visible
    pub sparse_spawn_chance: f32,
    pub min_visible_entities: usize,
    /// Hard cap on live entities
    pub max_entities: usize,

    /// Cooldown between spawns, drawn uniformly from this range (seconds)
    pub min_spawn_cooldown: f32,
    pub max_spawn_cooldown: f32,

    pub max_power_up_fraction: f32,
    pub drought_min_visible: usize,
    pub drought_power_up_chance: f32,
    pub min_obstacles_between_power_ups: u32,

    /// Power-up chance is `max(level_base - level * level_step, level_floor)`
    pub level_base: f32,
    pub level_step: f32,
    pub level_floor: f32,
    pub meter_bonus: f32,
    pub meter_bonus_threshold: f32,
    pub death_assist_step: f32,
    pub death_assist_cap: f32,

    /// Paired obstacles unlock after this many power-ups in a run
    pub paired_obstacle_min_power_ups: u32,
    pub paired_base: f32,
    pub paired_step: f32,
    pub paired_cap: f32,
    pub paired_death_damping: f32,
    pub paired_damping_floor: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            despawn_z: 10.0,
            visible_far_z: -200.0,
            spawn_near_z: -100.0,
            spawn_depth_range: 100.0,
            max_depth_speed_factor: 2.0,
            bucket_size: 10.0,

            base_spawn_chance: 0.08,
            sparse_spawn_chance: 0.15,
            min_visible_entities: 5,
            max_entities: 10,

            min_spawn_cooldown: 0.20,
            max_spawn_cooldown: 0.35,

            max_power_up_fraction: 0.25,
            drought_min_visible: 3,
            drought_power_up_chance: 0.4,
            min_obstacles_between_power_ups: 2,

            level_base: 0.25,
            level_step: 0.02,
            level_floor: 0.12,
            meter_bonus: 0.05,
            meter_bonus_threshold: 0.75,
            death_assist_step: 0.03,
            death_assist_cap: 0.4,

            paired_obstacle_min_power_ups: 4,
            paired_base: 0.05,
            paired_step: 0.03,
            paired_cap: 0.25,
            paired_death_damping: 0.1,
            paired_damping_floor: 0.5,
        }
    }
}

/// Complete balance sheet for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Lateral offsets of the left, center and right lanes
    pub lane_positions: [f32; 3],
    /// Fraction of the remaining lateral distance covered per tick
    pub lane_follow: f32,

    pub base_speed: f32,
    pub max_speed: f32,
    /// Entities advance `current_speed * movement_factor` per tick
    pub movement_factor: f32,
    /// Cosmetic power-up rotation per tick (radians)
    pub power_up_spin: f32,
    pub speed_increment: f32,
    pub speed_up_every: u32,

    pub initial_score: u64,
    pub initial_milestone_threshold: u32,
    pub milestone_step: u32,
    pub invincibility_secs: f32,

    pub player_half_extents: Vec2,
    pub obstacle_half_extents: Vec2,
    pub power_up_half_extents: Vec2,

    /// A final score strictly above this opens the quiz
    pub quiz_threshold: u64,
    pub quiz_questions: usize,
    pub quiz_bonus: u64,

    pub speed_notice_secs: f32,
    pub fact_notice_secs: f32,
    pub bonus_notice_secs: f32,

    pub spawn: SpawnTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lane_positions: [-5.0, 0.0, 5.0],
            lane_follow: 0.1,

            base_speed: 0.45,
            max_speed: 1.2,
            movement_factor: 2.0,
            power_up_spin: 0.01,
            speed_increment: 0.35,
            speed_up_every: 10,

            initial_score: 1,
            initial_milestone_threshold: 3,
            milestone_step: 2,
            invincibility_secs: 5.0,

            player_half_extents: Vec2::new(0.6, 1.2),
            obstacle_half_extents: Vec2::new(0.75, 0.3),
            power_up_half_extents: Vec2::new(0.8, 0.8),

            quiz_threshold: 15,
            quiz_questions: 3,
            quiz_bonus: 5,

            speed_notice_secs: 3.0,
            fact_notice_secs: 5.0,
            bonus_notice_secs: 3.0,

            spawn: SpawnTuning::default(),
        }
    }
}

fn check_probability(field: &'static str, p: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{p} is not a probability")))
    }
}

fn check_positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{v} must be positive")))
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject combinations the simulation cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lanes = self.lane_positions;
        if !(lanes[0] < lanes[1] && lanes[1] < lanes[2]) {
            return Err(ConfigError::invalid(
                "lane_positions",
                "lanes must be strictly increasing",
            ));
        }
        if !(self.lane_follow > 0.0 && self.lane_follow <= 1.0) {
            return Err(ConfigError::invalid("lane_follow", "must be in (0, 1]"));
        }
        check_positive("base_speed", self.base_speed)?;
        check_positive("movement_factor", self.movement_factor)?;
        if self.max_speed < self.base_speed {
            return Err(ConfigError::invalid(
                "max_speed",
                "must not be below base_speed",
            ));
        }
        // Entities move in discrete steps; a step wider than the combined
        // boxes can carry an obstacle past the bike without an overlap
        let step = self.max_speed * self.movement_factor;
        let narrowest = self
            .obstacle_half_extents
            .y
            .min(self.power_up_half_extents.y);
        let reach = 2.0 * (self.player_half_extents.y + narrowest);
        if step >= reach {
            return Err(ConfigError::invalid(
                "max_speed",
                format!("moves {step} per tick, collisions need less than {reach}"),
            ));
        }
        if self.speed_increment < 0.0 {
            return Err(ConfigError::invalid("speed_increment", "must not be negative"));
        }
        if self.speed_up_every == 0 {
            return Err(ConfigError::invalid("speed_up_every", "must be at least 1"));
        }
        if self.initial_milestone_threshold == 0 {
            return Err(ConfigError::invalid(
                "initial_milestone_threshold",
                "must be at least 1",
            ));
        }
        if self.quiz_questions == 0 {
            return Err(ConfigError::invalid("quiz_questions", "must be at least 1"));
        }

        let s = &self.spawn;
        if s.max_entities == 0 {
            return Err(ConfigError::invalid("spawn.max_entities", "must be at least 1"));
        }
        if s.min_spawn_cooldown < 0.0 || s.min_spawn_cooldown > s.max_spawn_cooldown {
            return Err(ConfigError::invalid(
                "spawn.min_spawn_cooldown",
                "cooldown range must satisfy 0 <= min <= max",
            ));
        }
        check_positive("spawn.bucket_size", s.bucket_size)?;
        check_positive("spawn.spawn_depth_range", s.spawn_depth_range)?;
        if s.max_depth_speed_factor < 1.0 {
            return Err(ConfigError::invalid(
                "spawn.max_depth_speed_factor",
                "must be at least 1",
            ));
        }
        if s.visible_far_z >= s.despawn_z {
            return Err(ConfigError::invalid(
                "spawn.visible_far_z",
                "visibility window is empty",
            ));
        }
        check_probability("spawn.base_spawn_chance", s.base_spawn_chance)?;
        check_probability("spawn.sparse_spawn_chance", s.sparse_spawn_chance)?;
        check_probability("spawn.max_power_up_fraction", s.max_power_up_fraction)?;
        check_probability("spawn.drought_power_up_chance", s.drought_power_up_chance)?;
        check_probability("spawn.level_base", s.level_base)?;
        check_probability("spawn.level_floor", s.level_floor)?;
        check_probability("spawn.death_assist_cap", s.death_assist_cap)?;
        check_probability("spawn.paired_cap", s.paired_cap)?;
        Ok(())
    }

    pub fn invincibility_ticks(&self) -> u64 {
        secs_to_ticks(self.invincibility_secs)
    }

    /// Speed for a multiplier, clamped to `max_speed`
    pub fn speed_for(&self, multiplier: f32) -> f32 {
        (self.base_speed * multiplier).min(self.max_speed)
    }
}
