//! Player vs. entity collision detection
//!
//! Everything is an axis-aligned box on the road plane: `x` is lateral,
//! `y` is the longitudinal (z) axis.

use glam::Vec2;

use super::state::{Entity, EntityKind, EntitySet, Player};
use crate::tuning::Tuning;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        (self.center - other.center)
            .abs()
            .cmplt(self.half_extents + other.half_extents)
            .all()
    }
}

pub fn player_box(player: &Player, tuning: &Tuning) -> Aabb {
    Aabb::new(
        Vec2::new(player.lateral_offset, 0.0),
        tuning.player_half_extents,
    )
}

pub fn entity_box(entity: &Entity, tuning: &Tuning) -> Aabb {
    let half_extents = match entity.kind {
        EntityKind::Obstacle => tuning.obstacle_half_extents,
        EntityKind::PowerUp => tuning.power_up_half_extents,
    };
    Aabb::new(
        Vec2::new(entity.lane.offset(tuning), entity.z),
        half_extents,
    )
}

/// Outcome of the player touching an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Obstacle hit without protection; ends the run
    Crashed { entity_id: u32 },
    /// Obstacle hit while invincible
    ShieldAbsorbed { entity_id: u32 },
    PowerUpCollected { entity_id: u32 },
}

/// Test the player against every entity once, removing what was touched
///
/// Invincibility is sampled once for the whole pass. Processing stops at the
/// first crash; entities behind it stay untouched.
pub fn resolve_collisions(
    entities: &mut EntitySet,
    player: &Player,
    invincible: bool,
    tuning: &Tuning,
) -> Vec<Collision> {
    let player_box = player_box(player, tuning);
    let mut collisions = Vec::new();

    let mut i = 0;
    while let Some(entity) = entities.get(i) {
        if !player_box.overlaps(&entity_box(entity, tuning)) {
            i += 1;
            continue;
        }

        // Removing shifts the next entity into slot `i`
        let entity = entities.remove(i);
        match entity.kind {
            EntityKind::PowerUp => collisions.push(Collision::PowerUpCollected {
                entity_id: entity.id,
            }),
            EntityKind::Obstacle if invincible => collisions.push(Collision::ShieldAbsorbed {
                entity_id: entity.id,
            }),
            EntityKind::Obstacle => {
                collisions.push(Collision::Crashed {
                    entity_id: entity.id,
                });
                break;
            }
        }
    }

    collisions
}
