//! Collision and scoring oracle
//!
//! A pure function of the entity, the already-advanced obstacle set and the
//! set of obstacles scored so far. Floor/ceiling checks run before the
//! obstacle checks and short-circuit them.

use serde::{Deserialize, Serialize};

use super::state::{Entity, Obstacle, ObstacleId, PassedSet};
use crate::settings::WorldConfig;

/// What ended the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionCause {
    /// Entity rose above the top of the world
    Ceiling,
    /// Entity fell below the bottom of the world
    Floor,
    /// Entity overlapped an obstacle outside its gap
    Obstacle(ObstacleId),
}

/// Result of evaluating one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    /// Set when the tick is terminal
    pub collision: Option<CollisionCause>,
    /// Obstacles credited this tick (already inserted into the passed set)
    pub scored: Vec<ObstacleId>,
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        self.collision.is_some()
    }

    pub fn score_delta(&self) -> u64 {
        self.scored.len() as u64
    }
}

/// Floor/ceiling rule. Touching a bound exactly is still alive.
pub fn bounds_collision(entity: &Entity, config: &WorldConfig) -> Option<CollisionCause> {
    if entity.pos < 0.0 {
        Some(CollisionCause::Ceiling)
    } else if entity.pos > config.entity_max_y() {
        Some(CollisionCause::Floor)
    } else {
        None
    }
}

/// Whether the entity hits this obstacle outside its gap
pub fn obstacle_collision(entity: &Entity, obstacle: &Obstacle, config: &WorldConfig) -> bool {
    if !obstacle.overlaps_span(config.entity_x, config.entity_size, config.obstacle_width) {
        return false;
    }
    entity.pos < obstacle.gap_top || entity.pos + config.entity_size > obstacle.gap_bottom()
}

/// Evaluate collisions and scoring for the current tick.
///
/// Scoring is independent of the terminal check: an obstacle whose trailing
/// edge is strictly left of the entity is credited once, even on the tick the
/// session ends. Such an obstacle cannot overlap the entity, so it is never
/// the obstacle that caused the collision.
pub fn evaluate(
    entity: &Entity,
    obstacles: &[Obstacle],
    passed: &mut PassedSet,
    config: &WorldConfig,
) -> Verdict {
    let collision = bounds_collision(entity, config).or_else(|| {
        obstacles
            .iter()
            .find(|o| obstacle_collision(entity, o, config))
            .map(|o| CollisionCause::Obstacle(o.id))
    });

    let mut scored = Vec::new();
    for obstacle in obstacles {
        if obstacle.right_edge(config.obstacle_width) < config.entity_x && passed.insert(obstacle.id) {
            debug_assert_ne!(collision, Some(CollisionCause::Obstacle(obstacle.id)));
            scored.push(obstacle.id);
        }
    }

    Verdict { collision, scored }
}
