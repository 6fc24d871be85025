//! Obstacle stream
//!
//! Spawns obstacles at variable intervals, moves them left every tick and
//! retires them once they leave the world. Spawn timing is a tick countdown
//! owned by the stream, so a spawn always lands inside a tick's stream step.

use super::rng::{RandomSource, SeededRandom};
use super::state::{Obstacle, ObstacleId};
use crate::settings::WorldConfig;

/// What the stream did during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStep {
    pub spawned: Option<ObstacleId>,
    pub retired: Vec<ObstacleId>,
}

/// Move every obstacle left by `speed * dt` and drop those fully off-world.
///
/// Returns the ids that were retired.
pub fn advance(obstacles: &mut Vec<Obstacle>, speed: f32, width: f32, dt: f32) -> Vec<ObstacleId> {
    let mut retired = Vec::new();
    obstacles.retain_mut(|o| {
        o.x -= speed * dt;
        if o.is_retired(width) {
            retired.push(o.id);
            false
        } else {
            true
        }
    });
    retired
}

/// Obstacle generator: random source, spawn countdown and id counter
pub struct ObstacleStream {
    rng: Box<dyn RandomSource + Send>,
    /// Ticks left before the next spawn (0 = nothing scheduled)
    ticks_until_spawn: u32,
    /// Never reset, so retired ids are never handed out again
    next_id: u64,
}

impl std::fmt::Debug for ObstacleStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObstacleStream")
            .field("ticks_until_spawn", &self.ticks_until_spawn)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl ObstacleStream {
    pub fn new(rng: Box<dyn RandomSource + Send>) -> Self {
        Self {
            rng,
            ticks_until_spawn: 0,
            next_id: 1,
        }
    }

    /// Stream backed by a seeded PCG source
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(SeededRandom::new(seed)))
    }

    pub fn ticks_until_spawn(&self) -> u32 {
        self.ticks_until_spawn
    }

    /// Draw the delay to the next spawn and arm the countdown
    pub fn schedule_next(&mut self, config: &WorldConfig) {
        let seconds = self
            .rng
            .uniform(config.spawn_interval_min, config.spawn_interval_max);
        self.ticks_until_spawn = config.seconds_to_ticks(seconds);
    }

    /// Disarm the countdown (nothing spawns until `schedule_next`)
    pub fn cancel(&mut self) {
        self.ticks_until_spawn = 0;
    }

    /// Create an obstacle at the leading edge of the world.
    ///
    /// Gap bounds come from a validated config, so the gap always fits.
    pub fn spawn(&mut self, config: &WorldConfig) -> Obstacle {
        let id = ObstacleId(self.next_id);
        self.next_id += 1;

        let gap_top = self.rng.uniform(config.gap_top_min, config.gap_top_max);
        let gap_height = self
            .rng
            .uniform(config.gap_height_min, config.gap_height_max);

        debug_assert!(gap_top >= 0.0 && gap_top + gap_height <= config.world_height);
        log::debug!(
            "Spawned obstacle {} (gap {:.1}..{:.1})",
            id.0,
            gap_top,
            gap_top + gap_height
        );

        Obstacle {
            id,
            x: config.world_width,
            gap_top,
            gap_height,
        }
    }

    /// One tick of the stream: advance and retire, then spawn if due
    pub fn step(&mut self, obstacles: &mut Vec<Obstacle>, config: &WorldConfig, dt: f32) -> StreamStep {
        let retired = advance(obstacles, config.obstacle_speed, config.obstacle_width, dt);

        let mut spawned = None;
        if self.ticks_until_spawn > 0 {
            self.ticks_until_spawn -= 1;
            if self.ticks_until_spawn == 0 {
                let obstacle = self.spawn(config);
                spawned = Some(obstacle.id);
                obstacles.push(obstacle);
                self.schedule_next(config);
            }
        }

        StreamStep { spawned, retired }
    }
}
