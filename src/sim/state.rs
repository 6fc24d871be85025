//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives here, except the obstacle stream's
//! random source and spawn schedule (see `stream`).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::settings::WorldConfig;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a start command. No physics, no obstacles.
    Idle,
    /// Physics, obstacle stream and collision checks all active
    Running,
    /// Collision happened. Everything frozen until reset.
    Over,
}

/// The controlled body
///
/// Only the vertical axis moves; the horizontal position is fixed by
/// `WorldConfig::entity_x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Top edge, growing downward
    pub pos: f32,
    /// Vertical velocity per tick (negative is up)
    pub vel: f32,
}

impl Entity {
    pub fn at_rest(pos: f32) -> Self {
        Self { pos, vel: 0.0 }
    }
}

/// Obstacle identity, unique for the lifetime of a game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObstacleId(pub u64);

/// A gapped barrier pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    /// Leading (left) edge
    pub x: f32,
    /// Top of the passable gap
    pub gap_top: f32,
    pub gap_height: f32,
}

impl Obstacle {
    /// Trailing (right) edge
    #[inline]
    pub fn right_edge(&self, width: f32) -> f32 {
        self.x + width
    }

    #[inline]
    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap_height
    }

    /// Whether the obstacle's horizontal span overlaps `[left, left + size)`
    #[inline]
    pub fn overlaps_span(&self, left: f32, size: f32, width: f32) -> bool {
        left + size > self.x && left < self.right_edge(width)
    }

    /// Fully past the trailing edge of the world
    #[inline]
    pub fn is_retired(&self, width: f32) -> bool {
        self.x < -width
    }
}

/// Obstacle ids already credited to the score this session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassedSet(BTreeSet<ObstacleId>);

impl PassedSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns false if the id was already credited
    pub fn insert(&mut self, id: ObstacleId) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = ObstacleId> + '_ {
        self.0.iter().copied()
    }
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase
    pub phase: GamePhase,
    /// Obstacles passed this session
    pub score: u64,
    /// Ticks simulated this session
    pub time_ticks: u64,
    /// Controlled body
    pub entity: Entity,
    /// Active obstacles in spawn order
    pub obstacles: Vec<Obstacle>,
    /// Obstacles already scored
    pub passed: PassedSet,
}

impl GameState {
    /// Fresh Idle state for the given world
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            phase: GamePhase::Idle,
            score: 0,
            time_ticks: 0,
            entity: Entity::at_rest(config.entity_start_y()),
            obstacles: Vec::new(),
            passed: PassedSet::new(),
        }
    }

    /// Restore the session values a fresh state starts with, keeping the phase
    pub fn reset_session(&mut self, config: &WorldConfig) {
        self.score = 0;
        self.time_ticks = 0;
        self.entity = Entity::at_rest(config.entity_start_y());
        self.obstacles.clear();
        self.passed.clear();
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }
}
