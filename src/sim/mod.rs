//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Replaceable, seedable random source only
//! - Stable iteration order (by obstacle id)
//! - No timers, threads or I/O

pub mod collision;
pub mod physics;
pub mod rng;
pub mod state;
pub mod stream;
pub mod tick;

pub use collision::{CollisionCause, Verdict, evaluate};
pub use physics::{apply_impulse, integrate};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use state::{Entity, GamePhase, GameState, Obstacle, ObstacleId, PassedSet};
pub use stream::{ObstacleStream, StreamStep, advance};
pub use tick::{TickReport, tick};
