//! Flappy Engine - fixed-timestep core of a side-scrolling gap-avoidance game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacle stream, collisions, tick)
//! - `game`: Session state machine (Idle -> Running -> Over) and snapshots
//! - `clock`: Fixed-step accumulator and the background tick runtime
//! - `settings`: World configuration with load-time validation
//! - `highscores`: Session ledger boundary and reference ledgers

pub mod clock;
pub mod error;
pub mod game;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use clock::{Clock, ClockHandle, FixedStep};
pub use error::{Command, GameError};
pub use game::{EntityView, Game, ObstacleView, Snapshot};
pub use highscores::{
    BackgroundLedger, JsonFileLedger, LedgerError, MemoryLedger, PlayerId, SessionLedger,
};
pub use settings::{ConfigError, WorldConfig};

/// Reference world parameters (used by `WorldConfig::default`)
pub mod consts {
    /// Tick period in milliseconds (50 Hz)
    pub const TICK_PERIOD_MS: u32 = 20;
    /// Simulation time units advanced per tick. Physics constants are per-tick quantities.
    pub const TICK_UNITS: f32 = 1.0;
    /// Maximum ticks the fixed-step accumulator releases for one frame
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta the accumulator accepts (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.1;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 400.0;
    pub const WORLD_HEIGHT: f32 = 800.0;

    /// Entity is a square of this size at a fixed horizontal position
    pub const ENTITY_SIZE: f32 = 40.0;
    pub const ENTITY_X: f32 = WORLD_WIDTH / 4.0;

    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.5;
    /// Velocity set by a jump (negative is up)
    pub const JUMP_FORCE: f32 = -10.0;

    /// Obstacles
    pub const OBSTACLE_WIDTH: f32 = 60.0;
    /// Leftward obstacle speed per tick
    pub const OBSTACLE_SPEED: f32 = 5.0;

    /// Seconds between consecutive spawns
    pub const SPAWN_INTERVAL_MIN: f32 = 1.5;
    pub const SPAWN_INTERVAL_MAX: f32 = 2.5;

    /// Top edge of the gap
    pub const GAP_TOP_MIN: f32 = 100.0;
    pub const GAP_TOP_MAX: f32 = 500.0;
    /// Gap height
    pub const GAP_HEIGHT_MIN: f32 = 150.0;
    pub const GAP_HEIGHT_MAX: f32 = 250.0;
}
