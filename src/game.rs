//! Game state machine
//!
//! Owns the session state, the obstacle stream and the ledger handle.
//! Transitions:
//! - Idle --start--> Running
//! - Running --tick--> Running | Over
//! - Running --jump--> Running
//! - Over --reset--> Idle (offers the final score to the ledger first)
//!
//! Every other command is rejected with `GameError::InvalidCommand` and leaves
//! the game untouched.

use serde::Serialize;

use crate::error::{Command, GameError};
use crate::highscores::{PlayerId, SessionLedger};
use crate::settings::WorldConfig;
use crate::sim::{
    GamePhase, GameState, Obstacle, ObstacleId, ObstacleStream, RandomSource, SeededRandom,
    TickReport, apply_impulse, tick,
};

/// Entity as seen by presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityView {
    pub vertical_position: f32,
}

/// Obstacle as seen by presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObstacleView {
    pub id: ObstacleId,
    pub horizontal_position: f32,
    pub gap_top: f32,
    pub gap_height: f32,
}

impl ObstacleView {
    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap_height
    }
}

impl From<&Obstacle> for ObstacleView {
    fn from(o: &Obstacle) -> Self {
        Self {
            id: o.id,
            horizontal_position: o.x,
            gap_top: o.gap_top,
            gap_height: o.gap_height,
        }
    }
}

/// Read-only per-tick view for presentation collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub best_score: u64,
    pub tick: u64,
    pub entity: EntityView,
    pub obstacles: Vec<ObstacleView>,
}

pub struct Game {
    config: WorldConfig,
    state: GameState,
    stream: ObstacleStream,
    ledger: Box<dyn SessionLedger + Send>,
    player: PlayerId,
    /// Player's best as last read from (or offered to) the ledger
    best_score: u64,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("player", &self.player)
            .field("phase", &self.state.phase)
            .field("score", &self.state.score)
            .field("best_score", &self.best_score)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Build an Idle game. Fails if the configuration is inconsistent.
    pub fn new(
        config: WorldConfig,
        player: PlayerId,
        ledger: Box<dyn SessionLedger + Send>,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let best_score = ledger.get_best(&player);
        log::info!("New game for {} (best {})", player, best_score);
        Ok(Self {
            state: GameState::new(&config),
            stream: ObstacleStream::new(rng),
            config,
            ledger,
            player,
            best_score,
        })
    }

    /// Build an Idle game whose obstacle stream is seeded PCG
    pub fn seeded(
        config: WorldConfig,
        player: PlayerId,
        ledger: Box<dyn SessionLedger + Send>,
        seed: u64,
    ) -> Result<Self, GameError> {
        Self::new(config, player, ledger, Box::new(SeededRandom::new(seed)))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn ledger(&self) -> &(dyn SessionLedger + Send) {
        self.ledger.as_ref()
    }

    fn reject(&self, command: Command) -> Result<(), GameError> {
        log::debug!("{} ignored in {:?}", command.as_str(), self.state.phase);
        Err(GameError::InvalidCommand { command, phase: self.state.phase })
    }

    /// Dispatch a command
    pub fn apply(&mut self, command: Command) -> Result<(), GameError> {
        match command {
            Command::Start => self.start(),
            Command::Jump => self.jump(),
            Command::Reset => self.reset(),
        }
    }

    /// Idle -> Running with fresh session values
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.state.phase != GamePhase::Idle {
            return self.reject(Command::Start);
        }
        self.state.reset_session(&self.config);
        self.best_score = self.ledger.get_best(&self.player);
        self.stream.schedule_next(&self.config);
        self.state.phase = GamePhase::Running;
        log::info!("Session started for {} (best {})", self.player, self.best_score);
        Ok(())
    }

    /// Overwrite the entity's velocity with the jump force
    pub fn jump(&mut self) -> Result<(), GameError> {
        if self.state.phase != GamePhase::Running {
            return self.reject(Command::Jump);
        }
        self.state.entity = apply_impulse(self.state.entity, self.config.jump_force);
        Ok(())
    }

    /// Over -> Idle.
    ///
    /// A score above the player's current best is offered to the ledger once.
    /// If that write fails the game still moves to Idle and the failure is
    /// returned.
    pub fn reset(&mut self) -> Result<(), GameError> {
        if self.state.phase != GamePhase::Over {
            return self.reject(Command::Reset);
        }

        let score = self.state.score;
        let current_best = self.ledger.get_best(&self.player);
        let handoff = if score > current_best {
            self.ledger.record_if_better(&self.player, score)
        } else {
            Ok(())
        };
        self.best_score = current_best.max(score);

        self.state.reset_session(&self.config);
        self.stream.cancel();
        self.state.phase = GamePhase::Idle;

        match handoff {
            Ok(()) => {
                log::info!("Session reset (final score {})", score);
                Ok(())
            }
            Err(e) => {
                log::error!("Could not record score {} for {}: {}", score, self.player, e);
                Err(GameError::LedgerWriteFailure(e))
            }
        }
    }

    /// Advance one fixed timestep (no-op unless Running)
    pub fn tick(&mut self) -> TickReport {
        tick(&mut self.state, &mut self.stream, &self.config)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.state.phase,
            score: self.state.score,
            best_score: self.best_score,
            tick: self.state.time_ticks,
            entity: EntityView { vertical_position: self.state.entity.pos },
            obstacles: self.state.obstacles.iter().map(ObstacleView::from).collect(),
        }
    }
}
