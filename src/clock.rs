//! Clock: fixed-rate tick driving
//!
//! Two ways to drive a `Game`:
//! - `FixedStep`: an accumulator for callers with their own frame loop. Feed it
//!   wall-clock frame deltas and it says how many ticks to run.
//! - `Clock`: a dedicated tick thread. Commands arrive over a channel and are
//!   applied only between ticks; a snapshot is published after every tick.
//!
//! ```text
//!  input ──Command──> [control channel] ──> tick thread ──Snapshot──> presentation
//!                                            │
//!                                            └─ drain commands, Game::tick, publish
//! ```

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};

use crate::consts::{MAX_FRAME_DELTA, MAX_SUBSTEPS};
use crate::error::{Command, GameError};
use crate::game::{Game, Snapshot};
use crate::settings::WorldConfig;

/// Frame-delta accumulator releasing whole fixed ticks
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
    max_substeps: u32,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.as_secs_f32(),
            accumulator: 0.0,
            max_substeps: MAX_SUBSTEPS,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.tick_period())
    }

    /// Add a frame delta; returns how many ticks to run now.
    ///
    /// Deltas are clamped to `MAX_FRAME_DELTA` and at most `max_substeps`
    /// ticks are released per call, so a long stall never turns into a burst
    /// of catch-up ticks.
    pub fn advance(&mut self, frame_delta: Duration) -> u32 {
        self.accumulator += frame_delta.as_secs_f32().min(MAX_FRAME_DELTA);

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            self.accumulator -= self.step;
            substeps += 1;
        }
        if substeps == self.max_substeps {
            // Drop what could not be simulated this frame
            self.accumulator = self.accumulator.min(self.step);
        }
        substeps
    }

    /// Fraction of a tick left in the accumulator (for render interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }
}

enum Control {
    Command(Command),
    Stop,
}

/// Builder for the tick thread
#[derive(Debug, Clone)]
pub struct Clock {
    tick_period: Duration,
    snapshot_capacity: usize,
}

impl Clock {
    pub fn new(tick_period: Duration) -> Self {
        assert!(!tick_period.is_zero(), "Tick period must be positive");
        Self {
            tick_period,
            snapshot_capacity: 64,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.tick_period())
    }

    /// Snapshots buffered for a slow consumer before new ones are dropped
    pub fn with_snapshot_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Snapshot capacity must be positive");
        self.snapshot_capacity = capacity;
        self
    }

    /// Move the game onto a tick thread. The returned handle owns the thread.
    pub fn spawn(self, game: Game) -> ClockHandle {
        let (control_tx, control_rx) = unbounded();
        let (snapshot_tx, snapshot_rx) = bounded(self.snapshot_capacity);
        let period = self.tick_period;

        log::info!("Clock starting ({:?} per tick)", period);
        let thread = thread::spawn(move || run_ticks(game, period, control_rx, snapshot_tx));

        ClockHandle {
            control: control_tx,
            snapshots: snapshot_rx,
            thread: Some(thread),
        }
    }
}

fn apply_pending(game: &mut Game, pending: &mut Vec<Command>) {
    for command in pending.drain(..) {
        match game.apply(command) {
            Ok(()) => {}
            Err(GameError::InvalidCommand { .. }) => {}
            Err(e) => log::warn!("{} failed: {}", command.as_str(), e),
        }
    }
}

fn run_ticks(
    mut game: Game,
    period: Duration,
    control: Receiver<Control>,
    snapshots: Sender<Snapshot>,
) -> Game {
    let mut pending = Vec::with_capacity(8);
    let mut deadline = Instant::now() + period;

    loop {
        // Collect commands until the next tick is due
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match control.recv_timeout(deadline - now) {
                Ok(Control::Command(command)) => pending.push(command),
                Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Clock stopped at tick {}", game.state().time_ticks);
                    return game;
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        // Tick boundary: commands first, then the tick
        apply_pending(&mut game, &mut pending);
        game.tick();

        // A full or abandoned feed only loses this snapshot
        let _ = snapshots.try_send(game.snapshot());

        deadline += period;
        let now = Instant::now();
        if now > deadline + period {
            // Fell behind; resume the cadence from now instead of bursting
            deadline = now + period;
        }
    }
}

/// Handle to a running tick thread.
///
/// Dropping the handle stops the thread and waits for it, so no tick runs
/// after the handle is gone.
pub struct ClockHandle {
    control: Sender<Control>,
    snapshots: Receiver<Snapshot>,
    thread: Option<JoinHandle<Game>>,
}

impl ClockHandle {
    /// Queue a command for the next tick boundary. False once the clock stopped.
    pub fn send(&self, command: Command) -> bool {
        self.thread.is_some() && self.control.send(Control::Command(command)).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn jump(&self) -> bool {
        self.send(Command::Jump)
    }

    pub fn reset(&self) -> bool {
        self.send(Command::Reset)
    }

    /// Per-tick snapshots (oldest first)
    pub fn snapshots(&self) -> &Receiver<Snapshot> {
        &self.snapshots
    }

    /// Drain buffered snapshots and return the newest
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.snapshots.try_iter().last()
    }

    /// Stop ticking and hand the game back
    pub fn stop(mut self) -> Option<Game> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<Game> {
        let thread = self.thread.take()?;
        let _ = self.control.send(Control::Stop);
        match thread.join() {
            Ok(game) => Some(game),
            Err(_) => {
                log::error!("Tick thread panicked");
                None
            }
        }
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
