//! Flappy Engine entry point
//!
//! Runs one autopilot session headless and logs the outcome. Useful as a
//! smoke test of config loading, the tick loop and the ledger.
//!
//! ```text
//! flappy-engine [--config world.json] [--ledger scores.json] [--player NAME]
//!               [--seed N] [--max-ticks N] [--realtime]
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use flappy_engine::sim::{GamePhase, SeededRandom};
use flappy_engine::{
    BackgroundLedger, Clock, Game, JsonFileLedger, MemoryLedger, ObstacleView, PlayerId,
    SessionLedger, WorldConfig,
};

#[derive(Debug)]
struct Args {
    config: Option<String>,
    ledger: Option<String>,
    player: String,
    seed: Option<u64>,
    max_ticks: u64,
    realtime: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        config: None,
        ledger: None,
        player: String::from("autopilot"),
        seed: None,
        max_ticks: 50_000,
        realtime: false,
    };

    let mut i = 0usize;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| anyhow!("missing value for {}", flag))
        };
        match flag {
            "--config" => parsed.config = Some(value()?),
            "--ledger" => parsed.ledger = Some(value()?),
            "--player" => parsed.player = value()?,
            "--seed" => {
                let v = value()?;
                parsed.seed = Some(v.parse().map_err(|_| anyhow!("invalid --seed value: {}", v))?);
            }
            "--max-ticks" => {
                let v = value()?;
                parsed.max_ticks = v
                    .parse()
                    .map_err(|_| anyhow!("invalid --max-ticks value: {}", v))?;
            }
            "--realtime" => parsed.realtime = true,
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(parsed)
}

/// Jump when falling below the next gap's safe line
fn should_jump(config: &WorldConfig, pos: f32, vel: f32, obstacles: &[ObstacleView]) -> bool {
    let target = obstacles
        .iter()
        .filter(|o| o.horizontal_position + config.obstacle_width >= config.entity_x)
        .min_by(|a, b| a.horizontal_position.total_cmp(&b.horizontal_position))
        .map(|o| o.gap_bottom() - config.entity_size - 12.0)
        .unwrap_or(config.entity_start_y());
    vel >= 0.0 && pos > target
}

fn run_headless(game: &mut Game, max_ticks: u64) {
    for _ in 0..max_ticks {
        let snapshot = game.snapshot();
        let vel = game.state().entity.vel;
        if should_jump(game.config(), snapshot.entity.vertical_position, vel, &snapshot.obstacles) {
            let _ = game.jump();
        }
        if game.tick().is_terminal() {
            break;
        }
    }
}

fn run_realtime(game: Game, max_ticks: u64) -> Option<Game> {
    let config = game.config().clone();
    let handle = Clock::from_config(&config).spawn(game);
    handle.start();

    while let Ok(snapshot) = handle.snapshots().recv_timeout(Duration::from_secs(1)) {
        if snapshot.phase == GamePhase::Over || snapshot.tick >= max_ticks {
            break;
        }
        // Snapshots carry no velocity, so jump whenever below the target line
        if should_jump(&config, snapshot.entity.vertical_position, 0.0, &snapshot.obstacles) {
            handle.jump();
        }
    }
    handle.stop()
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => WorldConfig::load(path).context("loading world config")?,
        None => WorldConfig::default(),
    };

    let ledger: Box<dyn SessionLedger + Send> = match &args.ledger {
        Some(path) => Box::new(BackgroundLedger::new(
            JsonFileLedger::open(path).context("opening ledger")?,
        )),
        None => Box::new(MemoryLedger::new()),
    };

    let player = PlayerId::new(args.player.clone());
    let mut game = match args.seed {
        Some(seed) => Game::seeded(config, player, ledger, seed)?,
        None => Game::new(
            config,
            player,
            ledger,
            Box::new(SeededRandom::from_entropy()),
        )?,
    };

    if args.realtime {
        game = run_realtime(game, args.max_ticks).ok_or_else(|| anyhow!("tick thread panicked"))?;
    } else {
        game.start()?;
        run_headless(&mut game, args.max_ticks);
    }

    let snapshot = game.snapshot();
    log::info!(
        "Finished in phase {:?} after {} ticks with score {}",
        snapshot.phase,
        snapshot.tick,
        snapshot.score
    );
    println!("{}", serde_json::to_string(&snapshot)?);

    if game.phase() == GamePhase::Over {
        if let Err(e) = game.reset() {
            log::error!("{}", e);
        }
    }
    log::info!(
        "Best for {}: {} (all-time {})",
        game.player(),
        game.best_score(),
        game.ledger().all_time_best()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Flappy Engine (headless) starting...");

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults_and_flags() {
        let args = parse_args(&argv(&["--seed", "9", "--max-ticks", "10", "--realtime"])).unwrap();
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.max_ticks, 10);
        assert!(args.realtime);
        assert_eq!(args.player, "autopilot");
    }

    #[test]
    fn test_parse_args_errors() {
        let err = parse_args(&argv(&["--seed"])).unwrap_err();
        assert_eq!(err.to_string(), "missing value for --seed");

        let err = parse_args(&argv(&["--seed", "x"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid --seed value: x");

        let err = parse_args(&argv(&["--fly"])).unwrap_err();
        assert_eq!(err.to_string(), "unknown argument: --fly");
    }
}
