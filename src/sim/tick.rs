//! Fixed timestep simulation tick
//!
//! Core loop step: advance obstacles (spawning if due), integrate the entity,
//! then evaluate collisions and scoring against the already-advanced set.

use super::collision::{CollisionCause, evaluate};
use super::physics::integrate;
use super::state::{GamePhase, GameState, ObstacleId};
use super::stream::ObstacleStream;
use crate::consts::TICK_UNITS;
use crate::settings::WorldConfig;

/// Everything observable that happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// False when the state was not Running and nothing moved
    pub simulated: bool,
    pub spawned: Option<ObstacleId>,
    pub retired: Vec<ObstacleId>,
    pub scored: Vec<ObstacleId>,
    /// Set on the tick that moved the session to Over
    pub collision: Option<CollisionCause>,
}

impl TickReport {
    pub fn is_terminal(&self) -> bool {
        self.collision.is_some()
    }
}

/// Advance the session by one fixed timestep.
///
/// Does nothing outside `Running`, so once a session is Over the entity and
/// obstacles stay exactly as they were on the terminal tick.
pub fn tick(state: &mut GameState, stream: &mut ObstacleStream, config: &WorldConfig) -> TickReport {
    if state.phase != GamePhase::Running {
        return TickReport::default();
    }

    state.time_ticks += 1;

    let step = stream.step(&mut state.obstacles, config, TICK_UNITS);
    state.entity = integrate(state.entity, config.gravity, TICK_UNITS);

    let verdict = evaluate(&state.entity, &state.obstacles, &mut state.passed, config);

    state.score += verdict.score_delta();
    for id in &verdict.scored {
        log::debug!("Passed obstacle {} (score {})", id.0, state.score);
    }

    if let Some(cause) = verdict.collision {
        state.phase = GamePhase::Over;
        stream.cancel();
        log::info!(
            "Session over at tick {}: {:?}, score {}",
            state.time_ticks,
            cause,
            state.score
        );
    }

    debug_assert!(
        state.obstacles.windows(2).all(|w| w[0].id < w[1].id),
        "obstacles out of spawn order"
    );

    TickReport {
        simulated: true,
        spawned: step.spawned,
        retired: step.retired,
        scored: verdict.scored,
        collision: verdict.collision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Entity, Obstacle};

    fn running(config: &WorldConfig) -> GameState {
        let mut state = GameState::new(config);
        state.phase = GamePhase::Running;
        state
    }

    #[test]
    fn test_idle_and_over_do_not_tick() {
        let config = WorldConfig::default();
        let mut stream = ObstacleStream::seeded(1);
        let mut state = GameState::new(&config);
        let before = state.clone();

        let report = tick(&mut state, &mut stream, &config);
        assert!(!report.simulated);
        assert_eq!(state, before);

        state.phase = GamePhase::Over;
        let before = state.clone();
        tick(&mut state, &mut stream, &config);
        assert_eq!(state, before);
    }

    #[test]
    fn test_pure_gravity_accumulation() {
        let config = WorldConfig::default();
        let mut stream = ObstacleStream::seeded(1);
        let mut state = running(&config);
        for n in 1..=30u32 {
            tick(&mut state, &mut stream, &config);
            assert_eq!(state.entity.vel, n as f32 * config.gravity);
        }
    }

    #[test]
    fn test_falls_to_floor_on_exact_tick() {
        // 400 + 0.5 * n(n+1)/2 first exceeds 760 at n = 38
        let config = WorldConfig::default();
        let mut stream = ObstacleStream::seeded(1);
        let mut state = running(&config);

        for _ in 0..37 {
            let report = tick(&mut state, &mut stream, &config);
            assert!(!report.is_terminal());
        }
        assert_eq!(state.entity.pos, 751.5);

        let report = tick(&mut state, &mut stream, &config);
        assert_eq!(report.collision, Some(CollisionCause::Floor));
        assert_eq!(state.time_ticks, 38);
        assert_eq!(state.entity.pos, 770.5);
        assert_eq!(state.phase, GamePhase::Over);
    }

    #[test]
    fn test_collision_uses_this_ticks_obstacle_positions() {
        // At x=144 the obstacle clears the entity span [100, 140); one advance brings it to 139
        let config = WorldConfig::default();
        let mut stream = ObstacleStream::seeded(1);
        let mut state = running(&config);
        state.entity = Entity { pos: 10.0, vel: -0.5 };
        state.obstacles.push(Obstacle {
            id: ObstacleId(99),
            x: 144.0,
            gap_top: 300.0,
            gap_height: 200.0,
        });

        let report = tick(&mut state, &mut stream, &config);
        // Advanced to 139 first, which overlaps, so this tick is terminal
        assert_eq!(report.collision, Some(CollisionCause::Obstacle(ObstacleId(99))));
    }

    #[test]
    fn test_single_pass_scores_once() {
        // Hovering inside the gap: trailing edge 400 + 60 - 5n drops below 100 at n = 73
        let mut config = WorldConfig::default();
        config.gravity = 0.0;
        let mut stream = ObstacleStream::seeded(1);
        let mut state = running(&config);
        let pos = state.entity.pos;
        state.obstacles.push(Obstacle {
            id: ObstacleId(1),
            x: config.world_width,
            gap_top: 300.0,
            gap_height: 250.0,
        });

        for n in 1..=120u64 {
            let report = tick(&mut state, &mut stream, &config);
            assert!(!report.is_terminal());
            let expected = if n >= 73 { 1 } else { 0 };
            assert_eq!(state.score, expected, "tick {}", n);
        }
        assert_eq!(state.entity.pos, pos);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_entity_near_left_edge_scores_before_retire() {
        // entity_x equal to one step: x = -60 scores (0 < 5) and is not yet retired
        let mut config = WorldConfig::default();
        config.gravity = 0.0;
        config.entity_x = config.obstacle_speed;
        let mut stream = ObstacleStream::seeded(1);
        let mut state = running(&config);
        state.obstacles.push(Obstacle {
            id: ObstacleId(1),
            x: 100.0,
            gap_top: 300.0,
            gap_height: 250.0,
        });

        let mut retired = Vec::new();
        for _ in 0..60 {
            let report = tick(&mut state, &mut stream, &config);
            assert!(!report.is_terminal());
            retired.extend(report.retired);
        }
        assert!(state.obstacles.is_empty());
        assert_eq!(retired, vec![ObstacleId(1)]);
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_fastest_accepted_step_still_overlaps() {
        // One step of 99 takes x from 180 to 81, inside the overlap span (40, 140)
        let config = WorldConfig {
            obstacle_speed: 99.0,
            ..Default::default()
        };
        config.validate().unwrap();
        let mut stream = ObstacleStream::seeded(1);
        let mut state = running(&config);
        state.obstacles.push(Obstacle {
            id: ObstacleId(1),
            x: 180.0,
            gap_top: 0.0,
            gap_height: 150.0,
        });

        let report = tick(&mut state, &mut stream, &config);
        assert_eq!(report.collision, Some(CollisionCause::Obstacle(ObstacleId(1))));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_over_freezes_state() {
        let config = WorldConfig::default();
        let mut stream = ObstacleStream::seeded(5);
        let mut state = running(&config);
        while !tick(&mut state, &mut stream, &config).is_terminal() {}

        let frozen = state.clone();
        for _ in 0..50 {
            tick(&mut state, &mut stream, &config);
        }
        assert_eq!(state, frozen);
    }
}
