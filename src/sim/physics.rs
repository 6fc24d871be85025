//! Entity physics
//!
//! Semi-implicit Euler on the vertical axis. `dt` is a fixed number of tick
//! units, never a wall-clock delta.

use super::state::Entity;

/// Apply gravity for one step, then move by the new velocity.
///
/// Positions are not clamped; leaving the world is for the collision check
/// to report.
#[inline]
pub fn integrate(entity: Entity, gravity: f32, dt: f32) -> Entity {
    let vel = entity.vel + gravity * dt;
    Entity { pos: entity.pos + vel * dt, vel }
}

/// Overwrite the velocity with the jump force (not additive)
#[inline]
pub fn apply_impulse(entity: Entity, jump_force: f32) -> Entity {
    Entity { vel: jump_force, ..entity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_step() {
        let e = integrate(Entity::at_rest(400.0), 0.5, 1.0);
        assert_eq!(e.vel, 0.5);
        assert_eq!(e.pos, 400.5);
    }

    #[test]
    fn test_jump_overwrites_velocity() {
        let falling = Entity { pos: 300.0, vel: 12.0 };
        let rising = Entity { pos: 300.0, vel: -4.0 };
        assert_eq!(apply_impulse(falling, -10.0).vel, -10.0);
        assert_eq!(apply_impulse(rising, -10.0).vel, -10.0);
        // Position is left to the next integration step
        assert_eq!(apply_impulse(falling, -10.0).pos, 300.0);
    }

    #[test]
    fn test_no_clamping_past_floor() {
        let e = integrate(Entity { pos: 799.0, vel: 20.0 }, 0.5, 1.0);
        assert!(e.pos > 800.0);
    }

    proptest! {
        #[test]
        fn prop_velocity_accumulates_linearly(n in 1u32..400, gravity in 0.01f32..2.0) {
            let mut e = Entity::at_rest(0.0);
            for _ in 0..n {
                e = integrate(e, gravity, 1.0);
            }
            let expected = n as f32 * gravity;
            prop_assert!((e.vel - expected).abs() <= expected * 1e-4);
        }

        #[test]
        fn prop_jump_is_idempotent(vel in -50.0f32..50.0, force in -30.0f32..-0.1) {
            let once = apply_impulse(Entity { pos: 1.0, vel }, force);
            let twice = apply_impulse(once, force);
            prop_assert_eq!(once.vel, force);
            prop_assert_eq!(once, twice);
        }
    }
}
