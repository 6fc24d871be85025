//! World configuration
//!
//! Loaded from JSON (partial files override only the fields they name) and
//! validated before any session can start. An inconsistent configuration is
//! rejected up front instead of producing an unwinnable obstacle stream.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Reasons a configuration is rejected
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// Config text is not valid JSON for `WorldConfig`
    Parse(serde_json::Error),
    /// A single parameter is out of its allowed range
    OutOfRange { field: &'static str, value: f32, reason: &'static str },
    /// Two parameters contradict each other
    Inconsistent(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config {}: {}", path.display(), source)
            }
            Self::Parse(e) => write!(f, "malformed config: {}", e),
            Self::OutOfRange { field, value, reason } => {
                write!(f, "{} = {} is invalid: {}", field, value, reason)
            }
            Self::Inconsistent(msg) => write!(f, "inconsistent config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// World parameters
///
/// Lengths are in world units, velocities and accelerations are per tick,
/// spawn intervals are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,

    // === Entity ===
    /// Side length of the (square) entity
    pub entity_size: f32,
    /// Fixed left edge of the entity
    pub entity_x: f32,
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Velocity assigned by a jump (negative is up)
    pub jump_force: f32,

    // === Obstacles ===
    pub obstacle_width: f32,
    /// Leftward distance per tick
    pub obstacle_speed: f32,
    pub spawn_interval_min: f32,
    pub spawn_interval_max: f32,
    pub gap_top_min: f32,
    pub gap_top_max: f32,
    pub gap_height_min: f32,
    pub gap_height_max: f32,

    // === Clock ===
    pub tick_period_ms: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,

            entity_size: ENTITY_SIZE,
            entity_x: ENTITY_X,
            gravity: GRAVITY,
            jump_force: JUMP_FORCE,

            obstacle_width: OBSTACLE_WIDTH,
            obstacle_speed: OBSTACLE_SPEED,
            spawn_interval_min: SPAWN_INTERVAL_MIN,
            spawn_interval_max: SPAWN_INTERVAL_MAX,
            gap_top_min: GAP_TOP_MIN,
            gap_top_max: GAP_TOP_MAX,
            gap_height_min: GAP_HEIGHT_MIN,
            gap_height_max: GAP_HEIGHT_MAX,

            tick_period_ms: TICK_PERIOD_MS,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, reason: "must be finite and > 0" })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, reason: "must be finite and >= 0" })
    }
}

fn ordered(lo_field: &str, lo: f32, hi_field: &str, hi: f32) -> Result<(), ConfigError> {
    if lo <= hi {
        Ok(())
    } else {
        Err(ConfigError::Inconsistent(format!(
            "{} ({}) exceeds {} ({})",
            lo_field, lo, hi_field, hi
        )))
    }
}

impl WorldConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    /// Check every parameter and every cross-parameter constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        positive("entity_size", self.entity_size)?;
        positive("entity_x", self.entity_x)?;
        positive("gravity", self.gravity)?;
        positive("obstacle_width", self.obstacle_width)?;
        positive("obstacle_speed", self.obstacle_speed)?;
        positive("spawn_interval_min", self.spawn_interval_min)?;
        positive("spawn_interval_max", self.spawn_interval_max)?;
        non_negative("gap_top_min", self.gap_top_min)?;
        non_negative("gap_top_max", self.gap_top_max)?;
        positive("gap_height_min", self.gap_height_min)?;
        positive("gap_height_max", self.gap_height_max)?;

        if !(self.jump_force.is_finite() && self.jump_force < 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "jump_force",
                value: self.jump_force,
                reason: "must be finite and < 0 (upward)",
            });
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "tick_period_ms",
                value: 0.0,
                reason: "must be > 0",
            });
        }

        ordered("spawn_interval_min", self.spawn_interval_min, "spawn_interval_max", self.spawn_interval_max)?;
        ordered("gap_top_min", self.gap_top_min, "gap_top_max", self.gap_top_max)?;
        ordered("gap_height_min", self.gap_height_min, "gap_height_max", self.gap_height_max)?;

        if self.entity_size >= self.world_height {
            return Err(ConfigError::Inconsistent(format!(
                "entity_size ({}) must be smaller than world_height ({})",
                self.entity_size, self.world_height
            )));
        }
        if self.entity_x + self.entity_size > self.world_width {
            return Err(ConfigError::Inconsistent(format!(
                "entity at x={} with size {} does not fit in world_width {}",
                self.entity_x, self.entity_size, self.world_width
            )));
        }
        // Per-tick obstacle travel must land at least once on each side of the
        // entity: inside the overlap span, and past its trailing edge before retiring
        let step = self.obstacle_speed * TICK_UNITS;
        if step >= self.entity_size + self.obstacle_width {
            return Err(ConfigError::Inconsistent(format!(
                "obstacle step {} per tick skips over entity_size + obstacle_width ({})",
                step,
                self.entity_size + self.obstacle_width
            )));
        }
        if step > self.entity_x {
            return Err(ConfigError::Inconsistent(format!(
                "obstacle step {} per tick exceeds entity_x ({}), obstacles would retire unscored",
                step, self.entity_x
            )));
        }
        // A gap the entity cannot fit through makes the stream unwinnable
        if self.gap_height_min <= self.entity_size {
            return Err(ConfigError::Inconsistent(format!(
                "gap_height_min ({}) must exceed entity_size ({})",
                self.gap_height_min, self.entity_size
            )));
        }
        if self.gap_top_max + self.gap_height_max > self.world_height {
            return Err(ConfigError::Inconsistent(format!(
                "gap_top_max + gap_height_max ({}) exceeds world_height ({})",
                self.gap_top_max + self.gap_height_max,
                self.world_height
            )));
        }

        Ok(())
    }

    /// Y coordinate an entity starts from
    pub fn entity_start_y(&self) -> f32 {
        self.world_height / 2.0
    }

    /// Largest non-terminal entity position
    pub fn entity_max_y(&self) -> f32 {
        self.world_height - self.entity_size
    }

    /// Convert a spawn delay in seconds to whole ticks (at least one)
    pub fn seconds_to_ticks(&self, seconds: f32) -> u32 {
        let ticks = (seconds * 1000.0 / self.tick_period_ms as f32).round();
        (ticks as u32).max(1)
    }

    /// Tick period as a `Duration`
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_period_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        WorldConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let config = WorldConfig::from_json(r#"{ "gravity": 0.75, "tick_period_ms": 16 }"#).unwrap();
        assert_eq!(config.gravity, 0.75);
        assert_eq!(config.tick_period_ms, 16);
        assert_eq!(config.world_height, WORLD_HEIGHT);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = WorldConfig::from_json("{ gravity: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_gap_that_overflows_world_rejected() {
        let config = WorldConfig {
            gap_top_max: 700.0,
            gap_height_max: 200.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_gap_smaller_than_entity_rejected() {
        let config = WorldConfig {
            gap_height_min: 30.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_inverted_ranges_rejected() {
        let config = WorldConfig {
            spawn_interval_min: 3.0,
            spawn_interval_max: 2.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_upward_gravity_and_downward_jump_rejected() {
        let config = WorldConfig { gravity: -0.5, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "gravity", .. })
        ));

        let config = WorldConfig { jump_force: 10.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "jump_force", .. })
        ));
    }

    #[test]
    fn test_entity_at_left_edge_rejected() {
        let config = WorldConfig { entity_x: 0.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "entity_x", .. })
        ));

        // Smallest accepted entity_x is one obstacle step
        let config = WorldConfig { entity_x: 5.0, ..Default::default() };
        config.validate().unwrap();
        let config = WorldConfig { entity_x: 4.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_entity_flush_with_right_edge_accepted() {
        let config = WorldConfig {
            entity_x: WORLD_WIDTH - ENTITY_SIZE,
            ..Default::default()
        };
        config.validate().unwrap();

        let config = WorldConfig {
            entity_x: WORLD_WIDTH - ENTITY_SIZE + 1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_obstacle_step_must_not_skip_entity() {
        // entity_size + obstacle_width = 100 with defaults
        let config = WorldConfig { obstacle_speed: 150.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));

        let config = WorldConfig { obstacle_speed: 100.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));

        let config = WorldConfig { obstacle_speed: 99.0, ..Default::default() };
        config.validate().unwrap();
    }

    #[test]
    fn test_obstacle_step_must_not_outrun_entity_x() {
        let config = WorldConfig {
            entity_x: 40.0,
            obstacle_speed: 60.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));

        let config = WorldConfig {
            entity_x: 60.0,
            obstacle_speed: 60.0,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_nan_rejected() {
        let config = WorldConfig { obstacle_speed: f32::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tick_period_rejected() {
        let config = WorldConfig { tick_period_ms: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seconds_to_ticks() {
        let config = WorldConfig::default();
        assert_eq!(config.seconds_to_ticks(2.0), 100);
        assert_eq!(config.seconds_to_ticks(1.5), 75);
        assert_eq!(config.seconds_to_ticks(0.0), 1);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = WorldConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
