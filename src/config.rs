//! Simulation configuration
//!
//! Every balance number the engine needs that is not per-move data lives
//! here. Defaults are the shipped balance. Values are authored as
//! floats/ints in world units and converted to fixed-point once, when a
//! [`Physics`] is built.

use std::env;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, WORLD_LIMIT, to_fixed, from_int};
use crate::core::hash::{StateHash, hash_with_domain};
use crate::TICK_RATE;

/// Environment variable holding the path of a JSON config file.
pub const CONFIG_ENV_VAR: &str = "TEKKEN_LITE_CONFIG";

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Stage bounds and spawn points
    pub arena: ArenaConfig,
    /// Movement tuning
    pub physics: PhysicsConfig,
    /// Hit/block rules
    pub combat: CombatRules,
    /// Timer and round counts
    pub round: RoundConfig,
}

/// Stage bounds, in whole world units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Left wall
    pub left: i32,
    /// Right wall
    pub right: i32,
    /// Anchor x of player 1 at round start
    pub p1_spawn_x: i32,
    /// Anchor x of player 2 at round start
    pub p2_spawn_x: i32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            left: 40,
            right: 960,
            p1_spawn_x: 228,
            p2_spawn_x: 772,
        }
    }
}

impl ArenaConfig {
    /// Left wall in fixed-point.
    pub fn left_fixed(&self) -> Fixed {
        from_int(self.left)
    }

    /// Right wall in fixed-point.
    pub fn right_fixed(&self) -> Fixed {
        from_int(self.right)
    }

    /// Usable width in world units.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

/// Movement tuning in world units per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration per tick while airborne
    pub gravity: f64,
    /// Horizontal walk speed
    pub move_speed: f64,
    /// Initial upward speed of a jump
    pub jump_speed: f64,
    /// Terminal fall speed
    pub max_fall: f64,
    /// Horizontal velocity multiplier per tick when not walking
    pub friction: f64,
    /// Horizontal speed below which a sliding fighter stops
    pub stop_threshold: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.85,
            move_speed: 6.0,
            jump_speed: 16.5,
            max_fall: 18.0,
            friction: 0.85,
            stop_threshold: 0.15,
        }
    }
}

impl PhysicsConfig {
    /// Convert to the fixed-point form used inside the tick.
    pub fn to_physics(&self) -> Physics {
        Physics {
            gravity: to_fixed(self.gravity),
            move_speed: to_fixed(self.move_speed),
            jump_speed: to_fixed(self.jump_speed),
            max_fall: to_fixed(self.max_fall),
            friction: to_fixed(self.friction),
            stop_threshold: to_fixed(self.stop_threshold),
        }
    }
}

/// Fixed-point physics tuning. Built once per simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Physics {
    /// Downward acceleration per tick
    pub gravity: Fixed,
    /// Walk speed per tick
    pub move_speed: Fixed,
    /// Jump take-off speed
    pub jump_speed: Fixed,
    /// Terminal fall speed
    pub max_fall: Fixed,
    /// Ground friction multiplier
    pub friction: Fixed,
    /// Stop threshold
    pub stop_threshold: Fixed,
}

/// Hit and block rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Health at round start
    pub max_health: u32,
    /// Whether a fighter can block while airborne
    pub allow_air_block: bool,
    /// Whether a block only works when facing the attacker
    pub require_facing_to_block: bool,
    /// Whether pushback absorbed by a wall moves the attacker back instead
    pub corner_pushback: bool,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            max_health: 100,
            allow_air_block: false,
            require_facing_to_block: true,
            corner_pushback: true,
        }
    }
}

/// Timer and round structure. This is the argument of `Simulation::reset`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Round length in seconds
    pub round_time_secs: u32,
    /// Rounds needed to win the match (2 = best of three)
    pub rounds_to_win: u8,
    /// Hard cap on rounds played, draws included
    pub max_rounds: u8,
    /// Freeze before each round ("READY... FIGHT!"), in ticks
    pub intro_ticks: u32,
    /// Hold after a round is decided, in ticks
    pub end_ticks: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_time_secs: 60,
            rounds_to_win: 2,
            max_rounds: 5,
            intro_ticks: 60,
            end_ticks: 60,
        }
    }
}

impl RoundConfig {
    /// Round length in ticks.
    pub fn round_ticks(&self) -> u32 {
        self.round_time_secs.saturating_mul(TICK_RATE)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config JSON is malformed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its valid range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::game::error::CombatError {
    fn from(err: ConfigError) -> Self {
        crate::game::error::CombatError::InvalidConfig(err.to_string())
    }
}

impl SimConfig {
    /// Parse from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load from the file named by `TEKKEN_LITE_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_path(path),
            _ => Ok(Self::default()),
        }
    }

    /// Check value ranges. Body-size checks against the arena happen when
    /// the simulation is built, since body sizes come from move tables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        if arena.right <= arena.left {
            return Err(ConfigError::Invalid(format!(
                "arena right ({}) must be greater than left ({})",
                arena.right, arena.left
            )));
        }
        for spawn in [arena.p1_spawn_x, arena.p2_spawn_x] {
            if spawn < arena.left || spawn > arena.right {
                return Err(ConfigError::Invalid(format!(
                    "spawn x {} outside arena [{}, {}]",
                    spawn, arena.left, arena.right
                )));
            }
        }
        // Keep every coordinate well inside Q16.16 range
        if arena.left < -WORLD_LIMIT || arena.right > WORLD_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "arena must fit within ±{} units",
                WORLD_LIMIT
            )));
        }

        let physics = &self.physics;
        let finite_non_negative = [
            ("gravity", physics.gravity),
            ("move_speed", physics.move_speed),
            ("jump_speed", physics.jump_speed),
            ("max_fall", physics.max_fall),
            ("stop_threshold", physics.stop_threshold),
        ];
        for (name, value) in finite_non_negative {
            if !value.is_finite() || !(0.0..=1000.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("physics.{} = {}", name, value)));
            }
        }
        if !physics.friction.is_finite() || !(0.0..=1.0).contains(&physics.friction) {
            return Err(ConfigError::Invalid(format!(
                "physics.friction must be in [0, 1], got {}",
                physics.friction
            )));
        }


        // A jump must come back down below the height limit
        let fixed = physics.to_physics();
        if fixed.jump_speed > 0 {
            if fixed.gravity <= 0 {
                return Err(ConfigError::Invalid(
                    "physics.gravity must be > 0 when jump_speed > 0".into(),
                ));
            }
            let v = fixed.jump_speed as i64;
            let apex = v * v / (2 * fixed.gravity as i64) + v;
            if apex > from_int(WORLD_LIMIT) as i64 {
                return Err(ConfigError::Invalid(format!(
                    "jump apex exceeds {} units (jump_speed {}, gravity {})",
                    WORLD_LIMIT, physics.jump_speed, physics.gravity
                )));
            }
        }

        if self.combat.max_health == 0 {
            return Err(ConfigError::Invalid("combat.max_health must be > 0".into()));
        }

        let round = &self.round;
        if round.round_time_secs == 0 {
            return Err(ConfigError::Invalid("round.round_time_secs must be > 0".into()));
        }
        if round.rounds_to_win == 0 {
            return Err(ConfigError::Invalid("round.rounds_to_win must be > 0".into()));
        }
        if round.max_rounds < round.rounds_to_win {
            return Err(ConfigError::Invalid(format!(
                "round.max_rounds ({}) must be >= rounds_to_win ({})",
                round.max_rounds, round.rounds_to_win
            )));
        }

        Ok(())
    }

    /// Hash of the canonical JSON form. Recorded in transcripts so a replay
    /// can tell it is running under the same rules.
    pub fn config_hash(&self) -> StateHash {
        // Serializing plain data structs to JSON cannot fail
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hash_with_domain(b"TEKKEN_LITE_CONFIG_V1", &bytes)
    }
}
