//! Simulation configuration parsing from locomotor.toml files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::game::constants::{
    character as character_consts, movement as movement_consts, physics as physics_consts,
    stamina as stamina_consts,
};

/// Physics world section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity magnitude (m/s², applied along -Y)
    pub gravity: f32,
    /// Fixed tick duration in seconds
    pub timestep: f32,
    /// Maximum number of fixed ticks a single frame may run
    pub max_ticks_per_frame: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: physics_consts::DEFAULT_GRAVITY,
            timestep: physics_consts::TIMESTEP,
            max_ticks_per_frame: physics_consts::MAX_TICKS_PER_FRAME,
        }
    }
}

/// Character body section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub radius: f32,
    pub height: f32,
    pub mass: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            radius: character_consts::RADIUS,
            height: character_consts::HEIGHT,
            mass: character_consts::MASS,
        }
    }
}

/// Ground probe section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Ray length from the body center
    pub check_distance: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            check_distance: character_consts::GROUND_CHECK_DISTANCE,
        }
    }
}

/// Stamina pool section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    pub max: f32,
    /// Passive regeneration per second
    pub regen_per_second: f32,
    /// Value the pool must reach again after exhaustion before it can be spent
    pub recovery_threshold: f32,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            max: stamina_consts::MAX,
            regen_per_second: stamina_consts::REGEN_PER_SECOND,
            recovery_threshold: stamina_consts::RECOVERY_THRESHOLD,
        }
    }
}

/// Locomotion and ability tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub smooth_time: f32,

    pub sprint_multiplier: f32,
    pub sprint_drain_per_second: f32,

    pub jump_strength: f32,
    pub max_jumps: u32,
    /// Stamina charged for every jump after the first since ground contact (0 = free)
    pub double_jump_cost: f32,

    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub dash_cost: f32,
    /// Skip walk/sprint/jump while a dash or dive is active
    pub disable_control_during_burst: bool,

    pub dive_speed: f32,
    pub dive_down_multiplier: f32,
    pub dive_cost: f32,

    pub fall_multiplier: f32,
    /// Degrees per second at full rotation intent
    pub rotation_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: movement_consts::WALK_SPEED,
            smooth_time: movement_consts::SMOOTH_TIME,
            sprint_multiplier: movement_consts::SPRINT_MULTIPLIER,
            sprint_drain_per_second: movement_consts::SPRINT_DRAIN_PER_SECOND,
            jump_strength: movement_consts::JUMP_STRENGTH,
            max_jumps: movement_consts::MAX_JUMPS,
            double_jump_cost: movement_consts::DOUBLE_JUMP_COST,
            dash_speed: movement_consts::DASH_SPEED,
            dash_duration: movement_consts::DASH_DURATION,
            dash_cooldown: movement_consts::DASH_COOLDOWN,
            dash_cost: movement_consts::DASH_COST,
            disable_control_during_burst: true,
            dive_speed: movement_consts::DIVE_SPEED,
            dive_down_multiplier: movement_consts::DIVE_DOWN_MULTIPLIER,
            dive_cost: movement_consts::DIVE_COST,
            fall_multiplier: movement_consts::FALL_MULTIPLIER,
            rotation_speed: movement_consts::ROTATION_SPEED,
        }
    }
}

/// Simulation configuration from locomotor.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Arena origin; observations report positions relative to it
    #[serde(default)]
    pub arena_origin: [f32; 3],
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub character: CharacterConfig,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub stamina: StaminaConfig,
    #[serde(default)]
    pub movement: MovementConfig,
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML (used by `locomotor init`)
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject values the controller cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        ensure(physics.timestep > 0.0, "physics.timestep must be > 0")?;
        ensure(physics.gravity >= 0.0, "physics.gravity must be >= 0")?;
        ensure(
            physics.max_ticks_per_frame > 0,
            "physics.max_ticks_per_frame must be > 0",
        )?;

        let character = &self.character;
        ensure(character.radius > 0.0, "character.radius must be > 0")?;
        ensure(
            character.height >= 2.0 * character.radius,
            "character.height must be at least twice the radius",
        )?;
        ensure(character.mass > 0.0, "character.mass must be > 0")?;

        ensure(
            self.ground.check_distance > 0.0,
            "ground.check_distance must be > 0",
        )?;

        let stamina = &self.stamina;
        ensure(stamina.max > 0.0, "stamina.max must be > 0")?;
        ensure(
            stamina.regen_per_second >= 0.0,
            "stamina.regen_per_second must be >= 0",
        )?;
        ensure(
            (0.0..=stamina.max).contains(&stamina.recovery_threshold),
            "stamina.recovery_threshold must lie within [0, max]",
        )?;

        self.movement.validate()
    }
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.walk_speed >= 0.0, "movement.walk_speed must be >= 0")?;
        ensure(self.smooth_time >= 0.0, "movement.smooth_time must be >= 0")?;
        ensure(
            self.sprint_multiplier >= 1.0,
            "movement.sprint_multiplier must be >= 1",
        )?;
        ensure(
            self.fall_multiplier >= 1.0,
            "movement.fall_multiplier must be >= 1",
        )?;
        let non_negative = [
            (self.sprint_drain_per_second, "movement.sprint_drain_per_second"),
            (self.jump_strength, "movement.jump_strength"),
            (self.double_jump_cost, "movement.double_jump_cost"),
            (self.dash_speed, "movement.dash_speed"),
            (self.dash_duration, "movement.dash_duration"),
            (self.dash_cooldown, "movement.dash_cooldown"),
            (self.dash_cost, "movement.dash_cost"),
            (self.dive_speed, "movement.dive_speed"),
            (self.dive_down_multiplier, "movement.dive_down_multiplier"),
            (self.dive_cost, "movement.dive_cost"),
        ];
        for (value, name) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0")));
            }
        }
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse {path}: {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
