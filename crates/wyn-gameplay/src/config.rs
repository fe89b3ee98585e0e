//! Platformer tuning and character stats.
//!
//! All tuning is immutable once a controller is built. Values are loaded from
//! RON and validated against the ranges the movement code assumes.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wyn_common::{ConfigError, Vec2};

/// Horizontal movement tuning.
///
/// Only `air_control_factor` is read by the controller; horizontal velocity
/// is assigned instantly each frame. The acceleration fields are carried for
/// hosts that ease movement themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Nominal walk speed (units/s)
    pub walk_speed: f32,
    /// Fraction of ground speed available while airborne (0-1)
    pub air_control_factor: f32,
    /// Ground acceleration (units/s²)
    pub ground_acceleration: f32,
    /// Air acceleration (units/s²)
    pub air_acceleration: f32,
    /// Ground deceleration (units/s²)
    pub ground_deceleration: f32,
    /// Air deceleration (units/s²)
    pub air_deceleration: f32,
    /// Terminal fall speed (units/s)
    pub max_fall_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 250.0,
            air_control_factor: 0.85,
            ground_acceleration: 1200.0,
            air_acceleration: 600.0,
            ground_deceleration: 1500.0,
            air_deceleration: 200.0,
            max_fall_speed: 600.0,
        }
    }
}

/// Jump tuning. Velocities are negative because +y points down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Vertical velocity of a ground (or coyote) jump
    pub jump_velocity: f32,
    /// Factor applied to rising velocity when jump is released early (0-1)
    pub jump_cut_multiplier: f32,
    /// Grace period after walking off a ledge (ms)
    pub coyote_time_ms: f64,
    /// How long a jump press is remembered before landing (ms)
    pub jump_buffer_ms: f64,
    /// Total jumps available before touching ground again (1-5)
    pub max_jumps: u32,
    /// Vertical velocity of every air jump
    pub double_jump_velocity: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            jump_velocity: -420.0,
            jump_cut_multiplier: 0.4,
            coyote_time_ms: 120.0,
            jump_buffer_ms: 100.0,
            max_jumps: 2,
            double_jump_velocity: -360.0,
        }
    }
}

/// Fast-fall tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastFallConfig {
    /// Total gravity multiplier while fast-falling (>= 1)
    pub multiplier: f32,
    /// Vertical velocity that must be exceeded before fast fall engages
    pub threshold: f32,
}

impl Default for FastFallConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.5,
            threshold: 0.0,
        }
    }
}

/// Collision box of the player body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDimensions {
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// X offset from the sprite origin
    pub offset_x: f32,
    /// Y offset from the sprite origin
    pub offset_y: f32,
}

impl Default for BodyDimensions {
    fn default() -> Self {
        Self {
            width: 24.0,
            height: 40.0,
            offset_x: 4.0,
            offset_y: 8.0,
        }
    }
}

/// Complete platformer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerConfig {
    /// World gravity (units/s²)
    pub gravity: Vec2,
    /// Horizontal movement
    pub movement: MovementConfig,
    /// Jumping
    pub jump: JumpConfig,
    /// Fast fall
    pub fast_fall: FastFallConfig,
    /// Body dimensions
    pub body: BodyDimensions,
}

impl Default for PlatformerConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 800.0),
            movement: MovementConfig::default(),
            jump: JumpConfig::default(),
            fast_fall: FastFallConfig::default(),
            body: BodyDimensions::default(),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value < 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be negative, got {value}")))
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ))
    }
}

fn at_least(field: &'static str, value: f64, min: f64) -> Result<(), ConfigError> {
    in_range(field, value, min, f64::MAX)
}

impl PlatformerConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::invalid("gravity", "must be finite"));
        }

        let m = &self.movement;
        positive("movement.walk_speed", m.walk_speed)?;
        in_range(
            "movement.air_control_factor",
            m.air_control_factor.into(),
            0.0,
            1.0,
        )?;
        positive("movement.ground_acceleration", m.ground_acceleration)?;
        positive("movement.air_acceleration", m.air_acceleration)?;
        positive("movement.ground_deceleration", m.ground_deceleration)?;
        positive("movement.air_deceleration", m.air_deceleration)?;
        positive("movement.max_fall_speed", m.max_fall_speed)?;

        let j = &self.jump;
        negative("jump.jump_velocity", j.jump_velocity)?;
        in_range(
            "jump.jump_cut_multiplier",
            j.jump_cut_multiplier.into(),
            0.0,
            1.0,
        )?;
        at_least("jump.coyote_time_ms", j.coyote_time_ms, 0.0)?;
        at_least("jump.jump_buffer_ms", j.jump_buffer_ms, 0.0)?;
        in_range("jump.max_jumps", j.max_jumps.into(), 1.0, 5.0)?;
        negative("jump.double_jump_velocity", j.double_jump_velocity)?;

        at_least("fast_fall.multiplier", self.fast_fall.multiplier.into(), 1.0)?;
        at_least("fast_fall.threshold", self.fast_fall.threshold.into(), 0.0)?;

        positive("body.width", self.body.width)?;
        positive("body.height", self.body.height)?;
        Ok(())
    }

    /// Parse and validate from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = parse_ron(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a RON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = load_ron(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a RON file, falling back to defaults if it is missing or
    /// invalid.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        or_default(path.as_ref(), |p| Self::load_from(p))
    }
}

/// Per-character stats.
///
/// `jump_force`, `attack_power` and `defense` are consumed by combat and
/// presentation code; the movement controller only reads `max_health` and
/// `speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    /// Maximum health (1-200)
    pub max_health: i32,
    /// Horizontal run speed (units/s)
    pub speed: f32,
    /// Nominal jump strength
    pub jump_force: f32,
    /// Attack power
    pub attack_power: i32,
    /// Defense
    pub defense: i32,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            max_health: 100,
            speed: 250.0,
            jump_force: 420.0,
            attack_power: 10,
            defense: 5,
        }
    }
}

impl CharacterStats {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("stats.max_health", self.max_health.into(), 1.0, 200.0)?;
        positive("stats.speed", self.speed)?;
        positive("stats.jump_force", self.jump_force)?;
        at_least("stats.attack_power", self.attack_power.into(), 0.0)?;
        at_least("stats.defense", self.defense.into(), 0.0)?;
        Ok(())
    }

    /// Parse and validate from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let stats: Self = parse_ron(text)?;
        stats.validate()?;
        Ok(stats)
    }

    /// Load and validate from a RON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let stats: Self = load_ron(path.as_ref())?;
        stats.validate()?;
        Ok(stats)
    }

    /// Load from a RON file, falling back to defaults if it is missing or
    /// invalid.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        or_default(path.as_ref(), |p| Self::load_from(p))
    }
}

pub(crate) fn parse_ron<T: DeserializeOwned>(text: &str) -> Result<T, ConfigError> {
    ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
}

pub(crate) fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    debug!("Reading {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let value = parse_ron(&text)?;
    info!("Loaded {}", path.display());
    Ok(value)
}

pub(crate) fn or_default<T, F>(path: &Path, load: F) -> T
where
    T: Default,
    F: FnOnce(&Path) -> Result<T, ConfigError>,
{
    if !path.exists() {
        info!("{} not found, using defaults", path.display());
        return T::default();
    }
    match load(path) {
        Ok(value) => value,
        Err(e) => {
            warn!("{e}; using defaults");
            T::default()
        }
    }
}
