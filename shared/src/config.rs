//! Gameplay tuning loaded from TOML.
//!
//! Every section is `#[serde(default)]`, so a file only needs the values it
//! overrides; a missing file section falls back to the constants.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;

/// Locomotion tuning shared by every state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTuning {
    pub inertia_bleed_factor: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub acceleration: f32,
    pub air_control_factor: f32,
    pub rotation_speed: f32,
    pub jump_speed: f32,
    pub gravity: f32,
    /// Squared-magnitude zero threshold.
    pub float_math_epsilon: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            inertia_bleed_factor: INERTIA_BLEED_FACTOR,
            walk_speed: WALK_SPEED,
            run_speed: RUN_SPEED,
            acceleration: ACCELERATION,
            air_control_factor: AIR_CONTROL_FACTOR,
            rotation_speed: ROTATION_SPEED,
            jump_speed: JUMP_SPEED,
            gravity: GRAVITY,
            float_math_epsilon: FLOAT_MATH_EPSILON,
        }
    }
}

/// Size of the vertical detection cylinder around an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTuning {
    pub radius: f32,
    pub height: f32,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            radius: INTERACTION_RADIUS,
            height: INTERACTION_HEIGHT,
        }
    }
}

/// Placement of dropped items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTuning {
    /// Distance in front of the actor where the probe starts.
    pub forward_offset: f32,
    /// Height above the actor origin where the probe starts.
    pub probe_height: f32,
    /// How far down the probe reaches.
    pub probe_depth: f32,
    /// Lift above the hit point so the item does not start inside the surface.
    pub surface_lift: f32,
}

impl Default for DropTuning {
    fn default() -> Self {
        Self {
            forward_offset: 1.0,
            probe_height: 1.0,
            probe_depth: 3.0,
            surface_lift: 0.05,
        }
    }
}

/// Props, pushing and projectiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropTuning {
    pub push_force: f32,
    pub dart_shoot_velocity: f32,
    pub dart_time_to_live: f32,
}

impl Default for PropTuning {
    fn default() -> Self {
        Self {
            push_force: CHARACTER_PUSH_FORCE,
            dart_shoot_velocity: DART_SHOOT_VELOCITY,
            dart_time_to_live: DART_TIME_TO_LIVE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    pub character: CharacterTuning,
    pub interaction: InteractionTuning,
    pub drop: DropTuning,
    pub props: PropTuning,
}

impl GameplayConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
