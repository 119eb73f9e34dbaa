//! Host settings loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid config.

use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use shared::config::GameplayConfig;
use shared::constants::MAX_FRAME_DT;
use shared::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    /// Including the host.
    pub max_players: usize,
    pub server_name: String,
    /// Display name of the host's own actor.
    pub host_name: String,
    /// Fixed simulation rate.
    pub physics_hz: u32,
    /// Upper bound on a single frame step, in seconds.
    pub max_frame_dt: f32,
    pub spawn_point: Vector3<f32>,
    /// Distance between consecutive spawns along +X.
    pub spawn_spacing: f32,
    pub ground_height: f32,
    pub gameplay: GameplayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".into(),
            port: 24565,
            max_players: 8,
            server_name: "Irksome Island Server".into(),
            host_name: "Host".into(),
            physics_hz: 60,
            max_frame_dt: MAX_FRAME_DT,
            spawn_point: Vector3::zeros(),
            spawn_spacing: 2.0,
            ground_height: 0.0,
            gameplay: GameplayConfig::default(),
        }
    }
}

impl ServerConfig {
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

    /// Seconds per physics tick.
    pub fn physics_dt(&self) -> f32 {
        1.0 / self.physics_hz.max(1) as f32
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
