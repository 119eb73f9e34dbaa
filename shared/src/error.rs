use std::path::PathBuf;
use thiserror::Error;

use crate::model::ModelId;

/// Failure to read or parse a TOML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure to build an actor; the actor is not registered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("model {0:?} could not be resolved: {1}")]
    ModelUnavailable(ModelId, String),
}

/// Raised by an interactable's effect; always caught and logged by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteractionError {
    #[error("interaction with {target} failed: {reason}")]
    Failed { target: String, reason: String },
}

/// Raised by a usable item's primary or secondary action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UseError {
    #[error("item {0} has nothing to fire from")]
    MissingMuzzle(String),
}
