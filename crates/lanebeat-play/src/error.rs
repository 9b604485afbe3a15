use std::path::PathBuf;

use lanebeat_model::{BeatmapError, InvalidLaneError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayError {
    /// A clock-dependent operation ran before any track was loaded.
    #[error("No audio track is loaded")]
    NoAudioLoaded,

    #[error(transparent)]
    InvalidLane(#[from] InvalidLaneError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Beatmap(#[from] BeatmapError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config")]
    Serialize(#[source] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
