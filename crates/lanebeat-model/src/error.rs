use std::path::PathBuf;
use thiserror::Error;

/// Reasons a beatmap document is rejected. Loading is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedBeatmapError {
    #[error("beatmap is not valid JSON: {0}")]
    Syntax(String),

    #[error("note {index} has no lane")]
    MissingLane { index: usize },

    #[error("note {index} has no time")]
    MissingTime { index: usize },

    #[error("note {index}: lane {lane} is outside 0..{lane_count}")]
    LaneOutOfRange {
        index: usize,
        lane: i64,
        lane_count: usize,
    },

    #[error("note {index}: negative time {time_ms}")]
    NegativeTime { index: usize, time_ms: f64 },

    #[error("note {index}: time is not a finite number")]
    NonFiniteTime { index: usize },

    #[error("note {index}: time or duration exceeds 2^53 ms")]
    TimeOutOfRange { index: usize },

    #[error("note {index}: unknown note type {kind:?}")]
    UnknownType { index: usize, kind: String },

    #[error("note {index}: hold note needs a positive duration")]
    InvalidHoldDuration { index: usize },
}

#[derive(Debug, Error)]
pub enum BeatmapError {
    #[error("Failed to read beatmap file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write beatmap file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Malformed(#[from] MalformedBeatmapError),

    #[error("Failed to serialize beatmap")]
    Serialize(#[source] serde_json::Error),
}

/// An input could not be mapped onto a configured lane.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidLaneError {
    #[error("lane {lane} is outside 0..{lane_count}")]
    OutOfRange { lane: i64, lane_count: usize },

    #[error("key {0:?} is not bound to a lane")]
    UnboundKey(String),

    #[error("input names neither a lane nor a key")]
    Unspecified,

    #[error("pointer x={x} is outside the play area (width {width})")]
    PointerOutside { x: f64, width: f64 },
}
