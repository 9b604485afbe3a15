use lanebeat_model::Note;

use crate::judge::Judgment;
use crate::session::PlaySummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// A note was missed or expired while misses end the session.
    Miss { note_index: usize },
    /// A press found no note in its lane.
    UnmatchedInput { lane: usize },
    /// A press skipped ahead of the earliest note when note order is enforced.
    WrongLane { lane: usize, expected: usize },
}

/// Notifications for presentation, in the order they happened within a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayEvent {
    NoteSpawned {
        index: usize,
        note: Note,
        combo: Option<u32>,
    },
    NoteResolved {
        note: Note,
        judgment: Judgment,
    },
    GameOver {
        reason: GameOverReason,
    },
    VolumeChanged {
        level: f32,
    },
    /// Music paused until the spawned note is hit.
    AudioPaused,
    AudioResumed,
    Cleared {
        summary: PlaySummary,
    },
}
