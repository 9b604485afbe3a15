use serde::{Deserialize, Serialize};

/// Type of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    #[default]
    Tap,
    Hold,
}

impl NoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Hold => "hold",
        }
    }

    /// Parse the beatmap file spelling of a note type.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "tap" => Some(Self::Tap),
            "hold" => Some(Self::Hold),
            _ => None,
        }
    }
}

/// A single note in a beatmap.
///
/// `duration_ms` is `Some` exactly when `note_type` is [`NoteType::Hold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub lane: usize,
    pub time_ms: u64,
    pub note_type: NoteType,
    pub duration_ms: Option<u64>,
}

impl Note {
    /// Create a new tap note.
    pub fn tap(lane: usize, time_ms: u64) -> Self {
        Self {
            lane,
            time_ms,
            note_type: NoteType::Tap,
            duration_ms: None,
        }
    }

    /// Create a new hold note. A zero duration is bumped to 1ms.
    pub fn hold(lane: usize, time_ms: u64, duration_ms: u64) -> Self {
        Self {
            lane,
            time_ms,
            note_type: NoteType::Hold,
            duration_ms: Some(duration_ms.max(1)),
        }
    }

    /// Returns true if this is a hold note.
    pub fn is_hold(&self) -> bool {
        matches!(self.note_type, NoteType::Hold)
    }

    /// Time at which the note ends (release time for holds).
    pub fn end_time_ms(&self) -> u64 {
        self.time_ms.saturating_add(self.duration_ms.unwrap_or(0))
    }
}
