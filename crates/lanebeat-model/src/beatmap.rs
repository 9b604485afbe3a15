use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::{BeatmapError, MalformedBeatmapError};
use crate::note::{Note, NoteType};

/// Default number of notes allowed to share one timestamp after normalization.
pub const DEFAULT_COMBO_CAP: usize = 2;

/// Largest note time or hold duration a beatmap document may carry (2^53 ms).
pub const MAX_TIME_MS: u64 = 1 << 53;

/// A track's notes, sorted by time, plus the audio asset they were written against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Beatmap {
    music: String,
    notes: Vec<Note>,
}

/// Beatmap document as found on disk. Every field is optional here so that
/// validation can report exactly what is missing.
#[derive(Debug, Deserialize)]
struct RawBeatmap {
    #[serde(default)]
    music: Option<String>,
    notes: Vec<RawNote>,
}

#[derive(Debug, Deserialize)]
struct RawNote {
    #[serde(default)]
    lane: Option<i64>,
    #[serde(default)]
    time: Option<Number>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    duration: Option<Number>,
}

/// A JSON millisecond value, floored to whole milliseconds.
enum Millis {
    Whole(u64),
    Negative(f64),
    NonFinite,
    TooLarge,
}

impl Millis {
    fn read(value: &Number) -> Self {
        // Integers are taken exactly; only fractional input goes through f64.
        if let Some(ms) = value.as_u64() {
            return if ms > MAX_TIME_MS {
                Millis::TooLarge
            } else {
                Millis::Whole(ms)
            };
        }
        match value.as_f64() {
            Some(v) if !v.is_finite() => Millis::NonFinite,
            Some(v) if v < 0.0 => Millis::Negative(v),
            Some(v) if v.floor() > MAX_TIME_MS as f64 => Millis::TooLarge,
            Some(v) => Millis::Whole(v.floor() as u64),
            None => Millis::NonFinite,
        }
    }
}

#[derive(Serialize)]
struct WireBeatmap<'a> {
    music: &'a str,
    notes: Vec<WireNote>,
}

#[derive(Serialize)]
struct WireNote {
    lane: usize,
    time: u64,
    #[serde(rename = "type")]
    note_type: NoteType,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u64>,
}

impl RawNote {
    fn validate(self, index: usize, lane_count: usize) -> Result<Note, MalformedBeatmapError> {
        let lane = self
            .lane
            .ok_or(MalformedBeatmapError::MissingLane { index })?;
        let time = self
            .time
            .ok_or(MalformedBeatmapError::MissingTime { index })?;

        if lane < 0 || lane as u64 >= lane_count as u64 {
            return Err(MalformedBeatmapError::LaneOutOfRange {
                index,
                lane,
                lane_count,
            });
        }
        let time_ms = match Millis::read(&time) {
            Millis::Whole(ms) => ms,
            Millis::Negative(time_ms) => {
                return Err(MalformedBeatmapError::NegativeTime { index, time_ms });
            }
            Millis::NonFinite => return Err(MalformedBeatmapError::NonFiniteTime { index }),
            Millis::TooLarge => return Err(MalformedBeatmapError::TimeOutOfRange { index }),
        };

        let note_type = match self.kind.as_deref() {
            None => NoteType::Tap,
            Some(kind) => NoteType::parse(kind).ok_or_else(|| MalformedBeatmapError::UnknownType {
                index,
                kind: kind.to_string(),
            })?,
        };

        let lane = lane as usize;
        match note_type {
            NoteType::Tap => Ok(Note::tap(lane, time_ms)),
            NoteType::Hold => {
                let duration = self
                    .duration
                    .as_ref()
                    .ok_or(MalformedBeatmapError::InvalidHoldDuration { index })?;
                match Millis::read(duration) {
                    Millis::Whole(ms) if ms >= 1 => Ok(Note::hold(lane, time_ms, ms)),
                    Millis::TooLarge => Err(MalformedBeatmapError::TimeOutOfRange { index }),
                    _ => Err(MalformedBeatmapError::InvalidHoldDuration { index }),
                }
            }
        }
    }
}

impl Beatmap {
    /// Build a beatmap from notes in any order. Notes are stably sorted by time.
    pub fn new(music: impl Into<String>, mut notes: Vec<Note>) -> Self {
        notes.sort_by_key(|n| n.time_ms);
        Self {
            music: music.into(),
            notes,
        }
    }

    /// Parse and validate a beatmap document.
    ///
    /// Fails if any note lacks `lane` or `time`, has a lane outside
    /// `0..lane_count`, or has a time or duration that is negative or above
    /// [`MAX_TIME_MS`]. The notes need not be sorted.
    pub fn load(raw: &[u8], lane_count: usize) -> Result<Self, MalformedBeatmapError> {
        let doc: RawBeatmap = serde_json::from_slice(raw)
            .map_err(|e| MalformedBeatmapError::Syntax(e.to_string()))?;

        let notes = doc
            .notes
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.validate(index, lane_count))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Parsed {} notes", notes.len());
        Ok(Self::new(doc.music.unwrap_or_default(), notes))
    }

    /// Load a beatmap file from disk.
    pub fn load_from<P: AsRef<Path>>(path: P, lane_count: usize) -> Result<Self, BeatmapError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| BeatmapError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let beatmap = Self::load(&bytes, lane_count)?;
        info!(
            "Loaded beatmap {} ({} notes, music {:?})",
            path.display(),
            beatmap.len(),
            beatmap.music
        );
        Ok(beatmap)
    }

    /// Cap the number of notes sharing an identical time.
    ///
    /// Notes are grouped by exact `time_ms`; in a group larger than `cap`
    /// only the first `cap` notes (in current order) survive.
    pub fn normalize(&self, cap: usize) -> Self {
        let mut per_time: HashMap<u64, usize> = HashMap::new();
        let notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|note| {
                let seen = per_time.entry(note.time_ms).or_insert(0);
                *seen += 1;
                *seen <= cap
            })
            .copied()
            .collect();

        let dropped = self.notes.len() - notes.len();
        if dropped > 0 {
            debug!("Normalization dropped {dropped} notes over the cap of {cap}");
        }

        Self {
            music: self.music.clone(),
            notes,
        }
    }

    /// Serialize to the beatmap JSON document.
    ///
    /// Notes that `load` would reject as out of range are refused here too.
    pub fn serialize(&self) -> Result<Vec<u8>, BeatmapError> {
        if let Some(index) = self.notes.iter().position(|n| {
            n.time_ms > MAX_TIME_MS || n.duration_ms.is_some_and(|d| d > MAX_TIME_MS)
        }) {
            return Err(MalformedBeatmapError::TimeOutOfRange { index }.into());
        }
        let wire = WireBeatmap {
            music: &self.music,
            notes: self
                .notes
                .iter()
                .map(|n| WireNote {
                    lane: n.lane,
                    time: n.time_ms,
                    note_type: n.note_type,
                    duration: n.duration_ms,
                })
                .collect(),
        };
        serde_json::to_vec_pretty(&wire).map_err(BeatmapError::Serialize)
    }

    /// Serialize and write to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), BeatmapError> {
        let path = path.as_ref();
        let bytes = self.serialize()?;
        fs::write(path, bytes).map_err(|source| BeatmapError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn music(&self) -> &str {
        &self.music
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Time of the last note end, or 0 for an empty beatmap.
    pub fn duration_ms(&self) -> u64 {
        self.notes.iter().map(Note::end_time_ms).max().unwrap_or(0)
    }

    /// Size of the largest group of notes sharing one timestamp.
    pub fn max_notes_per_timestamp(&self) -> usize {
        let mut per_time: HashMap<u64, usize> = HashMap::new();
        for note in &self.notes {
            *per_time.entry(note.time_ms).or_insert(0) += 1;
        }
        per_time.into_values().max().unwrap_or(0)
    }
}
