// Playback engine: clock, note scheduling, hit judgment and the beatmap recorder.

pub mod audio;
pub mod autoplay;
pub mod clock;
pub mod config;
pub mod engine;
mod error;
pub mod event;
pub mod fader;
pub mod input;
pub mod judge;
pub mod recorder;
pub mod scheduler;
pub mod session;

pub use audio::{AudioSource, SimulatedAudio};
pub use clock::{ClockState, PlaybackClock};
pub use config::{EditorConfig, PlayConfig, UnmatchedInput};
pub use engine::PlayEngine;
pub use error::{ConfigError, PlayError};
pub use event::{GameOverReason, PlayEvent};
pub use fader::VolumeFader;
pub use input::{Edge, InputEvent, InputLogger, InputQueue, KeyInputLog};
pub use judge::{HitJudge, HitOutcome, Judgment, TimingDirection, TimingStats};
pub use recorder::BeatmapRecorder;
pub use scheduler::{NoteScheduler, Spawn};
pub use session::{NoteState, PlaySummary, Session};

#[cfg(test)]
mod test_utils;
