// Beatmap data model: notes, lane mapping, load/normalize/serialize.

mod beatmap;
mod error;
pub mod lane;
mod note;

pub use beatmap::{Beatmap, DEFAULT_COMBO_CAP, MAX_TIME_MS};
pub use error::{BeatmapError, InvalidLaneError, MalformedBeatmapError};
pub use lane::{DEFAULT_LANE_COUNT, LaneMap};
pub use note::{Note, NoteType};
