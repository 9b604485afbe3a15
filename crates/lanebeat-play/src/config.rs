use std::fs;
use std::path::Path;

use lanebeat_model::{DEFAULT_COMBO_CAP, DEFAULT_LANE_COUNT, LaneMap};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a press does when its lane has no note in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedInput {
    /// Stray input ends the session.
    #[default]
    GameOver,
    /// Stray input is dropped.
    Ignore,
}

/// Gameplay policy. One engine covers every game variant through these flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayConfig {
    pub lane_count: usize,
    /// Largest |input - note time| that still counts as a hit.
    pub hit_window_ms: f64,
    /// Accept any timing as a hit.
    pub forgiving_mode: bool,
    pub on_unmatched_input: UnmatchedInput,
    /// Presses must follow note order across lanes; pressing any lane other
    /// than the earliest active note's lane counts as unmatched input.
    pub enforce_note_order: bool,
    /// Max notes sharing a timestamp. `None` keeps every note.
    pub combo_cap_per_timestamp: Option<usize>,
    /// Spawn this much earlier than the travel time alone would.
    pub lead_ms: f64,
    /// Fall speed in pixels per second.
    pub note_speed: f64,
    /// Distance from the spawn point to the hit zone, in pixels.
    pub hit_zone_y: f64,
    /// Full lane length in pixels. Notes past the bottom expire.
    pub lane_height: f64,
    /// Note sprite height in pixels; same-lane notes closer than this form a combo.
    pub note_height: f64,
    /// End the session on any miss.
    pub game_over_on_miss: bool,
    /// Pause the music whenever a note spawns until it is hit.
    pub pause_on_spawn: bool,
    /// Start fading when no hit happened for this long while notes are active.
    pub idle_fade_ms: Option<f64>,
    pub idle_volume_floor: f32,
    pub music_volume: f32,
    pub miss_volume: f32,
    pub miss_fade_ms: f64,
    pub restore_volume_ms: f64,
    /// Polling interval for drivers that run the engine on a fixed tick.
    pub tick_interval_ms: f64,
    /// Key bindings for input log entries that name a key instead of a lane.
    pub lane_map: LaneMap,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            hit_window_ms: 120.0,
            forgiving_mode: false,
            on_unmatched_input: UnmatchedInput::GameOver,
            enforce_note_order: false,
            combo_cap_per_timestamp: Some(DEFAULT_COMBO_CAP),
            lead_ms: 0.0,
            note_speed: 300.0,
            hit_zone_y: 500.0,
            lane_height: 600.0,
            note_height: 50.0,
            game_over_on_miss: true,
            pause_on_spawn: false,
            idle_fade_ms: Some(500.0),
            idle_volume_floor: 0.0,
            music_volume: 1.0,
            miss_volume: 0.2,
            miss_fade_ms: 300.0,
            restore_volume_ms: 300.0,
            tick_interval_ms: 10.0,
            lane_map: LaneMap::default(),
        }
    }
}

impl PlayConfig {
    /// Time a note takes to fall from spawn to the hit zone.
    pub fn travel_time_ms(&self) -> f64 {
        self.hit_zone_y / self.note_speed * 1000.0
    }

    /// Time past its hit instant after which an unresolved note falls off the lane.
    pub fn expiry_ms(&self) -> f64 {
        (self.lane_height - self.hit_zone_y) / self.note_speed * 1000.0
    }

    /// Time separation below which two same-lane notes overlap on screen.
    pub fn combo_window_ms(&self) -> f64 {
        self.note_height / self.note_speed * 1000.0
    }

    /// Check field ranges. Suspicious but legal combinations are only logged.
    // Negated comparisons also reject NaN.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count == 0 {
            return Err(ConfigError::invalid("lane_count", "must be at least 1"));
        }
        if !(self.hit_window_ms >= 0.0) {
            return Err(ConfigError::invalid("hit_window_ms", "must be >= 0"));
        }
        if self.combo_cap_per_timestamp == Some(0) {
            return Err(ConfigError::invalid(
                "combo_cap_per_timestamp",
                "must be at least 1 (use null to disable)",
            ));
        }
        if !(self.note_speed > 0.0) {
            return Err(ConfigError::invalid("note_speed", "must be > 0"));
        }
        if !(self.hit_zone_y > 0.0) {
            return Err(ConfigError::invalid("hit_zone_y", "must be > 0"));
        }
        if !(self.lane_height >= self.hit_zone_y) {
            return Err(ConfigError::invalid(
                "lane_height",
                "must not be shorter than hit_zone_y",
            ));
        }
        if !(self.lead_ms >= 0.0) {
            return Err(ConfigError::invalid("lead_ms", "must be >= 0"));
        }
        if !(self.tick_interval_ms > 0.0) {
            return Err(ConfigError::invalid("tick_interval_ms", "must be > 0"));
        }
        for (field, value) in [
            ("music_volume", self.music_volume),
            ("miss_volume", self.miss_volume),
            ("idle_volume_floor", self.idle_volume_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, "must be within 0.0..=1.0"));
            }
        }
        for (field, value) in [
            ("miss_fade_ms", self.miss_fade_ms),
            ("restore_volume_ms", self.restore_volume_ms),
            ("note_height", self.note_height),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::invalid(field, "must be >= 0"));
            }
        }
        if let Some(idle) = self.idle_fade_ms
            && !(idle >= 0.0)
        {
            return Err(ConfigError::invalid("idle_fade_ms", "must be >= 0"));
        }

        if self.lane_map.lane_count() != self.lane_count {
            warn!(
                "Key bindings cover {} lanes but lane_count is {}",
                self.lane_map.lane_count(),
                self.lane_count
            );
        }
        if self.pause_on_spawn && !self.forgiving_mode {
            warn!(
                "pause_on_spawn freezes the clock before notes reach the hit zone; \
                 without forgiving_mode every hit will be judged a miss"
            );
        }
        if self.expiry_ms() < self.hit_window_ms {
            warn!(
                "Notes expire {:.0}ms after their time, inside the {:.0}ms hit window",
                self.expiry_ms(),
                self.hit_window_ms
            );
        }
        Ok(())
    }

    /// Loads config from a specified path.
    /// Returns default config if file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Saves config to a specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, content).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Recorder settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub lane_count: usize,
    /// Presses shorter than this become taps, longer ones holds.
    pub tap_threshold_ms: f64,
    /// Duration given to hold notes placed by step entry.
    pub default_hold_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            tap_threshold_ms: 200.0,
            default_hold_ms: 500,
        }
    }
}

impl EditorConfig {
    // Negated comparisons also reject NaN.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count == 0 {
            return Err(ConfigError::invalid("lane_count", "must be at least 1"));
        }
        if !(self.tap_threshold_ms >= 0.0) {
            return Err(ConfigError::invalid("tap_threshold_ms", "must be >= 0"));
        }
        if self.default_hold_ms == 0 {
            return Err(ConfigError::invalid("default_hold_ms", "must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = PlayConfig::default();
        assert_eq!(config.lane_count, 4);
        assert!((config.hit_window_ms - 120.0).abs() < f64::EPSILON);
        assert!(!config.forgiving_mode);
        assert_eq!(config.on_unmatched_input, UnmatchedInput::GameOver);
        assert_eq!(config.combo_cap_per_timestamp, Some(2));
        assert!((config.lead_ms - 0.0).abs() < f64::EPSILON);
        assert_eq!(config.idle_fade_ms, Some(500.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_timings() {
        let config = PlayConfig::default();
        assert!((config.travel_time_ms() - 1666.666).abs() < 0.01);
        assert!((config.expiry_ms() - 333.333).abs() < 0.01);
        assert!((config.combo_window_ms() - 166.666).abs() < 0.01);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            PlayConfig {
                lane_count: 0,
                ..Default::default()
            },
            PlayConfig {
                combo_cap_per_timestamp: Some(0),
                ..Default::default()
            },
            PlayConfig {
                note_speed: 0.0,
                ..Default::default()
            },
            PlayConfig {
                lane_height: 100.0,
                ..Default::default()
            },
            PlayConfig {
                miss_volume: 1.5,
                ..Default::default()
            },
            PlayConfig {
                hit_window_ms: f64::NAN,
                ..Default::default()
            },
            PlayConfig {
                idle_fade_ms: Some(-1.0),
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlayConfig =
            serde_json::from_str(r#"{"hit_window_ms": 80, "on_unmatched_input": "ignore"}"#)
                .unwrap();
        assert!((config.hit_window_ms - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.on_unmatched_input, UnmatchedInput::Ignore);
        assert_eq!(config.lane_count, 4);
    }

    #[test]
    fn test_null_cap_disables_capping() {
        let config: PlayConfig =
            serde_json::from_str(r#"{"combo_cap_per_timestamp": null}"#).unwrap();
        assert_eq!(config.combo_cap_per_timestamp, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_io() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("play.json");

        let config = PlayConfig {
            forgiving_mode: true,
            pause_on_spawn: true,
            lead_ms: 500.0,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = PlayConfig::load_from(&path).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let dir = tempdir().unwrap();
        let config = PlayConfig::load_from(dir.path().join("nonexistent.json")).unwrap();
        assert_eq!(config, PlayConfig::default());
    }

    #[test]
    fn test_load_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"lane_count": 0}"#).unwrap();
        assert!(matches!(
            PlayConfig::load_from(&path),
            Err(ConfigError::Invalid {
                field: "lane_count",
                ..
            })
        ));
    }

    #[test]
    fn test_editor_defaults() {
        let config = EditorConfig::default();
        assert!((config.tap_threshold_ms - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.default_hold_ms, 500);
        assert!(config.validate().is_ok());
    }
}
