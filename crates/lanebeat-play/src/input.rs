use std::collections::VecDeque;

use lanebeat_model::lane::check_lane;
use lanebeat_model::{InvalidLaneError, LaneMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Down,
    Up,
}

/// A lane press or release, stamped with the playback position it happened at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub lane: usize,
    pub edge: Edge,
    pub time_ms: f64,
}

impl InputEvent {
    pub fn down(lane: usize, time_ms: f64) -> Self {
        Self {
            lane,
            edge: Edge::Down,
            time_ms,
        }
    }

    pub fn up(lane: usize, time_ms: f64) -> Self {
        Self {
            lane,
            edge: Edge::Up,
            time_ms,
        }
    }
}

/// FIFO of input events waiting for the next tick.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One entry of a recorded input log file.
///
/// An entry names either a lane index or a key; hand-written logs usually use keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInputLog {
    /// Playback position in milliseconds.
    pub time_ms: f64,
    /// Raw lane index, validated on conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<i64>,
    /// Key name, looked up in the lane map when `lane` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// true = pressed, false = released.
    pub pressed: bool,
}

impl KeyInputLog {
    pub fn to_event(
        &self,
        lane_map: &LaneMap,
        lane_count: usize,
    ) -> Result<InputEvent, InvalidLaneError> {
        let raw = match (self.lane, &self.key) {
            (Some(lane), _) => lane,
            (None, Some(key)) => lane_map.map_key(key)? as i64,
            (None, None) => return Err(InvalidLaneError::Unspecified),
        };
        let lane = check_lane(raw, lane_count)?;
        Ok(if self.pressed {
            InputEvent::down(lane, self.time_ms)
        } else {
            InputEvent::up(lane, self.time_ms)
        })
    }
}

impl From<InputEvent> for KeyInputLog {
    fn from(event: InputEvent) -> Self {
        Self {
            time_ms: event.time_ms,
            lane: Some(event.lane as i64),
            key: None,
            pressed: event.edge == Edge::Down,
        }
    }
}

/// Collects input events for writing an input log.
#[derive(Debug, Default)]
pub struct InputLogger {
    logs: Vec<KeyInputLog>,
}

impl InputLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: InputEvent) {
        self.logs.push(event.into());
    }

    pub fn logs(&self) -> &[KeyInputLog] {
        &self.logs
    }

    /// Take ownership of logs (consumes logger).
    pub fn into_logs(self) -> Vec<KeyInputLog> {
        self.logs
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
