//! Test fixtures: fluent beatmap builder, input simulation and a stepping driver.

use lanebeat_model::{Beatmap, Note};

use crate::audio::SimulatedAudio;
use crate::config::PlayConfig;
use crate::engine::PlayEngine;
use crate::event::PlayEvent;
use crate::input::InputEvent;

pub const STEP_MS: f64 = 10.0;

/// Builder for test beatmaps.
#[derive(Debug)]
pub struct BeatmapBuilder {
    music: String,
    notes: Vec<Note>,
}

impl BeatmapBuilder {
    pub fn new() -> Self {
        Self {
            music: "test-track".to_string(),
            notes: Vec::new(),
        }
    }

    pub fn tap(mut self, lane: usize, time_ms: u64) -> Self {
        self.notes.push(Note::tap(lane, time_ms));
        self
    }

    pub fn hold(mut self, lane: usize, time_ms: u64, duration_ms: u64) -> Self {
        self.notes.push(Note::hold(lane, time_ms, duration_ms));
        self
    }

    /// Evenly spaced taps cycling through `lanes` lanes.
    pub fn stream(mut self, count: usize, lanes: usize, start_ms: u64, interval_ms: u64) -> Self {
        for i in 0..count {
            self.notes
                .push(Note::tap(i % lanes, start_ms + i as u64 * interval_ms));
        }
        self
    }

    pub fn build(self) -> Beatmap {
        Beatmap::new(self.music, self.notes)
    }
}

/// Scripted press/release sequence.
#[derive(Debug, Default)]
pub struct InputSimulator {
    events: Vec<InputEvent>,
}

impl InputSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(mut self, lane: usize, time_ms: f64) -> Self {
        self.events.push(InputEvent::down(lane, time_ms));
        self
    }

    pub fn release(mut self, lane: usize, time_ms: f64) -> Self {
        self.events.push(InputEvent::up(lane, time_ms));
        self
    }

    /// Press then release after `hold_ms`.
    pub fn tap(self, lane: usize, time_ms: f64, hold_ms: f64) -> Self {
        self.press(lane, time_ms).release(lane, time_ms + hold_ms)
    }

    pub fn build(mut self) -> Vec<InputEvent> {
        self.events.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        self.events
    }
}

/// Engine with simulated audio loaded and playing.
pub fn started_engine(beatmap: Beatmap, config: PlayConfig) -> (PlayEngine, SimulatedAudio) {
    let audio = SimulatedAudio::new();
    let mut engine = PlayEngine::new(beatmap, config).unwrap();
    engine.load_audio(Box::new(audio.clone())).unwrap();
    engine.start().unwrap();
    (engine, audio)
}

/// Step audio and engine in `STEP_MS` increments until `target_ms` of audio
/// would have played. A paused clock does not move, but the steps still run.
pub fn run_until(engine: &mut PlayEngine, audio: &SimulatedAudio, target_ms: f64) -> Vec<PlayEvent> {
    let start = engine.clock().position_ms().unwrap();
    let steps = ((target_ms - start) / STEP_MS).ceil().max(0.0) as usize;
    let mut events = Vec::new();
    for _ in 0..steps {
        audio.advance(STEP_MS);
        events.extend(engine.tick(STEP_MS).unwrap());
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_orders_events() {
        let events = InputSimulator::new()
            .tap(0, 500.0, 50.0)
            .press(1, 100.0)
            .build();
        assert_eq!(events[0], InputEvent::down(1, 100.0));
        assert_eq!(events[1], InputEvent::down(0, 500.0));
        assert_eq!(events[2], InputEvent::up(0, 550.0));
    }

    #[test]
    fn builder_sorts_notes() {
        let beatmap = BeatmapBuilder::new().tap(0, 900).hold(1, 100, 300).build();
        assert_eq!(beatmap.notes()[0].time_ms, 100);
        assert_eq!(beatmap.music(), "test-track");
    }
}
