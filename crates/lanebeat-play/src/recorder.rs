use std::path::Path;

use lanebeat_model::lane::check_lane;
use lanebeat_model::{Beatmap, Note, NoteType};
use log::{debug, info};

use crate::audio::AudioSource;
use crate::clock::{ClockState, PlaybackClock};
use crate::config::EditorConfig;
use crate::error::PlayError;
use crate::input::{Edge, InputEvent};

/// Builds a beatmap from lane input against a playing track.
///
/// Two entry modes share one note list: live recording (press/release while
/// the track plays) and step entry (place the selected note type at the
/// current position).
pub struct BeatmapRecorder {
    config: EditorConfig,
    clock: PlaybackClock,
    music: Option<String>,
    notes: Vec<Note>,
    /// Press position per lane while held.
    held: Vec<Option<f64>>,
    selected_lane: usize,
    selected_type: NoteType,
}

impl BeatmapRecorder {
    pub fn new(config: EditorConfig) -> Result<Self, PlayError> {
        config.validate()?;
        Ok(Self {
            held: vec![None; config.lane_count],
            config,
            clock: PlaybackClock::new(),
            music: None,
            notes: Vec::new(),
            selected_lane: 0,
            selected_type: NoteType::Tap,
        })
    }

    /// Load the track to record against. `music` is the asset id written on export.
    pub fn load_audio(&mut self, source: Box<dyn AudioSource>, music: impl Into<String>) {
        self.clock.load(source);
        self.music = Some(music.into());
        self.held.iter_mut().for_each(|h| *h = None);
        info!("Editor track loaded: {}", self.music.as_deref().unwrap_or_default());
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn is_recording(&self) -> bool {
        self.clock.is_playing()
    }

    /// Play/pause. Returns whether the recorder is now recording.
    pub fn toggle_playback(&mut self) -> Result<bool, PlayError> {
        match self.clock.state() {
            ClockState::Stopped => self.clock.play()?,
            ClockState::Playing => self.clock.pause()?,
            ClockState::Paused => self.clock.resume()?,
        }
        Ok(self.is_recording())
    }

    pub fn seek(&mut self, position_ms: f64) -> Result<(), PlayError> {
        self.clock.seek(position_ms)
    }

    /// Start a press on `lane`. Ignored while not recording or already held.
    pub fn press(&mut self, lane: usize) -> Result<(), PlayError> {
        let position = self.clock.position_ms()?;
        let lane = check_lane(lane as i64, self.config.lane_count)?;
        if !self.is_recording() {
            debug!("Press on lane {} ignored: not recording", lane);
            return Ok(());
        }
        if self.held[lane].is_none() {
            self.held[lane] = Some(position);
        }
        Ok(())
    }

    /// End a press on `lane` and append the resulting note.
    ///
    /// Shorter presses than the tap threshold become taps; longer ones holds.
    pub fn release(&mut self, lane: usize) -> Result<Option<Note>, PlayError> {
        let position = self.clock.position_ms()?;
        let lane = check_lane(lane as i64, self.config.lane_count)?;
        let Some(pressed_at) = self.held[lane].take() else {
            return Ok(None);
        };

        let duration = (position - pressed_at).max(0.0);
        let time_ms = pressed_at.floor() as u64;
        let note = if duration < self.config.tap_threshold_ms {
            Note::tap(lane, time_ms)
        } else {
            Note::hold(lane, time_ms, duration.floor() as u64)
        };
        debug!("Recorded {} on lane {} at {}ms", note.note_type.as_str(), lane, time_ms);
        self.notes.push(note);
        Ok(Some(note))
    }

    /// Route an input event to press/release. Timing comes from the clock.
    pub fn handle(&mut self, event: InputEvent) -> Result<Option<Note>, PlayError> {
        match event.edge {
            Edge::Down => self.press(event.lane).map(|_| None),
            Edge::Up => self.release(event.lane),
        }
    }

    /// Step entry: place the selected note type on the selected lane at the
    /// current position.
    pub fn add_note_at_current_time(&mut self) -> Result<Note, PlayError> {
        let time_ms = self.clock.position_ms()?.floor() as u64;
        let note = match self.selected_type {
            NoteType::Tap => Note::tap(self.selected_lane, time_ms),
            NoteType::Hold => Note::hold(self.selected_lane, time_ms, self.config.default_hold_ms),
        };
        self.notes.push(note);
        Ok(note)
    }

    pub fn select_lane(&mut self, lane: usize) -> Result<(), PlayError> {
        self.selected_lane = check_lane(lane as i64, self.config.lane_count)?;
        Ok(())
    }

    pub fn selected_lane(&self) -> usize {
        self.selected_lane
    }

    /// Switch between tap and hold for step entry. Returns the new type.
    pub fn toggle_note_type(&mut self) -> NoteType {
        self.selected_type = match self.selected_type {
            NoteType::Tap => NoteType::Hold,
            NoteType::Hold => NoteType::Tap,
        };
        self.selected_type
    }

    pub fn selected_type(&self) -> NoteType {
        self.selected_type
    }

    /// Notes in recording order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.held.iter_mut().for_each(|h| *h = None);
    }

    /// Time-sorted beatmap of everything recorded so far.
    pub fn export(&self) -> Result<Beatmap, PlayError> {
        let music = self.music.clone().ok_or(PlayError::NoAudioLoaded)?;
        Ok(Beatmap::new(music, self.notes.clone()))
    }

    pub fn export_json(&self) -> Result<Vec<u8>, PlayError> {
        Ok(self.export()?.serialize()?)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), PlayError> {
        let beatmap = self.export()?;
        beatmap.save_to(path)?;
        info!("Exported {} notes", beatmap.len());
        Ok(())
    }
}
