use std::cell::Cell;

use log::debug;

use crate::audio::AudioSource;
use crate::error::PlayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Game time, read from the loaded music track.
///
/// Every transition is idempotent: pausing a paused clock, resuming a playing
/// one or playing twice leaves the source untouched.
pub struct PlaybackClock {
    source: Option<Box<dyn AudioSource>>,
    state: ClockState,
    volume: f32,
    // Highest position handed out since the last start or seek.
    last_position_ms: Cell<f64>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            source: None,
            state: ClockState::Stopped,
            volume: 1.0,
            last_position_ms: Cell::new(0.0),
        }
    }

    /// Replace the track. The clock is stopped and keeps its volume.
    pub fn load(&mut self, mut source: Box<dyn AudioSource>) {
        source.set_volume(self.volume);
        self.source = Some(source);
        self.state = ClockState::Stopped;
        self.last_position_ms.set(0.0);
    }

    pub fn unload(&mut self) -> Option<Box<dyn AudioSource>> {
        self.state = ClockState::Stopped;
        self.last_position_ms.set(0.0);
        self.source.take()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == ClockState::Playing
    }

    /// Start from the beginning. No-op while already playing.
    pub fn play(&mut self) -> Result<(), PlayError> {
        let source = self.source.as_mut().ok_or(PlayError::NoAudioLoaded)?;
        if self.state == ClockState::Playing {
            return Ok(());
        }
        source.start();
        self.last_position_ms.set(0.0);
        self.state = ClockState::Playing;
        debug!("Clock: play");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlayError> {
        let source = self.source.as_mut().ok_or(PlayError::NoAudioLoaded)?;
        if self.state != ClockState::Playing {
            return Ok(());
        }
        source.pause();
        self.state = ClockState::Paused;
        debug!("Clock: pause");
        Ok(())
    }

    /// Continue from the paused position. No-op unless paused.
    pub fn resume(&mut self) -> Result<(), PlayError> {
        let source = self.source.as_mut().ok_or(PlayError::NoAudioLoaded)?;
        if self.state != ClockState::Paused {
            return Ok(());
        }
        source.resume();
        self.state = ClockState::Playing;
        debug!("Clock: resume");
        Ok(())
    }

    /// Halt and rewind to zero.
    pub fn stop(&mut self) -> Result<(), PlayError> {
        let source = self.source.as_mut().ok_or(PlayError::NoAudioLoaded)?;
        if self.state == ClockState::Stopped {
            return Ok(());
        }
        if self.state == ClockState::Playing {
            source.pause();
        }
        source.seek(0.0);
        self.state = ClockState::Stopped;
        self.last_position_ms.set(0.0);
        debug!("Clock: stop");
        Ok(())
    }

    pub fn seek(&mut self, position_ms: f64) -> Result<(), PlayError> {
        let target = position_ms.max(0.0);
        self.source
            .as_mut()
            .ok_or(PlayError::NoAudioLoaded)?
            .seek(target);
        self.last_position_ms.set(target);
        Ok(())
    }

    /// Current game time. Never decreases while playing.
    pub fn position_ms(&self) -> Result<f64, PlayError> {
        let source = self.source.as_ref().ok_or(PlayError::NoAudioLoaded)?;
        let raw = source.position_ms();
        if self.state != ClockState::Playing {
            return Ok(raw);
        }
        let position = raw.max(self.last_position_ms.get());
        self.last_position_ms.set(position);
        Ok(position)
    }

    /// Set volume, clamped to 0.0..=1.0.
    pub fn set_volume(&mut self, volume: f32) -> Result<(), PlayError> {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.source
            .as_mut()
            .ok_or(PlayError::NoAudioLoaded)?
            .set_volume(volume);
        self.volume = volume;
        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
