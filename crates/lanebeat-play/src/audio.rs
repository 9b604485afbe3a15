use std::cell::Cell;
use std::rc::Rc;

/// Abstraction over the music track driving playback.
/// Implementations: SimulatedAudio (headless playback and testing).
///
/// The position reported here is the authoritative game time.
pub trait AudioSource {
    /// Start from the beginning.
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn seek(&mut self, position_ms: f64);
    /// Current track position in milliseconds.
    fn position_ms(&self) -> f64;
    /// Set volume (0.0..=1.0).
    fn set_volume(&mut self, volume: f32);
}

#[derive(Debug, Default)]
struct SimulatedState {
    position_ms: Cell<f64>,
    playing: Cell<bool>,
    stalled: Cell<bool>,
    volume: Cell<f32>,
    pause_calls: Cell<u32>,
}

/// Audio source whose position only moves when told to.
///
/// Clones share state, so a driver can keep a handle to advance the track
/// while the clock owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAudio {
    state: Rc<SimulatedState>,
}

impl SimulatedAudio {
    pub fn new() -> Self {
        let audio = Self::default();
        audio.state.volume.set(1.0);
        audio
    }

    /// Move the track forward if it is playing and not stalled.
    pub fn advance(&self, delta_ms: f64) {
        if self.state.playing.get() && !self.state.stalled.get() && delta_ms > 0.0 {
            self.state
                .position_ms
                .set(self.state.position_ms.get() + delta_ms);
        }
    }

    /// Simulate a buffering stall: the track keeps "playing" but does not move.
    pub fn set_stalled(&self, stalled: bool) {
        self.state.stalled.set(stalled);
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing.get()
    }

    pub fn volume(&self) -> f32 {
        self.state.volume.get()
    }

    /// Number of pause calls that reached the source.
    pub fn pause_calls(&self) -> u32 {
        self.state.pause_calls.get()
    }
}

impl AudioSource for SimulatedAudio {
    fn start(&mut self) {
        self.state.position_ms.set(0.0);
        self.state.playing.set(true);
    }

    fn pause(&mut self) {
        self.state.playing.set(false);
        self.state.pause_calls.set(self.state.pause_calls.get() + 1);
    }

    fn resume(&mut self) {
        self.state.playing.set(true);
    }

    fn seek(&mut self, position_ms: f64) {
        self.state.position_ms.set(position_ms.max(0.0));
    }

    fn position_ms(&self) -> f64 {
        self.state.position_ms.get()
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.volume.set(volume);
    }
}
