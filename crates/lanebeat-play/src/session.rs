use serde::{Deserialize, Serialize};

use crate::judge::{HitOutcome, Judgment, TimingStats};

/// Runtime state of one beatmap note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteState {
    #[default]
    Pending,
    Active,
    Hit,
    Missed,
}

impl NoteState {
    pub fn spawned(self) -> bool {
        self != NoteState::Pending
    }

    pub fn hit(self) -> bool {
        self == NoteState::Hit
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, NoteState::Hit | NoteState::Missed)
    }
}

/// End-of-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySummary {
    pub total_notes: usize,
    pub hits: u32,
    pub misses: u32,
    pub best_streak: u32,
    pub timing: TimingStats,
}

/// Mutable state of one play-through. The beatmap itself stays untouched.
#[derive(Debug, Clone)]
pub struct Session {
    states: Vec<NoteState>,
    combos: Vec<Option<u32>>,
    /// Indices of notes in flight, in spawn order.
    pub(crate) active: Vec<usize>,
    pub game_over: bool,
    pub waiting_for_input: bool,
    /// Last observed playback position.
    pub position_ms: f64,
    /// Sum of tick deltas. Drives fades and idle timers only.
    pub elapsed_ms: f64,
    pub last_hit_at_ms: Option<f64>,
    /// Start of the current no-hit stretch, in elapsed time.
    pub idle_since_ms: f64,
    pub hits: u32,
    pub misses: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub timing: TimingStats,
    pub cleared: bool,
}

impl Session {
    pub fn new(note_count: usize) -> Self {
        Self {
            states: vec![NoteState::Pending; note_count],
            combos: vec![None; note_count],
            active: Vec::new(),
            game_over: false,
            waiting_for_input: false,
            position_ms: 0.0,
            elapsed_ms: 0.0,
            last_hit_at_ms: None,
            idle_since_ms: 0.0,
            hits: 0,
            misses: 0,
            streak: 0,
            best_streak: 0,
            timing: TimingStats::default(),
            cleared: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.states.len());
    }

    pub fn note_state(&self, index: usize) -> NoteState {
        self.states.get(index).copied().unwrap_or_default()
    }

    pub fn combo(&self, index: usize) -> Option<u32> {
        self.combos.get(index).copied().flatten()
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub(crate) fn activate(&mut self, index: usize, combo: Option<u32>) {
        self.states[index] = NoteState::Active;
        self.combos[index] = combo;
        self.active.push(index);
    }

    /// Record a judgment and drop its note from the active set.
    pub(crate) fn resolve(&mut self, judgment: &Judgment) {
        let index = judgment.note_index;
        self.active.retain(|&i| i != index);
        match judgment.outcome {
            HitOutcome::Hit => {
                self.states[index] = NoteState::Hit;
                self.hits += 1;
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
                self.last_hit_at_ms = Some(self.elapsed_ms);
                self.idle_since_ms = self.elapsed_ms;
            }
            HitOutcome::Miss => {
                self.states[index] = NoteState::Missed;
                self.misses += 1;
                self.streak = 0;
            }
        }
        self.timing.record(judgment);
    }

    pub fn all_resolved(&self) -> bool {
        self.states.iter().all(|s| s.is_resolved())
    }

    pub fn summary(&self) -> PlaySummary {
        PlaySummary {
            total_notes: self.states.len(),
            hits: self.hits,
            misses: self.misses,
            best_streak: self.best_streak,
            timing: self.timing,
        }
    }
}
