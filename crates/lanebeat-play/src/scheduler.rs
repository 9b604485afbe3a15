use lanebeat_model::Note;
use log::debug;

use crate::config::PlayConfig;

/// A note that became active on this poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    /// Index into the beatmap's note list.
    pub index: usize,
    /// Combo group size when the note overlaps earlier same-lane notes still in flight.
    pub combo: Option<u32>,
}

/// Activates notes as playback approaches them.
///
/// Notes are time-sorted, so a cursor replaces rescanning: everything before
/// the cursor has spawned, nothing after it has.
#[derive(Debug, Clone)]
pub struct NoteScheduler {
    cursor: usize,
    travel_time_ms: f64,
    lead_ms: f64,
    combo_window_ms: f64,
}

impl NoteScheduler {
    pub fn new(config: &PlayConfig) -> Self {
        Self {
            cursor: 0,
            travel_time_ms: config.travel_time_ms(),
            lead_ms: config.lead_ms,
            combo_window_ms: config.combo_window_ms(),
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Number of notes spawned so far.
    pub fn spawned(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self, notes: &[Note]) -> bool {
        self.cursor >= notes.len()
    }

    /// Playback position at which `note` spawns.
    pub fn spawn_time_ms(&self, note: &Note) -> f64 {
        (note.time_ms as f64 - self.lead_ms - self.travel_time_ms).max(0.0)
    }

    /// Spawn every pending note whose spawn instant has been reached.
    ///
    /// `active` holds indices of notes currently in flight, used for combo tagging.
    pub fn poll(&mut self, notes: &[Note], active: &[usize], position_ms: f64) -> Vec<Spawn> {
        let mut spawned = Vec::new();
        let mut in_flight: Vec<usize> = active.to_vec();

        while let Some(note) = notes.get(self.cursor) {
            if position_ms + self.travel_time_ms < note.time_ms as f64 - self.lead_ms {
                break;
            }
            let index = self.cursor;
            let overlaps = in_flight
                .iter()
                .filter(|&&other| {
                    let other = &notes[other];
                    other.lane == note.lane
                        && (note.time_ms.abs_diff(other.time_ms) as f64) < self.combo_window_ms
                })
                .count();
            let combo = (overlaps > 0).then(|| overlaps as u32 + 1);

            debug!(
                "Spawn note {} (lane {}, t={}ms) at {:.1}ms{}",
                index,
                note.lane,
                note.time_ms,
                position_ms,
                combo.map(|c| format!(" combo x{c}")).unwrap_or_default()
            );
            spawned.push(Spawn { index, combo });
            in_flight.push(index);
            self.cursor += 1;
        }
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> NoteScheduler {
        // travel 1000ms, combo window 100ms
        NoteScheduler::new(&PlayConfig {
            note_speed: 500.0,
            hit_zone_y: 500.0,
            lane_height: 600.0,
            note_height: 50.0,
            ..Default::default()
        })
    }

    #[test]
    fn spawns_at_travel_time_before_note() {
        let notes = [Note::tap(0, 3000)];
        let mut sched = scheduler();
        assert!(sched.poll(&notes, &[], 1990.0).is_empty());
        let spawned = sched.poll(&notes, &[], 2000.0);
        assert_eq!(spawned, vec![Spawn { index: 0, combo: None }]);
    }

    #[test]
    fn spawning_is_idempotent() {
        let notes = [Note::tap(0, 1500), Note::tap(1, 1500)];
        let mut sched = scheduler();
        assert_eq!(sched.poll(&notes, &[], 600.0).len(), 2);
        assert!(sched.poll(&notes, &[], 700.0).is_empty());
        assert!(sched.is_finished(&notes));
    }

    #[test]
    fn early_notes_spawn_on_first_poll() {
        let notes = [Note::tap(0, 200), Note::tap(1, 900)];
        let mut sched = scheduler();
        assert_eq!(sched.poll(&notes, &[], 0.0).len(), 2);
        assert_eq!(sched.spawn_time_ms(&notes[0]), 0.0);
    }

    #[test]
    fn lead_spawns_earlier() {
        let mut sched = NoteScheduler::new(&PlayConfig {
            note_speed: 500.0,
            lead_ms: 500.0,
            ..Default::default()
        });
        let notes = [Note::tap(0, 3000)];
        assert_eq!(sched.spawn_time_ms(&notes[0]), 1500.0);
        assert_eq!(sched.poll(&notes, &[], 1500.0).len(), 1);
    }

    #[test]
    fn overlapping_same_lane_notes_form_combo() {
        let notes = [
            Note::tap(0, 2000),
            Note::tap(0, 2050),
            Note::tap(1, 2060),
            Note::tap(0, 2080),
            Note::tap(0, 2500),
        ];
        let mut sched = scheduler();
        let spawned = sched.poll(&notes, &[], 1600.0);
        let combos: Vec<_> = spawned.iter().map(|s| s.combo).collect();
        assert_eq!(combos, vec![None, Some(2), None, Some(3), None]);
    }

    #[test]
    fn combo_counts_notes_already_active() {
        let notes = [Note::tap(2, 1000), Note::tap(2, 1040)];
        let mut sched = scheduler();
        assert_eq!(sched.poll(&notes, &[], 0.0)[0].combo, None);

        let mut sched = scheduler();
        sched.poll(&notes[..1], &[], 0.0);
        let spawned = sched.poll(&notes, &[0], 40.0);
        assert_eq!(spawned, vec![Spawn { index: 1, combo: Some(2) }]);
    }

    #[test]
    fn reset_rewinds_cursor() {
        let notes = [Note::tap(0, 0)];
        let mut sched = scheduler();
        sched.poll(&notes, &[], 0.0);
        sched.reset();
        assert_eq!(sched.spawned(), 0);
        assert_eq!(sched.poll(&notes, &[], 0.0).len(), 1);
    }
}
