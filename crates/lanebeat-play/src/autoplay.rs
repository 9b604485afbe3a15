//! Perfect-play input generation.

use lanebeat_model::Note;

use crate::input::{Edge, InputEvent};

/// Press duration used for tap notes.
pub const PRESS_DURATION_MS: f64 = 50.0;

/// Press every note exactly on time: taps are held for [`PRESS_DURATION_MS`],
/// holds until their end. A release never passes the next press in its lane.
///
/// Events are ordered by time; at equal times releases come first.
pub fn autoplay_inputs(notes: &[Note]) -> Vec<InputEvent> {
    let mut events = Vec::with_capacity(notes.len() * 2);

    for (i, note) in notes.iter().enumerate() {
        let press = note.time_ms as f64;
        let mut release = if note.is_hold() {
            note.end_time_ms() as f64
        } else {
            press + PRESS_DURATION_MS
        };
        if let Some(next) = notes[i + 1..].iter().find(|n| n.lane == note.lane) {
            release = release.min(next.time_ms as f64);
        }
        events.push(InputEvent::down(note.lane, press));
        events.push(InputEvent::up(note.lane, release));
    }

    events.sort_by(|a, b| {
        a.time_ms
            .total_cmp(&b.time_ms)
            .then_with(|| (a.edge == Edge::Down).cmp(&(b.edge == Edge::Down)))
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::BeatmapBuilder;

    #[test]
    fn taps_and_holds() {
        let beatmap = BeatmapBuilder::new().tap(0, 1000).hold(1, 1200, 400).build();
        let events = autoplay_inputs(beatmap.notes());
        assert_eq!(
            events,
            vec![
                InputEvent::down(0, 1000.0),
                InputEvent::up(0, 1050.0),
                InputEvent::down(1, 1200.0),
                InputEvent::up(1, 1600.0),
            ]
        );
    }

    #[test]
    fn release_before_next_press_in_lane() {
        let beatmap = BeatmapBuilder::new().tap(2, 1000).tap(2, 1030).build();
        let events = autoplay_inputs(beatmap.notes());
        assert_eq!(
            events,
            vec![
                InputEvent::down(2, 1000.0),
                InputEvent::up(2, 1030.0),
                InputEvent::down(2, 1030.0),
                InputEvent::up(2, 1080.0),
            ]
        );
    }

    #[test]
    fn one_press_per_note() {
        let beatmap = BeatmapBuilder::new().stream(16, 4, 500, 125).build();
        let presses = autoplay_inputs(beatmap.notes())
            .iter()
            .filter(|e| e.edge == Edge::Down)
            .count();
        assert_eq!(presses, 16);
    }
}
