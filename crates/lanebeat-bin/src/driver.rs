//! Headless drivers: run the engine and the recorder against simulated audio.

use lanebeat_model::Beatmap;
use lanebeat_play::{
    AudioSource, BeatmapRecorder, EditorConfig, GameOverReason, InputEvent, PlayConfig,
    PlayEngine, PlayError, PlayEvent, PlaySummary, SimulatedAudio,
};
use log::{debug, info, warn};

/// Silence after the last note before a run is abandoned.
const TAIL_MS: f64 = 2000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayReport {
    pub summary: PlaySummary,
    pub game_over: Option<GameOverReason>,
    pub cleared: bool,
    pub end_position_ms: f64,
}

/// Play `beatmap` with `inputs` (stamped in track time) on a fixed tick.
///
/// While the engine waits for input with the music paused, the next press is
/// delivered immediately at the paused position.
pub fn simulate_play(
    beatmap: Beatmap,
    config: PlayConfig,
    inputs: &[InputEvent],
) -> Result<PlayReport, PlayError> {
    let step = config.tick_interval_ms;
    let end_ms = beatmap.duration_ms() as f64 + config.expiry_ms() + TAIL_MS;
    let max_steps = ((end_ms * 2.0) / step).ceil() as usize + inputs.len();

    let audio = SimulatedAudio::new();
    let mut engine = PlayEngine::new(beatmap, config)?;
    engine.load_audio(Box::new(audio.clone()))?;
    engine.start()?;

    let mut pending = inputs.iter().peekable();
    let mut game_over = None;

    for _ in 0..max_steps {
        audio.advance(step);
        let now = audio.position_ms();
        while let Some(event) = pending.next_if(|e| e.time_ms <= now) {
            engine.push_input(*event);
        }
        if engine.is_waiting_for_input()
            && let Some(event) = pending.next()
        {
            engine.push_input(InputEvent { time_ms: now, ..*event });
        }

        for event in engine.tick(step)? {
            match event {
                PlayEvent::GameOver { reason } => game_over = Some(reason),
                other => debug!("{:?}", other),
            }
        }

        if engine.is_game_over() || engine.is_cleared() {
            break;
        }
        if now > end_ms || (engine.is_waiting_for_input() && pending.peek().is_none()) {
            warn!("Run abandoned at {:.0}ms", now);
            break;
        }
    }

    Ok(PlayReport {
        summary: engine.summary(),
        game_over,
        cleared: engine.is_cleared(),
        end_position_ms: audio.position_ms(),
    })
}

/// Record a beatmap by replaying `inputs` into the editor while the track plays.
pub fn simulate_record(
    inputs: &[InputEvent],
    music: &str,
    config: EditorConfig,
) -> Result<Beatmap, PlayError> {
    let audio = SimulatedAudio::new();
    let mut recorder = BeatmapRecorder::new(config)?;
    recorder.load_audio(Box::new(audio.clone()), music);
    recorder.toggle_playback()?;

    for event in inputs {
        audio.advance(event.time_ms - audio.position_ms());
        match recorder.handle(*event) {
            Ok(_) => {}
            Err(PlayError::InvalidLane(e)) => warn!("Skipping input: {}", e),
            Err(e) => return Err(e),
        }
    }

    let beatmap = recorder.export()?;
    info!("Recorded {} notes from {} inputs", beatmap.len(), inputs.len());
    Ok(beatmap)
}
