use lanebeat_model::lane::check_lane;
use lanebeat_model::{Beatmap, Note};
use log::{debug, info};

use crate::audio::AudioSource;
use crate::clock::PlaybackClock;
use crate::config::{PlayConfig, UnmatchedInput};
use crate::error::PlayError;
use crate::event::{GameOverReason, PlayEvent};
use crate::fader::VolumeFader;
use crate::input::{Edge, InputEvent, InputQueue};
use crate::judge::{HitJudge, HitOutcome, Judgment, TimingDirection};
use crate::scheduler::NoteScheduler;
use crate::session::{PlaySummary, Session};

/// Drives one beatmap against one music track.
///
/// Call [`PlayEngine::tick`] at a fixed interval. Each tick reads the clock,
/// spawns due notes, judges queued input, expires overdue notes and updates
/// the music volume.
pub struct PlayEngine {
    beatmap: Beatmap,
    config: PlayConfig,
    clock: PlaybackClock,
    scheduler: NoteScheduler,
    judge: HitJudge,
    session: Session,
    fader: VolumeFader,
    input: InputQueue,
    events: Vec<PlayEvent>,
    applied_volume: f32,
}

impl PlayEngine {
    /// Validate `config` and normalize `beatmap` with its per-timestamp cap.
    pub fn new(beatmap: Beatmap, config: PlayConfig) -> Result<Self, PlayError> {
        config.validate()?;
        for note in beatmap.notes() {
            check_lane(note.lane as i64, config.lane_count)?;
        }
        let beatmap = match config.combo_cap_per_timestamp {
            Some(cap) => beatmap.normalize(cap),
            None => beatmap,
        };
        info!(
            "Play engine ready: {} notes, hit window {}ms{}",
            beatmap.len(),
            config.hit_window_ms,
            if config.forgiving_mode { " (forgiving)" } else { "" }
        );

        Ok(Self {
            session: Session::new(beatmap.len()),
            scheduler: NoteScheduler::new(&config),
            judge: HitJudge::new(&config),
            fader: VolumeFader::new(config.music_volume),
            applied_volume: config.music_volume,
            clock: PlaybackClock::new(),
            input: InputQueue::new(),
            events: Vec::new(),
            beatmap,
            config,
        })
    }

    pub fn load_audio(&mut self, source: Box<dyn AudioSource>) -> Result<(), PlayError> {
        self.clock.load(source);
        self.clock.set_volume(self.fader.level())?;
        self.applied_volume = self.fader.level();
        Ok(())
    }

    /// Start the music from the beginning.
    pub fn start(&mut self) -> Result<(), PlayError> {
        self.clock.play()?;
        info!("Playback started: {}", self.beatmap.music());
        Ok(())
    }

    /// Queue an input event for the next tick. Dropped after game over.
    pub fn push_input(&mut self, event: InputEvent) {
        if self.session.game_over {
            debug!("Input after game over dropped: {:?}", event);
            return;
        }
        self.input.push(event);
    }

    /// Advance one step. `delta_ms` is wall time since the previous tick and
    /// only drives fades and idle timers; judgment uses the clock.
    pub fn tick(&mut self, delta_ms: f64) -> Result<Vec<PlayEvent>, PlayError> {
        let position = self.clock.position_ms()?;
        if self.session.game_over {
            self.input.clear();
            return Ok(std::mem::take(&mut self.events));
        }

        self.session.elapsed_ms += delta_ms.max(0.0);
        self.session.position_ms = position;

        self.spawn_due_notes(position)?;
        self.process_input()?;
        if !self.session.game_over {
            self.expire_overdue_notes(position)?;
        }
        if !self.session.game_over {
            self.check_idle();
        }
        self.apply_volume()?;
        self.check_cleared();

        Ok(std::mem::take(&mut self.events))
    }

    fn spawn_due_notes(&mut self, position: f64) -> Result<(), PlayError> {
        let was_empty = self.session.active.is_empty();
        let spawns = self
            .scheduler
            .poll(self.beatmap.notes(), &self.session.active, position);
        if spawns.is_empty() {
            return Ok(());
        }

        if was_empty {
            self.session.idle_since_ms = self.session.elapsed_ms;
        }
        for spawn in spawns {
            self.session.activate(spawn.index, spawn.combo);
            self.events.push(PlayEvent::NoteSpawned {
                index: spawn.index,
                note: self.beatmap.notes()[spawn.index],
                combo: spawn.combo,
            });
        }

        if self.config.pause_on_spawn && !self.session.waiting_for_input {
            self.clock.pause()?;
            self.session.waiting_for_input = true;
            self.events.push(PlayEvent::AudioPaused);
        }
        Ok(())
    }

    fn process_input(&mut self) -> Result<(), PlayError> {
        while let Some(event) = self.input.pop() {
            if self.session.game_over {
                self.input.clear();
                break;
            }
            if event.edge == Edge::Up {
                continue;
            }
            match self.attempt_hit(event.lane, event.time_ms) {
                Ok(_) => {}
                Err(PlayError::InvalidLane(e)) => debug!("Input dropped: {}", e),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Judge a press on `lane` at playback time `input_time_ms` against the
    /// earliest unresolved note in that lane.
    ///
    /// Returns `None` when nothing was judged: no matching note, or the
    /// session is already over.
    pub fn attempt_hit(
        &mut self,
        lane: usize,
        input_time_ms: f64,
    ) -> Result<Option<Judgment>, PlayError> {
        self.clock.position_ms()?;
        if self.session.game_over {
            return Ok(None);
        }
        check_lane(lane as i64, self.config.lane_count)?;

        let notes = self.beatmap.notes();
        // min_by_key keeps the first of equal times, i.e. the earliest spawned.
        let earliest = |lane: Option<usize>| {
            self.session
                .active
                .iter()
                .copied()
                .filter(|&i| lane.is_none_or(|l| notes[i].lane == l))
                .min_by_key(|&i| notes[i].time_ms)
        };

        if self.config.enforce_note_order
            && let Some(first) = earliest(None)
            && notes[first].lane != lane
        {
            let expected = notes[first].lane;
            self.on_unmatched(GameOverReason::WrongLane { lane, expected })?;
            return Ok(None);
        }

        let target = earliest(Some(lane));
        let Some(index) = target else {
            self.on_unmatched(GameOverReason::UnmatchedInput { lane })?;
            return Ok(None);
        };
        let notes = self.beatmap.notes();

        let timing_diff_ms = input_time_ms - notes[index].time_ms as f64;
        let judgment = Judgment {
            note_index: index,
            lane,
            outcome: self.judge.judge(timing_diff_ms),
            timing_diff_ms,
            direction: TimingDirection::from_timing_diff(timing_diff_ms),
            expired: false,
        };
        self.resolve(judgment)?;
        Ok(Some(judgment))
    }

    fn on_unmatched(&mut self, reason: GameOverReason) -> Result<(), PlayError> {
        match self.config.on_unmatched_input {
            UnmatchedInput::GameOver => self.trigger_game_over(reason),
            UnmatchedInput::Ignore => {
                debug!("Unmatched input ignored: {:?}", reason);
                Ok(())
            }
        }
    }

    fn expire_overdue_notes(&mut self, position: f64) -> Result<(), PlayError> {
        let expiry_ms = self.config.expiry_ms();
        let notes = self.beatmap.notes();
        let overdue: Vec<usize> = self
            .session
            .active
            .iter()
            .copied()
            .filter(|&i| position > notes[i].time_ms as f64 + expiry_ms)
            .collect();

        for index in overdue {
            if self.session.game_over {
                break;
            }
            let note = self.beatmap.notes()[index];
            let timing_diff_ms = position - note.time_ms as f64;
            debug!("Note {} expired at {:.1}ms", index, position);
            self.resolve(Judgment {
                note_index: index,
                lane: note.lane,
                outcome: HitOutcome::Miss,
                timing_diff_ms,
                direction: TimingDirection::Late,
                expired: true,
            })?;
        }
        Ok(())
    }

    fn resolve(&mut self, judgment: Judgment) -> Result<(), PlayError> {
        self.session.resolve(&judgment);
        self.events.push(PlayEvent::NoteResolved {
            note: self.beatmap.notes()[judgment.note_index],
            judgment,
        });
        match judgment.outcome {
            HitOutcome::Hit => self.on_hit(),
            HitOutcome::Miss => self.on_miss(judgment.note_index),
        }
    }

    fn on_hit(&mut self) -> Result<(), PlayError> {
        if self.session.waiting_for_input {
            self.resume_after_wait()?;
        } else {
            self.fader.fade_to(
                self.config.music_volume,
                self.config.restore_volume_ms,
                self.session.elapsed_ms,
            );
        }
        Ok(())
    }

    fn on_miss(&mut self, note_index: usize) -> Result<(), PlayError> {
        self.fader.fade_to(
            self.config.miss_volume,
            self.config.miss_fade_ms,
            self.session.elapsed_ms,
        );
        if self.config.game_over_on_miss {
            return self.trigger_game_over(GameOverReason::Miss { note_index });
        }
        // Nothing left to hit: waiting would never end.
        if self.session.waiting_for_input && self.session.active.is_empty() {
            self.resume_after_wait()?;
        }
        Ok(())
    }

    fn resume_after_wait(&mut self) -> Result<(), PlayError> {
        self.clock.resume()?;
        self.session.waiting_for_input = false;
        self.fader.set(self.config.music_volume);
        self.events.push(PlayEvent::AudioResumed);
        Ok(())
    }

    fn trigger_game_over(&mut self, reason: GameOverReason) -> Result<(), PlayError> {
        if self.session.game_over {
            return Ok(());
        }
        self.session.game_over = true;
        self.session.waiting_for_input = false;
        self.clock.pause()?;
        self.input.clear();
        info!(
            "Game over at {:.1}ms: {:?} ({} hits, {} misses)",
            self.session.position_ms, reason, self.session.hits, self.session.misses
        );
        self.events.push(PlayEvent::GameOver { reason });
        Ok(())
    }

    fn check_idle(&mut self) {
        let Some(idle_fade_ms) = self.config.idle_fade_ms else {
            return;
        };
        if self.session.active.is_empty() || self.session.waiting_for_input {
            return;
        }
        if self.session.elapsed_ms - self.session.idle_since_ms >= idle_fade_ms {
            self.fader.fade_to(
                self.config.idle_volume_floor,
                self.config.miss_fade_ms,
                self.session.elapsed_ms,
            );
        }
    }

    fn apply_volume(&mut self) -> Result<(), PlayError> {
        let level = self.fader.update(self.session.elapsed_ms);
        if (level - self.applied_volume).abs() > f32::EPSILON {
            self.clock.set_volume(level)?;
            self.applied_volume = level;
            self.events.push(PlayEvent::VolumeChanged { level });
        }
        Ok(())
    }

    fn check_cleared(&mut self) {
        if self.session.game_over
            || self.session.cleared
            || !self.scheduler.is_finished(self.beatmap.notes())
            || !self.session.all_resolved()
        {
            return;
        }
        self.session.cleared = true;
        let summary = self.session.summary();
        info!(
            "Cleared: {}/{} hits, best streak {}",
            summary.hits, summary.total_notes, summary.best_streak
        );
        self.events.push(PlayEvent::Cleared { summary });
    }

    /// Reset the session and play the track again from zero.
    pub fn restart(&mut self) -> Result<(), PlayError> {
        self.session.reset();
        self.scheduler.reset();
        self.input.clear();
        self.events.clear();
        self.fader.set(self.config.music_volume);
        self.clock.stop()?;
        self.clock.set_volume(self.config.music_volume)?;
        self.applied_volume = self.config.music_volume;
        self.clock.play()?;
        info!("Restarted: {}", self.beatmap.music());
        Ok(())
    }

    /// Events produced outside of `tick`, such as by a direct `attempt_hit`.
    pub fn drain_events(&mut self) -> Vec<PlayEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn beatmap(&self) -> &Beatmap {
        &self.beatmap
    }

    pub fn notes(&self) -> &[Note] {
        self.beatmap.notes()
    }

    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn volume(&self) -> f32 {
        self.applied_volume
    }

    pub fn is_game_over(&self) -> bool {
        self.session.game_over
    }

    pub fn is_waiting_for_input(&self) -> bool {
        self.session.waiting_for_input
    }

    pub fn is_cleared(&self) -> bool {
        self.session.cleared
    }

    pub fn summary(&self) -> PlaySummary {
        self.session.summary()
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}
