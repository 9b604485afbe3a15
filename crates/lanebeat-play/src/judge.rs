use serde::{Deserialize, Serialize};

use crate::config::PlayConfig;

/// Whether an input landed before or after its note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingDirection {
    Early,
    Exact,
    Late,
}

impl TimingDirection {
    const EXACT_THRESHOLD_MS: f64 = 1.0;

    /// `timing_diff_ms` is input time minus note time.
    pub fn from_timing_diff(timing_diff_ms: f64) -> Self {
        if timing_diff_ms < -Self::EXACT_THRESHOLD_MS {
            TimingDirection::Early
        } else if timing_diff_ms > Self::EXACT_THRESHOLD_MS {
            TimingDirection::Late
        } else {
            TimingDirection::Exact
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitOutcome {
    Hit,
    Miss,
}

impl HitOutcome {
    pub fn is_hit(self) -> bool {
        self == HitOutcome::Hit
    }
}

/// Hit-window policy.
#[derive(Debug, Clone, Copy)]
pub struct HitJudge {
    pub hit_window_ms: f64,
    /// Accept every timing as a hit.
    pub forgiving: bool,
}

impl HitJudge {
    pub fn new(config: &PlayConfig) -> Self {
        Self {
            hit_window_ms: config.hit_window_ms,
            forgiving: config.forgiving_mode,
        }
    }

    /// Judge a signed timing difference (input time minus note time).
    pub fn judge(&self, timing_diff_ms: f64) -> HitOutcome {
        if self.forgiving || timing_diff_ms.abs() <= self.hit_window_ms {
            HitOutcome::Hit
        } else {
            HitOutcome::Miss
        }
    }
}

/// Resolution of one note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub note_index: usize,
    pub lane: usize,
    pub outcome: HitOutcome,
    /// Input time minus note time. For expiries, the overshoot at resolution.
    pub timing_diff_ms: f64,
    pub direction: TimingDirection,
    /// Resolved by falling off the lane rather than by input.
    pub expired: bool,
}

/// Cumulative early/late counts over judged hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingStats {
    pub early_count: u32,
    pub late_count: u32,
}

impl TimingStats {
    pub fn record(&mut self, judgment: &Judgment) {
        if judgment.expired {
            return;
        }
        match judgment.direction {
            TimingDirection::Early => self.early_count += 1,
            TimingDirection::Late => self.late_count += 1,
            TimingDirection::Exact => {}
        }
    }
}
