/// Linear volume ramp driven by an external time base.
#[derive(Debug, Clone)]
pub struct VolumeFader {
    from: f32,
    target: f32,
    start_ms: f64,
    duration_ms: f64,
    level: f32,
}

impl VolumeFader {
    pub fn new(level: f32) -> Self {
        Self {
            from: level,
            target: level,
            start_ms: 0.0,
            duration_ms: 0.0,
            level,
        }
    }

    /// Jump to `level` and cancel any ramp.
    pub fn set(&mut self, level: f32) {
        *self = Self::new(level);
    }

    /// Ramp from the current level to `target` over `duration_ms`, starting at `now_ms`.
    /// Re-targeting the running ramp keeps it untouched.
    pub fn fade_to(&mut self, target: f32, duration_ms: f64, now_ms: f64) {
        if (self.target - target).abs() < f32::EPSILON {
            return;
        }
        self.from = self.level;
        self.target = target;
        self.start_ms = now_ms;
        self.duration_ms = duration_ms.max(0.0);
        if self.duration_ms == 0.0 {
            self.level = target;
        }
    }

    /// Advance the ramp to `now_ms` and return the new level.
    pub fn update(&mut self, now_ms: f64) -> f32 {
        if !self.is_fading() {
            return self.level;
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0) as f32;
        self.level = self.from + (self.target - self.from) * t;
        if t >= 1.0 {
            self.level = self.target;
        }
        self.level
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_fading(&self) -> bool {
        (self.level - self.target).abs() >= f32::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_ramp() {
        let mut fader = VolumeFader::new(1.0);
        fader.fade_to(0.2, 300.0, 1000.0);
        assert!((fader.update(1150.0) - 0.6).abs() < 1e-5);
        assert!((fader.update(1300.0) - 0.2).abs() < 1e-6);
        assert!(!fader.is_fading());
        assert!((fader.update(2000.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn retarget_starts_from_current_level() {
        let mut fader = VolumeFader::new(1.0);
        fader.fade_to(0.0, 100.0, 0.0);
        fader.update(50.0);
        fader.fade_to(1.0, 100.0, 50.0);
        assert!((fader.level() - 0.5).abs() < 1e-6);
        assert!((fader.update(100.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn same_target_keeps_running_ramp() {
        let mut fader = VolumeFader::new(1.0);
        fader.fade_to(0.0, 100.0, 0.0);
        fader.fade_to(0.0, 100.0, 80.0);
        assert!((fader.update(100.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_jumps() {
        let mut fader = VolumeFader::new(1.0);
        fader.fade_to(0.3, 0.0, 10.0);
        assert!((fader.level() - 0.3).abs() < 1e-6);
        assert!(!fader.is_fading());
    }
}
