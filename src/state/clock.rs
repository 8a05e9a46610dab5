/// Clock values for one editing session.
///
/// Owned by the session that created it and reset whenever the scene list
/// changes; nothing here outlives the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockState {
    /// Authoritative position on the shot axis, in seconds.
    pub master_time: f64,
    /// Sum of the active scene's shot durations.
    pub total_duration: f64,
    /// Last position reported by (or pushed to) the audio source.
    pub audio_current_time: f64,
    /// Zero until audio metadata is known.
    pub audio_duration: f64,
    pub sync_enabled: bool,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            master_time: 0.0,
            total_duration: 0.0,
            audio_current_time: 0.0,
            audio_duration: 0.0,
            sync_enabled: true,
        }
    }
}

impl ClockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the initial state, keeping only the sync toggle.
    pub fn reset(&mut self) {
        *self = Self {
            sync_enabled: self.sync_enabled,
            ..Self::default()
        };
    }

    pub fn has_audio(&self) -> bool {
        self.audio_duration > 0.0
    }

    /// Store a master time clamped to `[0, total_duration]`.
    pub fn set_master_time(&mut self, time: f64) -> f64 {
        let time = if time.is_finite() { time } else { 0.0 };
        self.master_time = time.clamp(0.0, self.total_duration.max(0.0));
        self.master_time
    }

    pub fn set_audio_time(&mut self, time: f64) -> f64 {
        let time = if time.is_finite() { time } else { 0.0 };
        self.audio_current_time = time.clamp(0.0, self.audio_duration.max(0.0));
        self.audio_current_time
    }
}
