//! External audio source boundary.

use tokio::time::Instant;

/// An audio element the shot timeline can follow.
pub trait AudioSource {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Total length in seconds; `None` until metadata has loaded.
    fn duration(&self) -> Option<f64>;

    /// Move the playback position.
    fn seek(&mut self, time: f64);

    fn is_ended(&self) -> bool {
        self.duration()
            .is_some_and(|duration| self.current_time() >= duration)
    }
}

/// An audio clock that advances with (tokio) wall time, for headless
/// previews without a real audio device.
#[derive(Debug, Clone)]
pub struct WallClockAudio {
    duration: Option<f64>,
    position: f64,
    started_at: Option<Instant>,
}

impl WallClockAudio {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration,
            position: 0.0,
            started_at: None,
        }
    }

    /// Metadata arriving late.
    pub fn set_duration(&mut self, duration: Option<f64>) {
        self.duration = duration;
    }

    pub fn play(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.position = self.current_time();
        self.started_at = None;
    }

    pub fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }
}

impl AudioSource for WallClockAudio {
    fn current_time(&self) -> f64 {
        let running = self
            .started_at
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let time = self.position + running;
        match self.duration {
            Some(duration) => time.min(duration),
            None => time,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn seek(&mut self, time: f64) {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        self.position = time;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}
