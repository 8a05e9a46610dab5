use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FPS, PLAYBACK_MIN_TICK_INTERVAL_MS, PLAYBACK_TICK_INTERVAL_MS};
use crate::core::timeline_snap::MagnetismSettings;

/// What playback does after the last shot of the last scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBehavior {
    /// Halt on the last shot.
    #[default]
    Stop,
    /// Wrap to the first shot of the first non-empty scene.
    Loop,
}

/// Playback scheduling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub end_behavior: EndBehavior,
}

fn default_tick_interval_ms() -> u64 {
    PLAYBACK_TICK_INTERVAL_MS
}

impl PlaybackSettings {
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(PLAYBACK_MIN_TICK_INTERVAL_MS))
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            end_behavior: EndBehavior::default(),
        }
    }
}

/// Project-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Frame rate (frames per second)
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default)]
    pub playback: PlaybackSettings,
    #[serde(default)]
    pub magnetism: MagnetismSettings,
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            playback: PlaybackSettings::default(),
            magnetism: MagnetismSettings::default(),
        }
    }
}
