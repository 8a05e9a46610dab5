//! Callbacks fired synchronously from inside a tick or seek call.

use crate::state::ShotCursor;

/// Receives playback notifications. Both hooks run inside the triggering
/// call and are never queued.
pub trait PlaybackListener {
    /// In-shot elapsed seconds after a tick or seek.
    fn on_time_advanced(&mut self, _elapsed: f64) {}

    /// The active scene/shot changed.
    fn on_active_shot_changed(&mut self, _cursor: ShotCursor) {}
}

impl PlaybackListener for () {}

/// Keeps every notification it receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingListener {
    pub times: Vec<f64>,
    pub shot_changes: Vec<ShotCursor>,
}

impl PlaybackListener for RecordingListener {
    fn on_time_advanced(&mut self, elapsed: f64) {
        self.times.push(elapsed);
    }

    fn on_active_shot_changed(&mut self, cursor: ShotCursor) {
        self.shot_changes.push(cursor);
    }
}
