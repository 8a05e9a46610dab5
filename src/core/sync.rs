//! Dual-clock synchronization between the shot axis and an audio axis.
//!
//! The two axes have different total lengths and are kept ratio-locked:
//! `shot_time / shot_total == audio_time / audio_duration` while sync is on.
//! Updates can arrive from three writers (a manual seek, the audio source,
//! the playback tick); only one may own the clock at a time, and active
//! indices are only reported as changed when the resolved shot actually
//! differs from the current one.

use crate::core::grid::{snap_seconds_to_grid, sync_time_based_on_grid};
use crate::core::sequence::{locate_in_shots, sequence_duration};
use crate::state::{ClockState, Shot, ShotCursor, ShotLocation};

/// Who is mutating the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockWriter {
    Seek,
    Audio,
    Tick,
}

/// Result of an audio-driven update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncUpdate {
    pub shot_time: f64,
    pub location: Option<ShotLocation>,
    /// True only when the resolved shot differs from the active one.
    pub shot_changed: bool,
}

/// Result of a seek on the shot axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekOutcome {
    pub shot_time: f64,
    pub location: Option<ShotLocation>,
    pub shot_changed: bool,
    /// Time to push to the audio source, when one is attached and synced.
    pub audio_time: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DualClockSynchronizer {
    clock: ClockState,
    owner: Option<ClockWriter>,
}

impl DualClockSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.clock.reset();
        self.owner = None;
    }

    pub fn clock(&self) -> &ClockState {
        &self.clock
    }

    pub fn master_time(&self) -> f64 {
        self.clock.master_time
    }

    /// Set the shot-axis length (the active scene's duration).
    pub fn set_shot_duration(&mut self, total: f64) {
        let total = if total.is_finite() { total.max(0.0) } else { 0.0 };
        self.clock.total_duration = snap_seconds_to_grid(total);
        let master = self.clock.master_time;
        self.clock.set_master_time(master);
    }

    /// Audio metadata arrived. A zero or invalid duration detaches.
    pub fn attach_audio(&mut self, duration: f64) {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        if duration == 0.0 {
            tracing::warn!("audio duration unknown, shot axis runs unsynced");
        }
        self.clock.audio_duration = duration;
        let audio = self.clock.audio_current_time;
        self.clock.set_audio_time(audio);
    }

    pub fn detach_audio(&mut self) {
        self.clock.audio_duration = 0.0;
        self.clock.audio_current_time = 0.0;
    }

    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.clock.sync_enabled = enabled;
    }

    /// Audio drives the position instead of the wall clock.
    pub fn is_audio_driven(&self) -> bool {
        self.clock.sync_enabled && self.clock.has_audio()
    }

    pub fn convert_shot_time_to_audio_time(&self, shot_time: f64) -> f64 {
        sync_time_based_on_grid(shot_time, self.clock.total_duration, self.clock.audio_duration)
    }

    pub fn convert_audio_time_to_shot_time(&self, audio_time: f64) -> f64 {
        sync_time_based_on_grid(audio_time, self.clock.audio_duration, self.clock.total_duration)
    }

    // -------------------------------------------------------------------------
    // Single-writer token
    // -------------------------------------------------------------------------

    pub fn owner(&self) -> Option<ClockWriter> {
        self.owner
    }

    pub fn can_write(&self, writer: ClockWriter) -> bool {
        self.owner.map_or(true, |owner| owner == writer)
    }

    /// Take exclusive ownership of the clock. Fails if another writer holds it.
    pub fn acquire(&mut self, writer: ClockWriter) -> bool {
        if !self.can_write(writer) {
            tracing::debug!(?writer, owner = ?self.owner, "clock busy");
            return false;
        }
        self.owner = Some(writer);
        true
    }

    pub fn release(&mut self, writer: ClockWriter) {
        if self.owner == Some(writer) {
            self.owner = None;
        }
    }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Store a new master time from the tick path. Ignored while another
    /// writer owns the clock.
    pub fn set_master_time(&mut self, time: f64) -> Option<f64> {
        if !self.can_write(ClockWriter::Tick) {
            return None;
        }
        Some(self.clock.set_master_time(snap_seconds_to_grid(time)))
    }

    /// The audio source reported a new `current_time`.
    ///
    /// Returns `None` when sync is off, no audio duration is known, or
    /// another writer owns the clock.
    pub fn on_audio_time_update(
        &mut self,
        audio_time: f64,
        shots: &[Shot],
        active: ShotCursor,
    ) -> Option<SyncUpdate> {
        if !self.is_audio_driven() {
            return None;
        }
        if !self.can_write(ClockWriter::Audio) {
            tracing::trace!(audio_time, owner = ?self.owner, "audio update ignored");
            return None;
        }

        let audio_time = self.clock.set_audio_time(audio_time);
        let shot_time = self.clock.set_master_time(self.convert_audio_time_to_shot_time(audio_time));
        let location = resolve_location(shots, shot_time, active);
        let shot_changed = location.is_some_and(|loc| loc.cursor != active);

        Some(SyncUpdate {
            shot_time,
            location,
            shot_changed,
        })
    }

    /// Shot-axis time for a seek percentage, clamped to `[0, 100]`.
    pub fn percent_to_time(&self, percent: f64) -> f64 {
        let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
        percent / 100.0 * self.clock.total_duration
    }

    pub fn seek_percent(&mut self, percent: f64, shots: &[Shot], active: ShotCursor) -> SeekOutcome {
        let target = self.percent_to_time(percent);
        self.seek_time(target, shots, active)
    }

    /// Explicit seek on the shot axis. Out-of-range times are clamped.
    pub fn seek_time(&mut self, time: f64, shots: &[Shot], active: ShotCursor) -> SeekOutcome {
        let shot_time = self.clock.set_master_time(snap_seconds_to_grid(time));
        let location = resolve_location(shots, shot_time, active);
        let shot_changed = location.is_some_and(|loc| loc.cursor != active);

        let audio_time = if self.is_audio_driven() {
            let audio = self.convert_shot_time_to_audio_time(shot_time);
            Some(self.clock.set_audio_time(audio))
        } else {
            None
        };

        tracing::debug!(shot_time, ?audio_time, shot_changed, "seek");
        SeekOutcome {
            shot_time,
            location,
            shot_changed,
            audio_time,
        }
    }
}

/// Resolve a shot-axis time inside the active scene. The very end of the
/// scene resolves to the end of its last playable shot.
fn resolve_location(shots: &[Shot], time: f64, active: ShotCursor) -> Option<ShotLocation> {
    if let Some((index, offset)) = locate_in_shots(shots, time) {
        return Some(ShotLocation {
            cursor: active.with_image(index),
            offset,
        });
    }
    let (index, last) = shots
        .iter()
        .enumerate()
        .rev()
        .find(|(_, shot)| shot.duration_seconds() > 0.0)?;
    if time < sequence_duration(shots) {
        return None;
    }
    Some(ShotLocation {
        cursor: active.with_image(index),
        offset: snap_seconds_to_grid(last.duration_seconds()),
    })
}
