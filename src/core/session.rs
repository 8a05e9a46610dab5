//! One editing session's timeline engine.
//!
//! `TimelineSession` owns the scene snapshot, the scheduler, the dual-clock
//! synchronizer and the magnetic grid. It is created by the caller, reset
//! when the scene list changes, and dropped with the session. The scheduler
//! holds the authoritative active indices; seeks and audio updates reach it
//! only through `set_position`.

use std::time::Instant;

use crate::core::grid::{calculate_grid_percentage, format_time, TimeFormat};
use crate::core::listener::PlaybackListener;
use crate::core::playback::{PlaybackScheduler, PlaybackState, TickOutcome};
use crate::core::sequence::{
    calculate_all_shot_timecodes, calculate_current_shot_start_time, calculate_global_progress,
    calculate_shot_start_time, sequence_duration, ShotTimecodes,
};
use crate::core::sync::{ClockWriter, DualClockSynchronizer, SeekOutcome, SyncUpdate};
use crate::core::timeline_snap::MagneticGrid;
use crate::state::{ClockState, ProjectSettings, Scene, Shot, ShotCursor, ShotLocation, StoryboardSnapshot};

fn scene_shots(scenes: &[Scene], scene_index: usize) -> &[Shot] {
    scenes
        .get(scene_index)
        .map(|scene| scene.images.as_slice())
        .unwrap_or(&[])
}

#[derive(Debug, Clone)]
pub struct TimelineSession {
    scenes: Vec<Scene>,
    settings: ProjectSettings,
    scheduler: PlaybackScheduler,
    sync: DualClockSynchronizer,
    magnet: MagneticGrid,
}

impl TimelineSession {
    pub fn new(scenes: Vec<Scene>, settings: ProjectSettings) -> Self {
        let mut session = Self {
            scheduler: PlaybackScheduler::new(settings.playback.end_behavior),
            scenes,
            settings,
            sync: DualClockSynchronizer::new(),
            magnet: MagneticGrid::new(),
        };
        session.scheduler.reset(&session.scenes);
        session.refresh_active_scene();
        session
    }

    pub fn from_snapshot(snapshot: StoryboardSnapshot) -> Self {
        Self::new(snapshot.scenes, snapshot.settings)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> &ClockState {
        self.sync.clock()
    }

    pub fn cursor(&self) -> ShotCursor {
        self.scheduler.cursor()
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Shots of the active scene, empty when the index is out of range.
    pub fn active_shots(&self) -> &[Shot] {
        scene_shots(&self.scenes, self.cursor().scene_index)
    }

    pub fn master_time(&self) -> f64 {
        self.sync.master_time()
    }

    /// Length of the active scene.
    pub fn total_duration(&self) -> f64 {
        self.clock().total_duration
    }

    /// Position within the active scene as a percentage.
    pub fn progress(&self) -> f64 {
        calculate_grid_percentage(self.master_time(), self.total_duration())
    }

    /// Position across every scene as a percentage.
    pub fn global_progress(&self) -> f64 {
        calculate_global_progress(&self.scenes, self.cursor(), self.scheduler.elapsed())
    }

    /// Global start of the active shot.
    pub fn current_shot_start_time(&self) -> f64 {
        calculate_current_shot_start_time(&self.scenes, self.cursor())
    }

    pub fn timecodes(&self) -> ShotTimecodes<'_> {
        calculate_all_shot_timecodes(&self.scenes, self.cursor())
    }

    pub fn format_master_time(&self, format: TimeFormat) -> String {
        format_time(self.master_time(), format, self.settings.fps)
    }

    pub fn magnetic_points(&self) -> &[f64] {
        self.magnet.points()
    }

    pub fn is_near_magnetic_point(&self, time: f64) -> bool {
        self.magnet.is_near(time, &self.settings.magnetism)
    }

    // =========================================================================
    // Structure changes
    // =========================================================================

    /// Swap in a new scene list. Clock state starts over.
    pub fn replace_scenes(&mut self, scenes: Vec<Scene>) {
        self.scenes = scenes;
        self.sync.reset();
        self.scheduler.reset(&self.scenes);
        self.refresh_active_scene();
        tracing::debug!(scenes = self.scenes.len(), "scene list replaced");
    }

    pub fn update_settings(&mut self, settings: ProjectSettings) {
        self.scheduler.set_end_behavior(settings.playback.end_behavior);
        self.settings = settings;
        self.refresh_active_scene();
    }

    /// Make `scene_index` the active scene, starting at its first shot.
    pub fn select_scene(
        &mut self,
        scene_index: usize,
        now: Instant,
        listener: &mut dyn PlaybackListener,
    ) -> bool {
        if scene_index >= self.scenes.len() {
            return false;
        }
        let location = ShotLocation {
            cursor: ShotCursor::scene_start(scene_index),
            offset: 0.0,
        };
        self.apply_location(location, true, now, listener);
        true
    }

    fn refresh_active_scene(&mut self) {
        let total = sequence_duration(self.active_shots());
        self.sync.set_shot_duration(total);
        self.magnet
            .update(&self.settings.magnetism, self.sync.clock().total_duration, self.settings.fps);
        self.sync_master_from_scheduler();
    }

    fn sync_master_from_scheduler(&mut self) {
        let start = calculate_shot_start_time(self.active_shots(), self.cursor().image_index);
        self.sync.set_master_time(start + self.scheduler.elapsed());
    }

    fn apply_location(
        &mut self,
        location: ShotLocation,
        shot_changed: bool,
        now: Instant,
        listener: &mut dyn PlaybackListener,
    ) {
        let scene_changed = location.cursor.scene_index != self.cursor().scene_index;
        self.scheduler.set_position(location, now);
        if scene_changed {
            self.refresh_active_scene();
        } else {
            self.sync_master_from_scheduler();
        }
        if shot_changed {
            tracing::debug!(cursor = ?location.cursor, "active shot changed");
            listener.on_active_shot_changed(location.cursor);
        }
        listener.on_time_advanced(location.offset);
    }

    // =========================================================================
    // Transport
    // =========================================================================

    pub fn play(&mut self, now: Instant) -> bool {
        let scene_before = self.cursor().scene_index;
        let started = self.scheduler.play(now, &self.scenes);
        if self.cursor().scene_index != scene_before {
            self.refresh_active_scene();
        } else {
            self.sync_master_from_scheduler();
        }
        started
    }

    pub fn pause(&mut self, now: Instant) -> bool {
        let paused = self.scheduler.pause(now);
        self.sync_master_from_scheduler();
        paused
    }

    pub fn stop(&mut self, now: Instant) -> bool {
        let stopped = self.scheduler.stop(now);
        self.sync_master_from_scheduler();
        stopped
    }

    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.is_playing() {
            self.pause(now)
        } else {
            self.play(now)
        }
    }

    /// Wall-clock tick. Does nothing while a scrub owns the clock or while
    /// an attached audio source is driving the position.
    pub fn tick(&mut self, now: Instant, listener: &mut dyn PlaybackListener) -> TickOutcome {
        if !self.sync.can_write(ClockWriter::Tick) || self.sync.is_audio_driven() {
            return TickOutcome::Idle;
        }
        let scene_before = self.cursor().scene_index;
        let outcome = self.scheduler.tick(now, &self.scenes, listener);
        if self.cursor().scene_index != scene_before {
            self.refresh_active_scene();
        } else if outcome != TickOutcome::Idle {
            self.sync_master_from_scheduler();
        }
        outcome
    }

    pub fn next_shot(&mut self, now: Instant, listener: &mut dyn PlaybackListener) -> bool {
        let scene_before = self.cursor().scene_index;
        let moved = self.scheduler.next_shot(now, &self.scenes, listener);
        self.after_step(moved, scene_before);
        moved
    }

    pub fn prev_shot(&mut self, now: Instant, listener: &mut dyn PlaybackListener) -> bool {
        let scene_before = self.cursor().scene_index;
        let moved = self.scheduler.prev_shot(now, &self.scenes, listener);
        self.after_step(moved, scene_before);
        moved
    }

    fn after_step(&mut self, moved: bool, scene_before: usize) {
        if !moved {
            return;
        }
        if self.cursor().scene_index != scene_before {
            self.refresh_active_scene();
        } else {
            self.sync_master_from_scheduler();
        }
    }

    // =========================================================================
    // Seeking and audio sync
    // =========================================================================

    /// Start a drag on the shot timeline. Ticks and audio updates are
    /// ignored until `end_scrub`.
    pub fn begin_scrub(&mut self) -> bool {
        let acquired = self.sync.acquire(ClockWriter::Seek);
        if acquired {
            tracing::debug!("scrub started");
        }
        acquired
    }

    /// Release the scrub lock; playback resumes from the scrubbed position.
    pub fn end_scrub(&mut self, now: Instant) {
        if !self.is_scrubbing() {
            return;
        }
        self.sync.release(ClockWriter::Seek);
        let location = ShotLocation {
            cursor: self.cursor(),
            offset: self.scheduler.elapsed(),
        };
        self.scheduler.set_position(location, now);
        tracing::debug!("scrub ended");
    }

    pub fn is_scrubbing(&self) -> bool {
        self.sync.owner() == Some(ClockWriter::Seek)
    }

    /// Seek the active scene by percentage, with magnetism applied to the
    /// raw target before it is resolved to a shot.
    pub fn seek_percent(
        &mut self,
        percent: f64,
        now: Instant,
        listener: &mut dyn PlaybackListener,
    ) -> SeekOutcome {
        let target = self.sync.percent_to_time(percent);
        self.seek_time(target, now, listener)
    }

    pub fn seek_time(
        &mut self,
        time: f64,
        now: Instant,
        listener: &mut dyn PlaybackListener,
    ) -> SeekOutcome {
        let target = self.magnet.apply(time, &self.settings.magnetism);
        let active = self.cursor();
        let shots = scene_shots(&self.scenes, active.scene_index);
        let outcome = self.sync.seek_time(target, shots, active);
        if let Some(location) = outcome.location {
            self.apply_location(location, outcome.shot_changed, now, listener);
        }
        outcome
    }

    /// The audio source reported `audio_time`.
    pub fn on_audio_time_update(
        &mut self,
        audio_time: f64,
        now: Instant,
        listener: &mut dyn PlaybackListener,
    ) -> Option<SyncUpdate> {
        let active = self.cursor();
        let shots = scene_shots(&self.scenes, active.scene_index);
        let update = self.sync.on_audio_time_update(audio_time, shots, active)?;
        if let Some(location) = update.location {
            self.apply_location(location, update.shot_changed, now, listener);
        }
        Some(update)
    }

    pub fn attach_audio(&mut self, duration: f64) {
        self.sync.attach_audio(duration);
        tracing::debug!(duration = self.clock().audio_duration, "audio attached");
    }

    pub fn detach_audio(&mut self) {
        self.sync.detach_audio();
    }

    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.sync.set_sync_enabled(enabled);
    }

    pub fn convert_shot_time_to_audio_time(&self, shot_time: f64) -> f64 {
        self.sync.convert_shot_time_to_audio_time(shot_time)
    }

    pub fn convert_audio_time_to_shot_time(&self, audio_time: f64) -> f64 {
        self.sync.convert_audio_time_to_shot_time(audio_time)
    }
}
