//! Playback scheduler: a stopped/playing/paused state machine stepping
//! through shots.
//!
//! Elapsed time is always recomputed from the wall-clock delta since the
//! last baseline, never from a tick count, so late or skipped ticks do not
//! slow playback down. Callers pass the current `Instant` in explicitly.

use std::time::Instant;

use crate::core::listener::PlaybackListener;
use crate::state::{EndBehavior, Scene, ShotCursor, ShotLocation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not playing; nothing changed.
    Idle,
    /// Still inside the active shot; carries the in-shot elapsed seconds.
    Advanced(f64),
    /// Moved on to another shot.
    ShotChanged(ShotCursor),
    /// Wrapped around to the first shot.
    Looped(ShotCursor),
    /// Reached the end of the last shot and stopped.
    Finished,
}

fn shot_duration(scenes: &[Scene], cursor: ShotCursor) -> Option<f64> {
    scenes
        .get(cursor.scene_index)
        .and_then(|scene| scene.images.get(cursor.image_index))
        .map(|shot| shot.duration_seconds())
}

/// First shot of the first non-empty scene at or after `scene_index`.
fn first_shot_from(scenes: &[Scene], scene_index: usize) -> Option<ShotCursor> {
    scenes
        .iter()
        .enumerate()
        .skip(scene_index)
        .find(|(_, scene)| !scene.is_empty())
        .map(|(index, _)| ShotCursor::scene_start(index))
}

/// The shot after `cursor`, crossing into later scenes and skipping empty ones.
pub fn next_cursor(scenes: &[Scene], cursor: ShotCursor) -> Option<ShotCursor> {
    let scene = scenes.get(cursor.scene_index)?;
    if cursor.image_index + 1 < scene.images.len() {
        return Some(cursor.with_image(cursor.image_index + 1));
    }
    first_shot_from(scenes, cursor.scene_index + 1)
}

/// The shot before `cursor`, crossing into earlier scenes and skipping empty ones.
pub fn prev_cursor(scenes: &[Scene], cursor: ShotCursor) -> Option<ShotCursor> {
    let scene = scenes.get(cursor.scene_index)?;
    if cursor.image_index > 0 && !scene.is_empty() {
        let index = (cursor.image_index - 1).min(scene.images.len() - 1);
        return Some(cursor.with_image(index));
    }
    scenes[..cursor.scene_index]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, scene)| !scene.is_empty())
        .map(|(index, scene)| ShotCursor::new(index, scene.images.len() - 1))
}

/// Next shot with a playable (non-zero) window.
fn next_playable(scenes: &[Scene], cursor: ShotCursor) -> Option<ShotCursor> {
    let mut candidate = next_cursor(scenes, cursor)?;
    loop {
        if shot_duration(scenes, candidate).is_some_and(|d| d > 0.0) {
            return Some(candidate);
        }
        candidate = next_cursor(scenes, candidate)?;
    }
}

fn first_playable(scenes: &[Scene]) -> Option<ShotCursor> {
    let first = first_shot_from(scenes, 0)?;
    if shot_duration(scenes, first).is_some_and(|d| d > 0.0) {
        return Some(first);
    }
    next_playable(scenes, first)
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    cursor: ShotCursor,
    /// In-shot elapsed seconds as of the last update.
    elapsed: f64,
    /// Elapsed seconds at `started_at`.
    baseline: f64,
    started_at: Option<Instant>,
    end_behavior: EndBehavior,
}

impl PlaybackScheduler {
    pub fn new(end_behavior: EndBehavior) -> Self {
        Self {
            end_behavior,
            ..Self::default()
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn cursor(&self) -> ShotCursor {
        self.cursor
    }

    /// In-shot elapsed seconds as of the last tick, seek or step.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// In-shot elapsed seconds at `now`, without mutating anything.
    pub fn elapsed_at(&self, now: Instant) -> f64 {
        match (self.state, self.started_at) {
            (PlaybackState::Playing, Some(started)) => {
                self.baseline + now.saturating_duration_since(started).as_secs_f64()
            }
            _ => self.elapsed,
        }
    }

    pub fn end_behavior(&self) -> EndBehavior {
        self.end_behavior
    }

    pub fn set_end_behavior(&mut self, end_behavior: EndBehavior) {
        self.end_behavior = end_behavior;
    }

    fn rebase(&mut self, elapsed: f64, now: Instant) {
        self.elapsed = elapsed;
        self.baseline = elapsed;
        self.started_at = self.is_playing().then_some(now);
    }

    fn freeze(&mut self, now: Instant) {
        let elapsed = self.elapsed_at(now);
        self.elapsed = elapsed;
        self.baseline = elapsed;
        self.started_at = None;
    }

    /// Back to the first playable shot, stopped.
    pub fn reset(&mut self, scenes: &[Scene]) {
        self.state = PlaybackState::Stopped;
        self.cursor = first_playable(scenes).unwrap_or_default();
        self.elapsed = 0.0;
        self.baseline = 0.0;
        self.started_at = None;
    }

    fn at_end(&self, scenes: &[Scene]) -> bool {
        match shot_duration(scenes, self.cursor) {
            Some(duration) => self.elapsed >= duration && next_playable(scenes, self.cursor).is_none(),
            None => true,
        }
    }

    /// Start or resume. Playing from the very end restarts from the top.
    pub fn play(&mut self, now: Instant, scenes: &[Scene]) -> bool {
        if self.is_playing() {
            return false;
        }
        let Some(first) = first_playable(scenes) else {
            tracing::debug!("nothing to play");
            return false;
        };
        if self.state == PlaybackState::Stopped && self.at_end(scenes) {
            self.cursor = first;
            self.elapsed = 0.0;
        }
        self.state = PlaybackState::Playing;
        self.baseline = self.elapsed;
        self.started_at = Some(now);
        tracing::debug!(cursor = ?self.cursor, elapsed = self.elapsed, "playback started");
        true
    }

    pub fn pause(&mut self, now: Instant) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.freeze(now);
        self.state = PlaybackState::Paused;
        tracing::debug!(elapsed = self.elapsed, "playback paused");
        true
    }

    /// Stop playback, keeping the frozen position as the resume point.
    pub fn stop(&mut self, now: Instant) -> bool {
        if self.state == PlaybackState::Stopped {
            return false;
        }
        self.freeze(now);
        self.state = PlaybackState::Stopped;
        tracing::debug!(elapsed = self.elapsed, "playback stopped");
        true
    }

    pub fn toggle(&mut self, now: Instant, scenes: &[Scene]) -> bool {
        if self.is_playing() {
            self.pause(now)
        } else {
            self.play(now, scenes)
        }
    }

    /// Advance from the wall clock.
    pub fn tick(
        &mut self,
        now: Instant,
        scenes: &[Scene],
        listener: &mut dyn PlaybackListener,
    ) -> TickOutcome {
        if !self.is_playing() {
            return TickOutcome::Idle;
        }
        let elapsed = self.elapsed_at(now);

        let Some(duration) = shot_duration(scenes, self.cursor) else {
            // The scene list changed underneath us.
            return match first_playable(scenes) {
                Some(first) => self.enter(first, now, listener),
                None => {
                    self.stop(now);
                    TickOutcome::Finished
                }
            };
        };

        if elapsed < duration {
            self.elapsed = elapsed;
            tracing::trace!(elapsed, "tick");
            listener.on_time_advanced(elapsed);
            return TickOutcome::Advanced(elapsed);
        }

        if let Some(next) = next_playable(scenes, self.cursor) {
            return self.enter(next, now, listener);
        }

        match self.end_behavior {
            EndBehavior::Stop => {
                self.elapsed = duration;
                self.baseline = duration;
                self.started_at = None;
                self.state = PlaybackState::Stopped;
                listener.on_time_advanced(duration);
                tracing::debug!(cursor = ?self.cursor, "playback finished");
                TickOutcome::Finished
            }
            EndBehavior::Loop => match first_playable(scenes) {
                Some(first) => {
                    self.enter(first, now, listener);
                    TickOutcome::Looped(first)
                }
                None => {
                    self.stop(now);
                    TickOutcome::Finished
                }
            },
        }
    }

    fn enter(
        &mut self,
        cursor: ShotCursor,
        now: Instant,
        listener: &mut dyn PlaybackListener,
    ) -> TickOutcome {
        self.cursor = cursor;
        self.rebase(0.0, now);
        tracing::debug!(?cursor, "active shot changed");
        listener.on_active_shot_changed(cursor);
        listener.on_time_advanced(0.0);
        TickOutcome::ShotChanged(cursor)
    }

    /// Step forward one shot. No-op on the last shot.
    pub fn next_shot(
        &mut self,
        now: Instant,
        scenes: &[Scene],
        listener: &mut dyn PlaybackListener,
    ) -> bool {
        match next_cursor(scenes, self.cursor) {
            Some(next) => {
                self.enter(next, now, listener);
                true
            }
            None => false,
        }
    }

    /// Step back one shot. No-op on the first shot.
    pub fn prev_shot(
        &mut self,
        now: Instant,
        scenes: &[Scene],
        listener: &mut dyn PlaybackListener,
    ) -> bool {
        match prev_cursor(scenes, self.cursor) {
            Some(prev) => {
                self.enter(prev, now, listener);
                true
            }
            None => false,
        }
    }

    /// Jump to a resolved location (seek / audio sync path).
    pub fn set_position(&mut self, location: ShotLocation, now: Instant) {
        self.cursor = location.cursor;
        self.rebase(location.offset.max(0.0), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listener::RecordingListener;
    use std::time::Duration;

    fn scenes(durations: &[&[f64]]) -> Vec<Scene> {
        durations.iter().map(|d| Scene::from_durations(d)).collect()
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_state_transitions() {
        let scenes = scenes(&[&[2.0], &[3.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let t0 = Instant::now();
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert!(scheduler.play(t0, &scenes));
        assert!(!scheduler.play(t0, &scenes));
        assert!(scheduler.pause(t0 + ms(500)));
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert_eq!(scheduler.elapsed(), 0.5);
        assert!(scheduler.stop(t0 + ms(900)));
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert!(!scheduler.stop(t0 + ms(900)));
        assert_eq!(scheduler.elapsed(), 0.5);
    }

    #[test]
    fn test_play_with_nothing_playable() {
        let mut scheduler = PlaybackScheduler::default();
        assert!(!scheduler.play(Instant::now(), &[]));
        let empty = scenes(&[&[], &[0.0]]);
        assert!(!scheduler.play(Instant::now(), &empty));
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_elapsed_follows_wall_clock_not_tick_count() {
        let scenes = scenes(&[&[2.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let mut listener = RecordingListener::default();
        let t0 = Instant::now();
        scheduler.play(t0, &scenes);
        // One late tick covers the same ground as many punctual ones.
        let outcome = scheduler.tick(t0 + ms(1250), &scenes, &mut listener);
        assert_eq!(outcome, TickOutcome::Advanced(1.25));
        assert_eq!(listener.times, vec![1.25]);
    }

    #[test]
    fn test_pause_resume_keeps_baseline() {
        let scenes = scenes(&[&[5.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let t0 = Instant::now();
        scheduler.play(t0, &scenes);
        scheduler.pause(t0 + ms(1000));
        // Time spent paused does not count.
        scheduler.play(t0 + ms(4000), &scenes);
        let outcome = scheduler.tick(t0 + ms(4500), &scenes, &mut ());
        assert_eq!(outcome, TickOutcome::Advanced(1.5));
    }

    #[test]
    fn test_tick_advances_across_scenes_and_finishes() {
        let scenes = scenes(&[&[2.0], &[3.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let mut listener = RecordingListener::default();
        let t0 = Instant::now();
        scheduler.play(t0, &scenes);

        let outcome = scheduler.tick(t0 + ms(2000), &scenes, &mut listener);
        assert_eq!(outcome, TickOutcome::ShotChanged(ShotCursor::new(1, 0)));
        assert_eq!(scheduler.elapsed(), 0.0);

        let outcome = scheduler.tick(t0 + ms(3000), &scenes, &mut listener);
        assert_eq!(outcome, TickOutcome::Advanced(1.0));

        let outcome = scheduler.tick(t0 + ms(5100), &scenes, &mut listener);
        assert_eq!(outcome, TickOutcome::Finished);
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.cursor(), ShotCursor::new(1, 0));
        assert_eq!(scheduler.elapsed(), 3.0);
        assert_eq!(listener.shot_changes, vec![ShotCursor::new(1, 0)]);

        // Further ticks do nothing.
        assert_eq!(scheduler.tick(t0 + ms(9000), &scenes, &mut listener), TickOutcome::Idle);
    }

    #[test]
    fn test_play_after_finish_restarts() {
        let scenes = scenes(&[&[1.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let t0 = Instant::now();
        scheduler.play(t0, &scenes);
        assert_eq!(scheduler.tick(t0 + ms(1500), &scenes, &mut ()), TickOutcome::Finished);
        assert!(scheduler.play(t0 + ms(2000), &scenes));
        assert_eq!(scheduler.elapsed(), 0.0);
        assert_eq!(scheduler.cursor(), ShotCursor::new(0, 0));
    }

    #[test]
    fn test_loop_wraps_to_first_shot() {
        let scenes = scenes(&[&[], &[1.0, 1.0]]);
        let mut scheduler = PlaybackScheduler::new(EndBehavior::Loop);
        let mut listener = RecordingListener::default();
        let t0 = Instant::now();
        assert!(scheduler.play(t0, &scenes));
        assert_eq!(scheduler.cursor(), ShotCursor::new(1, 0));

        scheduler.tick(t0 + ms(1000), &scenes, &mut listener);
        let outcome = scheduler.tick(t0 + ms(2000), &scenes, &mut listener);
        assert_eq!(outcome, TickOutcome::Looped(ShotCursor::new(1, 0)));
        assert!(scheduler.is_playing());
        assert_eq!(
            listener.shot_changes,
            vec![ShotCursor::new(1, 1), ShotCursor::new(1, 0)]
        );
    }

    #[test]
    fn test_tick_skips_zero_duration_shots() {
        let scenes = scenes(&[&[1.0, 0.0, 0.0], &[], &[0.0, 2.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let t0 = Instant::now();
        scheduler.play(t0, &scenes);
        let outcome = scheduler.tick(t0 + ms(1000), &scenes, &mut ());
        assert_eq!(outcome, TickOutcome::ShotChanged(ShotCursor::new(2, 1)));
    }

    #[test]
    fn test_next_shot_is_clamped_at_the_end() {
        let scenes = scenes(&[&[2.0], &[3.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let mut listener = RecordingListener::default();
        let now = Instant::now();
        assert!(scheduler.next_shot(now, &scenes, &mut listener));
        assert!(!scheduler.next_shot(now, &scenes, &mut listener));
        assert!(!scheduler.next_shot(now, &scenes, &mut listener));
        assert_eq!(scheduler.cursor(), ShotCursor::new(1, 0));
        assert_eq!(listener.shot_changes, vec![ShotCursor::new(1, 0)]);
    }

    #[test]
    fn test_prev_shot_is_clamped_at_the_start() {
        let scenes = scenes(&[&[2.0, 1.0], &[], &[3.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let now = Instant::now();
        scheduler.set_position(
            ShotLocation {
                cursor: ShotCursor::new(2, 0),
                offset: 1.2,
            },
            now,
        );
        assert!(scheduler.prev_shot(now, &scenes, &mut ()));
        assert_eq!(scheduler.cursor(), ShotCursor::new(0, 1));
        assert_eq!(scheduler.elapsed(), 0.0);
        assert!(scheduler.prev_shot(now, &scenes, &mut ()));
        assert!(!scheduler.prev_shot(now, &scenes, &mut ()));
        assert_eq!(scheduler.cursor(), ShotCursor::new(0, 0));
    }

    #[test]
    fn test_stepping_while_playing_resets_elapsed() {
        let scenes = scenes(&[&[5.0, 5.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let t0 = Instant::now();
        scheduler.play(t0, &scenes);
        scheduler.tick(t0 + ms(3000), &scenes, &mut ());
        scheduler.next_shot(t0 + ms(3000), &scenes, &mut ());
        let outcome = scheduler.tick(t0 + ms(3400), &scenes, &mut ());
        assert_eq!(outcome, TickOutcome::Advanced(0.4));
    }

    #[test]
    fn test_scene_list_shrinking_under_playback() {
        let long = scenes(&[&[2.0], &[3.0]]);
        let short = scenes(&[&[4.0]]);
        let mut scheduler = PlaybackScheduler::default();
        let mut listener = RecordingListener::default();
        let t0 = Instant::now();
        scheduler.play(t0, &long);
        scheduler.next_shot(t0, &long, &mut listener);
        let outcome = scheduler.tick(t0 + ms(100), &short, &mut listener);
        assert_eq!(outcome, TickOutcome::ShotChanged(ShotCursor::new(0, 0)));
        assert_eq!(scheduler.tick(t0 + ms(100), &[], &mut listener), TickOutcome::Finished);
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
    }
}
