//! Shot sequence addressing.
//!
//! Two notions of "total duration" live side by side here and are kept
//! apart on purpose:
//! - per-scene functions (`calculate_shot_start_time`, `find_shot_at_time`,
//!   `sequence_duration`) work on the active scene's shot list, which is what
//!   playback schedules against;
//! - cross-scene functions (`calculate_all_shot_timecodes`,
//!   `calculate_accumulated_time_to_scene`, `calculate_total_duration`) sum
//!   every scene and feed global progress displays.
//!
//! Every duration is rounded onto the grid individually before summing.

use crate::core::grid::{calculate_grid_percentage, grid_points_to_seconds, seconds_to_grid_points, GridPoint};
use crate::state::{Scene, Shot, ShotCursor, ShotLocation};

fn shot_points(shot: &Shot) -> GridPoint {
    seconds_to_grid_points(shot.duration_seconds())
}

fn shots_points(shots: &[Shot]) -> GridPoint {
    shots
        .iter()
        .map(shot_points)
        .fold(0, GridPoint::saturating_add)
}

fn start_points(shots: &[Shot], index: usize) -> GridPoint {
    shots_points(&shots[..index.min(shots.len())])
}

/// Total length of one scene's shot list.
pub fn sequence_duration(shots: &[Shot]) -> f64 {
    grid_points_to_seconds(shots_points(shots))
}

/// Start of shot `index`: the grid-rounded sum of every shot before it.
pub fn calculate_shot_start_time(shots: &[Shot], index: usize) -> f64 {
    grid_points_to_seconds(start_points(shots, index))
}

/// End of shot `index`. Out-of-range indices contribute no duration.
pub fn calculate_shot_end_time(shots: &[Shot], index: usize) -> f64 {
    let duration = shots.get(index).map(shot_points).unwrap_or(0);
    grid_points_to_seconds(start_points(shots, index).saturating_add(duration))
}

/// Index of the shot whose `[start, end)` window contains `time`.
pub fn find_shot_at_time(shots: &[Shot], time: f64) -> Option<usize> {
    locate_in_shots(shots, time).map(|(index, _)| index)
}

/// Like [`find_shot_at_time`], also returning the offset into the shot.
pub fn locate_in_shots(shots: &[Shot], time: f64) -> Option<(usize, f64)> {
    if !time.is_finite() || time < 0.0 {
        return None;
    }
    let mut start: GridPoint = 0;
    for (index, shot) in shots.iter().enumerate() {
        let end = start.saturating_add(shot_points(shot));
        let start_seconds = grid_points_to_seconds(start);
        if time >= start_seconds && time < grid_points_to_seconds(end) {
            return Some((index, time - start_seconds));
        }
        start = end;
    }
    None
}

/// A shot placed on the global, all-scenes timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedShot<'a> {
    pub shot: &'a Shot,
    pub scene_index: usize,
    pub image_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub is_active: bool,
}

impl TimedShot<'_> {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn cursor(&self) -> ShotCursor {
        ShotCursor::new(self.scene_index, self.image_index)
    }
}

/// Every shot of every scene in time order, plus the accumulated total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotTimecodes<'a> {
    pub shots: Vec<TimedShot<'a>>,
    pub total_duration: f64,
}

pub fn calculate_all_shot_timecodes(scenes: &[Scene], active: ShotCursor) -> ShotTimecodes<'_> {
    let mut shots = Vec::with_capacity(scenes.iter().map(|s| s.images.len()).sum());
    let mut cursor: GridPoint = 0;

    for (scene_index, scene) in scenes.iter().enumerate() {
        for (image_index, shot) in scene.images.iter().enumerate() {
            let end = cursor.saturating_add(shot_points(shot));
            shots.push(TimedShot {
                shot,
                scene_index,
                image_index,
                start_time: grid_points_to_seconds(cursor),
                end_time: grid_points_to_seconds(end),
                is_active: active == ShotCursor::new(scene_index, image_index),
            });
            cursor = end;
        }
    }

    ShotTimecodes {
        shots,
        total_duration: grid_points_to_seconds(cursor),
    }
}

fn accumulated_points(scenes: &[Scene], scene_index: usize) -> GridPoint {
    scenes[..scene_index.min(scenes.len())]
        .iter()
        .map(|scene| shots_points(&scene.images))
        .fold(0, GridPoint::saturating_add)
}

/// Sum of every shot in the scenes strictly before `scene_index`.
pub fn calculate_accumulated_time_to_scene(scenes: &[Scene], scene_index: usize) -> f64 {
    grid_points_to_seconds(accumulated_points(scenes, scene_index))
}

/// Length of the whole storyboard, every scene included.
pub fn calculate_total_duration(scenes: &[Scene]) -> f64 {
    calculate_accumulated_time_to_scene(scenes, scenes.len())
}

/// Global start of the active shot: preceding scenes plus the preceding
/// shots of the active scene.
pub fn calculate_current_shot_start_time(scenes: &[Scene], active: ShotCursor) -> f64 {
    let in_scene = scenes
        .get(active.scene_index)
        .map(|scene| start_points(&scene.images, active.image_index))
        .unwrap_or(0);
    grid_points_to_seconds(accumulated_points(scenes, active.scene_index).saturating_add(in_scene))
}

/// Resolve a global time into the owning scene, shot and offset.
pub fn find_shot_in_scenes(scenes: &[Scene], time: f64) -> Option<ShotLocation> {
    if !time.is_finite() || time < 0.0 {
        return None;
    }
    let mut scene_start: GridPoint = 0;
    for (scene_index, scene) in scenes.iter().enumerate() {
        let scene_end = scene_start.saturating_add(shots_points(&scene.images));
        if time < grid_points_to_seconds(scene_end) {
            let local = time - grid_points_to_seconds(scene_start);
            if let Some((image_index, offset)) = locate_in_shots(&scene.images, local) {
                return Some(ShotLocation {
                    cursor: ShotCursor::new(scene_index, image_index),
                    offset,
                });
            }
        }
        scene_start = scene_end;
    }
    None
}

/// Position across the whole storyboard as a percentage.
pub fn calculate_global_progress(scenes: &[Scene], active: ShotCursor, offset: f64) -> f64 {
    let position = calculate_current_shot_start_time(scenes, active) + offset.max(0.0);
    calculate_grid_percentage(position, calculate_total_duration(scenes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shots(durations: &[f64]) -> Vec<Shot> {
        durations.iter().map(|&d| Shot::new(d)).collect()
    }

    fn storyboard() -> Vec<Scene> {
        vec![
            Scene::from_durations(&[2.0, 3.0]),
            Scene::from_durations(&[4.0]),
        ]
    }

    #[test]
    fn test_shot_start_and_end_times() {
        let shots = shots(&[2.0, 3.0, 4.0]);
        assert_eq!(calculate_shot_start_time(&shots, 0), 0.0);
        assert_eq!(calculate_shot_start_time(&shots, 1), 2.0);
        assert_eq!(calculate_shot_start_time(&shots, 2), 5.0);
        assert_eq!(calculate_shot_end_time(&shots, 2), 9.0);
        assert_eq!(calculate_shot_start_time(&shots, 10), 9.0);
        assert_eq!(calculate_shot_end_time(&shots, 10), 9.0);
        assert_eq!(sequence_duration(&shots), 9.0);
    }

    #[test]
    fn test_find_shot_at_time() {
        let shots = shots(&[2.0, 3.0, 4.0]);
        assert_eq!(find_shot_at_time(&shots, 0.0), Some(0));
        assert_eq!(find_shot_at_time(&shots, 4.999), Some(1));
        assert_eq!(find_shot_at_time(&shots, 5.0), Some(2));
        assert_eq!(find_shot_at_time(&shots, 9.0), None);
        assert_eq!(find_shot_at_time(&shots, -0.5), None);
        assert_eq!(find_shot_at_time(&[], 0.0), None);
    }

    #[test]
    fn test_zero_duration_shots_are_never_found() {
        let shots = shots(&[0.0, 2.0, 0.0, 1.0]);
        assert_eq!(find_shot_at_time(&shots, 0.0), Some(1));
        assert_eq!(find_shot_at_time(&shots, 2.0), Some(3));
        let (index, offset) = locate_in_shots(&shots, 2.5).unwrap();
        assert_eq!(index, 3);
        assert!((offset - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_and_nan_durations_count_as_zero() {
        let shots = shots(&[-3.0, f64::NAN, 1.5]);
        assert_eq!(sequence_duration(&shots), 1.5);
        assert_eq!(calculate_shot_start_time(&shots, 2), 0.0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let huge = shots(&[1.0e17, 1.0e17]);
        let max = grid_points_to_seconds(GridPoint::MAX);
        assert_eq!(sequence_duration(&huge), max);
        assert_eq!(calculate_shot_end_time(&huge, 1), max);
        assert_eq!(find_shot_at_time(&huge, 5.0), Some(0));

        let scenes = vec![Scene::new(huge.clone()), Scene::new(huge)];
        assert_eq!(calculate_total_duration(&scenes), max);
        assert_eq!(calculate_current_shot_start_time(&scenes, ShotCursor::new(1, 1)), max);
        let timecodes = calculate_all_shot_timecodes(&scenes, ShotCursor::default());
        assert_eq!(timecodes.total_duration, max);
        assert_eq!(find_shot_in_scenes(&scenes, 1.0).map(|l| l.cursor), Some(ShotCursor::new(0, 0)));
    }

    #[test]
    fn test_per_term_rounding_avoids_drift() {
        let shots = shots(&[0.1; 1000]);
        assert_eq!(sequence_duration(&shots), 100.0);
        assert_eq!(calculate_shot_start_time(&shots, 500), 50.0);
    }

    #[test]
    fn test_all_shot_timecodes() {
        let scenes = storyboard();
        let timecodes = calculate_all_shot_timecodes(&scenes, ShotCursor::new(0, 1));
        assert_eq!(timecodes.total_duration, 9.0);
        assert_eq!(timecodes.shots.len(), 3);

        let second = &timecodes.shots[1];
        assert_eq!((second.scene_index, second.image_index), (0, 1));
        assert_eq!((second.start_time, second.end_time), (2.0, 5.0));
        assert!(second.is_active);

        let third = &timecodes.shots[2];
        assert_eq!(third.cursor(), ShotCursor::new(1, 0));
        assert_eq!((third.start_time, third.end_time), (5.0, 9.0));
        assert_eq!(third.duration(), 4.0);
        assert!(!third.is_active);
        assert_eq!(timecodes.shots.iter().filter(|s| s.is_active).count(), 1);
    }

    #[test]
    fn test_timecodes_keep_shot_labels() {
        let scenes = vec![Scene::new(vec![
            Shot::with_label(1.5, "establishing"),
            Shot::new(2.0),
        ])];
        let timecodes = calculate_all_shot_timecodes(&scenes, ShotCursor::default());
        assert_eq!(timecodes.shots[0].shot.label.as_deref(), Some("establishing"));
        assert_eq!(timecodes.shots[1].shot.label, None);
        assert_eq!(timecodes.shots[1].start_time, 1.5);
    }

    #[test]
    fn test_accumulated_time_to_scene() {
        let scenes = storyboard();
        assert_eq!(calculate_accumulated_time_to_scene(&scenes, 0), 0.0);
        assert_eq!(calculate_accumulated_time_to_scene(&scenes, 1), 5.0);
        assert_eq!(calculate_accumulated_time_to_scene(&scenes, 7), 9.0);
        assert_eq!(calculate_total_duration(&scenes), 9.0);
    }

    #[test]
    fn test_current_shot_start_time_spans_scenes() {
        let scenes = storyboard();
        assert_eq!(calculate_current_shot_start_time(&scenes, ShotCursor::new(1, 0)), 5.0);
        assert_eq!(calculate_current_shot_start_time(&scenes, ShotCursor::new(0, 1)), 2.0);
    }

    #[test]
    fn test_find_shot_in_scenes() {
        let scenes = vec![
            Scene::from_durations(&[2.0, 3.0]),
            Scene::new(Vec::new()),
            Scene::from_durations(&[4.0]),
        ];
        let location = find_shot_in_scenes(&scenes, 6.5).unwrap();
        assert_eq!(location.cursor, ShotCursor::new(2, 0));
        assert!((location.offset - 1.5).abs() < 1e-9);
        assert_eq!(find_shot_in_scenes(&scenes, 4.0).unwrap().cursor, ShotCursor::new(0, 1));
        assert_eq!(find_shot_in_scenes(&scenes, 9.0), None);
    }

    #[test]
    fn test_global_progress() {
        let scenes = storyboard();
        let progress = calculate_global_progress(&scenes, ShotCursor::new(1, 0), 2.75);
        assert!((progress - 7.75 / 9.0 * 100.0).abs() < 1e-9);
        assert_eq!(calculate_global_progress(&[], ShotCursor::default(), 1.0), 0.0);
    }

    #[test]
    fn test_empty_storyboard_is_all_zero() {
        let timecodes = calculate_all_shot_timecodes(&[], ShotCursor::default());
        assert!(timecodes.shots.is_empty());
        assert_eq!(timecodes.total_duration, 0.0);
        assert_eq!(calculate_total_duration(&[]), 0.0);
        assert_eq!(calculate_current_shot_start_time(&[], ShotCursor::new(3, 2)), 0.0);
        assert_eq!(find_shot_in_scenes(&[], 0.0), None);
    }
}
