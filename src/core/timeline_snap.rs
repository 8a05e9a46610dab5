use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAGNET_STRENGTH, DEFAULT_MAGNET_THRESHOLD_SECONDS, MAX_MAGNETIC_POINTS};
use crate::core::grid::sanitize_fps;

/// Granularity of generated magnetic points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagneticPointType {
    /// Every frame boundary at the project fps.
    Frame,
    /// Whole seconds.
    #[default]
    Second,
    HalfSecond,
    QuarterSecond,
    TenthSecond,
    /// A caller-chosen interval in seconds.
    Custom,
}

/// Spacing between consecutive points.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PointStep {
    /// `n` points per second; point `i` sits at `i / n`.
    PerSecond(f64),
    /// Point `i` sits at `i * interval`.
    Interval(f64),
}

impl PointStep {
    fn seconds(self) -> f64 {
        match self {
            PointStep::PerSecond(n) => 1.0 / n,
            PointStep::Interval(interval) => interval,
        }
    }

    fn point(self, i: usize) -> f64 {
        match self {
            PointStep::PerSecond(n) => i as f64 / n,
            PointStep::Interval(interval) => i as f64 * interval,
        }
    }
}

impl MagneticPointType {
    fn step(self, fps: f64, custom_interval: Option<f64>) -> Option<PointStep> {
        match self {
            MagneticPointType::Frame => Some(PointStep::PerSecond(sanitize_fps(fps))),
            MagneticPointType::Second => Some(PointStep::PerSecond(1.0)),
            MagneticPointType::HalfSecond => Some(PointStep::PerSecond(2.0)),
            MagneticPointType::QuarterSecond => Some(PointStep::PerSecond(4.0)),
            MagneticPointType::TenthSecond => Some(PointStep::PerSecond(10.0)),
            MagneticPointType::Custom => custom_interval
                .filter(|interval| interval.is_finite() && *interval > 0.0)
                .map(PointStep::Interval),
        }
    }

    /// Seconds between points, or `None` when this type yields no points.
    pub fn interval_seconds(self, fps: f64, custom_interval: Option<f64>) -> Option<f64> {
        self.step(fps, custom_interval).map(PointStep::seconds)
    }
}

/// User-facing magnet controls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MagnetismSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub point_type: MagneticPointType,
    /// Pull factor from 0.0 (none) to 1.0 (exact snap).
    #[serde(default = "default_strength")]
    pub strength: f64,
    /// Maximum distance in seconds at which a point attracts.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Interval in seconds for [`MagneticPointType::Custom`].
    #[serde(default)]
    pub custom_interval: Option<f64>,
}

fn default_enabled() -> bool {
    true
}

fn default_strength() -> f64 {
    DEFAULT_MAGNET_STRENGTH
}

fn default_threshold() -> f64 {
    DEFAULT_MAGNET_THRESHOLD_SECONDS
}

impl Default for MagnetismSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            point_type: MagneticPointType::default(),
            strength: default_strength(),
            threshold: default_threshold(),
            custom_interval: None,
        }
    }
}

/// Nearest point to a query time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagneticMatch {
    pub point: f64,
    pub distance: f64,
}

/// Ascending candidate points covering `[0, total_duration]`.
pub fn generate_magnetic_points(
    point_type: MagneticPointType,
    total_duration: f64,
    fps: f64,
    custom_interval: Option<f64>,
) -> Vec<f64> {
    let Some(step) = point_type.step(fps, custom_interval) else {
        return Vec::new();
    };
    if !total_duration.is_finite() || total_duration < 0.0 {
        return Vec::new();
    }

    let last = (total_duration / step.seconds() + 1e-9).floor();
    if last >= MAX_MAGNETIC_POINTS as f64 {
        tracing::warn!(
            ?point_type,
            total_duration,
            last,
            "magnetic point set too large, snapping disabled"
        );
        return Vec::new();
    }
    let count = last as usize + 1;

    (0..count).map(|i| step.point(i)).collect()
}

/// Nearest candidate by absolute distance. `points` must be ascending.
pub fn nearest_magnetic_point(time: f64, points: &[f64]) -> Option<MagneticMatch> {
    if points.is_empty() || !time.is_finite() {
        return None;
    }
    let index = points.partition_point(|&p| p < time);
    let before = index.checked_sub(1).map(|i| points[i]);
    let after = points.get(index).copied();

    let nearest = match (before, after) {
        (Some(b), Some(a)) => {
            if (time - b).abs() <= (a - time).abs() {
                b
            } else {
                a
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    Some(MagneticMatch {
        point: nearest,
        distance: (nearest - time).abs(),
    })
}

/// Pull `time` part of the way toward the nearest point within `threshold`.
///
/// `strength` 0 leaves the time alone, 1 lands exactly on the point.
pub fn apply_magnetism(time: f64, points: &[f64], strength: f64, threshold: f64) -> f64 {
    if !strength.is_finite() || strength <= 0.0 {
        return time;
    }
    let Some(found) = nearest_magnetic_point(time, points) else {
        return time;
    };
    if found.distance > threshold.max(0.0) {
        return time;
    }
    if strength >= 1.0 {
        return found.point;
    }
    time + (found.point - time) * strength
}

/// Apply magnetism to both edges of a dragged interval.
pub fn apply_magnetism_to_clip(
    start: f64,
    end: f64,
    points: &[f64],
    strength: f64,
    threshold: f64,
) -> (f64, f64) {
    let start = apply_magnetism(start, points, strength, threshold);
    let end = apply_magnetism(end, points, strength, threshold);
    // Both edges pulled onto the same point would otherwise invert a tiny clip.
    (start, end.max(start))
}

/// Whether `time` sits within `threshold` of a point. Never moves anything.
pub fn is_near_magnetic_point(time: f64, points: &[f64], threshold: f64) -> bool {
    nearest_magnetic_point(time, points)
        .map(|found| found.distance <= threshold.max(0.0))
        .unwrap_or(false)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct GridKey {
    point_type: MagneticPointType,
    total_duration: f64,
    fps: f64,
    custom_interval: Option<f64>,
}

/// Cached magnetic points, regenerated only when their inputs change.
#[derive(Clone, Debug, Default)]
pub struct MagneticGrid {
    key: Option<GridKey>,
    points: Vec<f64>,
}

impl MagneticGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerate if point type, fps, duration or custom interval changed.
    /// Returns true when the point set was rebuilt.
    pub fn update(&mut self, settings: &MagnetismSettings, total_duration: f64, fps: f64) -> bool {
        let key = GridKey {
            point_type: settings.point_type,
            total_duration,
            fps,
            custom_interval: settings.custom_interval,
        };
        if self.key == Some(key) {
            return false;
        }
        self.points = generate_magnetic_points(
            settings.point_type,
            total_duration,
            fps,
            settings.custom_interval,
        );
        self.key = Some(key);
        tracing::debug!(
            points = self.points.len(),
            point_type = ?settings.point_type,
            "regenerated magnetic points"
        );
        true
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Apply the configured pull, or nothing when magnetism is off.
    pub fn apply(&self, time: f64, settings: &MagnetismSettings) -> f64 {
        if !settings.enabled {
            return time;
        }
        apply_magnetism(time, &self.points, settings.strength, settings.threshold)
    }

    pub fn is_near(&self, time: f64, settings: &MagnetismSettings) -> bool {
        settings.enabled && is_near_magnetic_point(time, &self.points, settings.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_points_per_granularity() {
        assert_eq!(
            generate_magnetic_points(MagneticPointType::Second, 3.0, 24.0, None),
            vec![0.0, 1.0, 2.0, 3.0]
        );
        assert_eq!(
            generate_magnetic_points(MagneticPointType::HalfSecond, 1.2, 24.0, None),
            vec![0.0, 0.5, 1.0]
        );
        assert_eq!(
            generate_magnetic_points(MagneticPointType::QuarterSecond, 0.5, 24.0, None),
            vec![0.0, 0.25, 0.5]
        );
        let tenths = generate_magnetic_points(MagneticPointType::TenthSecond, 1.0, 24.0, None);
        assert_eq!(tenths.len(), 11);
        assert_eq!(tenths[3], 0.3);

        let frames = generate_magnetic_points(MagneticPointType::Frame, 1.0, 24.0, None);
        assert_eq!(frames.len(), 25);
        assert_eq!(frames[12], 0.5);
        assert_eq!(frames[24], 1.0);
    }

    #[test]
    fn test_custom_points_need_positive_interval() {
        assert!(generate_magnetic_points(MagneticPointType::Custom, 5.0, 24.0, None).is_empty());
        assert!(generate_magnetic_points(MagneticPointType::Custom, 5.0, 24.0, Some(0.0)).is_empty());
        assert!(generate_magnetic_points(MagneticPointType::Custom, 5.0, 24.0, Some(-1.0)).is_empty());
        assert_eq!(
            generate_magnetic_points(MagneticPointType::Custom, 5.0, 24.0, Some(2.0)),
            vec![0.0, 2.0, 4.0]
        );
    }

    #[test]
    fn test_generate_rejects_bad_durations() {
        assert_eq!(
            generate_magnetic_points(MagneticPointType::Second, 0.0, 24.0, None),
            vec![0.0]
        );
        assert!(generate_magnetic_points(MagneticPointType::Second, -1.0, 24.0, None).is_empty());
        assert!(generate_magnetic_points(MagneticPointType::Second, f64::INFINITY, 24.0, None).is_empty());
        assert!(generate_magnetic_points(MagneticPointType::Frame, 1.0e7, 24.0, None).is_empty());
        assert!(generate_magnetic_points(MagneticPointType::Second, 1.0e20, 24.0, None).is_empty());
        assert!(
            generate_magnetic_points(MagneticPointType::Custom, 5.0, 24.0, Some(1.0e-300)).is_empty()
        );
    }

    #[test]
    fn test_magnetism_boundary() {
        let points = [1.0];
        assert_eq!(apply_magnetism(1.05, &points, 1.0, 0.1), 1.0);
        assert_eq!(apply_magnetism(1.2, &points, 1.0, 0.1), 1.2);
    }

    #[test]
    fn test_partial_pull() {
        let points = [0.0, 1.0, 2.0];
        let pulled = apply_magnetism(1.08, &points, 0.5, 0.1);
        assert!((pulled - 1.04).abs() < 1e-9);
        let pulled = apply_magnetism(1.92, &points, 0.25, 0.1);
        assert!((pulled - 1.94).abs() < 1e-9);
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let points = generate_magnetic_points(MagneticPointType::Frame, 10.0, 24.0, None);
        for i in 0..500 {
            let t = i as f64 * 0.0213;
            assert_eq!(apply_magnetism(t, &points, 0.0, 0.5), t);
            assert_eq!(apply_magnetism(t, &[], 1.0, 0.5), t);
        }
    }

    #[test]
    fn test_nearest_point() {
        let points = [0.0, 1.0, 2.0];
        assert_eq!(nearest_magnetic_point(1.4, &points).unwrap().point, 1.0);
        assert_eq!(nearest_magnetic_point(1.6, &points).unwrap().point, 2.0);
        assert_eq!(nearest_magnetic_point(-5.0, &points).unwrap().point, 0.0);
        assert_eq!(nearest_magnetic_point(9.0, &points).unwrap().point, 2.0);
        assert!(nearest_magnetic_point(1.0, &[]).is_none());
        assert!(nearest_magnetic_point(f64::NAN, &points).is_none());
    }

    #[test]
    fn test_magnetism_to_clip() {
        let points = [0.0, 1.0, 2.0, 3.0];
        let (start, end) = apply_magnetism_to_clip(0.95, 2.5, &points, 1.0, 0.1);
        assert_eq!(start, 1.0);
        assert_eq!(end, 2.5);
        let (start, end) = apply_magnetism_to_clip(0.97, 1.02, &points, 1.0, 0.1);
        assert_eq!((start, end), (1.0, 1.0));
    }

    #[test]
    fn test_is_near_does_not_snap() {
        let points = [1.0];
        assert!(is_near_magnetic_point(1.05, &points, 0.1));
        assert!(!is_near_magnetic_point(1.3, &points, 0.1));
        assert!(!is_near_magnetic_point(1.0, &[], 0.1));
    }

    #[test]
    fn test_grid_regenerates_only_on_change() {
        let mut grid = MagneticGrid::new();
        let mut settings = MagnetismSettings::default();
        assert!(grid.update(&settings, 4.0, 24.0));
        assert_eq!(grid.points().len(), 5);
        assert!(!grid.update(&settings, 4.0, 24.0));

        // Strength and threshold do not affect the point set.
        settings.strength = 1.0;
        settings.threshold = 0.2;
        assert!(!grid.update(&settings, 4.0, 24.0));

        settings.point_type = MagneticPointType::HalfSecond;
        assert!(grid.update(&settings, 4.0, 24.0));
        assert_eq!(grid.points().len(), 9);
        assert!(grid.update(&settings, 5.0, 24.0));
        assert!(!grid.update(&settings, 5.0, 24.0));
    }

    #[test]
    fn test_grid_respects_enabled_flag() {
        let mut grid = MagneticGrid::new();
        let mut settings = MagnetismSettings {
            strength: 1.0,
            ..Default::default()
        };
        grid.update(&settings, 4.0, 24.0);
        assert_eq!(grid.apply(2.05, &settings), 2.0);
        assert!(grid.is_near(2.05, &settings));

        settings.enabled = false;
        assert_eq!(grid.apply(2.05, &settings), 2.05);
        assert!(!grid.is_near(2.05, &settings));
    }
}
