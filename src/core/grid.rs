//! Fixed-precision time grid.
//!
//! All duration arithmetic in the engine runs on integer grid points
//! (1/120 s) and only converts back to seconds for output, so summing many
//! shot durations never accumulates floating-point drift. This module also
//! owns the conversions to frames and SMPTE timecode used for display.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FPS, GRID_PRECISION};
use crate::error::FormatError;

/// An integer count of 1/120 s units.
pub type GridPoint = i64;

/// Clamp a caller-supplied frame rate into something safe to divide by.
pub fn sanitize_fps(fps: f64) -> f64 {
    if fps.is_finite() {
        fps.max(1.0)
    } else {
        DEFAULT_FPS
    }
}

pub fn seconds_to_grid_points(seconds: f64) -> GridPoint {
    if !seconds.is_finite() {
        return 0;
    }
    (seconds * GRID_PRECISION as f64).round() as GridPoint
}

pub fn grid_points_to_seconds(points: GridPoint) -> f64 {
    points as f64 / GRID_PRECISION as f64
}

/// Round a seconds value onto the grid.
pub fn snap_seconds_to_grid(seconds: f64) -> f64 {
    grid_points_to_seconds(seconds_to_grid_points(seconds))
}

pub fn frames_to_grid_points(frames: i64, fps: f64) -> GridPoint {
    seconds_to_grid_points(frames as f64 / sanitize_fps(fps))
}

pub fn grid_points_to_frames(points: GridPoint, fps: f64) -> i64 {
    (grid_points_to_seconds(points) * sanitize_fps(fps)).round() as i64
}

/// Parse `HH:MM:SS:FF` into grid points.
pub fn smpte_to_grid_points(timecode: &str, fps: f64) -> Result<GridPoint, FormatError> {
    let fields: Vec<&str> = timecode.trim().split(':').collect();
    if fields.len() != 4 {
        return Err(FormatError::FieldCount {
            input: timecode.to_string(),
            found: fields.len(),
        });
    }

    let mut values = [0u64; 4];
    for (slot, field) in values.iter_mut().zip(fields.iter()) {
        *slot = field
            .trim()
            .parse::<u64>()
            .map_err(|_| FormatError::InvalidField {
                input: timecode.to_string(),
                field: field.to_string(),
            })?;
    }

    let [hours, minutes, seconds, frames] = values;
    let out_of_range = || FormatError::OutOfRange {
        input: timecode.to_string(),
    };
    let whole_points = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| GridPoint::try_from(s).ok())
        .and_then(|s| s.checked_mul(GRID_PRECISION))
        .ok_or_else(out_of_range)?;
    let frame_points = (frames as f64 / sanitize_fps(fps) * GRID_PRECISION as f64).round();
    if frame_points >= GridPoint::MAX as f64 {
        return Err(out_of_range());
    }
    whole_points
        .checked_add(frame_points as GridPoint)
        .ok_or_else(out_of_range)
}

/// Format grid points as `HH:MM:SS:FF`. Negative positions format as zero.
pub fn grid_points_to_smpte(points: GridPoint, fps: f64) -> String {
    let fps = sanitize_fps(fps);
    let points = points.max(0);
    let mut whole_seconds = points / GRID_PRECISION;
    let remainder = points % GRID_PRECISION;
    let mut frames = (remainder as f64 / GRID_PRECISION as f64 * fps).round() as i64;
    // A remainder that rounds up to a full second carries into the seconds field.
    if frames >= fps.ceil() as i64 {
        whole_seconds += 1;
        frames = 0;
    }

    let hours = whole_seconds / 3600;
    let minutes = (whole_seconds / 60) % 60;
    let seconds = whole_seconds % 60;
    format!("{:02}:{:02}:{:02}:{:02}", hours, minutes, seconds, frames)
}

/// Position as a percentage of `total`; zero when there is no total.
pub fn calculate_grid_percentage(current: f64, total: f64) -> f64 {
    if !total.is_finite() || total <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    current / total * 100.0
}

pub fn percentage_to_grid_point(percentage: f64, total: GridPoint) -> GridPoint {
    if !percentage.is_finite() {
        return 0;
    }
    (percentage / 100.0 * total as f64).round() as GridPoint
}

/// Map a point on one time axis onto the proportional point of another axis
/// with a different total length. Returns 0 when either axis is empty.
pub fn sync_time_based_on_grid(source_time: f64, source_duration: f64, target_duration: f64) -> f64 {
    let source_total = seconds_to_grid_points(source_duration);
    let target_total = seconds_to_grid_points(target_duration);
    if source_total <= 0 || target_total <= 0 {
        return 0.0;
    }
    let source_point = seconds_to_grid_points(source_time) as f64;
    let target_point = (source_point * target_total as f64 / source_total as f64).round();
    grid_points_to_seconds(target_point as GridPoint)
}

/// Display formats for a playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// `HH:MM:SS:FF`
    #[default]
    Smpte,
    /// Whole frame count.
    Frames,
    /// `mm:ss.cc`
    Clock,
    /// `12.50s`
    Seconds,
}

impl TimeFormat {
    pub const ALL: [TimeFormat; 4] = [
        TimeFormat::Smpte,
        TimeFormat::Frames,
        TimeFormat::Clock,
        TimeFormat::Seconds,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeFormat::Smpte => "SMPTE",
            TimeFormat::Frames => "Frames",
            TimeFormat::Clock => "Clock",
            TimeFormat::Seconds => "Seconds",
        }
    }
}

pub fn format_time(seconds: f64, format: TimeFormat, fps: f64) -> String {
    let points = seconds_to_grid_points(seconds).max(0);
    match format {
        TimeFormat::Smpte => grid_points_to_smpte(points, fps),
        TimeFormat::Frames => grid_points_to_frames(points, fps).to_string(),
        TimeFormat::Clock => format_clock(points),
        TimeFormat::Seconds => format!("{:.2}s", grid_points_to_seconds(points)),
    }
}

fn format_clock(points: GridPoint) -> String {
    let centis = (points as f64 * 100.0 / GRID_PRECISION as f64).round() as i64;
    let minutes = centis / 6000;
    let seconds = (centis / 100) % 60;
    let hundredths = centis % 100;
    format!("{:02}:{:02}.{:02}", minutes, seconds, hundredths)
}
