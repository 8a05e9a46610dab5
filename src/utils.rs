use crate::core::grid::{grid_points_to_seconds, smpte_to_grid_points};

pub fn parse_f64_input(value: &str, fallback: f64) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fallback;
    }
    trimmed.parse::<f64>().unwrap_or(fallback)
}

/// Parse a time typed by the user: plain seconds (`"12.5"`) or SMPTE
/// (`"00:00:12:12"`). Anything unparseable yields `fallback`.
pub fn parse_time_input(value: &str, fps: f64, fallback: f64) -> f64 {
    let trimmed = value.trim();
    if trimmed.contains(':') {
        return smpte_to_grid_points(trimmed, fps)
            .map(grid_points_to_seconds)
            .unwrap_or(fallback);
    }
    let seconds = parse_f64_input(trimmed, fallback);
    if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        fallback
    }
}
