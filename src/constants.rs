//! Shared engine constants: grid resolution, playback timing and magnet defaults.

/// Grid points per second. Every duration sum runs on this integer grid.
pub const GRID_PRECISION: i64 = 120;

pub const DEFAULT_FPS: f64 = 24.0;
pub const DEFAULT_SHOT_DURATION_SECONDS: f64 = 2.0;

pub const PLAYBACK_TICK_INTERVAL_MS: u64 = 50;
pub const PLAYBACK_MIN_TICK_INTERVAL_MS: u64 = 1;

pub const DEFAULT_MAGNET_STRENGTH: f64 = 0.5;
pub const DEFAULT_MAGNET_THRESHOLD_SECONDS: f64 = 0.1;
/// Upper bound on generated magnetic points (about 11.5 hours of 24 fps frames).
pub const MAX_MAGNETIC_POINTS: usize = 1_000_000;
