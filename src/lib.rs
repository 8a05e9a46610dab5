//! Storyboard Timeline
//!
//! Timeline grid and dual-clock synchronization engine for storyboard
//! playback: grid arithmetic, magnetic snapping, shot-sequence addressing,
//! audio/shot clock sync and a cooperative playback scheduler.

pub mod constants;
pub mod core;
pub mod error;
pub mod state;
pub mod utils;

pub use crate::core::grid::{GridPoint, TimeFormat};
pub use crate::core::listener::{PlaybackListener, RecordingListener};
pub use crate::core::playback::{PlaybackScheduler, PlaybackState, TickOutcome};
pub use crate::core::session::TimelineSession;
pub use crate::core::sync::{ClockWriter, DualClockSynchronizer, SeekOutcome, SyncUpdate};
pub use crate::error::{FormatError, FormatErrorKind, SnapshotError};
pub use crate::state::{ClockState, ProjectSettings, Scene, Shot, ShotCursor, StoryboardSnapshot};
