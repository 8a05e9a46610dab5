//! Storyboard data model
//!
//! This module contains the caller-owned data the engine reads:
//! - Scene / Shot: the ordered storyboard
//! - ProjectSettings: frame rate, playback and magnetism settings
//! - StoryboardSnapshot: a scene list handed in by a collaborator

mod scene;
mod settings;
mod snapshot;

pub use scene::{Scene, Shot};
pub use settings::{EndBehavior, PlaybackSettings, ProjectSettings};
pub use snapshot::StoryboardSnapshot;
