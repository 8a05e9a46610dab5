//! State module
//!
//! Plain data owned by the caller and by one editing session:
//! - Scene / Shot: the storyboard being played
//! - ShotCursor: active scene and shot indices
//! - ClockState: master time, audio time and their durations

mod project;
mod selection;
mod clock;

pub use project::*;
pub use selection::*;
pub use clock::*;
