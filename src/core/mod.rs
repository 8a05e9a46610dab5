pub mod grid;
pub mod timeline_snap;
pub mod sequence;
pub mod sync;
pub mod playback;
pub mod listener;
pub mod session;
pub mod audio;
pub mod ticker;
