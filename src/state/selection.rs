//! Active scene/shot indices shared by the scheduler and the synchronizer.

use serde::{Deserialize, Serialize};

/// Which shot is active: a scene index plus a shot index inside that scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShotCursor {
    pub scene_index: usize,
    pub image_index: usize,
}

impl ShotCursor {
    pub fn new(scene_index: usize, image_index: usize) -> Self {
        Self {
            scene_index,
            image_index,
        }
    }

    /// First shot of a scene.
    pub fn scene_start(scene_index: usize) -> Self {
        Self::new(scene_index, 0)
    }

    /// Same scene, different shot.
    pub fn with_image(self, image_index: usize) -> Self {
        Self {
            image_index,
            ..self
        }
    }
}

/// A resolved position: the owning shot plus the offset into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotLocation {
    pub cursor: ShotCursor,
    /// Seconds into the shot.
    pub offset: f64,
}
