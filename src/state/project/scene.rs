use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_SHOT_DURATION_SECONDS;

/// A single storyboard image with its display duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Unique identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Display duration in seconds
    #[serde(default = "default_shot_duration")]
    pub duration: f64,
    /// Optional user-facing label
    #[serde(default)]
    pub label: Option<String>,
    /// Caller data carried through untouched (image url, notes, ...).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Shot {
    /// Create a new shot
    pub fn new(duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration,
            label: None,
            payload: serde_json::Value::Null,
        }
    }

    /// Create a shot with a label
    pub fn with_label(duration: f64, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(duration)
        }
    }

    /// Duration clamped to a playable, non-negative value.
    pub fn duration_seconds(&self) -> f64 {
        if self.duration.is_finite() {
            self.duration.max(0.0)
        } else {
            0.0
        }
    }
}

fn default_shot_duration() -> f64 {
    DEFAULT_SHOT_DURATION_SECONDS
}

/// An ordered group of shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Unique identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Optional scene heading
    #[serde(default)]
    pub name: Option<String>,
    /// Shots in playback order
    #[serde(default)]
    pub images: Vec<Shot>,
}

impl Scene {
    /// Create a scene from its shots
    pub fn new(images: Vec<Shot>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            images,
        }
    }

    /// Build a scene straight from shot durations.
    pub fn from_durations(durations: &[f64]) -> Self {
        Self::new(durations.iter().map(|&d| Shot::new(d)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
