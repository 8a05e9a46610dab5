use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::SnapshotError;
use super::{ProjectSettings, Scene};

/// The scene list (plus settings) a collaborator hands to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryboardSnapshot {
    /// Project name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl StoryboardSnapshot {
    pub fn new(name: impl Into<String>, scenes: Vec<Scene>) -> Self {
        Self {
            name: name.into(),
            settings: ProjectSettings::default(),
            scenes,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            scenes = snapshot.scenes.len(),
            "loaded storyboard snapshot"
        );
        Ok(snapshot)
    }
}
