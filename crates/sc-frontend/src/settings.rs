//! Persistent viewport settings
//!
//! Stored as RON. Missing fields fall back to their defaults so older files
//! keep loading after new settings are added.

use std::path::Path;

use sc_renderer::{ImagingSettings, PhysicsSettings, RendererConfig};
use serde::{Deserialize, Serialize};

use crate::manipulators::ManipulatorKind;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub imaging: ImagingSettings,
    pub renderer: RendererConfig,
    pub physics: PhysicsSettings,
    /// Manipulator chosen when the viewport opens
    pub default_manipulator: ManipulatorKind,
}

impl ViewportSettings {
    /// Save settings to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        tracing::info!("Saved viewport settings to {}", path.as_ref().display());
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SettingsError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load settings from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read(path.as_ref())?;
        let settings = Self::load_from_bytes(&content)?;
        tracing::info!("Loaded viewport settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn load_from_bytes(data: &[u8]) -> Result<Self, SettingsError> {
        let content = std::str::from_utf8(data).map_err(|e| SettingsError::Deserialize(e.to_string()))?;
        ron::from_str(content).map_err(|e| SettingsError::Deserialize(e.to_string()))
    }
}
