//! Editor configuration

pub use serde::{Deserialize, Serialize};

use crate::viewport::{GizmoMode, SnapSettings, TransformTarget};
use std::path::Path;

// The on-disk format is chosen by file extension.
fn format_of(path: &Path) -> Option<&str> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| matches!(*ext, "toml" | "ron"))
}

/// Configuration trait
///
/// Any serde-serializable settings struct gains TOML and RON persistence
/// through the blanket default methods.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let Some(format) = format_of(path) else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        };
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match format {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match format_of(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some(_) => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            None => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Persisted editor viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Gizmo mode restored on startup
    pub gizmo_mode: GizmoMode,
    /// Multi-entity transform application policy
    pub multi_transform_target: TransformTarget,
    /// Gizmo handles follow world axes instead of the selection's axes
    pub gizmo_world_orientation: bool,
    /// Snap increments per operation type
    pub snap: SnapSettings,
    /// Draw bounding boxes of selected entities
    pub show_selection_bounds: bool,
    /// Draw the viewport grid
    pub show_grid: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            gizmo_mode: GizmoMode::Translate,
            multi_transform_target: TransformTarget::MedianPoint,
            gizmo_world_orientation: true,
            snap: SnapSettings::default(),
            show_selection_bounds: true,
            show_grid: true,
        }
    }
}

impl Config for EditorConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_roundtrip() {
        let mut config = EditorConfig::default();
        config.gizmo_mode = GizmoMode::Rotate;
        config.snap.translation = 2.0;

        let serialized = toml::to_string_pretty(&config).expect("serializes to TOML");
        let restored: EditorConfig = toml::from_str(&serialized).expect("parses back");
        assert_eq!(restored, config);
    }

    #[test]
    fn test_ron_roundtrip() {
        let mut config = EditorConfig::default();
        config.multi_transform_target = TransformTarget::IndividualOrigins;
        config.gizmo_world_orientation = false;

        let serialized =
            ron::ser::to_string_pretty(&config, Default::default()).expect("serializes to RON");
        let restored: EditorConfig = ron::from_str(&serialized).expect("parses back");
        assert_eq!(restored, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EditorConfig::default().save_to_file("settings.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
