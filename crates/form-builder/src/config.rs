//! Editor settings loaded from `form-builder.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::field::Viewport;

pub const CONFIG_FILE: &str = "form-builder.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Container width in pixels used by the resize gesture when the measured
    /// width is unusable.
    pub preview_width: f64,
    /// Number of layout columns; the upper bound for a field's span.
    pub grid_columns: u8,
    /// Viewport a new session starts on.
    pub default_viewport: Viewport,
    /// Maximum number of undo steps kept; unbounded when absent.
    pub history_limit: Option<usize>,
    /// `type` value that marks the stepper field.
    pub stepper_type: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            preview_width: 432.0,
            grid_columns: 12,
            default_viewport: Viewport::Default,
            history_limit: None,
            stepper_type: "stepper".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: EditorConfig = toml::from_str(contents)?;
        if config.grid_columns == 0 {
            warn!("grid_columns must be at least 1; using 12");
            config.grid_columns = 12;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `form-builder.toml` from `dir`, falling back to defaults when it
    /// is missing or unreadable.
    pub fn discover(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to load editor config at {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = EditorConfig::from_toml_str("grid_columns = 24\n").expect("config");
        assert_eq!(config.grid_columns, 24);
        assert_eq!(config.preview_width, 432.0);
        assert_eq!(config.stepper_type, "stepper");
        assert_eq!(config.default_viewport, Viewport::Default);
        assert_eq!(config.history_limit, None);

        let config = EditorConfig::from_toml_str("history_limit = 50\n").expect("config");
        assert_eq!(config.history_limit, Some(50));
    }

    #[test]
    fn viewport_is_lowercase() {
        let config = EditorConfig::from_toml_str("default_viewport = \"sm\"").expect("config");
        assert_eq!(config.default_viewport, Viewport::Sm);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            EditorConfig::from_toml_str("grid_columns = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(EditorConfig::discover(dir.path()), EditorConfig::default());

        std::fs::write(dir.path().join(CONFIG_FILE), "preview_width = 600.0\n").expect("write");
        assert_eq!(EditorConfig::discover(dir.path()).preview_width, 600.0);

        std::fs::write(dir.path().join(CONFIG_FILE), "preview_width = [").expect("write");
        assert_eq!(EditorConfig::discover(dir.path()), EditorConfig::default());
    }
}
