//! Review configuration, read from `config.toml`
//!
//! ```toml
//! data_dir = "/home/me/notes"
//! state_file = "weights.json"
//! default_count = 30
//! image_extensions = ["png", "jpg", "jpeg", "gif", "bmp"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Directory holding one sub-directory per collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// State file name, relative to the data directory
    pub state_file: String,
    /// Number of items selected when no count is given
    pub default_count: usize,
    /// File extensions (without dot, case-insensitive) treated as items
    pub image_extensions: Vec<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            state_file: "weights.json".to_string(),
            default_count: 30,
            image_extensions: ["png", "jpg", "jpeg", "gif", "bmp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl ReviewConfig {
    /// Default config file location (e.g. ~/.config/revu/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("revu").join("config.toml"))
    }

    /// Load from `path`; a missing file gives the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| ReviewError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an explicit path, or the default location if there is one
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Configured data directory, falling back to the platform data dir
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|p| p.join("revu"))
                .ok_or(ReviewError::DataDirNotFound),
        }
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.state_file))
    }

    /// Whether a file name carries one of the configured image extensions
    pub fn is_image(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                self.image_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ReviewConfig::default();
        assert_eq!(config.state_file, "weights.json");
        assert_eq!(config.default_count, 30);
        assert!(config.is_image("scan.PNG"));
        assert!(config.is_image("a.b.jpeg"));
        assert!(!config.is_image("notes.txt"));
        assert!(!config.is_image("png"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ReviewConfig::load_from_path(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ReviewConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "data_dir = \"/srv/notes\"\ndefault_count = 12\n").unwrap();

        let config = ReviewConfig::load_from_path(&path).unwrap();
        assert_eq!(config.default_count, 12);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/srv/notes"));
        assert_eq!(config.state_path().unwrap(), PathBuf::from("/srv/notes/weights.json"));
        assert_eq!(config.image_extensions.len(), 5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "default_count = \"many\"").unwrap();

        assert!(matches!(
            ReviewConfig::load_from_path(&path),
            Err(ReviewError::Toml { .. })
        ));
    }
}
