//! Model tool configuration
//!
//! Loaded from a TOML file; every field has a default so a partial (or
//! missing) file is fine.

use crate::palette::{Palette, PaletteError, DEFAULT_BUCKET_SIZE};
use crate::preview::ViewMode;
use crate::voxelize::DEFAULT_PRECISION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs, io};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "MODEL_TOOLS_CONFIG";

/// Config file used when the environment variable is unset
pub const DEFAULT_CONFIG_FILE: &str = "model_tools.toml";

/// Errors from reading or writing a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Root for relative model paths; also the first texture lookup root
    pub models_dir: PathBuf,
    /// Persisted palette table
    pub palette_path: PathBuf,
    /// Voxelizer samples per unit
    pub precision: f32,
    /// Palette quantization bucket width
    pub bucket_size: u8,
    /// Symbol for palette misses and colorless formats
    pub default_symbol: String,
    /// Preview mode a freshly loaded model starts in
    pub view_mode: ViewMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            palette_path: PathBuf::from("palette.txt"),
            precision: DEFAULT_PRECISION,
            bucket_size: DEFAULT_BUCKET_SIZE,
            default_symbol: "stone".to_string(),
            view_mode: ViewMode::Box,
        }
    }
}

impl ModelConfig {
    /// Load config from `path`, or return the defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `MODEL_TOOLS_CONFIG`, else `model_tools.toml`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "precision must be a positive number, got {}",
                self.precision
            )));
        }
        if self.bucket_size == 0 {
            return Err(ConfigError::Invalid("bucket_size must be at least 1".into()));
        }
        if self.default_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("default_symbol must not be empty".into()));
        }
        Ok(())
    }

    /// Roots tried in order for texture paths named by material files
    pub fn texture_roots(&self) -> Vec<PathBuf> {
        vec![self.models_dir.clone(), PathBuf::new()]
    }

    /// Resolve a model path: relative paths found under `models_dir` win,
    /// anything else is used as given
    pub fn resolve_model_path(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            let candidate = self.models_dir.join(path);
            if candidate.is_file() {
                return candidate;
            }
        }
        path.to_path_buf()
    }

    /// The configured palette table, or an empty palette when the file does
    /// not exist
    pub fn load_palette(&self) -> Result<Palette, PaletteError> {
        if !self.palette_path.exists() {
            warn!(
                "Palette {} not found, every color maps to '{}'",
                self.palette_path.display(),
                self.default_symbol
            );
            return Palette::new(self.bucket_size, self.default_symbol.as_str());
        }
        Palette::load(&self.palette_path, self.bucket_size, self.default_symbol.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert_eq!(config.precision, 1.5);
        assert_eq!(config.bucket_size, 20);
        assert_eq!(config.default_symbol, "stone");
        assert_eq!(config.view_mode, ViewMode::Box);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ModelConfig::load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config, ModelConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model_tools.toml");
        fs::write(&path, "precision = 3.0\nview_mode = \"voxels\"\n").expect("write");
        let config = ModelConfig::load(&path).expect("load");
        assert_eq!(config.precision, 3.0);
        assert_eq!(config.view_mode, ViewMode::Voxels);
        assert_eq!(config.default_symbol, "stone");
    }

    #[test]
    fn test_invalid_files_are_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "precision = \"fine\"\n").expect("write");
        assert!(matches!(ModelConfig::load(&path), Err(ConfigError::Parse(_))));

        fs::write(&path, "bucket_size = 0\n").expect("write");
        assert!(matches!(ModelConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let config = ModelConfig {
            default_symbol: "cobblestone".into(),
            view_mode: ViewMode::Voxels,
            ..ModelConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(ModelConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn test_missing_palette_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ModelConfig {
            palette_path: dir.path().join("none.txt"),
            ..ModelConfig::default()
        };
        let palette = config.load_palette().expect("empty palette");
        assert!(palette.is_empty());
        assert_eq!(palette.default_symbol().as_str(), "stone");
    }
}
