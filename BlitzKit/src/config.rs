//! Load options and TOML configuration
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! [model]
//! enable_animation = false
//!
//! [texture]
//! apply_masks = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options for decoding a model.
///
/// # Example
///
/// ```
/// use blitzkit::config::LoadOptions;
///
/// let options = LoadOptions::new().with_animation(false);
/// assert!(!options.enable_animation);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Decode `KEYS` and `ANIM` chunks. When false they are skipped like
    /// unknown tags.
    /// Default: true
    pub enable_animation: bool,
}

impl LoadOptions {
    /// Options with everything enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enable_animation: true,
        }
    }

    /// Set whether animation chunks are decoded.
    #[must_use]
    pub fn with_animation(mut self, enable: bool) -> Self {
        self.enable_animation = enable;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for decoding textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureOptions {
    /// Make near-black pixels transparent for textures flagged as masked.
    /// Default: true
    pub apply_masks: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self { apply_masks: true }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: LoadOptions,
    pub texture: TextureOptions,
}

impl Config {
    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the document is not valid TOML or has
    /// wrongly typed keys.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read, otherwise the same
    /// errors as [`Config::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.model.enable_animation);
        assert!(config.texture.apply_masks);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = Config::from_toml_str("[model]\nenable_animation = false\n").unwrap();
        assert!(!config.model.enable_animation);
        assert!(config.texture.apply_masks);

        let empty = Config::from_toml_str("").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn test_bad_document_is_config_error() {
        let err = Config::from_toml_str("[texture]\napply_masks = \"yes\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[texture]\napply_masks = false").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert!(!config.texture.apply_masks);
        assert!(config.model.enable_animation);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
