//! Optional TOML configuration
//!
//! ```toml
//! [normalize]
//! nodata_threshold = -3.40282e38
//!
//! [annotate]
//! class_field = "class"
//! default_class = 0
//! clamp = false
//!
//! [tiles]
//! size = 512
//!
//! [draw]
//! color = [255, 0, 0]
//! thickness = 2
//!
//! [batch]
//! parallel = true
//! report = "report.json"
//! ```
//!
//! Every section and key is optional. Command-line flags override values
//! read from the file.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::errors::{GeoLabelError, Result};

/// Lowest float32 value, the usual nodata sentinel of float GeoTIFF exports
pub const FLOAT32_NODATA: f64 = -3.40282e38;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub normalize: NormalizeConfig,
    pub annotate: AnnotateConfig,
    pub tiles: TilesConfig,
    pub draw: DrawConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Samples at or below this value are treated as nodata
    pub nodata_threshold: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig {
            nodata_threshold: FLOAT32_NODATA,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotateConfig {
    /// Feature attribute holding the class id
    pub class_field: Option<String>,
    /// Class id for features without one
    pub default_class: u32,
    /// Clip annotations to the image
    pub clamp: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TilesConfig {
    pub size: u32,
}

impl Default for TilesConfig {
    fn default() -> Self {
        TilesConfig { size: 512 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawConfig {
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        DrawConfig {
            color: [255, 0, 0],
            thickness: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Process independent units on the rayon thread pool
    pub parallel: bool,
    /// Where to write the JSON batch report
    pub report: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            parallel: true,
            report: None,
        }
    }
}

impl Config {
    /// Load from `path`
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| GeoLabelError::io_at(path, e))?;
        let config = Config::from_toml(&text).map_err(|message| GeoLabelError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        debug!("Loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Config::load(path),
            None => Ok(Config::default()),
        }
    }

    pub fn from_toml(text: &str) -> std::result::Result<Config, String> {
        let config: Config = toml::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.tiles.size == 0 {
            return Err("tiles.size must be positive".to_string());
        }
        if self.draw.thickness == 0 {
            return Err("draw.thickness must be positive".to_string());
        }
        if self.normalize.nodata_threshold.is_nan() {
            return Err("normalize.nodata_threshold must be a number".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.normalize.nodata_threshold, FLOAT32_NODATA);
        assert_eq!(config.tiles.size, 512);
        assert!(config.batch.parallel);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [annotate]
            class_field = "Id"
            clamp = true

            [draw]
            color = [0, 255, 0]
            "#,
        )
        .unwrap();
        assert_eq!(config.annotate.class_field.as_deref(), Some("Id"));
        assert!(config.annotate.clamp);
        assert_eq!(config.annotate.default_class, 0);
        assert_eq!(config.draw.color, [0, 255, 0]);
        assert_eq!(config.draw.thickness, 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("[tiles]\nsise = 256\n").is_err());
        assert!(Config::from_toml("[extra]\n").is_err());
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        let err = Config::from_toml("[tiles]\nsize = 0\n").unwrap_err();
        assert!(err.contains("tiles.size"));
    }
}
