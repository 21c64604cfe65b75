use serde::Deserialize;
use std::path::Path;

use crate::error::TilesetError;

/// Switches controlling how strictly a tileset is accepted.
///
/// ```toml
/// require_image_file = true
/// check_image_geometry = true
/// lenient_property_types = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// The image must exist on disk, relative to the descriptor.
    pub require_image_file: bool,
    /// The tile grid must fit inside the declared image size.
    pub check_image_geometry: bool,
    /// Keep properties of unknown type as strings instead of failing.
    pub lenient_property_types: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            require_image_file: true,
            check_image_geometry: true,
            lenient_property_types: false,
        }
    }
}

impl LoaderConfig {
    /// Parses a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    /// Reads a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TilesetError> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| TilesetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&txt).map_err(|source| TilesetError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
