//! File-level loading: format dispatch, validation and image resolution.

pub(crate) mod json_loader;
pub(crate) mod tsx_loader;

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::LoaderConfig;
use crate::error::{MalformedAsset, TilesetError};
use crate::tileset::Tileset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Tsx,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") => Some(Format::Tsx),
            Some("tsj") | Some("json") => Some(Format::Json),
            _ => None,
        }
    }
}

/// A validated tileset together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedTileset {
    /// The parsed, validated descriptor
    pub tileset: Tileset,
    /// Path the descriptor was read from
    pub descriptor_path: PathBuf,
    /// Image path resolved against the descriptor's directory
    pub image_path: PathBuf,
}

/// Loads tileset descriptors from disk.
#[derive(Debug, Clone, Default)]
pub struct TilesetLoader {
    config: LoaderConfig,
}

impl TilesetLoader {
    /// Creates a loader with the given settings.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Settings in effect.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Reads, parses and validates the descriptor at `path`.
    ///
    /// The format follows the extension: `tsx` is XML, `tsj` and `json` are
    /// Tiled's JSON export.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedTileset, TilesetError> {
        let p = path.as_ref();
        let format = Format::from_path(p)
            .ok_or_else(|| TilesetError::UnsupportedFormat(p.display().to_string()))?;

        let bytes = std::fs::read(p).map_err(|source| TilesetError::Io {
            path: p.to_path_buf(),
            source,
        })?;

        let malformed = |source: MalformedAsset| TilesetError::Malformed {
            path: p.to_path_buf(),
            source,
        };

        let txt = std::str::from_utf8(&bytes).map_err(|e| malformed(e.into()))?;

        let tileset = match format {
            Format::Tsx => tsx_loader::parse_tsx(txt, &self.config),
            Format::Json => json_loader::parse_json(txt, &self.config),
        }
        .map_err(malformed)?;
        tileset.validate(&self.config).map_err(malformed)?;

        let descriptor_dir = p
            .parent()
            .map(|d| d.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./"));
        let image_path = tileset.resolve_image(&descriptor_dir);

        if self.config.require_image_file && !image_path.is_file() {
            return Err(malformed(MalformedAsset::ImageUnresolved { path: image_path }));
        }

        debug!(
            descriptor = %p.display(),
            image = %image_path.display(),
            "loaded tileset {}",
            tileset.name()
        );

        Ok(LoadedTileset {
            tileset,
            descriptor_path: p.to_path_buf(),
            image_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TSX: &str = r#"<tileset name="t" tilewidth="8" tileheight="8" tilecount="4" columns="2">
 <image source="art/t.png" width="16" height="16"/>
 <tile id="3"><properties><property name="name" value="exit"/></properties></tile>
</tileset>"#;

    fn write_fixture(dir: &Path) -> PathBuf {
        fs::create_dir_all(dir.join("art")).unwrap();
        fs::write(dir.join("art/t.png"), b"png").unwrap();
        let path = dir.join("t.tsx");
        fs::write(&path, TSX).unwrap();
        path
    }

    #[test]
    fn resolves_image_relative_to_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path());

        let loaded = TilesetLoader::default().load(&path).unwrap();
        assert_eq!(loaded.image_path, dir.path().join("art/t.png"));
        assert_eq!(loaded.descriptor_path, path);
        assert_eq!(loaded.tileset.tile_name(3), Some("exit"));
    }

    #[test]
    fn missing_image_is_malformed_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path());
        fs::remove_file(dir.path().join("art/t.png")).unwrap();

        let err = TilesetLoader::default().load(&path).unwrap_err();
        assert!(matches!(
            err.malformed(),
            Some(MalformedAsset::ImageUnresolved { .. })
        ));

        let loader = TilesetLoader::new(LoaderConfig {
            require_image_file: false,
            ..LoaderConfig::default()
        });
        assert!(loader.load(&path).is_ok());
    }

    #[test]
    fn returns_typed_error_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TilesetLoader::default()
            .load(dir.path().join("absent.tsx"))
            .unwrap_err();
        assert!(matches!(err, TilesetError::Io { .. }));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = TilesetLoader::default().load("level.tmx").unwrap_err();
        assert!(matches!(err, TilesetError::UnsupportedFormat(p) if p == "level.tmx"));
    }

    #[test]
    fn json_extension_uses_json_reader() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.png"), b"png").unwrap();
        let path = dir.path().join("t.tsj");
        fs::write(
            &path,
            r#"{"name":"t","tilewidth":8,"tileheight":8,"tilecount":4,"columns":2,"image":"t.png"}"#,
        )
        .unwrap();

        let loaded = TilesetLoader::default().load(&path).unwrap();
        assert_eq!(loaded.tileset.columns(), 2);
    }
}
