// tests/load_tests.rs

use std::fs;
use std::path::Path;
use macroquad_tiled_tileset::{LoaderConfig, MalformedAsset, Tileset, TilesetError, TilesetLoader};

const TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset name="L" tilewidth="4" tileheight="4" tilecount="2" columns="2">
 <image source="l.png" width="8" height="4"/>
 <tile id="1"><properties><property name="name" value="goal"/></properties></tile>
</tileset>"#;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn integration_load_from_file_and_str() {
    let from_str = Tileset::from_tsx_str(TSX).expect("should parse inline TSX");
    assert_eq!(from_str.tile_count(), 2);

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "l.png", "");
    let path = write(dir.path(), "l.tsx", TSX);
    let from_file = Tileset::load(&path).unwrap();
    assert_eq!(from_file.tileset, from_str);
}

#[test]
fn integration_unsupported_format() {
    let err = Tileset::load("foo.tmx").unwrap_err();
    match err {
        TilesetError::UnsupportedFormat(ext) => assert_eq!(ext, "foo.tmx"),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn out_of_range_tile_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "l.png", "");
    let path = write(dir.path(), "l.tsx", &TSX.replace(r#"tile id="1""#, r#"tile id="2""#));

    let err = Tileset::load(&path).unwrap_err();
    match err {
        TilesetError::Malformed { path: p, source } => {
            assert_eq!(p, path);
            assert!(matches!(source, MalformedAsset::TileIdOutOfRange { id: 2, tile_count: 2 }));
        }
        other => panic!("expected Malformed, got {:?}", other),
    }
}

#[test]
fn ill_formed_xml_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "l.tsx", "<tileset name=\"L\" tilewidth=\"4\"");
    let err = Tileset::load(&path).unwrap_err();
    assert!(err.malformed().is_some(), "got {err:?}");
}

#[test]
fn non_utf8_descriptor_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "l.png", "");
    let mut bytes = TSX.replace(r#"name="L""#, r#"name="L@""#).into_bytes();
    let at = bytes.iter().position(|b| *b == b'@').unwrap();
    bytes[at] = 0xff;
    let path = dir.path().join("l.tsx");
    fs::write(&path, bytes).unwrap();

    let err = Tileset::load(&path).unwrap_err();
    assert!(
        matches!(err.malformed(), Some(MalformedAsset::InvalidUtf8(_))),
        "got {err:?}"
    );
}

#[test]
fn unresolvable_image_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "l.tsx", TSX);
    let err = Tileset::load(&path).unwrap_err();
    assert!(matches!(err.malformed(), Some(MalformedAsset::ImageUnresolved { .. })));
}

#[test]
fn loader_config_from_toml_relaxes_checks() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = write(
        dir.path(),
        "loader.toml",
        "require_image_file = false\ncheck_image_geometry = false\n",
    );
    let oversized = TSX.replace(r#"width="8""#, r#"width="7""#);
    let path = write(dir.path(), "l.tsx", &oversized);

    assert!(Tileset::load(&path).is_err());

    let loader = TilesetLoader::new(LoaderConfig::from_file(&cfg_path).unwrap());
    let loaded = loader.load(&path).unwrap();
    assert_eq!(loaded.tileset.tile_name(1), Some("goal"));
}

#[test]
fn json_and_tsx_agree() {
    let json = r#"{
      "name":"L","tilewidth":4,"tileheight":4,"tilecount":2,"columns":2,
      "image":"l.png","imagewidth":8,"imageheight":4,
      "tiles":[{"id":1,"properties":[{"name":"name","type":"string","value":"goal"}]}]
    }"#;
    assert_eq!(Tileset::from_json_str(json).unwrap(), Tileset::from_tsx_str(TSX).unwrap());
}
