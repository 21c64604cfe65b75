// src/loader/json_loader.rs
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::error::MalformedAsset;
use crate::properties::{Properties, PropertyValue};
use crate::tileset::{Frame, ObjectAlignment, TileData, TileOffset, Tileset, TilesetImage};

#[derive(Deserialize)]
struct JsonTileset {
    name: String,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    tiledversion: Option<String>,
    tilewidth: u32,
    tileheight: u32,
    tilecount: u32,
    columns: u32,
    image: String,
    #[serde(default)]
    imagewidth: Option<u32>,
    #[serde(default)]
    imageheight: Option<u32>,
    #[serde(default)]
    transparentcolor: Option<String>,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    objectalignment: Option<String>,
    #[serde(default)]
    tileoffset: Option<JsonTileOffset>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonTileOffset {
    x: i32,
    y: i32,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    propertytype: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    class: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    probability: Option<f32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    animation: Vec<JsonFrame>,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

fn json_property_to_value(
    prop: JsonProperty,
    config: &LoaderConfig,
) -> Result<(String, PropertyValue), MalformedAsset> {
    let JsonProperty {
        name,
        kind,
        propertytype,
        value,
    } = prop;

    let invalid = |kind: &str| MalformedAsset::InvalidPropertyValue {
        name: name.clone(),
        kind: kind.to_owned(),
        value: value.to_string(),
    };

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool).ok_or_else(|| invalid("bool"))?,
        Some("int") => value.as_i64().map(PropertyValue::Int).ok_or_else(|| invalid("int"))?,
        Some("float") => value.as_f64().map(PropertyValue::Float).ok_or_else(|| invalid("float"))?,
        Some("object") => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(PropertyValue::Object)
            .ok_or_else(|| invalid("object"))?,
        Some("string") | None if value.is_string() => {
            PropertyValue::String(value.as_str().unwrap_or_default().to_owned())
        }
        Some("color") => PropertyValue::Color(value.as_str().ok_or_else(|| invalid("color"))?.to_owned()),
        Some("file") => PropertyValue::File(value.as_str().ok_or_else(|| invalid("file"))?.to_owned()),
        Some("class") => PropertyValue::Class {
            property_type: propertytype,
            properties: class_members(&value),
        },
        None => infer_value(&value),
        Some("string") => return Err(invalid("string")),
        Some(other) if config.lenient_property_types => {
            warn!(property = %name, kind = other, "unsupported property type, keeping value as string");
            PropertyValue::String(value.as_str().map_or_else(|| value.to_string(), str::to_owned))
        }
        Some(other) => {
            return Err(MalformedAsset::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
    };

    Ok((name, parsed))
}

/// Untyped values, as found inside class members.
fn infer_value(value: &JsonValue) -> PropertyValue {
    if let Some(v) = value.as_bool() {
        PropertyValue::Bool(v)
    } else if let Some(v) = value.as_i64() {
        PropertyValue::Int(v)
    } else if let Some(v) = value.as_f64() {
        PropertyValue::Float(v)
    } else if value.is_object() {
        PropertyValue::Class {
            property_type: None,
            properties: class_members(value),
        }
    } else {
        PropertyValue::String(value.as_str().map_or_else(|| value.to_string(), str::to_owned))
    }
}

fn class_members(value: &JsonValue) -> Properties {
    value
        .as_object()
        .map(|members| {
            members
                .iter()
                .map(|(name, v)| (name.clone(), infer_value(v)))
                .collect()
        })
        .unwrap_or_default()
}

fn properties_from_json(props: Vec<JsonProperty>, config: &LoaderConfig) -> Result<Properties, MalformedAsset> {
    let mut out = Properties::new();
    for p in props {
        let (name, value) = json_property_to_value(p, config)?;
        out.insert(name, value);
    }
    Ok(out)
}

/// Parses Tiled's JSON tileset export. Validation happens in
/// [`Tileset::validate`].
pub(crate) fn parse_json(src: &str, config: &LoaderConfig) -> Result<Tileset, MalformedAsset> {
    let j: JsonTileset = serde_json::from_str(src)?;

    let object_alignment = match j.objectalignment.as_deref() {
        Some(raw) => ObjectAlignment::parse(raw).ok_or(MalformedAsset::InvalidAttribute {
            element: "tileset",
            attribute: "objectalignment",
            value: raw.to_owned(),
        })?,
        None => ObjectAlignment::Unspecified,
    };

    let mut tiles = BTreeMap::new();
    for tile in j.tiles {
        let data = TileData {
            class: tile.class.or(tile.kind).filter(|c| !c.is_empty()),
            probability: tile.probability,
            properties: properties_from_json(tile.properties, config)?,
            animation: tile
                .animation
                .into_iter()
                .map(|f| Frame {
                    tile_id: f.tileid,
                    duration_ms: f.duration,
                })
                .collect(),
        };
        if tiles.insert(tile.id, data).is_some() {
            return Err(MalformedAsset::DuplicateTileId { id: tile.id });
        }
    }

    let tileset = Tileset {
        version: j.version,
        tiled_version: j.tiledversion,
        name: j.name,
        class: j.class.filter(|c| !c.is_empty()),
        tile_width: j.tilewidth,
        tile_height: j.tileheight,
        spacing: j.spacing,
        margin: j.margin,
        tile_count: j.tilecount,
        columns: j.columns,
        object_alignment,
        tile_offset: j.tileoffset.map(|o| TileOffset { x: o.x, y: o.y }),
        image: TilesetImage {
            source: j.image,
            width: j.imagewidth,
            height: j.imageheight,
            // JSON keeps the leading '#', TSX does not
            trans: j
                .transparentcolor
                .map(|c| c.trim_start_matches('#').to_owned()),
        },
        properties: properties_from_json(j.properties, config)?,
        tiles,
    };

    debug!(
        name = %tileset.name,
        tile_count = tileset.tile_count,
        tiles = tileset.tiles.len(),
        "parsed JSON tileset"
    );
    Ok(tileset)
}
