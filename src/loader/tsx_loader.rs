// src/loader/tsx_loader.rs
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, trace, warn};

use crate::config::LoaderConfig;
use crate::error::MalformedAsset;
use crate::properties::{Properties, PropertyValue};
use crate::tileset::{Frame, ObjectAlignment, TileData, TileOffset, Tileset, TilesetImage};

type XmlReader<'a> = Reader<&'a [u8]>;

/// Attributes of one element, unescaped.
struct Attrs {
    element: &'static str,
    pairs: Vec<(String, String)>,
}

impl Attrs {
    fn read(element: &'static str, e: &BytesStart) -> Result<Self, MalformedAsset> {
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned();
            pairs.push((key, value));
        }
        Ok(Self { element, pairs })
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, name: &'static str) -> Result<&str, MalformedAsset> {
        self.get(name).ok_or(MalformedAsset::MissingAttribute {
            element: self.element,
            attribute: name,
        })
    }

    fn parse<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, MalformedAsset> {
        self.get(name)
            .map(|raw| {
                raw.parse().map_err(|_| MalformedAsset::InvalidAttribute {
                    element: self.element,
                    attribute: name,
                    value: raw.to_owned(),
                })
            })
            .transpose()
    }

    fn parse_required<T: FromStr>(&self, name: &'static str) -> Result<T, MalformedAsset> {
        self.require(name)?;
        self.parse(name)?.ok_or(MalformedAsset::MissingAttribute {
            element: self.element,
            attribute: name,
        })
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Next child element of the current one, or `None` at its end tag.
///
/// The flag is `true` for `<a>..</a>` and `false` for `<a/>`.
fn next_child<'a>(
    reader: &mut XmlReader<'a>,
    parent: &'static str,
) -> Result<Option<(BytesStart<'a>, bool)>, MalformedAsset> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => return Ok(Some((e, true))),
            Event::Empty(e) => return Ok(Some((e, false))),
            Event::End(_) => return Ok(None),
            Event::Eof => return Err(MalformedAsset::UnexpectedEof(parent.to_owned())),
            _ => {}
        }
    }
}

fn skip(reader: &mut XmlReader, e: &BytesStart, has_children: bool) -> Result<(), MalformedAsset> {
    if has_children {
        reader.read_to_end(e.name())?;
    }
    Ok(())
}

fn skip_unsupported(
    reader: &mut XmlReader,
    parent: &'static str,
    e: &BytesStart,
    has_children: bool,
) -> Result<(), MalformedAsset> {
    trace!(parent, element = %element_name(e), "skipping unsupported element");
    skip(reader, e, has_children)
}

/// Parses a TSX document. Geometry and id ranges are checked separately by
/// [`Tileset::validate`].
pub(crate) fn parse_tsx(src: &str, config: &LoaderConfig) -> Result<Tileset, MalformedAsset> {
    let mut reader = Reader::from_str(src);
    loop {
        let (e, has_children) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::Eof => return Err(MalformedAsset::MissingRoot),
            _ => continue,
        };
        if e.name().as_ref() != b"tileset" {
            return Err(MalformedAsset::UnexpectedRoot(element_name(&e)));
        }
        let tileset = parse_tileset(&mut reader, &e, has_children, config)?;
        debug!(
            name = %tileset.name,
            tile_count = tileset.tile_count,
            tiles = tileset.tiles.len(),
            "parsed TSX tileset"
        );
        expect_eof(&mut reader)?;
        return Ok(tileset);
    }
}

/// Only whitespace, comments and processing instructions may follow the root.
fn expect_eof(reader: &mut XmlReader) -> Result<(), MalformedAsset> {
    loop {
        match reader.read_event()? {
            Event::Eof => return Ok(()),
            Event::Comment(_) | Event::PI(_) => {}
            Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
            Event::Start(e) | Event::Empty(e) => {
                return Err(MalformedAsset::TrailingContent(format!("<{}>", element_name(&e))))
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                return Err(MalformedAsset::TrailingContent(format!("</{name}>")));
            }
            other => return Err(MalformedAsset::TrailingContent(format!("{other:?}"))),
        }
    }
}

fn parse_tileset(
    reader: &mut XmlReader,
    start: &BytesStart,
    has_children: bool,
    config: &LoaderConfig,
) -> Result<Tileset, MalformedAsset> {
    let attrs = Attrs::read("tileset", start)?;

    let object_alignment = match attrs.get("objectalignment") {
        Some(raw) => ObjectAlignment::parse(raw).ok_or(MalformedAsset::InvalidAttribute {
            element: "tileset",
            attribute: "objectalignment",
            value: raw.to_owned(),
        })?,
        None => ObjectAlignment::Unspecified,
    };

    let mut image = None;
    let mut tile_offset = None;
    let mut properties = Properties::new();
    let mut tiles = BTreeMap::new();

    if has_children {
        while let Some((e, nested)) = next_child(reader, "tileset")? {
            match e.name().as_ref() {
                b"image" => {
                    image = Some(parse_image(&e)?);
                    skip(reader, &e, nested)?;
                }
                b"tileoffset" => {
                    let offset = Attrs::read("tileoffset", &e)?;
                    tile_offset = Some(TileOffset {
                        x: offset.parse("x")?.unwrap_or(0),
                        y: offset.parse("y")?.unwrap_or(0),
                    });
                    skip(reader, &e, nested)?;
                }
                b"properties" => properties = parse_properties(reader, nested, config)?,
                b"tile" => {
                    let (id, tile) = parse_tile(reader, &e, nested, config)?;
                    if tiles.insert(id, tile).is_some() {
                        return Err(MalformedAsset::DuplicateTileId { id });
                    }
                }
                _ => skip_unsupported(reader, "tileset", &e, nested)?,
            }
        }
    }

    Ok(Tileset {
        version: attrs.get("version").map(str::to_owned),
        tiled_version: attrs.get("tiledversion").map(str::to_owned),
        name: attrs.require("name")?.to_owned(),
        class: attrs.get("class").map(str::to_owned),
        tile_width: attrs.parse_required("tilewidth")?,
        tile_height: attrs.parse_required("tileheight")?,
        spacing: attrs.parse("spacing")?.unwrap_or(0),
        margin: attrs.parse("margin")?.unwrap_or(0),
        tile_count: attrs.parse_required("tilecount")?,
        columns: attrs.parse_required("columns")?,
        object_alignment,
        tile_offset,
        image: image.ok_or(MalformedAsset::MissingImage)?,
        properties,
        tiles,
    })
}

fn parse_image(e: &BytesStart) -> Result<TilesetImage, MalformedAsset> {
    let attrs = Attrs::read("image", e)?;
    Ok(TilesetImage {
        source: attrs.require("source")?.to_owned(),
        width: attrs.parse("width")?,
        height: attrs.parse("height")?,
        trans: attrs.get("trans").map(str::to_owned),
    })
}

fn parse_tile(
    reader: &mut XmlReader,
    start: &BytesStart,
    has_children: bool,
    config: &LoaderConfig,
) -> Result<(u32, TileData), MalformedAsset> {
    let attrs = Attrs::read("tile", start)?;
    let id = attrs.parse_required("id")?;
    let mut tile = TileData {
        // Tiled < 1.9 wrote the class as `type`
        class: attrs.get("class").or(attrs.get("type")).map(str::to_owned),
        probability: attrs.parse("probability")?,
        ..TileData::default()
    };

    if has_children {
        while let Some((e, nested)) = next_child(reader, "tile")? {
            match e.name().as_ref() {
                b"properties" => tile.properties = parse_properties(reader, nested, config)?,
                b"animation" => tile.animation = parse_animation(reader, nested)?,
                _ => skip_unsupported(reader, "tile", &e, nested)?,
            }
        }
    }

    Ok((id, tile))
}

fn parse_animation(reader: &mut XmlReader, has_children: bool) -> Result<Vec<Frame>, MalformedAsset> {
    let mut frames = Vec::new();
    if !has_children {
        return Ok(frames);
    }
    while let Some((e, nested)) = next_child(reader, "animation")? {
        if e.name().as_ref() == b"frame" {
            let attrs = Attrs::read("frame", &e)?;
            frames.push(Frame {
                tile_id: attrs.parse_required("tileid")?,
                duration_ms: attrs.parse_required("duration")?,
            });
        }
        skip(reader, &e, nested)?;
    }
    Ok(frames)
}

fn parse_properties(
    reader: &mut XmlReader,
    has_children: bool,
    config: &LoaderConfig,
) -> Result<Properties, MalformedAsset> {
    let mut out = Properties::new();
    if !has_children {
        return Ok(out);
    }
    while let Some((e, nested)) = next_child(reader, "properties")? {
        if e.name().as_ref() == b"property" {
            let (name, value) = parse_property(reader, &e, nested, config)?;
            out.insert(name, value);
        } else {
            skip_unsupported(reader, "properties", &e, nested)?;
        }
    }
    Ok(out)
}

fn parse_property(
    reader: &mut XmlReader,
    start: &BytesStart,
    has_children: bool,
    config: &LoaderConfig,
) -> Result<(String, PropertyValue), MalformedAsset> {
    let attrs = Attrs::read("property", start)?;
    let name = attrs.require("name")?.to_owned();
    let kind = attrs.get("type");

    if kind == Some("class") {
        let mut properties = Properties::new();
        if has_children {
            while let Some((e, nested)) = next_child(reader, "property")? {
                if e.name().as_ref() == b"properties" {
                    properties = parse_properties(reader, nested, config)?;
                } else {
                    skip_unsupported(reader, "property", &e, nested)?;
                }
            }
        }
        let value = PropertyValue::Class {
            property_type: attrs.get("propertytype").map(str::to_owned),
            properties,
        };
        return Ok((name, value));
    }

    // Multi-line strings are stored as element text instead of `value`
    let raw = match attrs.get("value") {
        Some(value) => {
            skip(reader, start, has_children)?;
            value.to_owned()
        }
        None if has_children => read_text(reader)?,
        None => String::new(),
    };

    let value = match PropertyValue::parse_scalar(&name, kind, &raw) {
        Err(MalformedAsset::UnsupportedPropertyType { kind, .. }) if config.lenient_property_types => {
            warn!(property = %name, %kind, "unsupported property type, keeping value as string");
            PropertyValue::String(raw)
        }
        other => other?,
    };
    Ok((name, value))
}

/// Concatenated text content up to the current element's end tag.
fn read_text(reader: &mut XmlReader) -> Result<String, MalformedAsset> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape().map_err(quick_xml::Error::from)?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(MalformedAsset::UnexpectedEof("property".to_owned())),
            _ => {}
        }
    }
}
