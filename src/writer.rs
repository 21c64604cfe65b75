use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io;
use std::path::Path;

use crate::error::TilesetError;
use crate::properties::{Properties, PropertyValue};
use crate::tileset::{ObjectAlignment, TileData, Tileset};

type XmlWriter = Writer<Vec<u8>>;

fn emit(writer: &mut XmlWriter, event: Event) -> io::Result<()> {
    writer.write_event(event).map_err(io::Error::other)
}

impl Tileset {
    /// Serializes the descriptor as a TSX document.
    ///
    /// Tiles are written in ascending id order; everything else keeps
    /// Tiled's element order.
    pub fn to_tsx_string(&self) -> Result<String, TilesetError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);
        write_tileset(&mut writer, self)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Writes [`to_tsx_string`](Self::to_tsx_string) to `path`.
    pub fn save_tsx<P: AsRef<Path>>(&self, path: P) -> Result<(), TilesetError> {
        let path = path.as_ref();
        let xml = self.to_tsx_string()?;
        std::fs::write(path, xml).map_err(|source| TilesetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn write_tileset(writer: &mut XmlWriter, ts: &Tileset) -> io::Result<()> {
    emit(writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let numbers = [
        ("tilewidth", Some(ts.tile_width)),
        ("tileheight", Some(ts.tile_height)),
        ("spacing", Some(ts.spacing).filter(|v| *v != 0)),
        ("margin", Some(ts.margin).filter(|v| *v != 0)),
        ("tilecount", Some(ts.tile_count)),
        ("columns", Some(ts.columns)),
    ];

    let mut root = BytesStart::new("tileset");
    if let Some(version) = &ts.version {
        root.push_attribute(("version", version.as_str()));
    }
    if let Some(tiled_version) = &ts.tiled_version {
        root.push_attribute(("tiledversion", tiled_version.as_str()));
    }
    root.push_attribute(("name", ts.name.as_str()));
    if let Some(class) = &ts.class {
        root.push_attribute(("class", class.as_str()));
    }
    for (key, value) in numbers {
        if let Some(value) = value {
            root.push_attribute((key, value.to_string().as_str()));
        }
    }
    if ts.object_alignment != ObjectAlignment::Unspecified {
        root.push_attribute(("objectalignment", ts.object_alignment.as_str()));
    }
    emit(writer, Event::Start(root))?;

    if let Some(offset) = ts.tile_offset {
        let mut e = BytesStart::new("tileoffset");
        e.push_attribute(("x", offset.x.to_string().as_str()));
        e.push_attribute(("y", offset.y.to_string().as_str()));
        emit(writer, Event::Empty(e))?;
    }

    write_properties(writer, &ts.properties)?;

    let image = &ts.image;
    let mut e = BytesStart::new("image");
    e.push_attribute(("source", image.source.as_str()));
    if let Some(trans) = &image.trans {
        e.push_attribute(("trans", trans.as_str()));
    }
    if let Some(width) = image.width {
        e.push_attribute(("width", width.to_string().as_str()));
    }
    if let Some(height) = image.height {
        e.push_attribute(("height", height.to_string().as_str()));
    }
    emit(writer, Event::Empty(e))?;

    for (&id, tile) in &ts.tiles {
        write_tile(writer, id, tile)?;
    }

    emit(writer, Event::End(BytesEnd::new("tileset")))
}

fn write_tile(writer: &mut XmlWriter, id: u32, tile: &TileData) -> io::Result<()> {
    let mut e = BytesStart::new("tile");
    e.push_attribute(("id", id.to_string().as_str()));
    if let Some(class) = &tile.class {
        e.push_attribute(("type", class.as_str()));
    }
    if let Some(probability) = tile.probability {
        e.push_attribute(("probability", probability.to_string().as_str()));
    }

    if tile.properties.is_empty() && tile.animation.is_empty() {
        return emit(writer, Event::Empty(e));
    }

    emit(writer, Event::Start(e))?;
    write_properties(writer, &tile.properties)?;
    if !tile.animation.is_empty() {
        emit(writer, Event::Start(BytesStart::new("animation")))?;
        for frame in &tile.animation {
            let mut f = BytesStart::new("frame");
            f.push_attribute(("tileid", frame.tile_id.to_string().as_str()));
            f.push_attribute(("duration", frame.duration_ms.to_string().as_str()));
            emit(writer, Event::Empty(f))?;
        }
        emit(writer, Event::End(BytesEnd::new("animation")))?;
    }
    emit(writer, Event::End(BytesEnd::new("tile")))
}

fn write_properties(writer: &mut XmlWriter, props: &Properties) -> io::Result<()> {
    if props.is_empty() {
        return Ok(());
    }
    emit(writer, Event::Start(BytesStart::new("properties")))?;
    for (name, value) in props.iter() {
        write_property(writer, name, value)?;
    }
    emit(writer, Event::End(BytesEnd::new("properties")))
}

fn write_property(writer: &mut XmlWriter, name: &str, value: &PropertyValue) -> io::Result<()> {
    let mut e = BytesStart::new("property");
    e.push_attribute(("name", name));
    if !matches!(value, PropertyValue::String(_)) {
        e.push_attribute(("type", value.type_name()));
    }

    match value {
        PropertyValue::Class {
            property_type,
            properties,
        } => {
            if let Some(property_type) = property_type {
                e.push_attribute(("propertytype", property_type.as_str()));
            }
            if properties.is_empty() {
                return emit(writer, Event::Empty(e));
            }
            emit(writer, Event::Start(e))?;
            write_properties(writer, properties)?;
            emit(writer, Event::End(BytesEnd::new("property")))
        }
        // Tiled keeps multi-line strings as element text
        PropertyValue::String(text) if text.contains('\n') => {
            emit(writer, Event::Start(e))?;
            emit(writer, Event::Text(BytesText::new(text)))?;
            emit(writer, Event::End(BytesEnd::new("property")))
        }
        scalar => {
            if let Some(raw) = scalar.to_attribute() {
                e.push_attribute(("value", raw.as_str()));
            }
            emit(writer, Event::Empty(e))
        }
    }
}
