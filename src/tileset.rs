use macroquad::math::{Rect, Vec2};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::LoaderConfig;
use crate::error::{MalformedAsset, TilesetError};
use crate::loader::{self, LoadedTileset};
use crate::properties::Properties;

/// Property key carrying a tile's semantic tag.
pub const NAME_PROPERTY: &str = "name";

/// Where an object using a tile from this set is anchored.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAlignment {
    /// Orientation default: bottom-left for orthogonal maps
    #[default]
    Unspecified,
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl ObjectAlignment {
    /// Parses Tiled's lowercase attribute value, e.g. `"bottomleft"`.
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "unspecified" => Self::Unspecified,
            "topleft" => Self::TopLeft,
            "top" => Self::Top,
            "topright" => Self::TopRight,
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "bottomleft" => Self::BottomLeft,
            "bottom" => Self::Bottom,
            "bottomright" => Self::BottomRight,
            _ => return None,
        })
    }

    /// Attribute value as Tiled writes it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::TopLeft => "topleft",
            Self::Top => "top",
            Self::TopRight => "topright",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::BottomLeft => "bottomleft",
            Self::Bottom => "bottom",
            Self::BottomRight => "bottomright",
        }
    }
}

/// The atlas image tiles are sliced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetImage {
    /// Path as authored, relative to the descriptor
    pub source: String,
    /// Declared pixel width
    pub width: Option<u32>,
    /// Declared pixel height
    pub height: Option<u32>,
    /// Transparent colour key, `RRGGBB` without the `#`
    pub trans: Option<String>,
}

/// Pixel offset applied when drawing tiles from this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileOffset {
    /// Horizontal offset, positive is right
    pub x: i32,
    /// Vertical offset, positive is down
    pub y: i32,
}

/// One step of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Local tile id shown during this frame
    pub tile_id: u32,
    /// Display time in milliseconds
    pub duration_ms: u32,
}

/// Metadata attached to a single tile id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileData {
    /// User-defined class (`class`, or the older `type`)
    pub class: Option<String>,
    /// Relative chance of being picked by terrain and random tools
    pub probability: Option<f32>,
    /// Custom properties, including the `name` tag
    pub properties: Properties,
    /// Animation frames in playback order
    pub animation: Vec<Frame>,
}

impl TileData {
    /// The tile's `name` tag, if it has one and it is a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.get_string(NAME_PROPERTY)
    }

    /// `true` for a bare `<tile id="N"/>` with nothing attached.
    pub fn is_empty(&self) -> bool {
        self.class.is_none()
            && self.probability.is_none()
            && self.properties.is_empty()
            && self.animation.is_empty()
    }
}

/// A Tiled tileset descriptor: one image sliced into a regular grid, plus
/// per-tile metadata. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub(crate) version: Option<String>,
    pub(crate) tiled_version: Option<String>,
    pub(crate) name: String,
    pub(crate) class: Option<String>,
    pub(crate) tile_width: u32,
    pub(crate) tile_height: u32,
    pub(crate) spacing: u32,
    pub(crate) margin: u32,
    pub(crate) tile_count: u32,
    pub(crate) columns: u32,
    pub(crate) object_alignment: ObjectAlignment,
    pub(crate) tile_offset: Option<TileOffset>,
    pub(crate) image: TilesetImage,
    pub(crate) properties: Properties,
    pub(crate) tiles: BTreeMap<u32, TileData>,
}

impl Tileset {
    /// Loads a `.tsx`, `.tsj` or `.json` tileset with the default config.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedTileset, TilesetError> {
        loader::TilesetLoader::default().load(path)
    }

    /// Parses and validates an in-memory TSX document.
    ///
    /// The image is not looked up on disk since there is no descriptor
    /// location to resolve it against.
    pub fn from_tsx_str(src: &str) -> Result<Self, MalformedAsset> {
        let config = LoaderConfig::default();
        let tileset = loader::tsx_loader::parse_tsx(src, &config)?;
        tileset.validate(&config)?;
        Ok(tileset)
    }

    /// Parses and validates an in-memory Tiled JSON tileset.
    pub fn from_json_str(src: &str) -> Result<Self, MalformedAsset> {
        let config = LoaderConfig::default();
        let tileset = loader::json_loader::parse_json(src, &config)?;
        tileset.validate(&config)?;
        Ok(tileset)
    }

    /// Tileset name; may be empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// User-defined class of the tileset.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// TMX format version, e.g. `"1.10"`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Version of the Tiled editor that saved the descriptor.
    pub fn tiled_version(&self) -> Option<&str> {
        self.tiled_version.as_deref()
    }

    /// Width of one tile in pixels.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Height of one tile in pixels.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Gap between neighbouring tiles in pixels.
    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    /// Border around the grid in pixels.
    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Number of tiles in the set. Valid ids are `0..tile_count`.
    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    /// Tiles per grid row.
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of grid rows, counting a partially filled last row.
    pub fn rows(&self) -> u32 {
        if self.columns == 0 {
            return 0;
        }
        self.tile_count.div_ceil(self.columns)
    }

    /// Anchor used by tile objects.
    pub fn object_alignment(&self) -> ObjectAlignment {
        self.object_alignment
    }

    /// Drawing offset, when declared.
    pub fn tile_offset(&self) -> Option<TileOffset> {
        self.tile_offset
    }

    /// The atlas image as declared.
    pub fn image(&self) -> &TilesetImage {
        &self.image
    }

    /// Tileset-level custom properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Image path joined onto the directory holding the descriptor.
    pub fn resolve_image(&self, descriptor_dir: &Path) -> PathBuf {
        descriptor_dir.join(&self.image.source)
    }

    /// Metadata for `id`, if the descriptor declares any.
    pub fn tile(&self, id: u32) -> Option<&TileData> {
        self.tiles.get(&id)
    }

    /// Declared tiles in ascending id order.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, &TileData)> {
        self.tiles.iter().map(|(id, tile)| (*id, tile))
    }

    /// Semantic tag of `id`. Tiles without a `name` property have no tag.
    pub fn tile_name(&self, id: u32) -> Option<&str> {
        self.tile(id)?.name()
    }

    /// Lowest tile id tagged with `name`.
    pub fn tile_by_name(&self, name: &str) -> Option<u32> {
        self.named_tiles()
            .find(|(_, tag)| *tag == name)
            .map(|(id, _)| id)
    }

    /// `(id, tag)` for every tagged tile, ascending by id.
    pub fn named_tiles(&self) -> impl Iterator<Item = (u32, &str)> {
        self.tiles
            .iter()
            .filter_map(|(id, tile)| tile.name().map(|name| (*id, name)))
    }

    /// `(column, row)` of `id` in the atlas grid.
    pub fn tile_coords(&self, id: u32) -> Option<(u32, u32)> {
        if id >= self.tile_count || self.columns == 0 {
            return None;
        }
        Some((id % self.columns, id / self.columns))
    }

    /// Source rectangle of `id` inside the atlas image, in pixels.
    ///
    /// `None` when the offset does not fit in `u32`.
    pub fn tile_rect(&self, id: u32) -> Option<Rect> {
        let (col, row) = self.tile_coords(id)?;
        let x = axis_offset(col, self.margin, self.tile_width, self.spacing)?;
        let y = axis_offset(row, self.margin, self.tile_height, self.spacing)?;
        Some(Rect::new(
            x as f32,
            y as f32,
            self.tile_width as f32,
            self.tile_height as f32,
        ))
    }

    /// Tile whose source rectangle contains `pixel`.
    ///
    /// Margins, spacing gutters and cells past `tile_count` map to `None`.
    pub fn tile_id_at(&self, pixel: Vec2) -> Option<u32> {
        if !pixel.is_finite() || pixel.x < 0.0 || pixel.y < 0.0 || self.columns == 0 {
            return None;
        }
        let col = axis_cell(pixel.x as u32, self.margin, self.tile_width, self.spacing)?;
        let row = axis_cell(pixel.y as u32, self.margin, self.tile_height, self.spacing)?;
        if col >= self.columns {
            return None;
        }
        let id = row.checked_mul(self.columns)?.checked_add(col)?;
        (id < self.tile_count).then_some(id)
    }

    /// Checks the descriptor against its own grid geometry.
    pub fn validate(&self, config: &LoaderConfig) -> Result<(), MalformedAsset> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(MalformedAsset::InvalidGeometry(format!(
                "tile size {}x{} must be non-zero",
                self.tile_width, self.tile_height
            )));
        }
        if self.tile_count > 0 && self.columns == 0 {
            return Err(MalformedAsset::InvalidGeometry(format!(
                "{} tiles declared across 0 columns",
                self.tile_count
            )));
        }

        for (&id, tile) in &self.tiles {
            if id >= self.tile_count {
                return Err(MalformedAsset::TileIdOutOfRange {
                    id,
                    tile_count: self.tile_count,
                });
            }
            if let Some(frame) = tile.animation.iter().find(|f| f.tile_id >= self.tile_count) {
                return Err(MalformedAsset::FrameOutOfRange {
                    tile: id,
                    frame: frame.tile_id,
                    tile_count: self.tile_count,
                });
            }
        }

        if config.check_image_geometry {
            let checks = [
                ("horizontal", self.columns, self.tile_width, self.image.width),
                ("vertical", self.rows(), self.tile_height, self.image.height),
            ];
            for (axis, cells, size, available) in checks {
                let Some(available) = available else { continue };
                let needed = grid_extent(cells, size, self.margin, self.spacing);
                if needed > available {
                    return Err(MalformedAsset::GridExceedsImage {
                        axis,
                        needed,
                        available,
                    });
                }
            }
        }

        Ok(())
    }
}

fn grid_extent(cells: u32, size: u32, margin: u32, spacing: u32) -> u32 {
    margin
        .saturating_mul(2)
        .saturating_add(cells.saturating_mul(size))
        .saturating_add(cells.saturating_sub(1).saturating_mul(spacing))
}

fn axis_offset(cell: u32, margin: u32, size: u32, spacing: u32) -> Option<u32> {
    cell.checked_mul(size)?
        .checked_add(cell.checked_mul(spacing)?)?
        .checked_add(margin)
}

fn axis_cell(pos: u32, margin: u32, size: u32, spacing: u32) -> Option<u32> {
    let rel = pos.checked_sub(margin)?;
    let stride = size.checked_add(spacing).filter(|s| *s > 0)?;
    (rel % stride < size).then_some(rel / stride)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyValue;
    use macroquad::math::vec2;

    fn grid(tile_count: u32, columns: u32, margin: u32, spacing: u32) -> Tileset {
        Tileset {
            version: None,
            tiled_version: None,
            name: "grid".into(),
            class: None,
            tile_width: 16,
            tile_height: 8,
            spacing,
            margin,
            tile_count,
            columns,
            object_alignment: ObjectAlignment::Unspecified,
            tile_offset: None,
            image: TilesetImage {
                source: "atlas.png".into(),
                width: None,
                height: None,
                trans: None,
            },
            properties: Properties::new(),
            tiles: BTreeMap::new(),
        }
    }

    fn named(name: &str) -> TileData {
        let mut tile = TileData::default();
        tile.properties
            .insert(NAME_PROPERTY, PropertyValue::String(name.into()));
        tile
    }

    #[test]
    fn rows_round_up_partial_last_row() {
        assert_eq!(grid(20, 5, 0, 0).rows(), 4);
        assert_eq!(grid(21, 5, 0, 0).rows(), 5);
        assert_eq!(grid(0, 0, 0, 0).rows(), 0);
    }

    #[test]
    fn tile_rect_uses_row_major_order_with_margin_and_spacing() {
        let ts = grid(20, 5, 2, 1);
        let r = ts.tile_rect(7).unwrap();
        // column 2, row 1
        assert_eq!((r.x, r.y, r.w, r.h), (2.0 + 2.0 * 17.0, 2.0 + 9.0, 16.0, 8.0));
        assert!(ts.tile_rect(20).is_none());
    }

    #[test]
    fn tile_id_at_rejects_gutters() {
        let ts = grid(20, 5, 2, 1);
        assert_eq!(ts.tile_id_at(vec2(1.0, 5.0)), None);
        assert_eq!(ts.tile_id_at(vec2(18.0, 2.0)), None);
        assert_eq!(ts.tile_id_at(vec2(19.0, 2.0)), Some(1));
        assert_eq!(ts.tile_id_at(vec2(-1.0, 0.0)), None);
    }

    #[test]
    fn tile_id_at_rejects_non_finite_pixels() {
        let ts = grid(20, 5, 0, 0);
        assert_eq!(ts.tile_id_at(vec2(f32::NAN, f32::NAN)), None);
        assert_eq!(ts.tile_id_at(vec2(f32::NAN, 0.0)), None);
        assert_eq!(ts.tile_id_at(vec2(f32::INFINITY, 0.0)), None);
        assert_eq!(ts.tile_id_at(vec2(0.0, 0.0)), Some(0));
    }

    #[test]
    fn tile_rect_is_none_when_offset_overflows() {
        let src = r#"<tileset name="huge" tilewidth="3000000000" tileheight="8" spacing="3000000000" tilecount="2" columns="2"><image source="huge.png"/></tileset>"#;
        let ts = Tileset::from_tsx_str(src).unwrap();
        let first = ts.tile_rect(0).unwrap();
        assert_eq!((first.x, first.y), (0.0, 0.0));
        assert!(ts.tile_rect(1).is_none());
    }

    #[test]
    fn missing_tiles_and_untagged_tiles_have_no_name() {
        let mut ts = grid(20, 5, 0, 0);
        ts.tiles.insert(2, named("player_spawn"));
        ts.tiles.insert(5, TileData::default());

        assert_eq!(ts.tile_name(2), Some("player_spawn"));
        assert_eq!(ts.tile_name(5), None);
        assert_eq!(ts.tile_name(9), None);
    }

    #[test]
    fn tile_by_name_prefers_lowest_id() {
        let mut ts = grid(20, 5, 0, 0);
        ts.tiles.insert(11, named("floor"));
        ts.tiles.insert(4, named("floor"));
        assert_eq!(ts.tile_by_name("floor"), Some(4));
        assert_eq!(ts.tile_by_name("ceiling"), None);
    }

    #[test]
    fn validate_rejects_out_of_range_tile() {
        let mut ts = grid(20, 5, 0, 0);
        ts.tiles.insert(20, TileData::default());
        let err = ts.validate(&LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, MalformedAsset::TileIdOutOfRange { id: 20, tile_count: 20 }));
    }

    #[test]
    fn validate_rejects_out_of_range_frame() {
        let mut ts = grid(4, 2, 0, 0);
        ts.tiles.insert(
            0,
            TileData {
                animation: vec![Frame { tile_id: 4, duration_ms: 100 }],
                ..TileData::default()
            },
        );
        let err = ts.validate(&LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, MalformedAsset::FrameOutOfRange { tile: 0, frame: 4, .. }));
    }

    #[test]
    fn validate_checks_grid_against_image_size() {
        let mut ts = grid(20, 5, 0, 0);
        ts.image.width = Some(80);
        ts.image.height = Some(31);
        let err = ts.validate(&LoaderConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            MalformedAsset::GridExceedsImage { axis: "vertical", needed: 32, available: 31 }
        ));

        let relaxed = LoaderConfig {
            check_image_geometry: false,
            ..LoaderConfig::default()
        };
        assert!(ts.validate(&relaxed).is_ok());
    }

    #[test]
    fn validate_rejects_zero_columns() {
        let ts = grid(4, 0, 0, 0);
        assert!(matches!(
            ts.validate(&LoaderConfig::default()),
            Err(MalformedAsset::InvalidGeometry(_))
        ));
    }

    #[test]
    fn object_alignment_names_are_symmetric() {
        for name in ["unspecified", "topleft", "center", "bottomleft", "bottomright"] {
            assert_eq!(ObjectAlignment::parse(name).map(|a| a.as_str()), Some(name));
        }
        assert_eq!(ObjectAlignment::parse("BottomLeft"), None);
    }
}
