use std::io;
use std::path::PathBuf;

/// Content-level failure: the descriptor itself is unusable.
#[derive(Debug, thiserror::Error)]
pub enum MalformedAsset {
    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The document is not valid Tiled JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The document ended before its root element was closed
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
    /// The root element is not `<tileset>`
    #[error("expected <tileset> root element, found <{0}>")]
    UnexpectedRoot(String),
    /// The document has no root element at all
    #[error("document contains no <tileset> element")]
    MissingRoot,
    /// Something other than whitespace, comments or processing instructions
    /// follows the closing `</tileset>`
    #[error("unexpected content after </tileset>: {0}")]
    TrailingContent(String),
    /// The descriptor bytes are not UTF-8
    #[error("descriptor is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// A required attribute is absent
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Element the attribute belongs to
        element: &'static str,
        /// Attribute name
        attribute: &'static str,
    },
    /// An attribute does not parse as the expected type
    #[error("<{element}> attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute {
        /// Element the attribute belongs to
        element: &'static str,
        /// Attribute name
        attribute: &'static str,
        /// Raw attribute text
        value: String,
    },
    /// No atlas image was declared
    #[error("<tileset> has no <image> element")]
    MissingImage,
    /// The referenced image does not exist relative to the descriptor
    #[error("image '{}' could not be resolved", path.display())]
    ImageUnresolved {
        /// Resolved image path that was checked
        path: PathBuf,
    },
    /// A `<tile>` id is not below the tile count
    #[error("tile id {id} is out of range (tilecount = {tile_count})")]
    TileIdOutOfRange {
        /// Offending tile id
        id: u32,
        /// Declared tile count
        tile_count: u32,
    },
    /// Two `<tile>` blocks share an id
    #[error("tile id {id} is declared more than once")]
    DuplicateTileId {
        /// Repeated tile id
        id: u32,
    },
    /// An animation frame points outside the tileset
    #[error("animation of tile {tile} references tile id {frame} (tilecount = {tile_count})")]
    FrameOutOfRange {
        /// Tile owning the animation
        tile: u32,
        /// Referenced frame tile id
        frame: u32,
        /// Declared tile count
        tile_count: u32,
    },
    /// Zero tile size, or tiles without columns
    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),
    /// The grid does not fit inside the declared image size
    #[error("{axis} extent of the tile grid is {needed}px but the image is {available}px")]
    GridExceedsImage {
        /// `"horizontal"` or `"vertical"`
        axis: &'static str,
        /// Pixels the grid needs on that axis
        needed: u32,
        /// Pixels the image provides
        available: u32,
    },
    /// A property `type` this crate does not know
    #[error("property '{name}' has unsupported type '{kind}'")]
    UnsupportedPropertyType {
        /// Property name
        name: String,
        /// Declared type
        kind: String,
    },
    /// A property value does not parse as its declared type
    #[error("property '{name}' value '{value}' does not match its type '{kind}'")]
    InvalidPropertyValue {
        /// Property name
        name: String,
        /// Declared type
        kind: String,
        /// Raw value text
        value: String,
    },
}

/// Error type for loading, writing and configuring tilesets
#[derive(Debug, thiserror::Error)]
pub enum TilesetError {
    /// The descriptor could not be read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// The descriptor was read but its content was rejected
    #[error("malformed tileset {}: {source}", path.display())]
    Malformed {
        /// Descriptor path
        path: PathBuf,
        /// What was wrong with it
        #[source]
        source: MalformedAsset,
    },
    /// The descriptor extension is not one of `tsx`, `tsj` or `json`
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// The loader config file is not valid TOML for [`LoaderConfig`](crate::LoaderConfig)
    #[error("invalid loader config {}: {source}", path.display())]
    Config {
        /// Config file path
        path: PathBuf,
        /// TOML error
        #[source]
        source: toml::de::Error,
    },
    /// Serializing the TSX document failed
    #[error("failed to write tileset: {0}")]
    Write(#[from] io::Error),
}

impl TilesetError {
    /// The content-level cause, when the descriptor was read but rejected.
    pub fn malformed(&self) -> Option<&MalformedAsset> {
        match self {
            TilesetError::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }
}
