//! Tiled tileset loader for Macroquad.
//!
//! Reads `.tsx` (XML) and `.tsj`/`.json` tileset descriptors, validates the
//! tile metadata against the declared grid, and resolves the atlas image
//! relative to the descriptor.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod properties;
mod tileset;
mod writer;

pub use config::LoaderConfig;
pub use error::{MalformedAsset, TilesetError};
pub use loader::{LoadedTileset, TilesetLoader};
pub use properties::{Properties, PropertyValue};
pub use tileset::{
    Frame, ObjectAlignment, TileData, TileOffset, Tileset, TilesetImage, NAME_PROPERTY,
};
