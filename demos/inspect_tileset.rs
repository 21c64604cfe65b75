use anyhow::Context;
use macroquad_tiled_tileset::{LoaderConfig, TilesetLoader};
use tracing_subscriber::EnvFilter;

// Usage: cargo run --example inspect_tileset -- <tileset.tsx> [loader.toml]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/assets/tiled/main_tileset.tsx".to_owned());
    let config = match args.next() {
        Some(cfg) => LoaderConfig::from_file(&cfg).with_context(|| format!("Reading config {cfg}"))?,
        None => LoaderConfig::default(),
    };

    let loaded = TilesetLoader::new(config)
        .load(&path)
        .with_context(|| format!("Loading tileset {path}"))?;
    let ts = &loaded.tileset;

    tracing::info!(image = %loaded.image_path.display(), "loaded {}", ts.name());
    println!(
        "{}: {} tiles of {}x{} in {} columns x {} rows ({})",
        ts.name(),
        ts.tile_count(),
        ts.tile_width(),
        ts.tile_height(),
        ts.columns(),
        ts.rows(),
        ts.object_alignment().as_str(),
    );
    for (id, name) in ts.named_tiles() {
        if let Some(rect) = ts.tile_rect(id) {
            println!("  {id:>3}  {name:<24} at ({}, {})", rect.x, rect.y);
        }
    }

    Ok(())
}
