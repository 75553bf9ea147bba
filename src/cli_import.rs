use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mashup_catalog_server::catalog_store::{CatalogDump, CatalogStore, SqliteCatalogStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    Ok(std::path::absolute(s)?)
}

/// Imports a JSON catalog dump into the catalog database.
///
/// The dump holds `artists`, `albums` and `tracks` lists. Entities already in
/// the database are updated, and a failing entity aborts the whole import.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the JSON catalog dump.
    #[clap(value_parser = parse_path)]
    pub dump_path: PathBuf,

    /// Directory containing the catalog database, created if missing.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    if !cli_args.db_dir.is_dir() {
        bail!("db_dir is not a directory: {:?}", cli_args.db_dir);
    }

    let start = Instant::now();
    info!("Loading catalog dump from {:?}...", cli_args.dump_path);
    let dump = CatalogDump::load(&cli_args.dump_path)?;
    info!(
        "Dump has {} artists, {} albums, {} tracks",
        dump.artists.len(),
        dump.albums.len(),
        dump.tracks.len()
    );

    let db_path = cli_args.db_dir.join("catalog.db");
    info!("Opening catalog database at {:?}...", db_path);
    let store = SqliteCatalogStore::new(&db_path, 1)?;
    let stats = store.import(&dump)?;

    info!(
        "Done in {}ms: {}",
        start.elapsed().as_millis(),
        serde_json::to_string(&stats)?
    );
    info!(
        "Catalog now has {} artists, {} albums, {} tracks",
        store.get_artists_count(),
        store.get_albums_count(),
        store.get_tracks_count()
    );
    Ok(())
}
