//! Test fixture creation for the catalog database
//!
//! The catalog is written through the importer, the same path `cli-import`
//! takes, from a dump with 3 artists, 2 albums and 5 tracks.

use super::constants::*;
use anyhow::Result;
use mashup_catalog_server::catalog_store::{CatalogDump, SqliteCatalogStore};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

fn test_dump() -> Result<CatalogDump> {
    let dump = json!({
        "artists": [
            {
                "artist_id": ARTIST_1_ID,
                "artist_name": ARTIST_1_NAME,
                "artist_popularity": 70,
                "artist_followers": 12000,
                "genres": ["rock", "indie"]
            },
            {
                "artist_id": ARTIST_2_ID,
                "artist_name": ARTIST_2_NAME,
                "artist_popularity": 40,
                "genres": ["jazz"]
            },
            {
                "artist_id": ARTIST_3_ID,
                "artist_name": ARTIST_3_NAME,
                "artist_popularity": 85
            }
        ],
        "albums": [
            {
                "album_id": ALBUM_1_ID,
                "album_name": ALBUM_1_TITLE,
                "artist_id": ARTIST_1_ID,
                "album_type": "album",
                "album_release_date": "2020-01-15",
                "album_total_tracks": 3
            },
            {
                "album_id": ALBUM_2_ID,
                "album_name": ALBUM_2_TITLE,
                "artist_id": ARTIST_2_ID,
                "album_type": "compilation",
                "album_release_date": "2018-06",
                "album_total_tracks": 2
            }
        ],
        "tracks": [
            {
                "track_id": TRACK_1_ID,
                "track_name": TRACK_1_TITLE,
                "album_id": ALBUM_1_ID,
                "track_number": 1,
                "track_duration_ms": 215000,
                "track_popularity": 60,
                "track_tempo": 120.0,
                "track_energy": 0.8,
                "track_danceability": 0.6,
                "track_valence": 0.5,
                "track_loudness": -6.0,
                "track_key": 0,
                "track_mode": 1,
                "artist_ids": [ARTIST_1_ID]
            },
            {
                "track_id": TRACK_2_ID,
                "track_name": TRACK_2_TITLE,
                "album_id": ALBUM_1_ID,
                "track_number": 2,
                "track_popularity": 55,
                "track_tempo": 122.0,
                "track_energy": 0.78,
                "track_danceability": 0.62,
                "track_valence": 0.5,
                "track_loudness": -6.5,
                "track_key": 7,
                "track_mode": 1,
                "artist_ids": [ARTIST_1_ID]
            },
            {
                "track_id": TRACK_3_ID,
                "track_name": TRACK_3_TITLE,
                "album_id": ALBUM_1_ID,
                "track_number": 3,
                "track_explicit": true,
                "track_spotify_popularity": 30,
                "track_tempo": 90.0,
                "track_energy": 0.3,
                "track_danceability": 0.4,
                "track_valence": 0.2,
                "track_loudness": -11.0,
                "track_key": 3,
                "track_mode": 0,
                "artist_ids": [ARTIST_1_ID, ARTIST_3_ID]
            },
            {
                "track_id": TRACK_4_ID,
                "track_name": TRACK_4_TITLE,
                "album_id": ALBUM_2_ID,
                "track_number": 1,
                "track_popularity": 60,
                "track_tempo": 121.0,
                "track_energy": 0.8,
                "track_danceability": 0.6,
                "track_valence": 0.5,
                "track_loudness": -6.0,
                "track_key": 0,
                "track_mode": 1,
                "artist_ids": [ARTIST_2_ID]
            },
            {
                "track_id": TRACK_5_ID,
                "track_name": TRACK_5_TITLE,
                "album_id": ALBUM_2_ID,
                "track_number": 2,
                "artist_ids": [ARTIST_2_ID]
            }
        ]
    });
    Ok(serde_json::from_value(dump)?)
}

/// Creates a temporary db directory holding a populated catalog.db
/// Returns (temp_dir, catalog_db_path)
pub fn create_test_catalog() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let catalog_db_path = dir.path().join("catalog.db");

    let store = SqliteCatalogStore::new(&catalog_db_path, 1)?;
    store.import(&test_dump()?)?;

    Ok((dir, catalog_db_path))
}
