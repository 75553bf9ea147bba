//! Catalog dump models used by the importer.
//!
//! A dump is a single JSON document with the three entity lists. Everything
//! except ids and names is optional, audio features included.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDump {
    pub artists: Vec<ArtistEntry>,
    pub albums: Vec<AlbumEntry>,
    pub tracks: Vec<TrackEntry>,
}

impl CatalogDump {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog dump {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog dump {:?}", path))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistEntry {
    pub artist_id: String,
    pub artist_name: String,
    pub artist_spotify_url: Option<String>,
    pub artist_popularity: Option<i64>,
    pub artist_followers: Option<i64>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumEntry {
    pub album_id: String,
    pub album_name: String,
    /// Owner of the album.
    pub artist_id: Option<String>,
    pub album_type: Option<String>,
    pub album_release_date: Option<String>,
    pub album_total_tracks: Option<i64>,
    pub album_spotify_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub track_id: String,
    pub track_name: String,
    pub album_id: Option<String>,
    pub track_number: Option<i64>,
    pub track_duration_ms: Option<i64>,
    pub track_explicit: Option<bool>,
    pub track_spotify_url: Option<String>,
    pub track_popularity: Option<i64>,
    pub track_spotify_popularity: Option<i64>,
    pub track_tempo: Option<f64>,
    pub track_energy: Option<f64>,
    pub track_danceability: Option<f64>,
    pub track_valence: Option<f64>,
    pub track_loudness: Option<f64>,
    pub track_key: Option<i64>,
    pub track_mode: Option<i64>,
    /// Every artist credited on the track.
    #[serde(default)]
    pub artist_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub artists: usize,
    pub genres: usize,
    pub albums: usize,
    pub tracks: usize,
    pub track_artists: usize,
}
