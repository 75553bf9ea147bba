//! SQLite schema of the catalog database.
//!
//! Entities are keyed by their catalog text ids. Audio features live directly
//! on the `tracks` table and are nullable: analysis is not available for every
//! track.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, ForeignKey, OnDelete, SqlType, Table, VersionedSchema};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
    on_delete: OnDelete::Cascade,
};

const OWNER_ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
    on_delete: OnDelete::SetNull,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "album_id",
    on_delete: OnDelete::SetNull,
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "track_id",
    on_delete: OnDelete::Cascade,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_spotify_url", &SqlType::Text),
        sqlite_column!("artist_popularity", &SqlType::Integer), // 0..100
        sqlite_column!("artist_followers", &SqlType::Integer),
    ],
    indices: &[
        ("idx_artists_name", "artist_name"),
        ("idx_artists_popularity", "artist_popularity"),
    ],
    unique_constraints: &[],
};

const ARTIST_GENRES_TABLE: Table = Table {
    name: "artist_genres",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, non_null = true, foreign_key = Some(&ARTIST_FK)),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_artist_genres_artist", "artist_id")],
    unique_constraints: &[&["artist_id", "genre"]],
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("album_id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("album_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_id", &SqlType::Text, foreign_key = Some(&OWNER_ARTIST_FK)), // owner
        sqlite_column!("album_type", &SqlType::Text), // 'album', 'single', 'compilation'
        sqlite_column!("album_release_date", &SqlType::Text), // '2023-05-15', '2023-05', '2023'
        sqlite_column!("album_total_tracks", &SqlType::Integer),
        sqlite_column!("album_spotify_url", &SqlType::Text),
    ],
    indices: &[
        ("idx_albums_artist", "artist_id"),
        ("idx_albums_release_date", "album_release_date"),
    ],
    unique_constraints: &[],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("track_id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("track_name", &SqlType::Text, non_null = true),
        sqlite_column!("album_id", &SqlType::Text, foreign_key = Some(&ALBUM_FK)),
        sqlite_column!("track_number", &SqlType::Integer),
        sqlite_column!("track_duration_ms", &SqlType::Integer),
        sqlite_column!("track_explicit", &SqlType::Integer),
        sqlite_column!("track_spotify_url", &SqlType::Text),
        sqlite_column!("track_popularity", &SqlType::Integer),
        sqlite_column!("track_spotify_popularity", &SqlType::Integer),
        sqlite_column!("track_tempo", &SqlType::Real), // BPM
        sqlite_column!("track_energy", &SqlType::Real),
        sqlite_column!("track_danceability", &SqlType::Real),
        sqlite_column!("track_valence", &SqlType::Real),
        sqlite_column!("track_loudness", &SqlType::Real), // dB
        sqlite_column!("track_key", &SqlType::Integer), // pitch class, -1 when not detected
        sqlite_column!("track_mode", &SqlType::Integer), // 0 minor, 1 major
    ],
    indices: &[
        ("idx_tracks_album", "album_id"),
        ("idx_tracks_name", "track_name"),
        ("idx_tracks_tempo", "track_tempo"),
    ],
    unique_constraints: &[],
};

const TRACK_ARTISTS_TABLE: Table = Table {
    name: "track_artists",
    columns: &[
        sqlite_column!("track_id", &SqlType::Text, non_null = true, foreign_key = Some(&TRACK_FK)),
        sqlite_column!("artist_id", &SqlType::Text, non_null = true, foreign_key = Some(&ARTIST_FK)),
    ],
    indices: &[
        ("idx_track_artists_track", "track_id"),
        ("idx_track_artists_artist", "artist_id"),
    ],
    unique_constraints: &[&["track_id", "artist_id"]],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        ARTIST_GENRES_TABLE,
        ALBUMS_TABLE,
        TRACKS_TABLE,
        TRACK_ARTISTS_TABLE,
    ],
    migration: None,
}];
