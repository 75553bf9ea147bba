//! SQLite-backed catalog store.
//!
//! One write connection is used by the importer, reads are spread round-robin
//! over a pool of read-only connections. Rows are decoded generically into
//! JSON objects keyed by column name.

use super::models::{AlbumEntry, ArtistEntry, CatalogDump, ImportStats, TrackEntry};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::{list_limit, CatalogStore};
use crate::mix::{CandidatePoolQuery, CandidateSource, RawRecord};
use crate::sqlite_persistence::ensure_latest_schema;
use anyhow::{anyhow, Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Params, Row, Transaction};
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Columns holding a JSON document built by the query itself.
const JSON_COLUMNS: &[&str] = &["genres", "artists"];

const ARTIST_SELECT: &str = "
    SELECT
        a.*,
        (SELECT json_group_array(ag.genre)
           FROM artist_genres ag
          WHERE ag.artist_id = a.artist_id) AS genres
    FROM artists a";

const ALBUM_SELECT: &str = "
    SELECT
        al.*,
        ar.artist_name
    FROM albums al
    JOIN artists ar ON al.artist_id = ar.artist_id";

/// Tracks with their album name, every credited artist (most popular first)
/// and the resolved popularity.
const TRACK_SELECT: &str = "
    SELECT
        t.*,
        al.album_name,
        (SELECT json_group_array(json_object('artist_id', credited.artist_id,
                                             'artist_name', credited.artist_name))
           FROM (SELECT ar.artist_id, ar.artist_name
                   FROM track_artists ta
                   JOIN artists ar ON ta.artist_id = ar.artist_id
                  WHERE ta.track_id = t.track_id
                  ORDER BY ar.artist_popularity DESC NULLS LAST, ta.rowid) credited
        ) AS artists,
        COALESCE(t.track_popularity, t.track_spotify_popularity) AS popularity
    FROM tracks t
    LEFT JOIN albums al ON t.album_id = al.album_id";

/// Tracks with their album name and main artist, the credited artist with the
/// highest popularity.
const MIX_RECORD_SELECT: &str = "
    SELECT
        t.*,
        al.album_name,
        main.artist_id,
        main.artist_name
    FROM tracks t
    LEFT JOIN albums al ON t.album_id = al.album_id
    LEFT JOIN artists main ON main.artist_id = (
        SELECT ar.artist_id
          FROM track_artists ta
          JOIN artists ar ON ta.artist_id = ar.artist_id
         WHERE ta.track_id = t.track_id
         ORDER BY ar.artist_popularity DESC NULLS LAST, ta.rowid
         LIMIT 1)";

/// SQLite-backed catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("Catalog db connection mutex poisoned"))
}

/// Pattern matching names that contain `search`, `%` and `_` taken literally.
fn contains_pattern(search: Option<&str>) -> Option<String> {
    search.map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

fn column_value(name: &str, value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if JSON_COLUMNS.contains(&name) {
                serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
            } else {
                Value::String(text.into_owned())
            }
        }
        ValueRef::Blob(_) => Value::Null,
    }
}

fn row_to_record(row: &Row, column_names: &[String]) -> rusqlite::Result<RawRecord> {
    let mut record = Map::with_capacity(column_names.len());
    for (index, name) in column_names.iter().enumerate() {
        record.insert(name.clone(), column_value(name, row.get_ref(index)?));
    }
    Ok(record)
}

fn query_records<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<RawRecord>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let records = stmt
        .query_map(params, |row| row_to_record(row, &column_names))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

fn query_values<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Value>> {
    Ok(query_records(conn, sql, params)?
        .into_iter()
        .map(Value::Object)
        .collect())
}

fn count_rows(conn: &Connection, table: &str) -> usize {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
        r.get::<_, i64>(0)
    })
    .unwrap_or(0) as usize
}

impl SqliteCatalogStore {
    /// Opens (creating it if needed) the catalog database at `db_path`.
    ///
    /// `read_pool_size` is the number of read-only connections, at least one
    /// is always opened.
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database {:?}", db_path))?;

        ensure_latest_schema(&mut write_conn, CATALOG_VERSIONED_SCHEMAS, "catalog")?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        info!(
            "Opened catalog: {} artists, {} albums, {} tracks",
            count_rows(&write_conn, "artists"),
            count_rows(&write_conn, "albums"),
            count_rows(&write_conn, "tracks")
        );

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .context("Failed to open catalog read connection")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let read_conn = self.get_read_conn();
        let conn = lock(&read_conn)?;
        f(&conn)
    }

    fn count(&self, table: &str) -> usize {
        self.read(|conn| Ok(count_rows(conn, table))).unwrap_or(0)
    }

    /// Imports a catalog dump in a single transaction.
    ///
    /// Entities already in the catalog are updated in place. The genres of an
    /// imported artist and the credits of an imported track are replaced by
    /// the dump's. References to entities missing from both the dump and the
    /// catalog fail the whole import.
    pub fn import(&self, dump: &CatalogDump) -> Result<ImportStats> {
        let mut conn = lock(&self.write_conn)?;
        let tx = conn.transaction()?;
        let mut stats = ImportStats::default();

        for artist in &dump.artists {
            import_artist(&tx, artist, &mut stats)
                .with_context(|| format!("Failed to import artist {}", artist.artist_id))?;
        }
        for album in &dump.albums {
            import_album(&tx, album)
                .with_context(|| format!("Failed to import album {}", album.album_id))?;
            stats.albums += 1;
        }
        for track in &dump.tracks {
            import_track(&tx, track, &mut stats)
                .with_context(|| format!("Failed to import track {}", track.track_id))?;
        }

        tx.commit().context("Failed to commit catalog import")?;
        info!(
            "Imported {} artists ({} genres), {} albums, {} tracks ({} credits)",
            stats.artists, stats.genres, stats.albums, stats.tracks, stats.track_artists
        );
        Ok(stats)
    }
}

fn import_artist(
    tx: &Transaction,
    artist: &ArtistEntry,
    stats: &mut ImportStats,
) -> Result<()> {
    tx.execute(
        "INSERT INTO artists (artist_id, artist_name, artist_spotify_url, artist_popularity, artist_followers)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(artist_id) DO UPDATE SET
            artist_name = excluded.artist_name,
            artist_spotify_url = excluded.artist_spotify_url,
            artist_popularity = excluded.artist_popularity,
            artist_followers = excluded.artist_followers",
        params![
            &artist.artist_id,
            &artist.artist_name,
            &artist.artist_spotify_url,
            artist.artist_popularity,
            artist.artist_followers
        ],
    )?;
    tx.execute(
        "DELETE FROM artist_genres WHERE artist_id = ?1",
        params![&artist.artist_id],
    )?;
    for genre in &artist.genres {
        stats.genres += tx.execute(
            "INSERT OR IGNORE INTO artist_genres (artist_id, genre) VALUES (?1, ?2)",
            params![&artist.artist_id, genre],
        )?;
    }
    stats.artists += 1;
    Ok(())
}

fn import_album(tx: &Transaction, album: &AlbumEntry) -> Result<()> {
    tx.execute(
        "INSERT INTO albums (album_id, album_name, artist_id, album_type, album_release_date,
                             album_total_tracks, album_spotify_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(album_id) DO UPDATE SET
            album_name = excluded.album_name,
            artist_id = excluded.artist_id,
            album_type = excluded.album_type,
            album_release_date = excluded.album_release_date,
            album_total_tracks = excluded.album_total_tracks,
            album_spotify_url = excluded.album_spotify_url",
        params![
            &album.album_id,
            &album.album_name,
            &album.artist_id,
            &album.album_type,
            &album.album_release_date,
            album.album_total_tracks,
            &album.album_spotify_url
        ],
    )?;
    Ok(())
}

fn import_track(
    tx: &Transaction,
    track: &TrackEntry,
    stats: &mut ImportStats,
) -> Result<()> {
    tx.execute(
        "INSERT INTO tracks (track_id, track_name, album_id, track_number, track_duration_ms,
                             track_explicit, track_spotify_url, track_popularity,
                             track_spotify_popularity, track_tempo, track_energy,
                             track_danceability, track_valence, track_loudness, track_key,
                             track_mode)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
         ON CONFLICT(track_id) DO UPDATE SET
            track_name = excluded.track_name,
            album_id = excluded.album_id,
            track_number = excluded.track_number,
            track_duration_ms = excluded.track_duration_ms,
            track_explicit = excluded.track_explicit,
            track_spotify_url = excluded.track_spotify_url,
            track_popularity = excluded.track_popularity,
            track_spotify_popularity = excluded.track_spotify_popularity,
            track_tempo = excluded.track_tempo,
            track_energy = excluded.track_energy,
            track_danceability = excluded.track_danceability,
            track_valence = excluded.track_valence,
            track_loudness = excluded.track_loudness,
            track_key = excluded.track_key,
            track_mode = excluded.track_mode",
        params![
            &track.track_id,
            &track.track_name,
            &track.album_id,
            track.track_number,
            track.track_duration_ms,
            track.track_explicit,
            &track.track_spotify_url,
            track.track_popularity,
            track.track_spotify_popularity,
            track.track_tempo,
            track.track_energy,
            track.track_danceability,
            track.track_valence,
            track.track_loudness,
            track.track_key,
            track.track_mode
        ],
    )?;
    tx.execute(
        "DELETE FROM track_artists WHERE track_id = ?1",
        params![&track.track_id],
    )?;
    for artist_id in &track.artist_ids {
        stats.track_artists += tx.execute(
            "INSERT OR IGNORE INTO track_artists (track_id, artist_id) VALUES (?1, ?2)",
            params![&track.track_id, artist_id],
        )?;
    }
    stats.tracks += 1;
    Ok(())
}

impl CatalogStore for SqliteCatalogStore {
    fn list_artists(&self, search: Option<&str>) -> Result<Vec<Value>> {
        let sql = format!(
            "{ARTIST_SELECT}
             WHERE (?1 IS NULL OR a.artist_name LIKE ?1 ESCAPE '\\')
             ORDER BY a.artist_popularity DESC NULLS LAST, a.rowid
             LIMIT ?2"
        );
        self.read(|conn| {
            query_values(
                conn,
                &sql,
                params![contains_pattern(search), list_limit(search) as i64],
            )
        })
    }

    fn get_artist(&self, id: &str) -> Result<Option<Value>> {
        let sql = format!("{ARTIST_SELECT} WHERE a.artist_id = ?1");
        self.read(|conn| Ok(query_values(conn, &sql, params![id])?.into_iter().next()))
    }

    fn get_artist_albums(&self, id: &str) -> Result<Vec<Value>> {
        let sql = format!(
            "{ALBUM_SELECT}
             WHERE al.artist_id = ?1
             ORDER BY al.album_release_date DESC NULLS LAST, al.rowid"
        );
        self.read(|conn| query_values(conn, &sql, params![id]))
    }

    fn get_artist_tracks(&self, id: &str) -> Result<Vec<Value>> {
        let sql = format!(
            "{TRACK_SELECT}
             JOIN track_artists credit ON credit.track_id = t.track_id
             WHERE credit.artist_id = ?1
             ORDER BY popularity DESC NULLS LAST, t.rowid"
        );
        self.read(|conn| query_values(conn, &sql, params![id]))
    }

    fn list_albums(&self, search: Option<&str>) -> Result<Vec<Value>> {
        let sql = format!(
            "{ALBUM_SELECT}
             WHERE (?1 IS NULL OR al.album_name LIKE ?1 ESCAPE '\\')
             ORDER BY al.album_release_date DESC NULLS LAST, al.rowid
             LIMIT ?2"
        );
        self.read(|conn| {
            query_values(
                conn,
                &sql,
                params![contains_pattern(search), list_limit(search) as i64],
            )
        })
    }

    fn get_album(&self, id: &str) -> Result<Option<Value>> {
        let sql = format!("{ALBUM_SELECT} WHERE al.album_id = ?1");
        self.read(|conn| Ok(query_values(conn, &sql, params![id])?.into_iter().next()))
    }

    fn get_album_tracks(&self, id: &str) -> Result<Vec<Value>> {
        let sql = format!(
            "{TRACK_SELECT}
             WHERE t.album_id = ?1
             ORDER BY t.track_number ASC NULLS LAST, t.rowid"
        );
        self.read(|conn| query_values(conn, &sql, params![id]))
    }

    fn list_tracks(&self, search: Option<&str>) -> Result<Vec<Value>> {
        let sql = format!(
            "{TRACK_SELECT}
             WHERE (?1 IS NULL OR t.track_name LIKE ?1 ESCAPE '\\')
             ORDER BY popularity DESC NULLS LAST, t.rowid
             LIMIT ?2"
        );
        self.read(|conn| {
            query_values(
                conn,
                &sql,
                params![contains_pattern(search), list_limit(search) as i64],
            )
        })
    }

    fn get_artists_count(&self) -> usize {
        self.count("artists")
    }

    fn get_albums_count(&self) -> usize {
        self.count("albums")
    }

    fn get_tracks_count(&self) -> usize {
        self.count("tracks")
    }
}

impl CandidateSource for SqliteCatalogStore {
    fn get_track_record(&self, track_id: &str) -> Result<Option<RawRecord>> {
        let sql = format!("{MIX_RECORD_SELECT} WHERE t.track_id = ?1");
        self.read(|conn| Ok(query_records(conn, &sql, params![track_id])?.into_iter().next()))
    }

    fn get_candidate_pool(&self, query: &CandidatePoolQuery) -> Result<Vec<RawRecord>> {
        let records = match query.tempo_range {
            Some((min, max)) => {
                let sql = format!(
                    "{MIX_RECORD_SELECT}
                     WHERE t.track_id <> ?1
                       AND t.track_tempo IS NOT NULL
                       AND t.track_tempo BETWEEN ?2 AND ?3
                     ORDER BY t.rowid
                     LIMIT ?4"
                );
                self.read(|conn| {
                    query_records(
                        conn,
                        &sql,
                        params![&query.exclude_track_id, min, max, query.limit as i64],
                    )
                })?
            }
            None => {
                let sql = format!(
                    "{MIX_RECORD_SELECT}
                     WHERE t.track_id <> ?1
                     ORDER BY t.rowid
                     LIMIT ?2"
                );
                self.read(|conn| {
                    query_records(conn, &sql, params![&query.exclude_track_id, query.limit as i64])
                })?
            }
        };
        debug!(
            "Candidate pool for {} (tempo range {:?}): {} tracks",
            query.exclude_track_id,
            query.tempo_range,
            records.len()
        );
        Ok(records)
    }
}
