//! CatalogStore trait definition.
//!
//! Browse operations return rows as JSON objects, one field per column, so
//! handlers can pass them through without an intermediate model.

use anyhow::Result;
use serde_json::Value;

/// Maximum rows returned by a list operation with a search filter.
pub const SEARCH_LIMIT: usize = 200;

/// Maximum rows returned by an unfiltered list operation.
pub const LIST_LIMIT: usize = 500;

pub fn list_limit(search: Option<&str>) -> usize {
    if search.is_some() {
        SEARCH_LIMIT
    } else {
        LIST_LIMIT
    }
}

pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    /// Artists whose name contains `search` (case-insensitive), most popular
    /// first. Each row carries a `genres` array.
    fn list_artists(&self, search: Option<&str>) -> Result<Vec<Value>>;

    fn get_artist(&self, id: &str) -> Result<Option<Value>>;

    /// Albums owned by the artist, newest first.
    fn get_artist_albums(&self, id: &str) -> Result<Vec<Value>>;

    /// Tracks the artist is credited on, most popular first.
    fn get_artist_tracks(&self, id: &str) -> Result<Vec<Value>>;

    // =========================================================================
    // Albums
    // =========================================================================

    /// Albums whose name contains `search`, newest first, with the owner's
    /// `artist_id` and `artist_name`.
    fn list_albums(&self, search: Option<&str>) -> Result<Vec<Value>>;

    fn get_album(&self, id: &str) -> Result<Option<Value>>;

    /// Tracks of the album in track number order.
    fn get_album_tracks(&self, id: &str) -> Result<Vec<Value>>;

    // =========================================================================
    // Tracks
    // =========================================================================

    /// Tracks whose name contains `search`, most popular first, with
    /// `album_name`, an `artists` array and the resolved `popularity`.
    fn list_tracks(&self, search: Option<&str>) -> Result<Vec<Value>>;

    // =========================================================================
    // Counts (for metrics)
    // =========================================================================

    fn get_artists_count(&self) -> usize;

    fn get_albums_count(&self) -> usize;

    fn get_tracks_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_depends_on_search() {
        assert_eq!(list_limit(Some("daft")), 200);
        assert_eq!(list_limit(None), 500);
    }
}
