//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all catalog-server endpoints.
//!
//! When API routes or request formats change, update only this file.
#![allow(dead_code)]

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {} failed: {}", path, e))
    }

    fn search_query(search: Option<&str>) -> Vec<(&'static str, String)> {
        search
            .map(|s| vec![("search", s.to_string())])
            .unwrap_or_default()
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// GET /api
    pub async fn get_status(&self) -> Response {
        self.get("/api", &[]).await
    }

    // ========================================================================
    // Artists
    // ========================================================================

    /// GET /api/artists?search=
    pub async fn get_artists(&self, search: Option<&str>) -> Response {
        self.get("/api/artists", &Self::search_query(search)).await
    }

    /// GET /api/artists/{id}
    pub async fn get_artist(&self, id: &str) -> Response {
        self.get(&format!("/api/artists/{}", id), &[]).await
    }

    /// GET /api/artists/{id}/albums
    pub async fn get_artist_albums(&self, id: &str) -> Response {
        self.get(&format!("/api/artists/{}/albums", id), &[]).await
    }

    /// GET /api/artists/{id}/tracks
    pub async fn get_artist_tracks(&self, id: &str) -> Response {
        self.get(&format!("/api/artists/{}/tracks", id), &[]).await
    }

    // ========================================================================
    // Albums
    // ========================================================================

    /// GET /api/albums?search=
    pub async fn get_albums(&self, search: Option<&str>) -> Response {
        self.get("/api/albums", &Self::search_query(search)).await
    }

    /// GET /api/albums/{id}
    pub async fn get_album(&self, id: &str) -> Response {
        self.get(&format!("/api/albums/{}", id), &[]).await
    }

    /// GET /api/albums/{id}/tracks
    pub async fn get_album_tracks(&self, id: &str) -> Response {
        self.get(&format!("/api/albums/{}/tracks", id), &[]).await
    }

    // ========================================================================
    // Tracks
    // ========================================================================

    /// GET /api/tracks?search=
    pub async fn get_tracks(&self, search: Option<&str>) -> Response {
        self.get("/api/tracks", &Self::search_query(search)).await
    }

    // ========================================================================
    // Mix
    // ========================================================================

    /// GET /api/mix?trackId=&limit=
    pub async fn get_mix(&self, track_id: Option<&str>, limit: Option<usize>) -> Response {
        let mut query = Vec::new();
        if let Some(track_id) = track_id {
            query.push(("trackId", track_id.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.get("/api/mix", &query).await
    }
}
