//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes, update only this file and `fixtures.rs`.
#![allow(dead_code)]

// ============================================================================
// Test Catalog IDs
// ============================================================================

/// Artist ID for "The Test Band"
pub const ARTIST_1_ID: &str = "artist-1";

/// Artist ID for "Jazz Ensemble"
pub const ARTIST_2_ID: &str = "artist-2";

/// Artist ID for "Guest Singer", featured on one track of First Album
pub const ARTIST_3_ID: &str = "artist-3";

/// Album ID for "First Album" by The Test Band
pub const ALBUM_1_ID: &str = "album-1";

/// Album ID for "Jazz Collection" by Jazz Ensemble
pub const ALBUM_2_ID: &str = "album-2";

/// Track ID for "Opening Track" on First Album (120 BPM, C major)
pub const TRACK_1_ID: &str = "track-1";

/// Track ID for "Middle Track" on First Album (122 BPM, G major)
pub const TRACK_2_ID: &str = "track-2";

/// Track ID for "Closing Track" on First Album (90 BPM, with Guest Singer)
pub const TRACK_3_ID: &str = "track-3";

/// Track ID for "Smooth Jazz" on Jazz Collection (121 BPM, C major)
pub const TRACK_4_ID: &str = "track-4";

/// Track ID for "Upbeat Jazz" on Jazz Collection, no audio features
pub const TRACK_5_ID: &str = "track-5";

// ============================================================================
// Test Catalog Metadata
// ============================================================================

/// Artist 1 name
pub const ARTIST_1_NAME: &str = "The Test Band";

/// Artist 2 name
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

/// Artist 3 name
pub const ARTIST_3_NAME: &str = "Guest Singer";

/// Album 1 title
pub const ALBUM_1_TITLE: &str = "First Album";

/// Album 2 title
pub const ALBUM_2_TITLE: &str = "Jazz Collection";

/// Track 1 title
pub const TRACK_1_TITLE: &str = "Opening Track";

/// Track 2 title
pub const TRACK_2_TITLE: &str = "Middle Track";

/// Track 3 title
pub const TRACK_3_TITLE: &str = "Closing Track";

/// Track 4 title
pub const TRACK_4_TITLE: &str = "Smooth Jazz";

/// Track 5 title
pub const TRACK_5_TITLE: &str = "Upbeat Jazz";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
