//! Key/mode compatibility between two tracks.
//!
//! Keys are pitch classes on a 12-tone circle. Compatibility is a discrete
//! lookup where lower is better: identical key and mode score 0, a perfect
//! fourth or fifth apart (distance 5 or 7) stays close even across a mode
//! change, everything else falls back to the `other` bucket.

use serde::Deserialize;

use super::features::PITCH_CLASSES;

/// Largest possible distance on the circle (a tritone).
pub const MAX_KEY_DISTANCE: u8 = (PITCH_CLASSES / 2) as u8;

/// Scores of the tonal lookup table.
///
/// Distances 1 and 2 only have a same-mode entry: a semitone or whole-tone
/// step combined with a mode change lands in `other`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TonalTable {
    pub unknown_key: f64,
    pub same_key_same_mode: f64,
    pub same_key_mode_change: f64,
    pub semitone_same_mode: f64,
    pub whole_tone_same_mode: f64,
    pub fourth_fifth_same_mode: f64,
    pub fourth_fifth_mode_change: f64,
    pub other: f64,
}

impl Default for TonalTable {
    fn default() -> Self {
        Self {
            unknown_key: 1.0,
            same_key_same_mode: 0.0,
            same_key_mode_change: 0.3,
            semitone_same_mode: 0.5,
            whole_tone_same_mode: 0.7,
            fourth_fifth_same_mode: 0.8,
            fourth_fifth_mode_change: 1.0,
            other: 1.5,
        }
    }
}

/// Circular distance between two pitch classes, `None` if either is unknown.
pub fn key_distance(a: Option<u8>, b: Option<u8>) -> Option<u8> {
    let (a, b) = (a?, b?);
    let diff = (a as i64 - b as i64).abs() % PITCH_CLASSES;
    Some(diff.min(PITCH_CLASSES - diff) as u8)
}

pub fn tonal_score(
    base_key: Option<u8>,
    base_mode: Option<i64>,
    cand_key: Option<u8>,
    cand_mode: Option<i64>,
    table: &TonalTable,
) -> f64 {
    let Some(distance) = key_distance(base_key, cand_key) else {
        return table.unknown_key;
    };
    let same_mode = base_mode == cand_mode;

    match (distance, same_mode) {
        (0, true) => table.same_key_same_mode,
        (0, false) => table.same_key_mode_change,
        (1, true) => table.semitone_same_mode,
        (2, true) => table.whole_tone_same_mode,
        (5 | 7, true) => table.fourth_fifth_same_mode,
        (5 | 7, false) => table.fourth_fifth_mode_change,
        _ => table.other,
    }
}
