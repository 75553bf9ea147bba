//! Composite similarity score between a base track and a candidate.
//!
//! Every dimension yields a nonnegative term, the score is their weighted sum.
//! Lower means a better fit for mixing into the base track.

use serde::Deserialize;

use super::features::{resolve_or_default, FeatureVector};
use super::tonal::{tonal_score, TonalTable};

/// Weight of each term in the composite score.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub tempo: f64,
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub loudness: f64,
    pub tonal: f64,
    pub popularity: f64,
    pub same_artist: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            tempo: 2.5,
            energy: 1.8,
            danceability: 1.8,
            valence: 1.0,
            loudness: 0.6,
            tonal: 2.2,
            popularity: 0.5,
            same_artist: 0.7,
        }
    }
}

/// Weights, tonal table and calibration constants used by [`score`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: SimilarityWeights,
    pub tonal: TonalTable,
    /// BPM difference counted as one unit of tempo mismatch.
    pub tempo_scale_bpm: f64,
    /// dB difference counted as one unit of loudness mismatch.
    pub loudness_scale_db: f64,
    /// Stand-in for unknown energy, danceability and valence.
    pub neutral_unit_value: f64,
    /// Stand-in for unknown loudness.
    pub neutral_loudness_db: f64,
    pub popularity_min: f64,
    pub popularity_max: f64,
    /// Normalized popularity assumed when popularity is unknown.
    pub popularity_fallback: f64,
    pub same_artist_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            tonal: TonalTable::default(),
            tempo_scale_bpm: 8.0,
            loudness_scale_db: 12.0,
            neutral_unit_value: 0.5,
            neutral_loudness_db: -10.0,
            popularity_min: 0.0,
            popularity_max: 100.0,
            popularity_fallback: 0.5,
            same_artist_penalty: 0.3,
        }
    }
}

/// Unweighted per-dimension terms plus the weighted total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub tempo: f64,
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub loudness: f64,
    pub tonal: f64,
    pub popularity: f64,
    pub same_artist: f64,
    pub total: f64,
}

/// Linearly maps `value` from `[min, max]` into `[0, 1]`, clamping values
/// outside the range. Unknown values and an empty range yield `fallback`.
pub fn normalize(value: Option<f64>, min: f64, max: f64, fallback: f64) -> f64 {
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return fallback;
    };
    if max == min {
        return fallback;
    }
    let clamped = value.max(min.min(max)).min(max.max(min));
    (clamped - min) / (max - min)
}

pub fn score(base: &FeatureVector, cand: &FeatureVector, config: &ScoringConfig) -> f64 {
    breakdown(base, cand, config).total
}

pub fn breakdown(base: &FeatureVector, cand: &FeatureVector, config: &ScoringConfig) -> ScoreBreakdown {
    // Missing tempo on either side disables the term instead of penalizing.
    let tempo = match (base.tempo, cand.tempo) {
        (Some(base_tempo), Some(cand_tempo)) => {
            ((cand_tempo - base_tempo) / config.tempo_scale_bpm).powi(2)
        }
        _ => 0.0,
    };

    let unit_term = |base_value: Option<f64>, cand_value: Option<f64>| {
        let neutral = config.neutral_unit_value;
        (resolve_or_default(cand_value, neutral) - resolve_or_default(base_value, neutral)).powi(2)
    };
    let energy = unit_term(base.energy, cand.energy);
    let danceability = unit_term(base.danceability, cand.danceability);
    let valence = unit_term(base.valence, cand.valence);

    let loudness = ((resolve_or_default(cand.loudness, config.neutral_loudness_db)
        - resolve_or_default(base.loudness, config.neutral_loudness_db))
        / config.loudness_scale_db)
        .powi(2);

    let tonal = tonal_score(base.key, base.mode, cand.key, cand.mode, &config.tonal);

    let popularity = 1.0
        - normalize(
            cand.popularity,
            config.popularity_min,
            config.popularity_max,
            config.popularity_fallback,
        );

    let same_artist = match (&base.artist_id, &cand.artist_id) {
        (Some(base_artist), Some(cand_artist)) if base_artist == cand_artist => {
            config.same_artist_penalty
        }
        _ => 0.0,
    };

    let w = &config.weights;
    let total = w.tempo * tempo
        + w.energy * energy
        + w.danceability * danceability
        + w.valence * valence
        + w.loudness * loudness
        + w.tonal * tonal
        + w.popularity * popularity
        + w.same_artist * same_artist;

    ScoreBreakdown {
        tempo,
        energy,
        danceability,
        valence,
        loudness,
        tonal,
        popularity,
        same_artist,
        total,
    }
}
