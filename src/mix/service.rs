//! Mix orchestration: fetch the base track and its candidate pool from a
//! [`CandidateSource`], rank the pool and keep the best recommendations.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::features::{numeric_field, track_id, RawRecord, TEMPO_FIELD};
use super::ranker::{rank_top_n, ScoredCandidate};
use super::scoring::ScoringConfig;

/// Parameters of a candidate pool request.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidatePoolQuery {
    /// Track that must not appear in the pool (the base track).
    pub exclude_track_id: String,
    /// Inclusive tempo bounds. Tracks without a tempo are left out when set.
    pub tempo_range: Option<(f64, f64)>,
    pub limit: usize,
}

/// Where base tracks and candidate pools come from.
pub trait CandidateSource: Send + Sync {
    /// Looks up a single track record, `None` if the id is unknown.
    fn get_track_record(&self, track_id: &str) -> Result<Option<RawRecord>>;

    /// Returns at most `query.limit` candidate records.
    fn get_candidate_pool(&self, query: &CandidatePoolQuery) -> Result<Vec<RawRecord>>;
}

#[derive(Debug, Error)]
pub enum MixError {
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Candidate source unavailable: {0}")]
    SourceUnavailable(#[source] anyhow::Error),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MixSettings {
    /// Half width of the tempo window used to prefilter candidates.
    pub tempo_window_bpm: f64,
    pub max_pool_size: usize,
    pub default_top_n: usize,
    pub max_top_n: usize,
    #[serde(flatten)]
    pub scoring: ScoringConfig,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            tempo_window_bpm: 8.0,
            max_pool_size: 1000,
            default_top_n: 10,
            max_top_n: 100,
            scoring: ScoringConfig::default(),
        }
    }
}

impl MixSettings {
    /// Requested count clamped to `1..=max_top_n`.
    pub fn resolve_top_n(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_n)
            .clamp(1, self.max_top_n.max(1))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MixRecommendations {
    pub base_track: RawRecord,
    pub recommendations: Vec<ScoredCandidate>,
    /// Number of candidates that were ranked.
    #[serde(skip)]
    pub pool_size: usize,
}

pub struct MixService {
    source: Arc<dyn CandidateSource>,
    settings: MixSettings,
}

impl MixService {
    pub fn new(source: Arc<dyn CandidateSource>, settings: MixSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &MixSettings {
        &self.settings
    }

    pub fn recommend(
        &self,
        base_track_id: &str,
        top_n: Option<usize>,
    ) -> Result<MixRecommendations, MixError> {
        let start = Instant::now();

        let base_track = self
            .source
            .get_track_record(base_track_id)
            .map_err(MixError::SourceUnavailable)?
            .ok_or_else(|| MixError::TrackNotFound(base_track_id.to_string()))?;

        let tempo_range = numeric_field(&base_track, TEMPO_FIELD).map(|tempo| {
            (
                tempo - self.settings.tempo_window_bpm,
                tempo + self.settings.tempo_window_bpm,
            )
        });
        let query = CandidatePoolQuery {
            exclude_track_id: base_track_id.to_string(),
            tempo_range,
            limit: self.settings.max_pool_size,
        };

        let mut pool = self
            .source
            .get_candidate_pool(&query)
            .map_err(MixError::SourceUnavailable)?;
        pool.retain(|candidate| track_id(candidate).as_deref() != Some(base_track_id));
        let pool_size = pool.len();

        if pool.is_empty() {
            debug!("Empty candidate pool for track {}", base_track_id);
            return Ok(MixRecommendations {
                base_track,
                recommendations: Vec::new(),
                pool_size,
            });
        }

        let top_n = self.settings.resolve_top_n(top_n);
        let recommendations = rank_top_n(&base_track, pool, top_n, &self.settings.scoring);

        debug!(
            "Ranked {} candidates for track {} (tempo window: {:?}), kept {} in {}ms",
            pool_size,
            base_track_id,
            tempo_range,
            recommendations.len(),
            start.elapsed().as_millis()
        );

        Ok(MixRecommendations {
            base_track,
            recommendations,
            pool_size,
        })
    }
}
