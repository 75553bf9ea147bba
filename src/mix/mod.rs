//! Track similarity ranking behind the "mix" recommendations.
//!
//! Lower scores mean more similar tracks. The engine (`features`, `tonal`,
//! `scoring`, `ranker`) is pure and infallible, `service` wires it to a
//! [`CandidateSource`].

pub mod features;
pub mod ranker;
pub mod scoring;
pub mod service;
pub mod tonal;

pub use features::{extract, FeatureVector, RawRecord};
pub use ranker::{rank, rank_top_n, ScoredCandidate};
pub use scoring::{breakdown, score, ScoreBreakdown, ScoringConfig, SimilarityWeights};
pub use service::{
    CandidatePoolQuery, CandidateSource, MixError, MixRecommendations, MixService, MixSettings,
};
pub use tonal::{key_distance, tonal_score, TonalTable};
