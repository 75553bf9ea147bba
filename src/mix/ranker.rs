//! Ranking of a candidate pool against a base track.

use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::features::{extract, RawRecord};
use super::scoring::{score, ScoringConfig};

pub const SIMILARITY_SCORE_FIELD: &str = "similarity_score";

/// A candidate record with its similarity to the base track attached.
///
/// Serializes as the original record plus a `similarity_score` field, which
/// replaces any field of the same name already in the record.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub record: RawRecord,
    pub similarity_score: f64,
}

impl ScoredCandidate {
    pub fn into_record(self) -> RawRecord {
        let mut record = self.record;
        record.insert(
            SIMILARITY_SCORE_FIELD.to_string(),
            serde_json::Value::from(self.similarity_score),
        );
        record
    }
}

impl Serialize for ScoredCandidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self
            .record
            .iter()
            .filter(|(name, _)| name.as_str() != SIMILARITY_SCORE_FIELD);
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(SIMILARITY_SCORE_FIELD, &self.similarity_score)?;
        map.end()
    }
}

/// Scores every candidate against `base` and returns them best first.
///
/// Scoring runs in parallel, the sort happens afterwards on the complete list
/// and is stable: candidates with equal scores keep their input order.
pub fn rank(base: &RawRecord, candidates: Vec<RawRecord>, config: &ScoringConfig) -> Vec<ScoredCandidate> {
    let base_features = extract(base);

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_par_iter()
        .map(|record| {
            let similarity_score = score(&base_features, &extract(&record), config);
            ScoredCandidate {
                record,
                similarity_score,
            }
        })
        .collect();

    scored.sort_by(|a, b| a.similarity_score.total_cmp(&b.similarity_score));
    scored
}

/// [`rank`] followed by keeping the best `n` candidates.
pub fn rank_top_n(
    base: &RawRecord,
    candidates: Vec<RawRecord>,
    n: usize,
    config: &ScoringConfig,
) -> Vec<ScoredCandidate> {
    let mut ranked = rank(base, candidates, config);
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test records must be objects"),
        }
    }

    fn ids(ranked: &[ScoredCandidate]) -> Vec<&str> {
        ranked
            .iter()
            .map(|c| c.record["track_id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn close_match_ranks_before_distant_one() {
        let base = record(json!({
            "track_id": "base", "track_tempo": 120, "track_energy": 0.8,
            "track_key": 0, "track_mode": 1,
        }));
        let a = record(json!({
            "track_id": "a", "track_tempo": 122, "track_energy": 0.8,
            "track_key": 0, "track_mode": 1,
        }));
        let b = record(json!({
            "track_id": "b", "track_tempo": 160, "track_energy": 0.1,
            "track_key": 6, "track_mode": 0,
        }));

        let ranked = rank(&base, vec![b, a], &ScoringConfig::default());

        assert_eq!(ids(&ranked), vec!["a", "b"]);
        assert!(ranked[0].similarity_score < ranked[1].similarity_score);
    }

    #[test]
    fn empty_pool_yields_empty_ranking() {
        let base = record(json!({"track_id": "base", "track_tempo": 120}));
        assert!(rank(&base, Vec::new(), &ScoringConfig::default()).is_empty());
        assert!(rank_top_n(&base, Vec::new(), 10, &ScoringConfig::default()).is_empty());
    }

    #[test]
    fn output_is_sorted_and_truncated() {
        let base = record(json!({"track_id": "base", "track_tempo": 120, "track_key": 5}));
        let candidates: Vec<RawRecord> = (0..40)
            .map(|i| {
                record(json!({
                    "track_id": format!("t{i}"),
                    "track_tempo": 100 + i,
                    "track_key": i % 12,
                    "track_popularity": (i * 7) % 100,
                }))
            })
            .collect();

        let config = ScoringConfig::default();
        let ranked = rank_top_n(&base, candidates.clone(), 10, &config);
        assert_eq!(ranked.len(), 10);
        assert!(ranked
            .windows(2)
            .all(|pair| pair[0].similarity_score <= pair[1].similarity_score));

        let short = rank_top_n(&base, candidates[..3].to_vec(), 10, &config);
        assert_eq!(short.len(), 3);
    }

    #[test]
    fn ties_keep_input_order() {
        let base = record(json!({"track_id": "base", "track_tempo": 120}));
        let candidates: Vec<RawRecord> = (0..200)
            .map(|i| record(json!({"track_id": format!("t{i}"), "track_tempo": 120})))
            .collect();
        let expected: Vec<String> = (0..200).map(|i| format!("t{i}")).collect();

        let ranked = rank(&base, candidates, &ScoringConfig::default());

        assert_eq!(ids(&ranked), expected);
    }

    #[test]
    fn ties_are_stable_among_mixed_scores() {
        let base = record(json!({"track_tempo": 120}));
        let candidates = vec![
            record(json!({"track_id": "far-1", "track_tempo": 140})),
            record(json!({"track_id": "near-1", "track_tempo": 121})),
            record(json!({"track_id": "far-2", "track_tempo": 140})),
            record(json!({"track_id": "near-2", "track_tempo": 121})),
        ];

        let ranked = rank(&base, candidates, &ScoringConfig::default());

        assert_eq!(ids(&ranked), vec!["near-1", "near-2", "far-1", "far-2"]);
    }

    #[test]
    fn base_without_tempo_ignores_candidate_tempo() {
        let base = record(json!({"track_id": "base"}));
        let candidates = vec![
            record(json!({"track_id": "slow", "track_tempo": 60})),
            record(json!({"track_id": "fast", "track_tempo": 200})),
        ];

        let ranked = rank(&base, candidates, &ScoringConfig::default());

        assert_eq!(ranked[0].similarity_score, ranked[1].similarity_score);
        assert_eq!(ids(&ranked), vec!["slow", "fast"]);
    }

    #[test]
    fn records_are_preserved_and_score_is_attached() {
        let base = record(json!({"track_id": "base"}));
        let cand = record(json!({
            "track_id": "c",
            "track_name": "Night Drive",
            "similarity_score": "stale",
        }));

        let ranked = rank(&base, vec![cand.clone()], &ScoringConfig::default());
        assert_eq!(ranked[0].record, cand);

        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(json["track_name"], "Night Drive");
        assert_eq!(json["similarity_score"], json!(ranked[0].similarity_score));
        assert_eq!(json.as_object().unwrap().len(), 3);

        let flattened = ranked[0].clone().into_record();
        assert_eq!(flattened["similarity_score"], json!(ranked[0].similarity_score));
    }
}
