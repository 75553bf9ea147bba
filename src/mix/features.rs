//! Mapping of raw catalog records to the feature vectors compared by the
//! similarity scorer.
//!
//! Extraction never fails: a field that is missing or not numeric becomes
//! "unknown" (`None`), and the scorer decides how unknown values are treated.

use serde_json::{Map, Value};

/// A catalog record as produced by a candidate source. The engine only reads
/// it and hands it back untouched inside the ranking output.
pub type RawRecord = Map<String, Value>;

pub const TEMPO_FIELD: &str = "track_tempo";
pub const ENERGY_FIELD: &str = "track_energy";
pub const DANCEABILITY_FIELD: &str = "track_danceability";
pub const VALENCE_FIELD: &str = "track_valence";
pub const LOUDNESS_FIELD: &str = "track_loudness";
pub const KEY_FIELD: &str = "track_key";
pub const MODE_FIELD: &str = "track_mode";
pub const ARTIST_ID_FIELD: &str = "artist_id";
pub const TRACK_ID_FIELD: &str = "track_id";

/// Popularity candidates, in priority order. The first present numeric value
/// wins, values are never averaged.
pub const POPULARITY_FIELDS: &[&str] = &["track_popularity", "track_spotify_popularity"];

/// Number of pitch classes on the tonal circle.
pub const PITCH_CLASSES: i64 = 12;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureVector {
    /// Beats per minute.
    pub tempo: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    /// Decibels, usually negative.
    pub loudness: Option<f64>,
    /// Pitch class, 0 (C) to 11 (B).
    pub key: Option<u8>,
    /// 0 = minor, 1 = major. Only ever compared for equality.
    pub mode: Option<i64>,
    /// 0 to 100.
    pub popularity: Option<f64>,
    pub artist_id: Option<String>,
}

pub fn extract(record: &RawRecord) -> FeatureVector {
    FeatureVector {
        tempo: numeric_field(record, TEMPO_FIELD),
        energy: numeric_field(record, ENERGY_FIELD),
        danceability: numeric_field(record, DANCEABILITY_FIELD),
        valence: numeric_field(record, VALENCE_FIELD),
        loudness: numeric_field(record, LOUDNESS_FIELD),
        key: integer_field(record, KEY_FIELD)
            .filter(|key| (0..PITCH_CLASSES).contains(key))
            .map(|key| key as u8),
        mode: integer_field(record, MODE_FIELD),
        popularity: POPULARITY_FIELDS
            .iter()
            .find_map(|field| numeric_field(record, field)),
        artist_id: record.get(ARTIST_ID_FIELD).and_then(identifier_value),
    }
}

/// Falls back to `default` when the value is unknown.
pub fn resolve_or_default(value: Option<f64>, default: f64) -> f64 {
    value.unwrap_or(default)
}

/// Reads a numeric field. Numbers rendered as text (the way some drivers
/// return NUMERIC columns) are accepted as long as they parse to a finite value.
pub fn numeric_field(record: &RawRecord, field: &str) -> Option<f64> {
    record.get(field).and_then(numeric_value)
}

pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn integer_field(record: &RawRecord, field: &str) -> Option<i64> {
    let number = numeric_field(record, field)?;
    (number.fract() == 0.0).then_some(number as i64)
}

fn identifier_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier of the track a record describes, if any.
pub fn track_id(record: &RawRecord) -> Option<String> {
    record.get(TRACK_ID_FIELD).and_then(identifier_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn extracts_all_known_fields() {
        let features = extract(&record(json!({
            "track_tempo": 124.5,
            "track_energy": 0.8,
            "track_danceability": 0.7,
            "track_valence": 0.4,
            "track_loudness": -6.5,
            "track_key": 9,
            "track_mode": 0,
            "track_popularity": 64,
            "artist_id": "artist-1",
        })));

        assert_eq!(features.tempo, Some(124.5));
        assert_eq!(features.energy, Some(0.8));
        assert_eq!(features.danceability, Some(0.7));
        assert_eq!(features.valence, Some(0.4));
        assert_eq!(features.loudness, Some(-6.5));
        assert_eq!(features.key, Some(9));
        assert_eq!(features.mode, Some(0));
        assert_eq!(features.popularity, Some(64.0));
        assert_eq!(features.artist_id.as_deref(), Some("artist-1"));
    }

    #[test]
    fn missing_and_invalid_fields_are_unknown() {
        let features = extract(&record(json!({
            "track_tempo": null,
            "track_energy": "loud",
            "track_danceability": true,
            "track_valence": [0.5],
            "track_key": 4.5,
            "track_mode": {"major": true},
            "artist_id": "",
        })));

        assert_eq!(features, FeatureVector::default());
    }

    #[test]
    fn empty_record_is_all_unknown() {
        assert_eq!(extract(&RawRecord::new()), FeatureVector::default());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let features = extract(&record(json!({
            "track_tempo": " 120.25 ",
            "track_key": "11",
            "track_loudness": "-7",
        })));

        assert_eq!(features.tempo, Some(120.25));
        assert_eq!(features.key, Some(11));
        assert_eq!(features.loudness, Some(-7.0));
    }

    #[test]
    fn out_of_range_key_is_unknown() {
        assert_eq!(extract(&record(json!({"track_key": -1}))).key, None);
        assert_eq!(extract(&record(json!({"track_key": 12}))).key, None);
        assert_eq!(extract(&record(json!({"track_key": 0}))).key, Some(0));
    }

    #[test]
    fn unit_features_are_not_clamped() {
        let features = extract(&record(json!({"track_energy": 1.7, "track_valence": -0.2})));
        assert_eq!(features.energy, Some(1.7));
        assert_eq!(features.valence, Some(-0.2));
    }

    #[test]
    fn popularity_uses_first_present_field() {
        let both = extract(&record(json!({
            "track_popularity": 30,
            "track_spotify_popularity": 90,
        })));
        assert_eq!(both.popularity, Some(30.0));

        let fallback = extract(&record(json!({
            "track_popularity": null,
            "track_spotify_popularity": 90,
        })));
        assert_eq!(fallback.popularity, Some(90.0));

        let invalid_primary = extract(&record(json!({
            "track_popularity": "n/a",
            "track_spotify_popularity": 12,
        })));
        assert_eq!(invalid_primary.popularity, Some(12.0));

        assert_eq!(extract(&RawRecord::new()).popularity, None);
    }

    #[test]
    fn numeric_artist_ids_are_rendered_as_text() {
        let features = extract(&record(json!({"artist_id": 42})));
        assert_eq!(features.artist_id.as_deref(), Some("42"));
    }

    #[test]
    fn resolve_or_default_only_replaces_unknown() {
        assert_eq!(resolve_or_default(None, 0.5), 0.5);
        assert_eq!(resolve_or_default(Some(0.0), 0.5), 0.0);
        assert_eq!(resolve_or_default(Some(-12.0), -10.0), -12.0);
    }

    #[test]
    fn track_id_reads_identifier() {
        assert_eq!(
            track_id(&record(json!({"track_id": "t-1"}))).as_deref(),
            Some("t-1")
        );
        assert_eq!(track_id(&RawRecord::new()), None);
    }
}
