mod file_config;

pub use file_config::FileConfig;

use crate::mix::MixSettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_READ_POOL_SIZE: usize = 4;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub read_pool_size: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::default(),
            frontend_dir_path: None,
            read_pool_size: DEFAULT_READ_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub read_pool_size: usize,
    pub mix: MixSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = match file.logging_level {
            Some(level) => match parse_logging_level(&level) {
                Some(level) => level,
                None => bail!("Invalid logging_level in config file: {}", level),
            },
            None => cli.logging_level.clone(),
        };

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let read_pool_size = file.read_pool_size.unwrap_or(cli.read_pool_size);
        if read_pool_size == 0 {
            bail!("read_pool_size must be at least 1");
        }

        let mix = file.mix.unwrap_or_default();
        validate_mix_settings(&mix)?;

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            read_pool_size,
            mix,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }
}

/// Rejects settings the ranking cannot work with: the scales divide feature
/// differences and the popularity range is used as a divisor too.
fn validate_mix_settings(mix: &MixSettings) -> Result<()> {
    let scoring = &mix.scoring;
    if !(mix.tempo_window_bpm.is_finite() && mix.tempo_window_bpm >= 0.0) {
        bail!("mix.tempo_window_bpm must be a non-negative number");
    }
    if mix.max_pool_size == 0 {
        bail!("mix.max_pool_size must be at least 1");
    }
    if mix.max_top_n == 0 || mix.default_top_n == 0 || mix.default_top_n > mix.max_top_n {
        bail!(
            "mix.default_top_n ({}) must be between 1 and mix.max_top_n ({})",
            mix.default_top_n,
            mix.max_top_n
        );
    }
    if !(scoring.tempo_scale_bpm > 0.0) {
        bail!("mix.tempo_scale_bpm must be positive");
    }
    if !(scoring.loudness_scale_db > 0.0) {
        bail!("mix.loudness_scale_db must be positive");
    }
    if !(scoring.popularity_min.is_finite()
        && scoring.popularity_max.is_finite()
        && scoring.popularity_max > scoring.popularity_min)
    {
        bail!("mix.popularity_max must be greater than mix.popularity_min");
    }
    if !(0.0..=1.0).contains(&scoring.popularity_fallback) {
        bail!("mix.popularity_fallback must be between 0 and 1");
    }
    if !scoring.neutral_unit_value.is_finite() {
        bail!("mix.neutral_unit_value must be a finite number");
    }
    if !scoring.neutral_loudness_db.is_finite() {
        bail!("mix.neutral_loudness_db must be a finite number");
    }
    ensure_non_negative("mix.same_artist_penalty", scoring.same_artist_penalty)?;

    let weights = &scoring.weights;
    for (name, value) in [
        ("tempo", weights.tempo),
        ("energy", weights.energy),
        ("danceability", weights.danceability),
        ("valence", weights.valence),
        ("loudness", weights.loudness),
        ("tonal", weights.tonal),
        ("popularity", weights.popularity),
        ("same_artist", weights.same_artist),
    ] {
        ensure_non_negative(&format!("mix.weights.{}", name), value)?;
    }

    let tonal = &scoring.tonal;
    for (name, value) in [
        ("unknown_key", tonal.unknown_key),
        ("same_key_same_mode", tonal.same_key_same_mode),
        ("same_key_mode_change", tonal.same_key_mode_change),
        ("semitone_same_mode", tonal.semitone_same_mode),
        ("whole_tone_same_mode", tonal.whole_tone_same_mode),
        ("fourth_fifth_same_mode", tonal.fourth_fifth_same_mode),
        ("fourth_fifth_mode_change", tonal.fourth_fifth_mode_change),
        ("other", tonal.other),
    ] {
        ensure_non_negative(&format!("mix.tonal.{}", name), value)?;
    }
    Ok(())
}

/// Every term of the score is a non-negative factor times a non-negative
/// penalty, so the total stays finite and `>= 0`.
fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        bail!("{} must be a finite, non-negative number (got {})", name, value);
    }
    Ok(())
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
