//! Amphibian Migration: weather-driven migration likelihood scoring
//!
//! Turns an hourly weather history and an evaluation instant into a
//! calibrated 0-100 score for amphibian road-crossing migration.
//!
//! ## Architecture
//!
//! - **Feature Extractor**: lookback-window means and sums over the series
//! - **Normalizer Library**: response curves (ramp, gaussian, beta, log, drizzle, step)
//! - **Lunar Calculator**: synodic phase and its modulation factor
//! - **Seasonal Table**: month → importance weight
//! - **Combiner**: additive or multiplicative composition plus override rules
//! - **Provider Seam**: file-backed weather sources behind a trait

pub mod config;
pub mod engine;
pub mod features;
pub mod lunar;
pub mod normalizer;
pub mod provider;
pub mod seasonal;
pub mod types;

// Re-export model configuration
pub use config::{ConfigError, ModelConfig, ModelPreset};

// Re-export the scoring surface
pub use engine::{clamp_score, nightly_timestamps, score, score_series, ScoringEngine, ScoringError};

// Re-export commonly used types
pub use types::{
    FeatureSet, FeatureSource, LookbackWindow, OverrideKind, ScoreBreakdown, ScoreResult,
    SeriesError, WeatherSample, WeatherSeries,
};

// Re-export providers
pub use provider::{CsvProvider, FetchRequest, JsonLinesProvider, Location, WeatherProvider};
