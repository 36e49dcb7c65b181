//! Scoring engine
//!
//! Pipeline per evaluation instant:
//! 1. Feature extraction over the configured lookback windows
//! 2. Factor normalization through each factor's response curve
//! 3. Seasonal weight and lunar modulation
//! 4. Composition (additive or multiplicative) scaled to 0-100
//! 5. Override rules (soft cold, dryness, hard veto)
//! 6. Clamp and round to an integer score
//!
//! The engine borrows its [`ModelConfig`] and holds no mutable state, so one
//! engine can score any number of timestamps concurrently.

mod combiner;
mod overrides;

pub use combiner::combine;
pub use overrides::{apply_overrides, OverrideInputs};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rayon::prelude::*;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use crate::config::defaults::{SCORE_MAX, SCORE_MIN, SCORE_SCALE};
use crate::config::{ConfigError, CurveConfig, ModelConfig};
use crate::features::extract_features;
use crate::lunar;
use crate::seasonal::SeasonalIndex;
use crate::types::{
    FactorContribution, FeatureSet, FeatureSource, LookbackWindow, ScoreBreakdown, ScoreResult,
    WeatherSeries,
};

/// Errors surfaced by a scoring call.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error(
        "Insufficient history for {window_hours}h window: need samples from {requested_start}, first available {}",
        describe_first(.first_available)
    )]
    InsufficientHistory {
        window_hours: u32,
        requested_start: DateTime<Utc>,
        first_available: Option<DateTime<Utc>>,
    },

    #[error(
        "No current weather for {timestamp}: latest sample is {latest_available}, more than {max_age_hours}h earlier"
    )]
    StaleCurrentSample {
        timestamp: DateTime<Utc>,
        latest_available: DateTime<Utc>,
        max_age_hours: i64,
    },

    #[error("Incomplete {window_hours}h window: found {found} of {expected} samples")]
    IncompleteWindow {
        window_hours: u32,
        found: usize,
        expected: usize,
    },

    #[error("Feature '{feature}' was not extracted for this evaluation")]
    MissingFeature { feature: String },

    #[error("Invalid model config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

fn describe_first(first: &Option<DateTime<Utc>>) -> String {
    match first {
        Some(t) => t.to_rfc3339(),
        None => "none (empty series)".to_string(),
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Validated, ready-to-run scoring model.
#[derive(Debug, Clone)]
pub struct ScoringEngine<'a> {
    config: &'a ModelConfig,
    windows: BTreeSet<LookbackWindow>,
    seasonal: SeasonalIndex,
    breakdown: bool,
}

impl<'a> ScoringEngine<'a> {
    /// Validate `config` once and precompute the lookups every call needs.
    pub fn new(config: &'a ModelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            windows: config.required_windows(),
            seasonal: config.seasonal.index(),
            breakdown: false,
        })
    }

    /// Attach a per-factor [`ScoreBreakdown`] to every result.
    pub fn with_breakdown(mut self, enabled: bool) -> Self {
        self.breakdown = enabled;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        self.config
    }

    /// Lookback windows extracted for every evaluation.
    pub fn windows(&self) -> &BTreeSet<LookbackWindow> {
        &self.windows
    }

    /// Score one evaluation instant.
    pub fn score(
        &self,
        series: &WeatherSeries,
        t: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringError> {
        let features = extract_features(series, t, &self.windows, &self.config.features)?;
        self.score_features(&features)
    }

    /// Score many instants in parallel. Results keep the input order.
    pub fn score_series(
        &self,
        series: &WeatherSeries,
        timestamps: &[DateTime<Utc>],
    ) -> Vec<Result<ScoreResult, ScoringError>> {
        debug!(count = timestamps.len(), model = %self.config.model.name, "Scoring batch");
        timestamps
            .par_iter()
            .map(|&t| self.score(series, t))
            .collect()
    }

    /// Score an already extracted feature set.
    pub fn score_features(&self, features: &FeatureSet) -> Result<ScoreResult, ScoringError> {
        let cfg = self.config;

        // Normalize every factor
        let mut contributions = Vec::with_capacity(cfg.factors.len());
        for factor in &cfg.factors {
            let input = resolve(features, factor.source)?;
            let companion = match &factor.curve {
                CurveConfig::LogSaturation {
                    recency: Some(boost),
                    ..
                } => Some(resolve(features, boost.source)?),
                _ => None,
            };
            contributions.push(FactorContribution {
                name: factor.name.clone(),
                input,
                factor: factor.curve.evaluate(input, companion),
                weight: cfg.composition.weight_of(&factor.name),
            });
        }

        let seasonal_weight = self.seasonal.weight_for(features.month);
        let lunar = lunar::reading(features.timestamp, &cfg.lunar);

        let pairs: Vec<(&str, f64)> = contributions
            .iter()
            .map(|c| (c.name.as_str(), c.factor))
            .collect();
        let base = combine(&cfg.composition, &pairs, seasonal_weight, lunar.modulation);
        let base_score = base * SCORE_SCALE;

        let inputs = OverrideInputs {
            felt_temperature: resolve(features, cfg.overrides.felt_source)?,
            current_precipitation: features.current_precipitation,
            window_precipitation: match &cfg.overrides.dryness {
                Some(dry) => Some(resolve(
                    features,
                    FeatureSource::PrecipitationSum {
                        hours: dry.window_hours,
                    },
                )?),
                None => None,
            },
            relative_humidity: features.current_relative_humidity,
        };
        let (adjusted, fired) = apply_overrides(base_score, &inputs, &cfg.overrides);
        let score = clamp_score(adjusted);

        debug!(
            timestamp = %features.timestamp,
            base_score,
            score,
            overrides = ?fired,
            "Scored evaluation"
        );

        let breakdown = self.breakdown.then(|| ScoreBreakdown {
            factors: contributions,
            seasonal_weight,
            lunar,
            overrides: fired,
            partial_windows: features.partial_windows(),
            current_is_exact: features.current_is_exact,
        });

        Ok(ScoreResult {
            timestamp: features.timestamp,
            score,
            base_score,
            breakdown,
        })
    }
}

fn resolve(features: &FeatureSet, source: FeatureSource) -> Result<f64, ScoringError> {
    features
        .value(source)
        .ok_or_else(|| ScoringError::MissingFeature {
            feature: source.label(),
        })
}

// ============================================================================
// Free Functions
// ============================================================================

/// Validate `config` and score one instant.
pub fn score(
    series: &WeatherSeries,
    t: DateTime<Utc>,
    config: &ModelConfig,
) -> Result<ScoreResult, ScoringError> {
    ScoringEngine::new(config)?.score(series, t)
}

/// Validate `config` and score many instants. The outer error is a config
/// failure; inner errors are per timestamp.
pub fn score_series(
    series: &WeatherSeries,
    timestamps: &[DateTime<Utc>],
    config: &ModelConfig,
) -> Result<Vec<Result<ScoreResult, ScoringError>>, ScoringError> {
    Ok(ScoringEngine::new(config)?.score_series(series, timestamps))
}

/// Bound a 0-100 scale score and round it to an integer. NaN maps to 0.
pub fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.clamp(SCORE_MIN, SCORE_MAX).round() as u8
}

/// Evaluation instants at `hour`:00 UTC for `nights` consecutive days.
///
/// Returns an empty list when `hour` is not a valid hour of day.
pub fn nightly_timestamps(first_night: NaiveDate, nights: u32, hour: u32) -> Vec<DateTime<Utc>> {
    let Some(start) = first_night.and_hms_opt(hour, 0, 0) else {
        return Vec::new();
    };
    let start = start.and_utc();
    (0..nights)
        .map(|n| start + Duration::days(i64::from(n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets;
    use crate::types::{OverrideKind, WeatherSample};
    use chrono::TimeZone;

    fn series(hours: i64, temp: f64, rain: f64, humidity: f64) -> (WeatherSeries, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let samples = (0..hours)
            .map(|h| WeatherSample {
                timestamp: start + Duration::hours(h),
                air_temperature: temp,
                apparent_temperature: None,
                precipitation: rain,
                relative_humidity: humidity,
            })
            .collect();
        (
            WeatherSeries::new(samples).unwrap(),
            start + Duration::hours(hours - 1),
        )
    }

    #[test]
    fn test_clamp_score_bounds_and_rounds() {
        assert_eq!(clamp_score(-12.0), 0);
        assert_eq!(clamp_score(140.0), 100);
        assert_eq!(clamp_score(58.999999999), 59);
        assert_eq!(clamp_score(1.0000000000000002), 1);
        assert_eq!(clamp_score(f64::NAN), 0);
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = presets::weighted();
        config.seasonal.months.clear();
        assert!(ScoringEngine::new(&config).is_err());
        let (s, t) = series(24, 10.0, 1.0, 90.0);
        assert!(matches!(
            score(&s, t, &config),
            Err(ScoringError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_breakdown_lists_every_factor() {
        let config = presets::conjunctive();
        let engine = ScoringEngine::new(&config).unwrap().with_breakdown(true);
        let (s, t) = series(24, 10.0, 0.8, 90.0);
        let result = engine.score(&s, t).unwrap();
        let breakdown = result.breakdown.unwrap();
        let names: Vec<&str> = breakdown.factors.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["felt_2h", "temp_8h", "rain_8h", "rain_current", "humidity"]);
        assert!(breakdown.factors.iter().all(|f| f.weight.is_none()));
        assert_eq!(breakdown.seasonal_weight, 1.0);
        assert!(breakdown.current_is_exact);
    }

    #[test]
    fn test_breakdown_off_by_default() {
        let config = presets::weighted();
        let engine = ScoringEngine::new(&config).unwrap();
        let (s, t) = series(24, 10.0, 1.0, 90.0);
        assert!(engine.score(&s, t).unwrap().breakdown.is_none());
    }

    #[test]
    fn test_cold_night_is_vetoed() {
        let config = presets::conjunctive();
        let engine = ScoringEngine::new(&config).unwrap().with_breakdown(true);
        let (s, t) = series(24, 0.0, 1.0, 95.0);
        let result = engine.score(&s, t).unwrap();
        assert_eq!(result.score, 0);
        assert!(result
            .breakdown
            .unwrap()
            .overrides
            .contains(&OverrideKind::HardVeto));
    }

    #[test]
    fn test_score_series_preserves_order() {
        let config = presets::weighted();
        let engine = ScoringEngine::new(&config).unwrap();
        let (s, last) = series(48, 10.0, 1.0, 90.0);
        let timestamps: Vec<DateTime<Utc>> =
            (0..10).map(|i| last - Duration::hours(i * 3)).collect();
        let results = engine.score_series(&s, &timestamps);
        assert_eq!(results.len(), timestamps.len());
        for (result, t) in results.iter().zip(&timestamps) {
            assert_eq!(result.as_ref().unwrap().timestamp, *t);
        }
    }

    #[test]
    fn test_nightly_timestamps() {
        let first = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        let nights = nightly_timestamps(first, 3, 21);
        assert_eq!(nights.len(), 3);
        assert_eq!(nights[0], Utc.with_ymd_and_hms(2025, 3, 30, 21, 0, 0).unwrap());
        assert_eq!(nights[2], Utc.with_ymd_and_hms(2025, 4, 1, 21, 0, 0).unwrap());
        assert!(nightly_timestamps(first, 3, 24).is_empty());
    }
}
