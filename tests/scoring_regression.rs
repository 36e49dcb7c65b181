//! Scoring Regression Tests
//!
//! Reference scenarios and end-to-end properties of the scoring engine:
//! known values for curves and composition, veto dominance, history
//! requirements and batch behaviour.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, Duration, TimeZone, Utc};

use amphibian_migration::config::{presets, Composition, LunarConfig, LunarMode, OverrideConfig};
use amphibian_migration::engine::{apply_overrides, combine, OverrideInputs};
use amphibian_migration::normalizer::linear_ramp;
use amphibian_migration::provider::{FetchRequest, JsonLinesProvider, Location, WeatherProvider};
use amphibian_migration::types::FeatureSource;
use amphibian_migration::{
    clamp_score, lunar, score, score_series, OverrideKind, ScoringEngine, ScoringError,
    WeatherSample, WeatherSeries,
};

// ============================================================================
// Helpers
// ============================================================================

fn march_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap()
}

/// Constant hourly weather for `hours` hours starting at `start`.
fn constant_series(
    start: DateTime<Utc>,
    hours: i64,
    air: f64,
    apparent: Option<f64>,
    rain: f64,
    humidity: f64,
) -> WeatherSeries {
    let samples = (0..hours)
        .map(|h| WeatherSample {
            timestamp: start + Duration::hours(h),
            air_temperature: air,
            apparent_temperature: apparent,
            precipitation: rain,
            relative_humidity: humidity,
        })
        .collect();
    WeatherSeries::new(samples).unwrap()
}

fn last_hour(series: &WeatherSeries) -> DateTime<Utc> {
    series.last_timestamp().unwrap()
}

// ============================================================================
// Reference Scenarios
// ============================================================================

#[test]
fn linear_ramp_reference_points() {
    assert!((linear_ramp(4.0, 4.0, 8.0, 0.1) - 0.1).abs() < 1e-12);
    assert!((linear_ramp(8.0, 4.0, 8.0, 0.1) - 1.0).abs() < 1e-12);
    assert!((linear_ramp(6.0, 4.0, 8.0, 0.1) - 0.55).abs() < 1e-12);
}

#[test]
fn multiplicative_rain_shortfall_scores_one() {
    let factors = [
        ("rain_8h", 0.1),
        ("rain_2h", 0.1),
        ("temp_8h", 1.0),
        ("felt_2h", 1.0),
    ];
    let base = combine(&Composition::Multiplicative, &factors, 1.0, 1.0);
    assert!((base - 0.01).abs() < 1e-12);
    assert_eq!(clamp_score(base * 100.0), 1);
}

#[test]
fn additive_weighted_sum_scores_fifty_nine() {
    let weights: BTreeMap<String, f64> = [
        ("season", 0.15),
        ("temp_8h", 0.25),
        ("felt_2h", 0.20),
        ("rain_8h", 0.15),
        ("rain_current", 0.15),
        ("lunar", 0.10),
    ]
    .into_iter()
    .map(|(k, w)| (k.to_string(), w))
    .collect();
    let factors = [
        ("temp_8h", 0.6),
        ("felt_2h", 0.5),
        ("rain_8h", 0.4),
        ("rain_current", 0.3),
    ];
    let base = combine(&Composition::Additive { weights }, &factors, 0.9, 1.0);
    assert!((base - 0.59).abs() < 1e-9);
    assert_eq!(clamp_score(base * 100.0), 59);
}

#[test]
fn hard_veto_zeroes_a_high_base_score() {
    let inputs = OverrideInputs {
        felt_temperature: 0.5,
        current_precipitation: 2.0,
        window_precipitation: None,
        relative_humidity: 95.0,
    };
    let (adjusted, fired) = apply_overrides(85.0, &inputs, &OverrideConfig::default());
    assert_eq!(clamp_score(adjusted), 0);
    assert_eq!(fired, vec![OverrideKind::HardVeto]);
}

#[test]
fn short_history_for_long_window_is_an_error() {
    let mut config = presets::weighted();
    config.factors[0].source = FeatureSource::TemperatureMean { hours: 72 };

    let series = constant_series(march_start(), 10, 10.0, None, 1.0, 90.0);
    let result = score(&series, last_hour(&series), &config);
    match result {
        Err(ScoringError::InsufficientHistory {
            window_hours,
            first_available,
            ..
        }) => {
            assert_eq!(window_hours, 72);
            assert_eq!(first_available, Some(march_start()));
        }
        other => panic!("expected InsufficientHistory, got {other:?}"),
    }
}

#[test]
fn evaluation_past_the_series_end_is_refused() {
    let config = presets::weighted();
    let series = constant_series(march_start(), 24, 10.0, None, 1.0, 90.0);
    let t = march_start() + Duration::days(10);
    match score(&series, t, &config) {
        Err(ScoringError::StaleCurrentSample {
            latest_available, ..
        }) => assert_eq!(latest_available, last_hour(&series)),
        other => panic!("expected StaleCurrentSample, got {other:?}"),
    }
}

#[test]
fn rain_of_the_current_hour_counts_once_between_hours() {
    let config = presets::weighted();
    let engine = ScoringEngine::new(&config).unwrap().with_breakdown(true);
    let samples = (0..24)
        .map(|h| WeatherSample {
            timestamp: march_start() + Duration::hours(h),
            air_temperature: 10.0,
            apparent_temperature: None,
            precipitation: if h == 20 { 3.0 } else { 0.0 },
            relative_humidity: 90.0,
        })
        .collect();
    let series = WeatherSeries::new(samples).unwrap();
    let t = march_start() + Duration::hours(20) + Duration::minutes(30);

    let breakdown = engine.score(&series, t).unwrap().breakdown.unwrap();
    let input = |name: &str| {
        breakdown
            .factors
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.input)
            .unwrap()
    };
    assert_eq!(input("rain_current"), 3.0);
    assert_eq!(input("rain_8h"), 0.0);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn scores_stay_within_bounds() {
    for config in [presets::weighted(), presets::conjunctive()] {
        let engine = ScoringEngine::new(&config).unwrap();
        for air in [-15.0, -2.0, 0.5, 4.0, 9.0, 14.0, 22.0, 35.0] {
            for rain in [0.0, 0.05, 0.4, 1.5, 6.0, 40.0] {
                for humidity in [20.0, 65.0, 100.0] {
                    let series = constant_series(march_start(), 24, air, None, rain, humidity);
                    let result = engine.score(&series, last_hour(&series)).unwrap();
                    assert!(result.score <= 100, "{}: {result:?}", config.model.name);
                    assert!(result.base_score.is_finite());
                }
            }
        }
    }
}

#[test]
fn identical_inputs_give_identical_results() {
    let config = presets::conjunctive();
    let engine = ScoringEngine::new(&config).unwrap().with_breakdown(true);
    let series = constant_series(march_start(), 30, 9.5, Some(8.0), 0.7, 88.0);
    let t = last_hour(&series);
    assert_eq!(engine.score(&series, t).unwrap(), engine.score(&series, t).unwrap());
}

#[test]
fn veto_wins_even_when_every_other_factor_is_maxed() {
    // Warm air and heavy rain, but wind chill pins the felt temperature at 0 °C
    let config = presets::weighted();
    let engine = ScoringEngine::new(&config).unwrap().with_breakdown(true);
    let series = constant_series(march_start(), 24, 20.0, Some(0.0), 5.0, 98.0);

    let result = engine.score(&series, last_hour(&series)).unwrap();
    assert_eq!(result.score, 0);
    assert!(result.base_score >= 70.0, "base was {}", result.base_score);

    let breakdown = result.breakdown.unwrap();
    assert_eq!(breakdown.overrides, vec![OverrideKind::HardVeto]);
    for name in ["temp_8h", "rain_8h", "rain_current"] {
        let factor = breakdown.factors.iter().find(|f| f.name == name).unwrap();
        assert_eq!(factor.factor, 1.0, "{name} should be saturated");
    }
}

#[test]
fn off_season_month_uses_default_weight() {
    let config = presets::weighted();
    let engine = ScoringEngine::new(&config).unwrap().with_breakdown(true);
    let july = Utc.with_ymd_and_hms(2025, 7, 10, 0, 0, 0).unwrap();
    let series = constant_series(july, 24, 12.0, None, 1.0, 90.0);

    let result = engine.score(&series, last_hour(&series)).unwrap();
    let breakdown = result.breakdown.unwrap();
    assert_eq!(breakdown.seasonal_weight, config.seasonal.default_weight);

    let conjunctive = presets::conjunctive();
    assert_eq!(conjunctive.seasonal.weight_for(7), 0.05);
    assert_eq!(conjunctive.seasonal.index().weight_for(12), 0.05);
}

#[test]
fn lunar_modulation_repeats_every_synodic_month() {
    let config = LunarConfig {
        mode: LunarMode::Continuous,
        boost: 0.2,
        baseline: 1.0,
        ..LunarConfig::default()
    };
    let period = Duration::milliseconds(2_551_442_976);
    let mut t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    for _ in 0..40 {
        let now = lunar::reading(t, &config).modulation;
        let later = lunar::reading(t + period, &config).modulation;
        assert!((now - later).abs() < 1e-6, "{t}: {now} vs {later}");
        t += Duration::hours(19);
    }
}

#[test]
fn batch_scoring_keeps_order_and_isolates_failures() {
    let config = presets::weighted();
    let series = constant_series(march_start(), 24, 10.0, None, 1.0, 90.0);
    let timestamps = vec![
        march_start() + Duration::hours(23),
        march_start() + Duration::hours(2),
        march_start() + Duration::hours(12),
    ];

    let results = score_series(&series, &timestamps, &config).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().timestamp, timestamps[0]);
    assert!(matches!(
        results[1],
        Err(ScoringError::InsufficientHistory { window_hours: 8, .. })
    ));
    assert_eq!(results[2].as_ref().unwrap().timestamp, timestamps[2]);
}

#[test]
fn invalid_config_fails_before_any_scoring() {
    let mut config = presets::weighted();
    config.seasonal.months.clear();
    let series = constant_series(march_start(), 24, 10.0, None, 1.0, 90.0);
    assert!(matches!(
        score_series(&series, &[last_hour(&series)], &config),
        Err(ScoringError::InvalidConfig(_))
    ));
}

// ============================================================================
// End to End
// ============================================================================

#[test]
fn jsonl_file_scores_like_the_in_memory_series() {
    let series = constant_series(march_start(), 48, 10.0, Some(9.0), 0.8, 92.0);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for sample in series.samples() {
        writeln!(file, "{}", serde_json::to_string(sample).unwrap()).unwrap();
    }
    writeln!(file, "not json").unwrap();

    let config = presets::weighted();
    let engine = ScoringEngine::new(&config).unwrap();
    let t = last_hour(&series);

    let request = FetchRequest::for_evaluations(
        Location::new(51.0, 7.0).unwrap(),
        &[t],
        config.required_history_hours(),
    )
    .unwrap();
    let fetched = JsonLinesProvider::new(file.path()).fetch(&request).unwrap();
    assert_eq!(fetched.len(), 10);

    let from_file = engine.score(&fetched, t).unwrap();
    let in_memory = engine.score(&series, t).unwrap();
    assert_eq!(from_file, in_memory);
    assert!(from_file.score > 0);
}
