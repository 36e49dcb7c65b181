//! Feature extractor
//!
//! The current hour is the latest sample at or before the evaluation
//! instant `t`, and it must be no older than one sample cadence. Lookback
//! windows are half-open `[c - span, c)` where `c` is the current sample's
//! timestamp, so each window ends exactly where the current hour begins.
//! Windows are aggregated as means for temperature-like quantities and sums
//! for precipitation. The current sample is reported separately and never
//! counted in a window.
//!
//! Missing hours are not interpolated. A window that holds fewer samples
//! than its span is flagged partial and aggregated over what is present.

use chrono::{DateTime, Datelike, Duration, Utc};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::defaults::SAMPLE_CADENCE_HOURS;
use crate::config::FeatureConfig;
use crate::engine::ScoringError;
use crate::types::{FeatureSet, LookbackWindow, WeatherSample, WeatherSeries, WindowAggregate};

/// Build the [`FeatureSet`] for evaluation instant `t`.
///
/// Fails with `InsufficientHistory` when any window starts before the first
/// sample or no sample exists at or before `t`, and with `StaleCurrentSample`
/// when the latest sample is more than one cadence older than `t`. Fails with
/// `IncompleteWindow` only when `policy` rejects partial windows of that span.
pub fn extract_features(
    series: &WeatherSeries,
    t: DateTime<Utc>,
    windows: &BTreeSet<LookbackWindow>,
    policy: &FeatureConfig,
) -> Result<FeatureSet, ScoringError> {
    let longest = windows.iter().next_back().copied();

    let Some(first_available) = series.first_timestamp() else {
        return Err(ScoringError::InsufficientHistory {
            window_hours: longest.map_or(0, |w| w.hours),
            requested_start: longest.map_or(t, |w| t - w.span()),
            first_available: None,
        });
    };

    let current = series
        .latest_at_or_before(t)
        .ok_or(ScoringError::InsufficientHistory {
            window_hours: 0,
            requested_start: t,
            first_available: Some(first_available),
        })?;

    let max_age = Duration::hours(SAMPLE_CADENCE_HOURS);
    if t - current.timestamp > max_age {
        return Err(ScoringError::StaleCurrentSample {
            timestamp: t,
            latest_available: current.timestamp,
            max_age_hours: SAMPLE_CADENCE_HOURS,
        });
    }
    let anchor = current.timestamp;

    // Longest first so the error names the window that needs the most history
    if let Some(window) = longest {
        let start = anchor - window.span();
        if start < first_available {
            return Err(ScoringError::InsufficientHistory {
                window_hours: window.hours,
                requested_start: start,
                first_available: Some(first_available),
            });
        }
    }

    let mut aggregates = BTreeMap::new();
    for &window in windows {
        let aggregate = aggregate_window(series.range(anchor - window.span(), anchor), window, current);
        if aggregate.is_partial() {
            if let Some(limit) = policy.reject_partial_from_hours {
                if window.hours >= limit {
                    return Err(ScoringError::IncompleteWindow {
                        window_hours: window.hours,
                        found: aggregate.found,
                        expected: aggregate.expected,
                    });
                }
            }
        }
        aggregates.insert(window.hours, aggregate);
    }

    Ok(FeatureSet {
        timestamp: t,
        month: t.month(),
        current_air_temperature: current.air_temperature,
        current_apparent_temperature: current.felt_temperature(),
        current_precipitation: current.precipitation,
        current_relative_humidity: current.relative_humidity,
        current_is_exact: current.timestamp == t,
        windows: aggregates,
    })
}

/// Aggregate one window. An empty window (data gap) falls back to the
/// current sample for its means and sums to zero precipitation.
fn aggregate_window(
    samples: &[WeatherSample],
    window: LookbackWindow,
    current: &WeatherSample,
) -> WindowAggregate {
    let expected = window.expected_samples();
    if samples.is_empty() {
        return WindowAggregate {
            window,
            expected,
            found: 0,
            mean_air_temperature: current.air_temperature,
            mean_apparent_temperature: current.felt_temperature(),
            mean_relative_humidity: current.relative_humidity,
            precipitation_sum: 0.0,
        };
    }

    WindowAggregate {
        window,
        expected,
        found: samples.len(),
        mean_air_temperature: samples.iter().map(|s| s.air_temperature).mean(),
        mean_apparent_temperature: samples.iter().map(WeatherSample::felt_temperature).mean(),
        mean_relative_humidity: samples.iter().map(|s| s.relative_humidity).mean(),
        precipitation_sum: samples.iter().map(|s| s.precipitation).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
    }

    /// `hours` hourly samples; temperature = hour index, 1 mm rain each hour.
    fn hourly(hours: i64) -> WeatherSeries {
        let samples = (0..hours)
            .map(|h| WeatherSample {
                timestamp: start() + Duration::hours(h),
                air_temperature: h as f64,
                apparent_temperature: Some(h as f64 - 1.0),
                precipitation: 1.0,
                relative_humidity: 80.0,
            })
            .collect();
        WeatherSeries::new(samples).unwrap()
    }

    fn windows(hours: &[u32]) -> BTreeSet<LookbackWindow> {
        hours.iter().map(|&h| LookbackWindow::hours(h)).collect()
    }

    #[test]
    fn test_window_excludes_current_hour() {
        let series = hourly(24);
        let t = start() + Duration::hours(20);
        let fs = extract_features(&series, t, &windows(&[2, 8]), &FeatureConfig::default()).unwrap();

        let w2 = fs.window(LookbackWindow::hours(2)).unwrap();
        assert_eq!(w2.found, 2);
        // Hours 18 and 19
        assert!((w2.mean_air_temperature - 18.5).abs() < 1e-9);
        assert!((w2.mean_apparent_temperature - 17.5).abs() < 1e-9);
        assert!((w2.precipitation_sum - 2.0).abs() < 1e-9);

        assert_eq!(fs.current_air_temperature, 20.0);
        assert!(fs.current_is_exact);
        assert_eq!(fs.month, 3);
        assert!(!fs.has_partial_window());
    }

    #[test]
    fn test_insufficient_history_names_longest_window() {
        let series = hourly(10);
        let t = start() + Duration::hours(9);
        let err = extract_features(&series, t, &windows(&[2, 72]), &FeatureConfig::default())
            .unwrap_err();
        match err {
            ScoringError::InsufficientHistory { window_hours, .. } => assert_eq!(window_hours, 72),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_window_may_start_exactly_at_first_sample() {
        let series = hourly(10);
        let t = start() + Duration::hours(8);
        let fs = extract_features(&series, t, &windows(&[8]), &FeatureConfig::default()).unwrap();
        assert_eq!(fs.window(LookbackWindow::hours(8)).unwrap().found, 8);
    }

    #[test]
    fn test_gap_marks_window_partial() {
        let mut samples: Vec<WeatherSample> = hourly(24).samples().to_vec();
        samples.retain(|s| s.timestamp != start() + Duration::hours(15));
        let series = WeatherSeries::new(samples).unwrap();
        let t = start() + Duration::hours(20);
        let fs = extract_features(&series, t, &windows(&[2, 8]), &FeatureConfig::default()).unwrap();

        let w8 = fs.window(LookbackWindow::hours(8)).unwrap();
        assert_eq!((w8.found, w8.expected), (7, 8));
        assert!(w8.is_partial());
        assert_eq!(fs.partial_windows(), vec![LookbackWindow::hours(8)]);
    }

    #[test]
    fn test_policy_rejects_long_partial_windows_only() {
        let mut samples: Vec<WeatherSample> = hourly(24).samples().to_vec();
        samples.retain(|s| s.timestamp != start() + Duration::hours(15));
        let series = WeatherSeries::new(samples).unwrap();
        let t = start() + Duration::hours(20);

        let strict = FeatureConfig {
            reject_partial_from_hours: Some(8),
        };
        let err = extract_features(&series, t, &windows(&[2, 8]), &strict).unwrap_err();
        assert!(matches!(err, ScoringError::IncompleteWindow { window_hours: 8, found: 7, expected: 8 }));

        let lenient = FeatureConfig {
            reject_partial_from_hours: Some(12),
        };
        assert!(extract_features(&series, t, &windows(&[2, 8]), &lenient).is_ok());
    }

    #[test]
    fn test_empty_window_falls_back_to_current_sample() {
        let samples = vec![
            WeatherSample {
                timestamp: start(),
                air_temperature: 5.0,
                apparent_temperature: None,
                precipitation: 0.0,
                relative_humidity: 70.0,
            },
            WeatherSample {
                timestamp: start() + Duration::hours(6),
                air_temperature: 9.0,
                apparent_temperature: None,
                precipitation: 0.4,
                relative_humidity: 90.0,
            },
        ];
        let series = WeatherSeries::new(samples).unwrap();
        let t = start() + Duration::hours(6);
        let fs = extract_features(&series, t, &windows(&[2]), &FeatureConfig::default()).unwrap();
        let w2 = fs.window(LookbackWindow::hours(2)).unwrap();
        assert_eq!(w2.found, 0);
        assert_eq!(w2.mean_air_temperature, 9.0);
        assert_eq!(w2.precipitation_sum, 0.0);
    }

    #[test]
    fn test_current_falls_back_to_latest_earlier_sample() {
        let series = hourly(24);
        let t = start() + Duration::hours(20) + Duration::minutes(30);
        let fs = extract_features(&series, t, &windows(&[2]), &FeatureConfig::default()).unwrap();
        assert!(!fs.current_is_exact);
        assert_eq!(fs.current_air_temperature, 20.0);
        // Window ends where the 20:00 current hour begins: hours 18 and 19
        let w2 = fs.window(LookbackWindow::hours(2)).unwrap();
        assert_eq!(w2.found, 2);
        assert!((w2.mean_air_temperature - 18.5).abs() < 1e-9);
    }

    #[test]
    fn test_off_hour_rain_is_not_counted_twice() {
        let samples = (0..24)
            .map(|h| WeatherSample {
                timestamp: start() + Duration::hours(h),
                air_temperature: 10.0,
                apparent_temperature: None,
                precipitation: if h == 20 { 3.0 } else { 0.0 },
                relative_humidity: 85.0,
            })
            .collect();
        let series = WeatherSeries::new(samples).unwrap();
        let t = start() + Duration::hours(20) + Duration::minutes(30);
        let fs = extract_features(&series, t, &windows(&[2, 8]), &FeatureConfig::default()).unwrap();

        assert_eq!(fs.current_precipitation, 3.0);
        assert_eq!(fs.window(LookbackWindow::hours(2)).unwrap().precipitation_sum, 0.0);
        assert_eq!(fs.window(LookbackWindow::hours(8)).unwrap().precipitation_sum, 0.0);
    }

    #[test]
    fn test_one_missing_hour_keeps_previous_sample_current() {
        let series = hourly(20);
        let t = start() + Duration::hours(20);
        let fs = extract_features(&series, t, &windows(&[2]), &FeatureConfig::default()).unwrap();
        assert!(!fs.current_is_exact);
        assert_eq!(fs.current_air_temperature, 19.0);
    }

    #[test]
    fn test_instant_past_end_of_series_is_stale() {
        let series = hourly(24);
        let t = start() + Duration::days(10);
        let err = extract_features(&series, t, &windows(&[2, 8]), &FeatureConfig::default())
            .unwrap_err();
        match err {
            ScoringError::StaleCurrentSample {
                timestamp,
                latest_available,
                max_age_hours,
            } => {
                assert_eq!(timestamp, t);
                assert_eq!(latest_available, start() + Duration::hours(23));
                assert_eq!(max_age_hours, SAMPLE_CADENCE_HOURS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        let series = WeatherSeries::new(Vec::new()).unwrap();
        let err = extract_features(&series, start(), &windows(&[8]), &FeatureConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ScoringError::InsufficientHistory { first_available: None, .. }
        ));
    }
}
