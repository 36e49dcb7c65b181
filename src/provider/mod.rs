//! Weather provider seam
//!
//! The engine never fetches weather itself. A [`WeatherProvider`] turns a
//! location and a time range into a [`WeatherSeries`]; remote clients,
//! caches and station lookup live behind this trait.
//!
//! Two file-backed providers ship with the crate:
//! - `JsonLinesProvider`: one JSON `WeatherSample` per line
//! - `CsvProvider`: header-mapped CSV, Open-Meteo column names accepted

mod csv;
mod jsonl;

pub use self::csv::CsvProvider;
pub use self::jsonl::JsonLinesProvider;

use anyhow::{ensure, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::defaults::SAMPLE_CADENCE_HOURS;
use crate::types::{WeatherSample, WeatherSeries};

/// Source of hourly weather for one location.
pub trait WeatherProvider: Send + Sync {
    /// Fetch samples covering `request.start..=request.end`.
    fn fetch(&self, request: &FetchRequest) -> Result<WeatherSeries>;

    /// Provider name for logs.
    fn provider_name(&self) -> &str;
}

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        ensure!(
            latitude.is_finite() && (-90.0..=90.0).contains(&latitude),
            "latitude {latitude} is outside -90..=90"
        );
        ensure!(
            longitude.is_finite() && (-180.0..=180.0).contains(&longitude),
            "longitude {longitude} is outside -180..=180"
        );
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Time range of hourly weather requested for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub location: Location,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchRequest {
    /// Range covering every evaluation instant plus `history_hours` before
    /// the earliest one, widened by one sample cadence because windows end at
    /// the current sample rather than at the instant itself. `None` when
    /// `timestamps` is empty.
    pub fn for_evaluations(
        location: Location,
        timestamps: &[DateTime<Utc>],
        history_hours: u32,
    ) -> Option<Self> {
        let first = timestamps.iter().min()?;
        let last = timestamps.iter().max()?;
        Some(Self {
            location,
            start: *first - Duration::hours(i64::from(history_hours) + SAMPLE_CADENCE_HOURS),
            end: *last,
        })
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Pick a file-backed provider from the file extension (`.csv` or JSON lines).
pub fn provider_for_path(path: &Path) -> Box<dyn WeatherProvider> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvProvider::new(path))
    } else {
        Box::new(JsonLinesProvider::new(path))
    }
}

/// Keep samples inside the request and assemble a series.
fn into_series(samples: Vec<WeatherSample>, request: &FetchRequest) -> WeatherSeries {
    let in_range: Vec<WeatherSample> = samples
        .into_iter()
        .filter(|s| request.contains(s.timestamp))
        .collect();
    WeatherSeries::from_unsorted(in_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_location_validates_ranges() {
        assert!(Location::new(52.5, 13.4).is_ok());
        assert!(Location::new(91.0, 0.0).is_err());
        assert!(Location::new(0.0, -181.0).is_err());
        assert!(Location::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_request_covers_history_before_first_evaluation() {
        let loc = Location::new(48.1, 11.6).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 3, 2, 21, 0, 0).unwrap();
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 21, 0, 0).unwrap();
        let req = FetchRequest::for_evaluations(loc, &[t1, t0], 8).unwrap();
        assert_eq!(req.start, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(req.end, t1);
        assert!(FetchRequest::for_evaluations(loc, &[], 8).is_none());
    }
}
