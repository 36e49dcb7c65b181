//! JSON-lines weather file
//!
//! One `WeatherSample` object per line:
//! `{"timestamp":"2025-03-01T21:00:00Z","air_temperature":8.4,"precipitation":0.6,"relative_humidity":91}`
//! Blank lines are ignored; malformed lines are skipped with a warning.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{into_series, FetchRequest, WeatherProvider};
use crate::types::{WeatherSample, WeatherSeries};

pub struct JsonLinesProvider {
    path: PathBuf,
}

impl JsonLinesProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse every well-formed line of `reader`.
    pub fn read_samples(reader: impl BufRead) -> Result<Vec<WeatherSample>> {
        let mut samples = Vec::new();
        let mut skipped = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("reading line {}", idx + 1))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<WeatherSample>(trimmed) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    skipped += 1;
                    warn!(line = idx + 1, error = %e, "Skipping malformed weather line");
                }
            }
        }
        debug!(parsed = samples.len(), skipped, "Parsed JSON-lines weather");
        Ok(samples)
    }
}

impl WeatherProvider for JsonLinesProvider {
    fn fetch(&self, request: &FetchRequest) -> Result<WeatherSeries> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening weather file {}", self.path.display()))?;
        let samples = Self::read_samples(BufReader::new(file))?;
        Ok(into_series(samples, request))
    }

    fn provider_name(&self) -> &str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Location;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    #[test]
    fn test_skips_malformed_lines() {
        let text = r#"{"timestamp":"2025-03-01T20:00:00Z","air_temperature":8.0,"precipitation":0.2,"relative_humidity":90.0}
not json at all

{"timestamp":"2025-03-01T21:00:00Z","air_temperature":7.5,"apparent_temperature":5.0,"precipitation":0.4,"relative_humidity":92.0}
"#;
        let samples = JsonLinesProvider::read_samples(text.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].apparent_temperature, Some(5.0));
        assert_eq!(samples[0].apparent_temperature, None);
    }

    #[test]
    fn test_fetch_filters_to_request_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for hour in 0..6 {
            writeln!(
                file,
                r#"{{"timestamp":"2025-03-01T{hour:02}:00:00Z","air_temperature":6.0,"precipitation":0.0,"relative_humidity":80.0}}"#
            )
            .unwrap();
        }
        let provider = JsonLinesProvider::new(file.path());
        let request = FetchRequest {
            location: Location::new(50.0, 8.0).unwrap(),
            start: Utc.with_ymd_and_hms(2025, 3, 1, 2, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 1, 4, 0, 0).unwrap(),
        };
        let series = provider.fetch(&request).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(provider.provider_name(), "jsonl");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let provider = JsonLinesProvider::new("/nonexistent/weather.jsonl");
        let request = FetchRequest {
            location: Location::new(50.0, 8.0).unwrap(),
            start: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap(),
        };
        assert!(provider.fetch(&request).is_err());
    }
}
