//! CSV weather file
//!
//! Columns are mapped from the header row, so column order does not matter.
//! Accepted names (case-insensitive, a trailing unit like `(°C)` is ignored):
//!
//! | Field               | Column names                                              |
//! |---------------------|-----------------------------------------------------------|
//! | timestamp           | `timestamp`, `time`, `datetime`, `date`                   |
//! | air temperature     | `air_temperature`, `temperature_2m`, `temperature`        |
//! | apparent temperature| `apparent_temperature` (optional)                         |
//! | precipitation       | `precipitation`, `rain` (fallback)                        |
//! | relative humidity   | `relative_humidity`, `relative_humidity_2m`, `humidity`   |
//!
//! Open-Meteo exports start with a location block before the hourly table;
//! lines are skipped until a header with the required columns appears.
//! Timestamps without an offset (`2025-03-01T21:00`) are read as UTC.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{into_series, FetchRequest, WeatherProvider};
use crate::types::{WeatherSample, WeatherSeries};

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote ("")
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Column name without surrounding whitespace, case or a unit suffix.
fn normalize_column(raw: &str) -> String {
    let name = raw.trim().trim_start_matches('\u{feff}');
    let name = name.split(" (").next().unwrap_or(name);
    name.trim().to_lowercase()
}

// ============================================================================
// Column Mapping
// ============================================================================

#[derive(Debug, Default)]
struct ColumnMap {
    timestamp: Option<usize>,
    air_temperature: Option<usize>,
    apparent_temperature: Option<usize>,
    precipitation: Option<usize>,
    rain: Option<usize>,
    relative_humidity: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &str) -> Self {
        let mut map = Self::default();
        for (idx, column) in csv_split(header).iter().enumerate() {
            let slot = match normalize_column(column).as_str() {
                "timestamp" | "time" | "datetime" | "date" => &mut map.timestamp,
                "air_temperature" | "temperature_2m" | "temperature" => &mut map.air_temperature,
                "apparent_temperature" => &mut map.apparent_temperature,
                "precipitation" => &mut map.precipitation,
                "rain" => &mut map.rain,
                "relative_humidity" | "relative_humidity_2m" | "humidity" => {
                    &mut map.relative_humidity
                }
                _ => continue,
            };
            // First matching column wins
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        map
    }

    fn precipitation_column(&self) -> Option<usize> {
        self.precipitation.or(self.rain)
    }

    fn is_complete(&self) -> bool {
        self.timestamp.is_some()
            && self.air_temperature.is_some()
            && self.precipitation_column().is_some()
            && self.relative_humidity.is_some()
    }

    fn parse_row(&self, fields: &[String]) -> Result<WeatherSample> {
        let apparent_temperature = match self.apparent_temperature.and_then(|i| fields.get(i)) {
            Some(raw) if !raw.trim().is_empty() => {
                Some(number(fields, self.apparent_temperature, "apparent_temperature")?)
            }
            _ => None,
        };

        Ok(WeatherSample {
            timestamp: parse_timestamp(field(fields, self.timestamp, "timestamp")?)?,
            air_temperature: number(fields, self.air_temperature, "air_temperature")?,
            apparent_temperature,
            precipitation: number(fields, self.precipitation_column(), "precipitation")?,
            relative_humidity: number(fields, self.relative_humidity, "relative_humidity")?,
        })
    }
}

fn field<'a>(fields: &'a [String], idx: Option<usize>, name: &str) -> Result<&'a str> {
    idx.and_then(|i| fields.get(i))
        .map(|f| f.trim())
        .with_context(|| format!("missing {name} field"))
}

fn number(fields: &[String], idx: Option<usize>, name: &str) -> Result<f64> {
    let raw = field(fields, idx, name)?;
    raw.parse::<f64>()
        .with_context(|| format!("invalid {name} value '{raw}'"))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    bail!("unrecognized timestamp '{raw}'")
}

// ============================================================================
// Provider
// ============================================================================

pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse the hourly table of `reader`. Rows that fail to parse are
    /// skipped with a warning; a missing header is an error.
    pub fn read_samples(reader: impl BufRead) -> Result<Vec<WeatherSample>> {
        let mut columns: Option<ColumnMap> = None;
        let mut samples = Vec::new();
        let mut skipped = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("reading line {}", idx + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            if columns.is_none() {
                let candidate = ColumnMap::from_header(&line);
                if candidate.is_complete() {
                    columns = Some(candidate);
                }
                continue;
            }
            let Some(map) = columns.as_ref() else {
                continue;
            };
            match map.parse_row(&csv_split(&line)) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    skipped += 1;
                    warn!(line = idx + 1, error = %e, "Skipping malformed CSV row");
                }
            }
        }

        if columns.is_none() {
            bail!("no header with timestamp, temperature, precipitation and humidity columns");
        }
        debug!(parsed = samples.len(), skipped, "Parsed CSV weather");
        Ok(samples)
    }
}

impl WeatherProvider for CsvProvider {
    fn fetch(&self, request: &FetchRequest) -> Result<WeatherSeries> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening weather file {}", self.path.display()))?;
        let samples = Self::read_samples(BufReader::new(file))
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(into_series(samples, request))
    }

    fn provider_name(&self) -> &str {
        "csv"
    }
}
