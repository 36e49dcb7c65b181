//! Hourly weather observations and the ordered series the engine consumes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::defaults::{
    HUMIDITY_MAX_PCT, HUMIDITY_MIN_PCT, TEMPERATURE_MAX_C, TEMPERATURE_MIN_C,
};

/// One hourly observation for a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Hour-aligned observation instant
    pub timestamp: DateTime<Utc>,
    /// Air temperature (°C)
    pub air_temperature: f64,
    /// Apparent ("felt") temperature (°C), if the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apparent_temperature: Option<f64>,
    /// Precipitation over the hour (mm)
    pub precipitation: f64,
    /// Relative humidity (%)
    pub relative_humidity: f64,
}

impl WeatherSample {
    /// Felt temperature: apparent temperature, falling back to air temperature.
    pub fn felt_temperature(&self) -> f64 {
        self.apparent_temperature.unwrap_or(self.air_temperature)
    }

    /// Clamp physically implausible values into range.
    ///
    /// Returns `None` when a required value is not a finite number, and
    /// otherwise the sanitized sample plus whether anything was clamped.
    fn sanitize(mut self) -> Option<(Self, bool)> {
        if !self.air_temperature.is_finite()
            || !self.precipitation.is_finite()
            || !self.relative_humidity.is_finite()
        {
            return None;
        }

        let mut clamped = false;
        let mut clamp = |value: f64, lo: f64, hi: f64| {
            let c = value.clamp(lo, hi);
            if c != value {
                clamped = true;
            }
            c
        };

        self.air_temperature = clamp(self.air_temperature, TEMPERATURE_MIN_C, TEMPERATURE_MAX_C);
        self.precipitation = clamp(self.precipitation, 0.0, f64::MAX);
        self.relative_humidity = clamp(self.relative_humidity, HUMIDITY_MIN_PCT, HUMIDITY_MAX_PCT);
        self.apparent_temperature = match self.apparent_temperature {
            Some(a) if a.is_finite() => Some(clamp(a, TEMPERATURE_MIN_C, TEMPERATURE_MAX_C)),
            _ => None,
        };

        Some((self, clamped))
    }
}

/// Errors raised while assembling a series.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("Sample {index} is earlier than the sample before it")]
    OutOfOrder { index: usize },

    #[error("Sample {index} repeats the timestamp of the sample before it")]
    DuplicateTimestamp { index: usize },
}

/// How much sanitation a series needed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesQuality {
    /// Samples with at least one value clamped into physical range
    pub clamped: usize,
    /// Samples discarded because a required value was not finite
    pub dropped: usize,
}

/// Immutable, strictly increasing hourly series for one location.
#[derive(Debug, Clone, Default)]
pub struct WeatherSeries {
    samples: Vec<WeatherSample>,
    quality: SeriesQuality,
}

impl WeatherSeries {
    /// Build a series from samples that are already in timestamp order.
    pub fn new(samples: Vec<WeatherSample>) -> Result<Self, SeriesError> {
        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].timestamp == pair[0].timestamp {
                return Err(SeriesError::DuplicateTimestamp { index: index + 1 });
            }
            if pair[1].timestamp < pair[0].timestamp {
                return Err(SeriesError::OutOfOrder { index: index + 1 });
            }
        }
        Ok(Self::sanitized(samples))
    }

    /// Build a series from provider output in arbitrary order.
    ///
    /// Samples are sorted by timestamp; for repeated timestamps the last
    /// occurrence in the input wins.
    pub fn from_unsorted(mut samples: Vec<WeatherSample>) -> Self {
        // Stable sort keeps input order within equal timestamps.
        samples.sort_by_key(|s| s.timestamp);
        let mut deduped: Vec<WeatherSample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match deduped.last_mut() {
                Some(last) if last.timestamp == sample.timestamp => *last = sample,
                _ => deduped.push(sample),
            }
        }
        Self::sanitized(deduped)
    }

    fn sanitized(samples: Vec<WeatherSample>) -> Self {
        let mut quality = SeriesQuality::default();
        let mut kept = Vec::with_capacity(samples.len());
        for sample in samples {
            match sample.sanitize() {
                Some((s, was_clamped)) => {
                    if was_clamped {
                        quality.clamped += 1;
                    }
                    kept.push(s);
                }
                None => quality.dropped += 1,
            }
        }

        if quality.clamped > 0 || quality.dropped > 0 {
            warn!(
                clamped = quality.clamped,
                dropped = quality.dropped,
                "Weather series contained out-of-range samples"
            );
        }

        Self {
            samples: kept,
            quality,
        }
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn quality(&self) -> SeriesQuality {
        self.quality
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Samples with `start <= timestamp < end`.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[WeatherSample] {
        let lo = self.samples.partition_point(|s| s.timestamp < start);
        let hi = self.samples.partition_point(|s| s.timestamp < end);
        if lo >= hi {
            &[]
        } else {
            &self.samples[lo..hi]
        }
    }

    /// Latest sample at or before `t`.
    pub fn latest_at_or_before(&self, t: DateTime<Utc>) -> Option<&WeatherSample> {
        let idx = self.samples.partition_point(|s| s.timestamp <= t);
        idx.checked_sub(1).map(|i| &self.samples[i])
    }
}
