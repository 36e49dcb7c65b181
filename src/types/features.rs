//! Derived per-evaluation features

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A lookback span preceding an evaluation instant, in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub hours: u32,
}

impl LookbackWindow {
    pub const fn hours(hours: u32) -> Self {
        Self { hours }
    }

    pub fn span(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.hours))
    }

    /// Number of hourly samples a complete window holds.
    pub fn expected_samples(&self) -> usize {
        self.hours as usize
    }
}

impl std::fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h", self.hours)
    }
}

/// Which scalar of a [`FeatureSet`] feeds a factor or an override rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureSource {
    /// Mean air temperature over the window (°C)
    TemperatureMean { hours: u32 },
    /// Mean apparent temperature over the window (°C)
    ApparentTemperatureMean { hours: u32 },
    /// Precipitation total over the window (mm)
    PrecipitationSum { hours: u32 },
    /// Mean relative humidity over the window (%)
    HumidityMean { hours: u32 },
    /// Precipitation of the evaluation hour (mm)
    CurrentPrecipitation,
    /// Relative humidity of the evaluation hour (%)
    CurrentHumidity,
    /// Air temperature of the evaluation hour (°C)
    CurrentTemperature,
    /// Apparent temperature of the evaluation hour (°C)
    CurrentApparentTemperature,
}

impl FeatureSource {
    /// The lookback window this source aggregates over, if any.
    pub fn window(&self) -> Option<LookbackWindow> {
        match *self {
            FeatureSource::TemperatureMean { hours }
            | FeatureSource::ApparentTemperatureMean { hours }
            | FeatureSource::PrecipitationSum { hours }
            | FeatureSource::HumidityMean { hours } => Some(LookbackWindow::hours(hours)),
            FeatureSource::CurrentPrecipitation
            | FeatureSource::CurrentHumidity
            | FeatureSource::CurrentTemperature
            | FeatureSource::CurrentApparentTemperature => None,
        }
    }

    /// Short label for logs and breakdowns (e.g. `precipitation_sum_8h`).
    pub fn label(&self) -> String {
        match *self {
            FeatureSource::TemperatureMean { hours } => format!("temperature_mean_{hours}h"),
            FeatureSource::ApparentTemperatureMean { hours } => {
                format!("apparent_temperature_mean_{hours}h")
            }
            FeatureSource::PrecipitationSum { hours } => format!("precipitation_sum_{hours}h"),
            FeatureSource::HumidityMean { hours } => format!("humidity_mean_{hours}h"),
            FeatureSource::CurrentPrecipitation => "current_precipitation".to_string(),
            FeatureSource::CurrentHumidity => "current_humidity".to_string(),
            FeatureSource::CurrentTemperature => "current_temperature".to_string(),
            FeatureSource::CurrentApparentTemperature => "current_apparent_temperature".to_string(),
        }
    }
}

/// Aggregates of one lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregate {
    pub window: LookbackWindow,
    /// Samples a gap-free window would contain
    pub expected: usize,
    /// Samples actually found in `[t - span, t)`
    pub found: usize,
    pub mean_air_temperature: f64,
    pub mean_apparent_temperature: f64,
    pub mean_relative_humidity: f64,
    pub precipitation_sum: f64,
}

impl WindowAggregate {
    pub fn is_partial(&self) -> bool {
        self.found < self.expected
    }
}

/// Scalars derived from a series for one evaluation instant.
///
/// Built fresh for every evaluation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub timestamp: DateTime<Utc>,
    /// Calendar month of `timestamp` (1-12, UTC)
    pub month: u32,
    pub current_air_temperature: f64,
    pub current_apparent_temperature: f64,
    pub current_precipitation: f64,
    pub current_relative_humidity: f64,
    /// Whether the current-hour values come from a sample exactly at `timestamp`
    pub current_is_exact: bool,
    /// Aggregates keyed by window span in hours
    pub windows: BTreeMap<u32, WindowAggregate>,
}

impl FeatureSet {
    pub fn window(&self, window: LookbackWindow) -> Option<&WindowAggregate> {
        self.windows.get(&window.hours)
    }

    /// Windows with fewer samples than a gap-free series would provide.
    pub fn partial_windows(&self) -> Vec<LookbackWindow> {
        self.windows
            .values()
            .filter(|w| w.is_partial())
            .map(|w| w.window)
            .collect()
    }

    pub fn has_partial_window(&self) -> bool {
        self.windows.values().any(WindowAggregate::is_partial)
    }

    /// Resolve a source to its value. `None` if the window was not extracted.
    pub fn value(&self, source: FeatureSource) -> Option<f64> {
        match source {
            FeatureSource::TemperatureMean { hours } => self
                .window(LookbackWindow::hours(hours))
                .map(|w| w.mean_air_temperature),
            FeatureSource::ApparentTemperatureMean { hours } => self
                .window(LookbackWindow::hours(hours))
                .map(|w| w.mean_apparent_temperature),
            FeatureSource::PrecipitationSum { hours } => self
                .window(LookbackWindow::hours(hours))
                .map(|w| w.precipitation_sum),
            FeatureSource::HumidityMean { hours } => self
                .window(LookbackWindow::hours(hours))
                .map(|w| w.mean_relative_humidity),
            FeatureSource::CurrentPrecipitation => Some(self.current_precipitation),
            FeatureSource::CurrentHumidity => Some(self.current_relative_humidity),
            FeatureSource::CurrentTemperature => Some(self.current_air_temperature),
            FeatureSource::CurrentApparentTemperature => Some(self.current_apparent_temperature),
        }
    }
}
