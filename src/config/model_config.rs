//! Model Configuration - curve shapes, weights and override thresholds as TOML
//!
//! Every constant the dashboards used to hard-code inline is a field here.
//! Sections missing from a file fall back to the Weighted preset, so an
//! empty file reproduces the original additive model exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use super::presets;
use crate::types::{FeatureSource, LookbackWindow};

/// Environment variable naming the config file to load.
pub const CONFIG_ENV_VAR: &str = "MIGRATION_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "model_config.toml";

/// Factor names reserved for the seasonal and lunar terms.
pub const SEASON_KEY: &str = "season";
pub const LUNAR_KEY: &str = "lunar";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of a scoring model.
///
/// Load with `ModelConfig::load()` which searches:
/// 1. `$MIGRATION_CONFIG` env var
/// 2. `./model_config.toml`
/// 3. Built-in defaults (Weighted preset)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identification, used in logs only
    #[serde(default = "presets::weighted_info")]
    pub model: ModelInfo,

    /// Feature extraction policy
    #[serde(default)]
    pub features: FeatureConfig,

    /// Normalized factors, each a feature source run through a response curve
    #[serde(default = "presets::weighted_factors")]
    pub factors: Vec<FactorConfig>,

    /// Month → importance weight
    #[serde(default = "presets::weighted_seasonal")]
    pub seasonal: SeasonalTable,

    /// Lunar phase modulation
    #[serde(default = "presets::weighted_lunar")]
    pub lunar: LunarConfig,

    /// How factors are merged into the base score
    #[serde(default = "presets::weighted_composition")]
    pub composition: Composition,

    /// Post-composition damping and veto rules
    #[serde(default)]
    pub overrides: OverrideConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        presets::weighted()
    }
}

impl ModelConfig {
    /// Load configuration using the standard search order:
    /// 1. `$MIGRATION_CONFIG` environment variable
    /// 2. `./model_config.toml` in the current working directory
    /// 3. Built-in defaults (Weighted preset)
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), model = %config.model.name, "Loaded model config from MIGRATION_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from MIGRATION_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "MIGRATION_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(model = %config.model.name, "Loaded model config from ./model_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./model_config.toml, using defaults");
                }
            }
        }

        info!("No model_config.toml found, using built-in Weighted preset");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&contents, path)
    }

    /// Parse and validate a TOML document held in memory.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, Path::new("<inline>"))
    }

    fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Model config saved");
        Ok(())
    }

    /// Every lookback window a scoring call has to aggregate.
    pub fn required_windows(&self) -> BTreeSet<LookbackWindow> {
        let mut windows: BTreeSet<LookbackWindow> = BTreeSet::new();
        for factor in &self.factors {
            windows.extend(factor.source.window());
            if let CurveConfig::LogSaturation {
                recency: Some(boost),
                ..
            } = &factor.curve
            {
                windows.extend(boost.source.window());
            }
        }
        windows.extend(self.overrides.felt_source.window());
        if let Some(dry) = &self.overrides.dryness {
            windows.insert(LookbackWindow::hours(dry.window_hours));
        }
        windows
    }

    /// Hours of history needed before the first evaluable timestamp.
    pub fn required_history_hours(&self) -> u32 {
        self.required_windows()
            .iter()
            .map(|w| w.hours)
            .max()
            .unwrap_or(0)
    }

    /// Validate the whole model for structural consistency.
    ///
    /// Collects every problem before failing so one run reports them all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        // Factors
        if self.factors.is_empty() {
            errors.push("factors: at least one factor must be configured".to_string());
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for factor in &self.factors {
            let name = factor.name.as_str();
            if name.trim().is_empty() {
                errors.push("factors: factor name must not be empty".to_string());
            } else if name == SEASON_KEY || name == LUNAR_KEY {
                errors.push(format!("factors.{name}: name is reserved"));
            } else if !seen.insert(name) {
                errors.push(format!("factors.{name}: duplicate factor name"));
            }
            Self::check_source(&format!("factors.{name}.source"), &factor.source, &mut errors);
            Self::check_curve(&format!("factors.{name}.curve"), &factor.curve, &mut errors);
        }

        // Seasonal table
        let s = &self.seasonal;
        if s.months.is_empty() {
            errors.push("seasonal.months must not be empty".to_string());
        }
        Self::check_unit("seasonal.default_weight", s.default_weight, &mut errors);
        let mut months_seen: HashSet<u32> = HashSet::new();
        for entry in &s.months {
            if !(1..=12).contains(&entry.month) {
                errors.push(format!("seasonal.months: month {} is outside 1-12", entry.month));
            } else if !months_seen.insert(entry.month) {
                errors.push(format!("seasonal.months: month {} listed twice", entry.month));
            }
            Self::check_unit(&format!("seasonal.months[{}].weight", entry.month), entry.weight, &mut errors);
        }

        // Lunar
        let l = &self.lunar;
        if !l.synodic_period_days.is_finite() || l.synodic_period_days <= 0.0 {
            errors.push(format!(
                "lunar.synodic_period_days ({}) must be > 0",
                l.synodic_period_days
            ));
        }
        if !l.boost.is_finite() || l.boost < 0.0 {
            errors.push(format!("lunar.boost ({}) must be >= 0", l.boost));
        }
        if !l.baseline.is_finite() || l.baseline < 0.0 {
            errors.push(format!("lunar.baseline ({}) must be >= 0", l.baseline));
        }
        if !(l.half_width > 0.0 && l.half_width < 0.5) {
            errors.push(format!(
                "lunar.half_width ({}) must be inside (0, 0.5)",
                l.half_width
            ));
        }
        if l.mode == LunarMode::Continuous && l.baseline - l.boost < 0.0 {
            errors.push(format!(
                "lunar: continuous modulation dips below 0 (baseline {} - boost {})",
                l.baseline, l.boost
            ));
        }

        // Composition
        if let Composition::Additive { weights } = &self.composition {
            for (key, &w) in weights {
                if !w.is_finite() || w < 0.0 {
                    errors.push(format!("composition.weights.{key} ({w}) must be finite and >= 0"));
                }
                let known = key == SEASON_KEY
                    || key == LUNAR_KEY
                    || self.factors.iter().any(|f| &f.name == key);
                if !known {
                    errors.push(format!(
                        "composition.weights.{key}: no factor with this name"
                    ));
                }
            }
            for factor in &self.factors {
                if !weights.contains_key(&factor.name) {
                    errors.push(format!(
                        "composition.weights: missing weight for factor '{}'",
                        factor.name
                    ));
                }
            }
            if !weights.values().any(|&w| w > 0.0) {
                errors.push("composition.weights: at least one weight must be > 0".to_string());
            }
        }

        // Overrides
        let o = &self.overrides;
        Self::check_source("overrides.felt_source", &o.felt_source, &mut errors);
        Self::check_finite("overrides.hard_veto_below_c", o.hard_veto_below_c, &mut errors);
        if let Some(soft) = &o.soft_cold {
            Self::check_finite("overrides.soft_cold.below_c", soft.below_c, &mut errors);
            Self::check_unit("overrides.soft_cold.damping", soft.damping, &mut errors);
        }
        if let Some(dry) = &o.dryness {
            if dry.window_hours == 0 {
                errors.push("overrides.dryness.window_hours must be > 0".to_string());
            }
            Self::check_finite("overrides.dryness.current_rain_below_mm", dry.current_rain_below_mm, &mut errors);
            Self::check_finite("overrides.dryness.window_rain_below_mm", dry.window_rain_below_mm, &mut errors);
            Self::check_finite("overrides.dryness.humidity_below_pct", dry.humidity_below_pct, &mut errors);
            Self::check_unit("overrides.dryness.damping", dry.damping, &mut errors);
        }

        // Features
        if self.features.reject_partial_from_hours == Some(0) {
            errors.push("features.reject_partial_from_hours must be > 0 when set".to_string());
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_source(name: &str, source: &FeatureSource, errors: &mut Vec<String>) {
        if source.window().is_some_and(|w| w.hours == 0) {
            errors.push(format!("{name}: window hours must be > 0"));
        }
    }

    fn check_curve(name: &str, curve: &CurveConfig, errors: &mut Vec<String>) {
        match curve {
            CurveConfig::LinearRamp { min, max, floor } => {
                Self::check_finite(&format!("{name}.min"), *min, errors);
                Self::check_finite(&format!("{name}.max"), *max, errors);
                if min >= max {
                    errors.push(format!("{name}: linear ramp min ({min}) must be < max ({max})"));
                }
                Self::check_floor(&format!("{name}.floor"), *floor, errors);
            }
            CurveConfig::GaussianBump {
                optimum,
                sigma,
                domain_min,
                domain_max,
                floor,
            } => {
                Self::check_finite(&format!("{name}.optimum"), *optimum, errors);
                Self::check_positive(&format!("{name}.sigma"), *sigma, errors);
                Self::check_finite(&format!("{name}.domain_min"), *domain_min, errors);
                Self::check_finite(&format!("{name}.domain_max"), *domain_max, errors);
                if domain_min >= domain_max {
                    errors.push(format!(
                        "{name}: domain_min ({domain_min}) must be < domain_max ({domain_max})"
                    ));
                } else if optimum < domain_min || optimum > domain_max {
                    errors.push(format!(
                        "{name}: optimum ({optimum}) must lie inside [{domain_min}, {domain_max}]"
                    ));
                }
                Self::check_floor(&format!("{name}.floor"), *floor, errors);
            }
            CurveConfig::AsymmetricBeta {
                min,
                max,
                alpha,
                beta,
            } => {
                Self::check_finite(&format!("{name}.min"), *min, errors);
                Self::check_finite(&format!("{name}.max"), *max, errors);
                if min >= max {
                    errors.push(format!("{name}: min ({min}) must be < max ({max})"));
                }
                if !alpha.is_finite() || *alpha <= 1.0 {
                    errors.push(format!("{name}.alpha ({alpha}) must be > 1"));
                }
                if !beta.is_finite() || *beta <= 1.0 {
                    errors.push(format!("{name}.beta ({beta}) must be > 1"));
                }
            }
            CurveConfig::LogSaturation { scale, recency } => {
                Self::check_positive(&format!("{name}.scale"), *scale, errors);
                if let Some(boost) = recency {
                    if !boost.factor.is_finite() || boost.factor < 1.0 {
                        errors.push(format!(
                            "{name}.recency.factor ({}) must be >= 1",
                            boost.factor
                        ));
                    }
                    Self::check_finite(&format!("{name}.recency.threshold"), boost.threshold, errors);
                    Self::check_source(&format!("{name}.recency.source"), &boost.source, errors);
                }
            }
            CurveConfig::DrizzleSaturation {
                low_threshold,
                sat_point,
                decay_rate,
                floor,
            } => {
                if !low_threshold.is_finite() || *low_threshold < 0.0 {
                    errors.push(format!("{name}.low_threshold ({low_threshold}) must be >= 0"));
                }
                Self::check_finite(&format!("{name}.sat_point"), *sat_point, errors);
                if low_threshold >= sat_point {
                    errors.push(format!(
                        "{name}: low_threshold ({low_threshold}) must be < sat_point ({sat_point})"
                    ));
                }
                Self::check_positive(&format!("{name}.decay_rate"), *decay_rate, errors);
                Self::check_floor(&format!("{name}.floor"), *floor, errors);
            }
            CurveConfig::Step { breakpoints } => {
                if breakpoints.len() < 2 {
                    errors.push(format!(
                        "{name}: step curve needs at least 2 breakpoints, got {}",
                        breakpoints.len()
                    ));
                }
                for pair in breakpoints.windows(2) {
                    if pair[1].x <= pair[0].x {
                        errors.push(format!(
                            "{name}: breakpoints must be strictly increasing in x ({} then {})",
                            pair[0].x, pair[1].x
                        ));
                    }
                }
                for bp in breakpoints {
                    if !bp.x.is_finite() || !bp.y.is_finite() || bp.y < 0.0 {
                        errors.push(format!(
                            "{name}: breakpoint ({}, {}) must be finite with y >= 0",
                            bp.x, bp.y
                        ));
                    }
                }
            }
        }
    }

    fn check_finite(name: &str, value: f64, errors: &mut Vec<String>) {
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
        }
    }

    fn check_positive(name: &str, value: f64, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} ({value}) must be > 0"));
        }
    }

    fn check_unit(name: &str, value: f64, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&value) {
            errors.push(format!("{name} ({value}) must be within [0, 1]"));
        }
    }

    fn check_floor(name: &str, value: f64, errors: &mut Vec<String>) {
        if !(0.0..1.0).contains(&value) {
            errors.push(format!("{name} ({value}) must be within [0, 1)"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Model Info
// ============================================================================

/// Identification metadata. Not used for logic, but appears in logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

fn default_model_name() -> String {
    "weighted".to_string()
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            description: String::new(),
        }
    }
}

// ============================================================================
// Feature Extraction
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Reject partial windows spanning at least this many hours.
    /// Shorter partial windows are always accepted and only flagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_partial_from_hours: Option<u32>,
}

// ============================================================================
// Factors and Curves
// ============================================================================

/// One named factor: a feature source run through a response curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorConfig {
    pub name: String,
    pub source: FeatureSource,
    pub curve: CurveConfig,
}

/// Response curve turning a physical value into a unit-scale factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveConfig {
    /// `floor` at/below `min`, 1.0 at/above `max`, linear between
    LinearRamp {
        min: f64,
        max: f64,
        #[serde(default = "default_ramp_floor")]
        floor: f64,
    },
    /// `exp(-0.5 z²)` around `optimum`, `floor` outside the hard domain
    GaussianBump {
        optimum: f64,
        sigma: f64,
        domain_min: f64,
        domain_max: f64,
        #[serde(default = "default_gaussian_floor")]
        floor: f64,
    },
    /// Beta-shaped activation over `[min, max]`, peak rescaled to 1.0
    AsymmetricBeta {
        min: f64,
        max: f64,
        alpha: f64,
        beta: f64,
    },
    /// `min(1, ln(1 + 2x) / scale)`, optionally boosted by a recent burst
    LogSaturation {
        scale: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recency: Option<RecencyBoost>,
    },
    /// Rises to 1.0 at `sat_point`, then decays linearly down to `floor`
    DrizzleSaturation {
        low_threshold: f64,
        sat_point: f64,
        decay_rate: f64,
        #[serde(default)]
        floor: f64,
    },
    /// Piecewise-linear through `breakpoints`, flat beyond both ends
    Step { breakpoints: Vec<Breakpoint> },
}

fn default_ramp_floor() -> f64 {
    defaults::LINEAR_RAMP_FLOOR
}
fn default_gaussian_floor() -> f64 {
    defaults::GAUSSIAN_FLOOR
}

/// Multiplier applied to a log-saturation factor when a companion
/// short-window quantity exceeds `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencyBoost {
    pub factor: f64,
    pub threshold: f64,
    pub source: FeatureSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub x: f64,
    pub y: f64,
}

// ============================================================================
// Seasonal Table
// ============================================================================

/// Month → weight mapping; unlisted months resolve to `default_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTable {
    #[serde(default = "default_off_season_weight")]
    pub default_weight: f64,

    #[serde(default)]
    pub months: Vec<MonthWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthWeight {
    /// Calendar month, 1-12
    pub month: u32,
    pub weight: f64,
}

fn default_off_season_weight() -> f64 {
    defaults::OFF_SEASON_WEIGHT
}

// ============================================================================
// Lunar Modulation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunarMode {
    /// No modulation (factor 1.0)
    #[default]
    Disabled,
    /// `baseline + boost * cos(2π |phase - 0.5|)`
    Continuous,
    /// `baseline + boost` inside the full-moon band, `baseline` outside
    Binary,
}

/// What the configured epoch instant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochPhase {
    #[default]
    NewMoon,
    FullMoon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunarConfig {
    #[serde(default)]
    pub mode: LunarMode,

    #[serde(default = "default_lunar_boost")]
    pub boost: f64,

    #[serde(default = "default_lunar_baseline")]
    pub baseline: f64,

    /// Half-width of the binary band around full moon (phase fraction)
    #[serde(default = "default_half_width")]
    pub half_width: f64,

    #[serde(default = "default_synodic_period")]
    pub synodic_period_days: f64,

    /// Reference instant (RFC 3339 string)
    #[serde(default = "default_epoch")]
    pub epoch: DateTime<Utc>,

    #[serde(default)]
    pub epoch_phase: EpochPhase,
}

fn default_lunar_boost() -> f64 {
    0.2
}
fn default_lunar_baseline() -> f64 {
    1.0
}
fn default_half_width() -> f64 {
    defaults::FULL_MOON_HALF_WIDTH
}
fn default_synodic_period() -> f64 {
    defaults::SYNODIC_PERIOD_DAYS
}
pub(crate) fn default_epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(defaults::REFERENCE_NEW_MOON)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

impl Default for LunarConfig {
    fn default() -> Self {
        Self {
            mode: LunarMode::default(),
            boost: default_lunar_boost(),
            baseline: default_lunar_baseline(),
            half_width: default_half_width(),
            synodic_period_days: default_synodic_period(),
            epoch: default_epoch(),
            epoch_phase: EpochPhase::default(),
        }
    }
}

// ============================================================================
// Composition
// ============================================================================

/// Strategy merging the normalized factors into one base score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Composition {
    /// Compensating: weighted sum. `season` and `lunar` are terms when
    /// weighted, otherwise they scale the sum.
    Additive {
        #[serde(default)]
        weights: BTreeMap<String, f64>,
    },
    /// Conjunctive: product of every factor, season and lunar included.
    Multiplicative,
}

// ============================================================================
// Overrides
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Feature the temperature rules compare against
    #[serde(default = "default_felt_source")]
    pub felt_source: FeatureSource,

    /// Felt temperature (°C) under which the score is forced to 0
    #[serde(default = "default_hard_veto")]
    pub hard_veto_below_c: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_cold: Option<SoftColdRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dryness: Option<DrynessRule>,
}

fn default_felt_source() -> FeatureSource {
    FeatureSource::ApparentTemperatureMean {
        hours: defaults::FELT_TEMPERATURE_WINDOW_HOURS,
    }
}
fn default_hard_veto() -> f64 {
    defaults::HARD_VETO_BELOW_C
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            felt_source: default_felt_source(),
            hard_veto_below_c: default_hard_veto(),
            soft_cold: None,
            dryness: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftColdRule {
    pub below_c: f64,
    pub damping: f64,
}

/// Fires when current rain, recent rain and humidity are all under their limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrynessRule {
    pub current_rain_below_mm: f64,
    pub window_hours: u32,
    pub window_rain_below_mm: f64,
    pub humidity_below_pct: f64,
    pub damping: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ModelConfig::default().validate().unwrap();
    }

    #[test]
    fn test_empty_toml_yields_weighted_preset() {
        let config = ModelConfig::from_toml_str("").unwrap();
        assert_eq!(config, presets::weighted());
    }

    #[test]
    fn test_toml_roundtrip_preserves_conjunctive_preset() {
        let original = presets::conjunctive();
        let text = original.to_toml().unwrap();
        let parsed = ModelConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_required_history_is_longest_window() {
        let config = presets::weighted();
        assert_eq!(config.required_history_hours(), 8);
        let windows: Vec<u32> = config.required_windows().iter().map(|w| w.hours).collect();
        assert_eq!(windows, vec![2, 8]);
    }

    #[test]
    fn test_ramp_with_inverted_bounds_rejected() {
        let mut config = ModelConfig::default();
        config.factors[0].curve = CurveConfig::LinearRamp {
            min: 8.0,
            max: 4.0,
            floor: 0.1,
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min (8) must be < max (4)"));
    }

    #[test]
    fn test_missing_weight_for_factor_rejected() {
        let mut config = ModelConfig::default();
        if let Composition::Additive { weights } = &mut config.composition {
            weights.remove("temp_8h");
        }
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("missing weight for factor 'temp_8h'"));
    }

    #[test]
    fn test_reserved_factor_name_rejected() {
        let mut config = presets::conjunctive();
        config.factors[0].name = "season".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_seasonal_table_rejected() {
        let mut config = ModelConfig::default();
        config.seasonal.months.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("seasonal.months must not be empty"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = ModelConfig::default();
        config.seasonal.months.clear();
        config.lunar.synodic_period_days = 0.0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert!(errors.len() >= 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_curve_bounds_rejected() {
        let cases: [(usize, &str, fn(&mut CurveConfig)); 5] = [
            (0, "domain_min", |c| {
                if let CurveConfig::GaussianBump { domain_min, .. } = c {
                    *domain_min = f64::NAN;
                }
            }),
            (0, "domain_max", |c| {
                if let CurveConfig::GaussianBump { domain_max, .. } = c {
                    *domain_max = f64::INFINITY;
                }
            }),
            (1, "min", |c| {
                if let CurveConfig::AsymmetricBeta { min, .. } = c {
                    *min = f64::NAN;
                }
            }),
            (1, "max", |c| {
                if let CurveConfig::AsymmetricBeta { max, .. } = c {
                    *max = f64::NAN;
                }
            }),
            (3, "sat_point", |c| {
                if let CurveConfig::DrizzleSaturation { sat_point, .. } = c {
                    *sat_point = f64::NAN;
                }
            }),
        ];
        for (index, field, corrupt) in cases {
            let mut config = presets::conjunctive();
            corrupt(&mut config.factors[index].curve);
            let expected = format!("factors.{}.curve.{field}", config.factors[index].name);
            match config.validate() {
                Err(ConfigError::Validation(errors)) => assert!(
                    errors.iter().any(|e| e.starts_with(&expected) && e.contains("finite")),
                    "{expected}: {errors:?}"
                ),
                other => panic!("{expected}: expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_error_reports_origin() {
        let err = ModelConfig::from_toml_str("[lunar\nmode = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_, _)));
    }
}
