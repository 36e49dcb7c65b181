//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::model_config::{CurveConfig, ModelConfig};
use super::defaults::{
    PLAUSIBLE_RAIN_MAX_MM, PLAUSIBLE_THRESHOLD_MAX_C, PLAUSIBLE_THRESHOLD_MIN_C,
    PLAUSIBLE_WINDOW_MAX_HOURS, SYNODIC_PERIOD_DAYS,
};
use crate::types::FeatureSource;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Key prefixes whose children are user-chosen names.
const DYNAMIC_KEY_PREFIXES: &[&str] = &["composition.weights."];

/// Returns the complete set of valid dotted key paths for ModelConfig.
///
/// Elements of arrays of tables share their array's path, so every
/// `[[factors]]` entry contributes `factors.name`, `factors.curve.kind`, ...
///
/// Maintained manually to match the struct hierarchy in model_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [model]
        "model",
        "model.name",
        "model.description",
        // [features]
        "features",
        "features.reject_partial_from_hours",
        // [[factors]]
        "factors",
        "factors.name",
        "factors.source",
        "factors.source.kind",
        "factors.source.hours",
        "factors.curve",
        "factors.curve.kind",
        "factors.curve.min",
        "factors.curve.max",
        "factors.curve.floor",
        "factors.curve.optimum",
        "factors.curve.sigma",
        "factors.curve.domain_min",
        "factors.curve.domain_max",
        "factors.curve.alpha",
        "factors.curve.beta",
        "factors.curve.scale",
        "factors.curve.recency",
        "factors.curve.recency.factor",
        "factors.curve.recency.threshold",
        "factors.curve.recency.source",
        "factors.curve.recency.source.kind",
        "factors.curve.recency.source.hours",
        "factors.curve.low_threshold",
        "factors.curve.sat_point",
        "factors.curve.decay_rate",
        "factors.curve.breakpoints",
        "factors.curve.breakpoints.x",
        "factors.curve.breakpoints.y",
        // [seasonal]
        "seasonal",
        "seasonal.default_weight",
        "seasonal.months",
        "seasonal.months.month",
        "seasonal.months.weight",
        // [lunar]
        "lunar",
        "lunar.mode",
        "lunar.boost",
        "lunar.baseline",
        "lunar.half_width",
        "lunar.synodic_period_days",
        "lunar.epoch",
        "lunar.epoch_phase",
        // [composition]
        "composition",
        "composition.strategy",
        "composition.weights",
        // [overrides]
        "overrides",
        "overrides.felt_source",
        "overrides.felt_source.kind",
        "overrides.felt_source.hours",
        "overrides.hard_veto_below_c",
        "overrides.soft_cold",
        "overrides.soft_cold.below_c",
        "overrides.soft_cold.damping",
        "overrides.dryness",
        "overrides.dryness.current_rain_below_mm",
        "overrides.dryness.window_hours",
        "overrides.dryness.window_rain_below_mm",
        "overrides.dryness.humidity_below_pct",
        "overrides.dryness.damping",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables nested in arrays are walked under the
/// array's own path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for key in walk_toml_keys(item, &path) {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        // Ties resolve alphabetically so suggestions are stable across runs
        let better = match best {
            None => true,
            Some((best_key, best_dist)) => dist < best_dist || (dist == best_dist && k < best_key),
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let found = walk_toml_keys(&value, "");
    let mut warnings = Vec::new();

    for key in &found {
        if known.contains(key.as_str()) {
            continue;
        }
        if DYNAMIC_KEY_PREFIXES.iter().any(|p| key.starts_with(p)) {
            continue;
        }
        let suggestion = suggest_correction(key, &known);
        warnings.push(ValidationWarning {
            field: key.clone(),
            message: format!("Unknown config key '{key}'"),
            suggestion,
        });
    }

    warnings
}

// ============================================================================
// Physical Range Validation
// ============================================================================

fn is_temperature(source: &FeatureSource) -> bool {
    matches!(
        source,
        FeatureSource::TemperatureMean { .. }
            | FeatureSource::ApparentTemperatureMean { .. }
            | FeatureSource::CurrentTemperature
            | FeatureSource::CurrentApparentTemperature
    )
}

fn plausible_temperature(field: String, value: f64, warnings: &mut Vec<ValidationWarning>) {
    if value < PLAUSIBLE_THRESHOLD_MIN_C || value > PLAUSIBLE_THRESHOLD_MAX_C {
        warnings.push(ValidationWarning {
            message: format!(
                "{field} = {value:.1} is outside typical range ({PLAUSIBLE_THRESHOLD_MIN_C}-{PLAUSIBLE_THRESHOLD_MAX_C} °C)"
            ),
            field,
            suggestion: None,
        });
    }
}

/// Validate physical ranges on a parsed ModelConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent scoring; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(config: &ModelConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let o = &config.overrides;

    // Relative humidity only exists between 0 and 100 %
    if let Some(dry) = &o.dryness {
        if !(0.0..=100.0).contains(&dry.humidity_below_pct) {
            errors.push(format!(
                "overrides.dryness.humidity_below_pct = {:.1} is outside physical range (0-100 %)",
                dry.humidity_below_pct
            ));
        }
        if dry.current_rain_below_mm < 0.0 || dry.window_rain_below_mm < 0.0 {
            errors.push("overrides.dryness: rain thresholds cannot be negative".to_string());
        }
        if dry.window_rain_below_mm > PLAUSIBLE_RAIN_MAX_MM {
            warnings.push(ValidationWarning {
                field: "overrides.dryness.window_rain_below_mm".to_string(),
                message: format!(
                    "overrides.dryness.window_rain_below_mm = {:.1} is above typical range (0-{PLAUSIBLE_RAIN_MAX_MM} mm)",
                    dry.window_rain_below_mm
                ),
                suggestion: None,
            });
        }
        if dry.window_hours > PLAUSIBLE_WINDOW_MAX_HOURS {
            warnings.push(ValidationWarning {
                field: "overrides.dryness.window_hours".to_string(),
                message: format!(
                    "overrides.dryness.window_hours = {} is longer than {PLAUSIBLE_WINDOW_MAX_HOURS} h",
                    dry.window_hours
                ),
                suggestion: None,
            });
        }
    }

    plausible_temperature(
        "overrides.hard_veto_below_c".to_string(),
        o.hard_veto_below_c,
        &mut warnings,
    );
    if let Some(soft) = &o.soft_cold {
        plausible_temperature(
            "overrides.soft_cold.below_c".to_string(),
            soft.below_c,
            &mut warnings,
        );
        // Below the veto threshold the soft rule can never change the outcome
        if soft.below_c <= o.hard_veto_below_c {
            warnings.push(ValidationWarning {
                field: "overrides.soft_cold.below_c".to_string(),
                message: format!(
                    "overrides.soft_cold.below_c = {:.1} is not above hard_veto_below_c = {:.1}; the rule has no effect",
                    soft.below_c, o.hard_veto_below_c
                ),
                suggestion: None,
            });
        }
    }

    for factor in &config.factors {
        if let Some(w) = factor.source.window() {
            if w.hours > PLAUSIBLE_WINDOW_MAX_HOURS {
                warnings.push(ValidationWarning {
                    field: format!("factors.{}.source.hours", factor.name),
                    message: format!(
                        "factor '{}' aggregates {} h, longer than {PLAUSIBLE_WINDOW_MAX_HOURS} h",
                        factor.name, w.hours
                    ),
                    suggestion: None,
                });
            }
        }
        if !is_temperature(&factor.source) {
            continue;
        }
        match &factor.curve {
            CurveConfig::LinearRamp { min, max, .. } | CurveConfig::AsymmetricBeta { min, max, .. } => {
                plausible_temperature(format!("factors.{}.curve.min", factor.name), *min, &mut warnings);
                plausible_temperature(format!("factors.{}.curve.max", factor.name), *max, &mut warnings);
            }
            CurveConfig::GaussianBump { optimum, .. } => {
                plausible_temperature(
                    format!("factors.{}.curve.optimum", factor.name),
                    *optimum,
                    &mut warnings,
                );
            }
            _ => {}
        }
    }

    // A period far from the synodic month makes the phase meaningless
    let period = config.lunar.synodic_period_days;
    if period.is_finite() && period > 0.0 && (period - SYNODIC_PERIOD_DAYS).abs() > 1.0 {
        warnings.push(ValidationWarning {
            field: "lunar.synodic_period_days".to_string(),
            message: format!(
                "lunar.synodic_period_days = {period:.3} differs from the mean synodic month ({SYNODIC_PERIOD_DAYS})"
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
