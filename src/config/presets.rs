//! Built-in model presets
//!
//! - `Weighted`: the additive dashboard model. Linear ramps, a binary
//!   full-moon bonus and a weighted seasonal term. Default for empty configs.
//! - `Conjunctive`: multiplicative model. Bell-shaped temperature response,
//!   saturating rain with a recency boost, continuous lunar modulation and
//!   soft-cold / dryness damping.

use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

use super::model_config::*;
use crate::types::FeatureSource;

/// Named model configurations selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelPreset {
    #[default]
    Weighted,
    Conjunctive,
}

impl ModelPreset {
    pub fn config(self) -> ModelConfig {
        match self {
            ModelPreset::Weighted => weighted(),
            ModelPreset::Conjunctive => conjunctive(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelPreset::Weighted => "weighted",
            ModelPreset::Conjunctive => "conjunctive",
        }
    }
}

impl std::str::FromStr for ModelPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weighted" | "additive" => Ok(ModelPreset::Weighted),
            "conjunctive" | "multiplicative" => Ok(ModelPreset::Conjunctive),
            other => Err(format!(
                "unknown preset '{other}' (expected 'weighted' or 'conjunctive')"
            )),
        }
    }
}

impl std::fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn factor(name: &str, source: FeatureSource, curve: CurveConfig) -> FactorConfig {
    FactorConfig {
        name: name.to_string(),
        source,
        curve,
    }
}

fn months(entries: &[(u32, f64)]) -> Vec<MonthWeight> {
    entries
        .iter()
        .map(|&(month, weight)| MonthWeight { month, weight })
        .collect()
}

// ============================================================================
// Weighted (additive)
// ============================================================================

pub fn weighted() -> ModelConfig {
    ModelConfig {
        model: weighted_info(),
        features: FeatureConfig::default(),
        factors: weighted_factors(),
        seasonal: weighted_seasonal(),
        lunar: weighted_lunar(),
        composition: weighted_composition(),
        overrides: OverrideConfig::default(),
    }
}

pub(crate) fn weighted_info() -> ModelInfo {
    ModelInfo {
        name: "weighted".to_string(),
        description: "Additive weighted sum of linear ramps".to_string(),
    }
}

pub(crate) fn weighted_factors() -> Vec<FactorConfig> {
    let temperature_ramp = CurveConfig::LinearRamp {
        min: 3.0,
        max: 13.0,
        floor: 0.0,
    };
    let rain_ramp = CurveConfig::LinearRamp {
        min: 0.0,
        max: 3.0,
        floor: 0.0,
    };
    vec![
        factor(
            "temp_8h",
            FeatureSource::TemperatureMean { hours: 8 },
            temperature_ramp.clone(),
        ),
        factor(
            "felt_2h",
            FeatureSource::ApparentTemperatureMean { hours: 2 },
            temperature_ramp,
        ),
        factor(
            "rain_8h",
            FeatureSource::PrecipitationSum { hours: 8 },
            rain_ramp.clone(),
        ),
        factor("rain_current", FeatureSource::CurrentPrecipitation, rain_ramp),
    ]
}

pub(crate) fn weighted_seasonal() -> SeasonalTable {
    SeasonalTable {
        default_weight: super::defaults::OFF_SEASON_WEIGHT,
        months: months(&[(1, 0.8), (2, 0.9), (3, 1.0), (4, 0.8), (9, 0.7), (10, 0.7)]),
    }
}

pub(crate) fn weighted_lunar() -> LunarConfig {
    LunarConfig {
        mode: LunarMode::Binary,
        boost: 1.0,
        baseline: 0.0,
        epoch: Utc
            .with_ymd_and_hms(2024, 1, 25, 18, 54, 0)
            .single()
            .unwrap_or_else(default_epoch),
        epoch_phase: EpochPhase::FullMoon,
        ..LunarConfig::default()
    }
}

pub(crate) fn weighted_composition() -> Composition {
    let weights: BTreeMap<String, f64> = [
        (SEASON_KEY, 0.15),
        ("temp_8h", 0.25),
        ("felt_2h", 0.20),
        ("rain_8h", 0.15),
        ("rain_current", 0.15),
        (LUNAR_KEY, 0.10),
    ]
    .into_iter()
    .map(|(k, w)| (k.to_string(), w))
    .collect();
    Composition::Additive { weights }
}

// ============================================================================
// Conjunctive (multiplicative)
// ============================================================================

pub fn conjunctive() -> ModelConfig {
    ModelConfig {
        model: ModelInfo {
            name: "conjunctive".to_string(),
            description: "Product of bell, beta and saturating factors".to_string(),
        },
        features: FeatureConfig::default(),
        factors: vec![
            factor(
                "felt_2h",
                FeatureSource::ApparentTemperatureMean { hours: 2 },
                CurveConfig::GaussianBump {
                    optimum: 10.0,
                    sigma: 4.0,
                    domain_min: 2.0,
                    domain_max: 20.0,
                    floor: 0.05,
                },
            ),
            factor(
                "temp_8h",
                FeatureSource::TemperatureMean { hours: 8 },
                CurveConfig::AsymmetricBeta {
                    min: 0.0,
                    max: 20.0,
                    alpha: 3.0,
                    beta: 2.0,
                },
            ),
            factor(
                "rain_8h",
                FeatureSource::PrecipitationSum { hours: 8 },
                CurveConfig::LogSaturation {
                    scale: 2.4,
                    recency: Some(RecencyBoost {
                        factor: 1.2,
                        threshold: 0.5,
                        source: FeatureSource::PrecipitationSum { hours: 2 },
                    }),
                },
            ),
            factor(
                "rain_current",
                FeatureSource::CurrentPrecipitation,
                CurveConfig::DrizzleSaturation {
                    low_threshold: 0.1,
                    sat_point: 1.5,
                    decay_rate: 0.2,
                    floor: 0.1,
                },
            ),
            factor(
                "humidity",
                FeatureSource::CurrentHumidity,
                CurveConfig::Step {
                    breakpoints: vec![
                        Breakpoint { x: 40.0, y: 0.3 },
                        Breakpoint { x: 60.0, y: 0.5 },
                        Breakpoint { x: 75.0, y: 1.0 },
                        Breakpoint { x: 100.0, y: 1.1 },
                    ],
                },
            ),
        ],
        seasonal: SeasonalTable {
            default_weight: 0.05,
            months: months(&[(2, 0.6), (3, 1.0), (4, 0.9), (9, 0.4), (10, 0.5)]),
        },
        lunar: LunarConfig {
            mode: LunarMode::Continuous,
            boost: 0.1,
            baseline: 1.0,
            ..LunarConfig::default()
        },
        composition: Composition::Multiplicative,
        overrides: OverrideConfig {
            soft_cold: Some(SoftColdRule {
                below_c: 4.0,
                damping: 0.6,
            }),
            dryness: Some(DrynessRule {
                current_rain_below_mm: 0.1,
                window_hours: 8,
                window_rain_below_mm: 0.5,
                humidity_below_pct: 70.0,
                damping: 0.3,
            }),
            ..OverrideConfig::default()
        },
    }
}
