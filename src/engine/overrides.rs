//! Post-composition override rules
//!
//! Fixed order: soft cold, dryness, hard veto. The veto runs last and
//! always wins.

use crate::config::OverrideConfig;
use crate::types::OverrideKind;

/// Feature values the override rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrideInputs {
    /// Value of the configured felt-temperature source (°C)
    pub felt_temperature: f64,
    pub current_precipitation: f64,
    /// Rain sum over the dryness window, when a dryness rule is configured
    pub window_precipitation: Option<f64>,
    pub relative_humidity: f64,
}

/// Apply the configured rules to a 0-100 scale score.
///
/// Returns the adjusted score and the rules that fired, in order.
pub fn apply_overrides(
    score: f64,
    inputs: &OverrideInputs,
    rules: &OverrideConfig,
) -> (f64, Vec<OverrideKind>) {
    let mut score = score;
    let mut fired = Vec::new();

    if let Some(soft) = &rules.soft_cold {
        if inputs.felt_temperature < soft.below_c {
            score *= soft.damping;
            fired.push(OverrideKind::SoftCold);
        }
    }

    if let (Some(dry), Some(window_rain)) = (&rules.dryness, inputs.window_precipitation) {
        if inputs.current_precipitation < dry.current_rain_below_mm
            && window_rain < dry.window_rain_below_mm
            && inputs.relative_humidity < dry.humidity_below_pct
        {
            score *= dry.damping;
            fired.push(OverrideKind::Dryness);
        }
    }

    if inputs.felt_temperature < rules.hard_veto_below_c {
        score = 0.0;
        fired.push(OverrideKind::HardVeto);
    }

    (score, fired)
}
