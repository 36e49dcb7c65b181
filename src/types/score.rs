//! Scoring output and its diagnostic breakdown

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LookbackWindow;

/// Final result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub timestamp: DateTime<Utc>,
    /// Migration likelihood, 0-100
    pub score: u8,
    /// Composed score (base × 100) before override rules and clamping
    pub base_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

/// Per-factor diagnostics attached when the engine runs with breakdowns enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorContribution>,
    pub seasonal_weight: f64,
    pub lunar: LunarReading,
    /// Override rules that changed the score, in the order they ran
    pub overrides: Vec<OverrideKind>,
    pub partial_windows: Vec<LookbackWindow>,
    pub current_is_exact: bool,
}

/// One normalized factor and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub name: String,
    /// Raw physical input fed to the response curve
    pub input: f64,
    /// Unit-scale factor the curve produced
    pub factor: f64,
    /// Additive weight, `None` under multiplicative composition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Lunar phase and the modulation it produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunarReading {
    /// 0 = new moon, 0.5 = full moon
    pub phase_fraction: f64,
    pub modulation: f64,
}

/// Post-composition rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    /// Felt temperature under the soft-cold threshold; score damped
    SoftCold,
    /// Dry air and no recent rain; score damped
    Dryness,
    /// Felt temperature under the absolute floor; score forced to 0
    HardVeto,
}

impl std::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideKind::SoftCold => write!(f, "soft_cold"),
            OverrideKind::Dryness => write!(f, "dryness"),
            OverrideKind::HardVeto => write!(f, "hard_veto"),
        }
    }
}
