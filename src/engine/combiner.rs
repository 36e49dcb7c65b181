//! Factor composition strategies
//!
//! Additive is compensating: a weak factor is diluted by the others.
//! Multiplicative is conjunctive: any near-zero factor collapses the score.

use crate::config::{Composition, LUNAR_KEY, SEASON_KEY};

impl Composition {
    /// Additive weight attached to a factor, `None` under multiplicative
    /// composition or when the factor is not weighted.
    pub fn weight_of(&self, name: &str) -> Option<f64> {
        match self {
            Composition::Additive { weights } => weights.get(name).copied(),
            Composition::Multiplicative => None,
        }
    }
}

/// Merge normalized factors into a unit-scale base score.
///
/// `factors` are `(name, value)` pairs of the configured factors. Under
/// additive composition `season` and `lunar` join the weighted sum when the
/// weights name them, and otherwise scale the sum.
pub fn combine(
    composition: &Composition,
    factors: &[(&str, f64)],
    seasonal_weight: f64,
    lunar_modulation: f64,
) -> f64 {
    match composition {
        Composition::Additive { weights } => {
            let weight = |name: &str| weights.get(name).copied().unwrap_or(0.0);
            let mut sum: f64 = factors.iter().map(|&(name, f)| weight(name) * f).sum();
            let mut scale = 1.0;

            for (key, value) in [(SEASON_KEY, seasonal_weight), (LUNAR_KEY, lunar_modulation)] {
                if weights.contains_key(key) {
                    sum += weight(key) * value;
                } else {
                    scale *= value;
                }
            }
            sum * scale
        }
        Composition::Multiplicative => {
            factors.iter().map(|&(_, f)| f).product::<f64>() * seasonal_weight * lunar_modulation
        }
    }
}
