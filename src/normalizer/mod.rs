//! Response curves mapping physical quantities to unit-scale factors
//!
//! Every curve is a pure, total function: out-of-domain inputs are clamped,
//! NaN inputs resolve to the curve's lowest value. Most curves stay inside
//! [0, 1]; step curves and recency boosts may exceed 1 as mild bonuses.
//!
//! - Linear ramp: temperature and rainfall-sum activation thresholds
//! - Gaussian bump: single-peaked temperature preference
//! - Asymmetric beta: skewed activation (slow rise, sharper fall)
//! - Log saturation: accumulated rain with an optional recency boost
//! - Drizzle saturation: light rain good, downpour bad (non-monotonic)
//! - Step / plateau: piecewise-linear humidity response

use statrs::distribution::{Beta, Continuous};

use crate::config::{Breakpoint, CurveConfig};

// ============================================================================
// Curve Functions
// ============================================================================

/// Linear ramp between two activation bounds
///
/// Formula: floor + (1 - floor) × (x - min) / (max - min)
///
/// Returns `floor` at/below `min` and 1.0 at/above `max`.
pub fn linear_ramp(x: f64, min: f64, max: f64, floor: f64) -> f64 {
    if x.is_nan() || x <= min {
        return floor;
    }
    if x >= max {
        return 1.0;
    }
    floor + (1.0 - floor) * (x - min) / (max - min)
}

/// Gaussian preference around an optimum
///
/// Formula: exp(-0.5 × ((x - optimum) / sigma)²)
///
/// Outside `[domain_min, domain_max]` the tail is replaced by `floor`, and
/// inside the domain the bump never drops under it.
pub fn gaussian_bump(
    x: f64,
    optimum: f64,
    sigma: f64,
    domain_min: f64,
    domain_max: f64,
    floor: f64,
) -> f64 {
    if x.is_nan() || x < domain_min || x > domain_max {
        return floor;
    }
    let z = (x - optimum) / sigma;
    (-0.5 * z * z).exp().max(floor)
}

/// Beta-shaped activation rescaled so its peak is 1.0
///
/// x is normalized to n ∈ [0, 1] over `[min, max]`, then
/// f(n) = pdf(n) / pdf(mode) with mode = (α - 1) / (α + β - 2).
///
/// α > β skews the peak towards `max`: a slow rise and a sharp fall.
/// Requires α > 1 and β > 1 (enforced by config validation); anything
/// else evaluates to 0.
pub fn asymmetric_beta(x: f64, min: f64, max: f64, alpha: f64, beta: f64) -> f64 {
    if x.is_nan() || alpha <= 1.0 || beta <= 1.0 || max <= min {
        return 0.0;
    }
    let n = ((x - min) / (max - min)).clamp(0.0, 1.0);
    let Ok(dist) = Beta::new(alpha, beta) else {
        return 0.0;
    };
    let mode = (alpha - 1.0) / (alpha + beta - 2.0);
    let peak = dist.pdf(mode);
    if peak <= 0.0 || !peak.is_finite() {
        return 0.0;
    }
    (dist.pdf(n) / peak).clamp(0.0, 1.0)
}

/// Logarithmic saturation of an accumulated quantity
///
/// Formula: min(1, ln(1 + 2x) / scale)
///
/// Negative inputs clamp to 0. When `boost` is `Some(factor)` the saturated
/// value is multiplied by it.
pub fn log_saturation(x: f64, scale: f64, boost: Option<f64>) -> f64 {
    let x = if x.is_nan() { 0.0 } else { x.max(0.0) };
    let base = ((2.0 * x).ln_1p() / scale).min(1.0);
    match boost {
        Some(factor) => base * factor,
        None => base,
    }
}

/// Light-rain preference that turns against heavy rain
///
/// - x < low_threshold: `floor`
/// - low_threshold ≤ x ≤ sat_point: linear from `floor` to 1.0
/// - x > sat_point: max(floor, 1 - decay_rate × (x - sat_point))
pub fn drizzle_saturation(
    x: f64,
    low_threshold: f64,
    sat_point: f64,
    decay_rate: f64,
    floor: f64,
) -> f64 {
    if x.is_nan() || x < low_threshold {
        return floor;
    }
    if x <= sat_point {
        return floor + (1.0 - floor) * (x - low_threshold) / (sat_point - low_threshold);
    }
    (1.0 - decay_rate * (x - sat_point)).max(floor)
}

/// Piecewise-linear interpolation through `breakpoints`
///
/// Flat beyond the first and last breakpoint. Breakpoints must be sorted by
/// x (enforced by config validation). An empty slice evaluates to 0.
pub fn step_plateau(x: f64, breakpoints: &[Breakpoint]) -> f64 {
    let (Some(first), Some(last)) = (breakpoints.first(), breakpoints.last()) else {
        return 0.0;
    };
    if x.is_nan() || x <= first.x {
        return first.y;
    }
    if x >= last.x {
        return last.y;
    }
    // First breakpoint strictly right of x; 1..len by the guards above
    let idx = breakpoints.partition_point(|bp| bp.x <= x);
    let (lo, hi) = (breakpoints[idx - 1], breakpoints[idx]);
    lo.y + (hi.y - lo.y) * (x - lo.x) / (hi.x - lo.x)
}

// ============================================================================
// Config Dispatch
// ============================================================================

impl CurveConfig {
    /// Evaluate the configured curve at `x`.
    ///
    /// `companion` feeds the recency boost of a log-saturation curve and is
    /// ignored by every other kind.
    pub fn evaluate(&self, x: f64, companion: Option<f64>) -> f64 {
        match self {
            CurveConfig::LinearRamp { min, max, floor } => linear_ramp(x, *min, *max, *floor),
            CurveConfig::GaussianBump {
                optimum,
                sigma,
                domain_min,
                domain_max,
                floor,
            } => gaussian_bump(x, *optimum, *sigma, *domain_min, *domain_max, *floor),
            CurveConfig::AsymmetricBeta {
                min,
                max,
                alpha,
                beta,
            } => asymmetric_beta(x, *min, *max, *alpha, *beta),
            CurveConfig::LogSaturation { scale, recency } => {
                let boost = recency.as_ref().and_then(|r| {
                    companion
                        .filter(|&c| c > r.threshold)
                        .map(|_| r.factor)
                });
                log_saturation(x, *scale, boost)
            }
            CurveConfig::DrizzleSaturation {
                low_threshold,
                sat_point,
                decay_rate,
                floor,
            } => drizzle_saturation(x, *low_threshold, *sat_point, *decay_rate, *floor),
            CurveConfig::Step { breakpoints } => step_plateau(x, breakpoints),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CurveConfig::LinearRamp { .. } => "linear_ramp",
            CurveConfig::GaussianBump { .. } => "gaussian_bump",
            CurveConfig::AsymmetricBeta { .. } => "asymmetric_beta",
            CurveConfig::LogSaturation { .. } => "log_saturation",
            CurveConfig::DrizzleSaturation { .. } => "drizzle_saturation",
            CurveConfig::Step { .. } => "step",
        }
    }
}
