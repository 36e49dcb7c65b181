//! Lunar phase calculator
//!
//! Phase fraction is measured in synodic months since a reference epoch and
//! normalized so that 0.0 is new moon and 0.5 is full moon, whichever phase
//! the epoch itself marks.

use chrono::{DateTime, Utc};
use std::f64::consts::TAU;

use crate::config::{EpochPhase, LunarConfig, LunarMode};
use crate::types::LunarReading;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fraction of the synodic cycle elapsed at `t`, in `[0, 1)`.
///
/// Pure function of `t`; instants before the epoch wrap around.
pub fn phase_fraction(t: DateTime<Utc>, config: &LunarConfig) -> f64 {
    let days = (t - config.epoch).num_milliseconds() as f64 / MILLIS_PER_DAY;
    let offset = match config.epoch_phase {
        EpochPhase::NewMoon => 0.0,
        EpochPhase::FullMoon => 0.5,
    };
    let fraction = (days / config.synodic_period_days + offset).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if fraction >= 1.0 {
        0.0
    } else {
        fraction
    }
}

/// Modulation factor for a phase fraction under the configured mode.
pub fn modulation(phase: f64, config: &LunarConfig) -> f64 {
    let from_full = (phase - 0.5).abs();
    match config.mode {
        LunarMode::Disabled => 1.0,
        LunarMode::Continuous => config.baseline + config.boost * (TAU * from_full).cos(),
        LunarMode::Binary => {
            if from_full < config.half_width {
                config.baseline + config.boost
            } else {
                config.baseline
            }
        }
    }
}

/// Phase and modulation at `t`.
pub fn reading(t: DateTime<Utc>, config: &LunarConfig) -> LunarReading {
    let phase_fraction = phase_fraction(t, config);
    LunarReading {
        phase_fraction,
        modulation: modulation(phase_fraction, config),
    }
}
