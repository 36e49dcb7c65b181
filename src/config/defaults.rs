//! System-wide default constants.
//!
//! Centralises the magic numbers of the scoring model. Grouped by subsystem
//! for easy discovery.

// ============================================================================
// Weather Samples
// ============================================================================

/// Nominal spacing between samples (hours).
pub const SAMPLE_CADENCE_HOURS: i64 = 1;

/// Lowest plausible temperature (°C); colder readings are clamped.
pub const TEMPERATURE_MIN_C: f64 = -80.0;

/// Highest plausible temperature (°C); warmer readings are clamped.
pub const TEMPERATURE_MAX_C: f64 = 60.0;

pub const HUMIDITY_MIN_PCT: f64 = 0.0;
pub const HUMIDITY_MAX_PCT: f64 = 100.0;

// ============================================================================
// Normalizers
// ============================================================================

/// Value a linear ramp returns at or below its lower bound.
pub const LINEAR_RAMP_FLOOR: f64 = 0.1;

/// Value a gaussian bump returns outside its hard domain.
pub const GAUSSIAN_FLOOR: f64 = 0.05;

// ============================================================================
// Lunar Phase
// ============================================================================

/// Mean synodic month (days).
pub const SYNODIC_PERIOD_DAYS: f64 = 29.53059;

/// Reference new moon, 2000-01-06 18:14 UTC.
pub const REFERENCE_NEW_MOON: &str = "2000-01-06T18:14:00Z";

/// Half-width of the binary full-moon band (phase fraction).
///
/// 0.07 of a cycle is ~2 days either side of full moon.
pub const FULL_MOON_HALF_WIDTH: f64 = 0.07;

// ============================================================================
// Seasonal Table
// ============================================================================

/// Weight for months missing from the table (off-season suppression).
pub const OFF_SEASON_WEIGHT: f64 = 0.01;

// ============================================================================
// Overrides
// ============================================================================

/// Felt temperature (°C) under which the score is forced to 0.
pub const HARD_VETO_BELOW_C: f64 = 1.0;

/// Window (hours) backing the felt-temperature override source.
pub const FELT_TEMPERATURE_WINDOW_HOURS: u32 = 2;

// ============================================================================
// Score
// ============================================================================

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Base scores are unit-scale; multiply by this to get the 0-100 scale.
pub const SCORE_SCALE: f64 = 100.0;

// ============================================================================
// Physical Range Checks
// ============================================================================

/// Temperature thresholds outside this range trigger a config warning (°C).
pub const PLAUSIBLE_THRESHOLD_MIN_C: f64 = -30.0;
pub const PLAUSIBLE_THRESHOLD_MAX_C: f64 = 45.0;

/// Rainfall thresholds above this trigger a config warning (mm).
pub const PLAUSIBLE_RAIN_MAX_MM: f64 = 100.0;

/// Windows longer than this trigger a config warning (hours). 336 = 14 days.
pub const PLAUSIBLE_WINDOW_MAX_HOURS: u32 = 336;
