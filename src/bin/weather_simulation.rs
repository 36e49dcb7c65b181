//! Synthetic Weather Simulation
//!
//! Generates hourly weather series for exercising the migration scorer.
//! Scenarios:
//! - mild-rain: spring nights around 9 °C with evening drizzle
//! - cold-snap: mild start, then a front drops felt temperature below zero
//! - dry-spell: mild but rainless with dry air
//!
//! # Usage
//! ```bash
//! ./weather-simulation --scenario cold-snap --hours 96 --seed 7 > weather.jsonl
//! ./amphibian-migration table --weather weather.jsonl --from 2025-03-02 --nights 3
//! ```

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::io::{self, Write};

use amphibian_migration::WeatherSample;

// ============================================================================
// Climate Constants
// ============================================================================

/// Daily temperature swing, peak to mean (°C)
const DIURNAL_AMPLITUDE: f64 = 3.5;
/// Hour of the daily temperature peak (UTC)
const PEAK_HOUR: f64 = 15.0;
/// Felt-temperature drop per unit of wind (°C per m/s)
const WIND_CHILL_PER_MS: f64 = 0.35;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "weather-simulation")]
#[command(about = "Synthetic hourly weather for amphibian migration scoring")]
#[command(version = "1.0")]
struct Args {
    /// Weather scenario to simulate
    #[arg(long, value_enum, default_value = "mild-rain")]
    scenario: Scenario,

    /// Number of hourly samples (24-2160)
    #[arg(short = 'H', long, default_value = "168", value_parser = clap::value_parser!(u32).range(24..=2160))]
    hours: u32,

    /// First day of the series (UTC midnight)
    #[arg(long, default_value = "2025-03-01")]
    start: NaiveDate,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Suppress the run summary on stderr
    #[arg(short, long)]
    quiet: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

// ============================================================================
// Scenarios
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    MildRain,
    ColdSnap,
    DrySpell,
}

/// Weather regime at one point of the run.
#[derive(Debug, Clone, Copy)]
struct Regime {
    mean_temperature: f64,
    /// Chance of rain in any given evening/night hour
    rain_chance: f64,
    /// Mean rain of a wet hour (mm)
    rain_mean: f64,
    mean_humidity: f64,
    mean_wind: f64,
}

impl Scenario {
    fn name(&self) -> &'static str {
        match self {
            Scenario::MildRain => "Mild Rain (favourable migration nights)",
            Scenario::ColdSnap => "Cold Snap (front passes at 50%)",
            Scenario::DrySpell => "Dry Spell (no rain, dry air)",
        }
    }

    fn regime(&self, progress: f64) -> Regime {
        match self {
            Scenario::MildRain => Regime {
                mean_temperature: 9.0,
                rain_chance: 0.55,
                rain_mean: 0.8,
                mean_humidity: 88.0,
                mean_wind: 2.0,
            },
            Scenario::ColdSnap => {
                if progress < 0.5 {
                    Regime {
                        mean_temperature: 8.0,
                        rain_chance: 0.4,
                        rain_mean: 0.6,
                        mean_humidity: 85.0,
                        mean_wind: 2.5,
                    }
                } else {
                    Regime {
                        mean_temperature: -1.5,
                        rain_chance: 0.05,
                        rain_mean: 0.2,
                        mean_humidity: 70.0,
                        mean_wind: 6.0,
                    }
                }
            }
            Scenario::DrySpell => Regime {
                mean_temperature: 12.0,
                rain_chance: 0.0,
                rain_mean: 0.0,
                mean_humidity: 55.0,
                mean_wind: 3.0,
            },
        }
    }
}

// ============================================================================
// Simulation State
// ============================================================================

struct SimulationState {
    rng: StdRng,
    scenario: Scenario,
    start: DateTime<Utc>,
    total_hours: u32,
    // Slowly varying anomaly so consecutive days differ
    temperature_drift: f64,
    temperature_noise: Normal<f64>,
    humidity_noise: Normal<f64>,
    wind_noise: Normal<f64>,
    // Statistics
    wet_hours: u32,
    freezing_hours: u32,
}

impl SimulationState {
    fn new(scenario: Scenario, start: NaiveDate, total_hours: u32, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let Some(midnight) = start.and_hms_opt(0, 0, 0) else {
            anyhow::bail!("invalid start date {start}");
        };

        Ok(Self {
            rng,
            scenario,
            start: midnight.and_utc(),
            total_hours,
            temperature_drift: 0.0,
            temperature_noise: Normal::new(0.0, 0.6)?,
            humidity_noise: Normal::new(0.0, 4.0)?,
            wind_noise: Normal::new(0.0, 1.0)?,
            wet_hours: 0,
            freezing_hours: 0,
        })
    }

    fn sample(&mut self, hour: u32) -> WeatherSample {
        let timestamp = self.start + Duration::hours(i64::from(hour));
        let progress = f64::from(hour) / f64::from(self.total_hours);
        let regime = self.scenario.regime(progress);

        // Random walk on the daily anomaly, pulled back towards zero
        self.temperature_drift = 0.97 * self.temperature_drift + self.rng.gen_range(-0.15..0.15);

        let hour_of_day = f64::from(timestamp.hour());
        let diurnal =
            DIURNAL_AMPLITUDE * (std::f64::consts::TAU * (hour_of_day - PEAK_HOUR) / 24.0).cos();
        let air_temperature = regime.mean_temperature
            + diurnal
            + self.temperature_drift
            + self.temperature_noise.sample(&mut self.rng);

        let wind = (regime.mean_wind + self.wind_noise.sample(&mut self.rng)).max(0.0);
        let apparent_temperature = air_temperature - WIND_CHILL_PER_MS * wind;

        // Rain concentrates in the evening and night
        let evening = !(8..18).contains(&timestamp.hour());
        let chance = if evening {
            regime.rain_chance
        } else {
            regime.rain_chance * 0.4
        };
        let precipitation = if chance > 0.0 && self.rng.gen_bool(chance.min(1.0)) {
            self.wet_hours += 1;
            (regime.rain_mean * self.rng.gen_range(0.2..2.0) * 10.0).round() / 10.0
        } else {
            0.0
        };

        let wet_bonus = if precipitation > 0.0 { 6.0 } else { 0.0 };
        let relative_humidity = (regime.mean_humidity
            + wet_bonus
            + self.humidity_noise.sample(&mut self.rng))
        .clamp(20.0, 100.0);

        if apparent_temperature < 1.0 {
            self.freezing_hours += 1;
        }

        WeatherSample {
            timestamp,
            air_temperature: round1(air_temperature),
            apparent_temperature: Some(round1(apparent_temperature)),
            precipitation,
            relative_humidity: relative_humidity.round(),
        }
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn log_mission(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let mut state = SimulationState::new(args.scenario, args.start, args.hours, args.seed)?;

    log_mission(&"=".repeat(60), args.quiet);
    log_mission("WEATHER SIMULATION", args.quiet);
    log_mission(&format!("  Scenario: {}", args.scenario.name()), args.quiet);
    log_mission(&format!("  Start: {} ({} hours)", state.start, args.hours), args.quiet);
    if let Some(seed) = args.seed {
        log_mission(&format!("  Random seed: {seed}"), args.quiet);
    }
    log_mission(&"=".repeat(60), args.quiet);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.format == OutputFormat::Csv {
        writeln!(
            out,
            "timestamp,air_temperature,apparent_temperature,precipitation,relative_humidity"
        )?;
    }

    for hour in 0..args.hours {
        let sample = state.sample(hour);
        match args.format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&sample)?)?,
            OutputFormat::Csv => writeln!(
                out,
                "{},{:.1},{:.1},{:.1},{:.0}",
                sample.timestamp.to_rfc3339(),
                sample.air_temperature,
                sample.felt_temperature(),
                sample.precipitation,
                sample.relative_humidity
            )?,
        }
    }
    out.flush()?;

    log_mission(
        &format!(
            "Done: {} samples, {} wet hours, {} hours with felt temperature below 1 °C",
            args.hours, state.wet_hours, state.freezing_hours
        ),
        args.quiet,
    );
    Ok(())
}
