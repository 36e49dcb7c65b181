//! amphibian-migration - score migration likelihood from hourly weather
//!
//! # Usage
//!
//! ```bash
//! # Score one evening from a JSON-lines weather file
//! amphibian-migration score --weather weather.jsonl --at 2025-03-14T21:00:00Z
//!
//! # Seven-night table at 21:00 UTC with the conjunctive model
//! amphibian-migration --preset conjunctive table --weather export.csv --from 2025-03-14 --nights 7
//!
//! # Validate and print the effective config
//! amphibian-migration --config model_config.toml check-config
//! amphibian-migration print-config > model_config.toml
//! ```
//!
//! # Environment Variables
//!
//! - `MIGRATION_CONFIG`: Path to the model TOML (used when neither `--config` nor `--preset` is given)
//! - `RUST_LOG`: Logging level (default: info)
//!
//! Results are JSON on stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use amphibian_migration::provider::{provider_for_path, FetchRequest, Location};
use amphibian_migration::{nightly_timestamps, ModelConfig, ModelPreset, ScoringEngine};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "amphibian-migration")]
#[command(about = "Amphibian migration likelihood from hourly weather")]
#[command(version)]
struct CliArgs {
    /// Model config TOML (overrides MIGRATION_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Built-in model preset instead of a config file (weighted | conjunctive)
    #[arg(long, global = true, conflicts_with = "config")]
    preset: Option<ModelPreset>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Score a single evaluation instant
    Score {
        #[command(flatten)]
        weather: WeatherArgs,

        /// Evaluation instant (RFC 3339)
        #[arg(long)]
        at: DateTime<Utc>,

        /// Include the per-factor breakdown
        #[arg(long)]
        breakdown: bool,
    },

    /// Score consecutive nights at a fixed hour (forecast table)
    Table {
        #[command(flatten)]
        weather: WeatherArgs,

        /// First night (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Number of nights
        #[arg(long, default_value = "7")]
        nights: u32,

        /// Evaluation hour of day (UTC)
        #[arg(long, default_value = "21")]
        hour: u32,

        /// Include per-factor breakdowns
        #[arg(long)]
        breakdown: bool,
    },

    /// Validate the model config and report warnings
    CheckConfig,

    /// Print the effective model config as TOML
    PrintConfig,
}

#[derive(clap::Args, Debug)]
struct WeatherArgs {
    /// Weather file: .csv (Open-Meteo columns accepted) or JSON lines
    #[arg(long, value_name = "PATH")]
    weather: PathBuf,

    /// Latitude of the site
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the site
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    lon: f64,
}

// ============================================================================
// Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve the model: `--preset`, then `--config`, then the standard search.
fn resolve_config(args: &CliArgs) -> Result<ModelConfig> {
    if let Some(preset) = args.preset {
        info!(preset = %preset, "Using built-in preset");
        return Ok(preset.config());
    }
    if let Some(path) = &args.config {
        let config = ModelConfig::load_from_file(path)
            .with_context(|| format!("loading model config {}", path.display()))?;
        info!(path = %path.display(), model = %config.model.name, "Loaded model config");
        return Ok(config);
    }
    Ok(ModelConfig::load())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_table(
    engine: &ScoringEngine<'_>,
    weather: &WeatherArgs,
    timestamps: &[DateTime<Utc>],
) -> Result<()> {
    let location = Location::new(weather.lat, weather.lon)?;
    let Some(request) = FetchRequest::for_evaluations(
        location,
        timestamps,
        engine.config().required_history_hours(),
    ) else {
        bail!("no evaluation instants requested");
    };

    let provider = provider_for_path(&weather.weather);
    let series = provider
        .fetch(&request)
        .with_context(|| format!("fetching weather from {}", provider.provider_name()))?;
    info!(
        provider = provider.provider_name(),
        samples = series.len(),
        clamped = series.quality().clamped,
        dropped = series.quality().dropped,
        "Weather loaded"
    );

    let mut rows = Vec::with_capacity(timestamps.len());
    for (t, result) in timestamps.iter().zip(engine.score_series(&series, timestamps)) {
        match result {
            Ok(score) => rows.push(serde_json::to_value(score)?),
            Err(e) => {
                warn!(timestamp = %t, error = %e, "Evaluation failed");
                rows.push(serde_json::json!({ "timestamp": t, "error": e.to_string() }));
            }
        }
    }
    print_json(&rows)
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    match &args.command {
        SubCommand::CheckConfig => {
            // Unknown keys and suspicious ranges are logged while loading
            let config = resolve_config(&args)?;
            config.validate()?;
            info!(
                model = %config.model.name,
                factors = config.factors.len(),
                history_hours = config.required_history_hours(),
                "Model config is valid"
            );
            print_json(&serde_json::json!({
                "valid": true,
                "model": config.model.name,
                "required_history_hours": config.required_history_hours(),
            }))
        }
        SubCommand::PrintConfig => {
            let config = resolve_config(&args)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        SubCommand::Score {
            weather,
            at,
            breakdown,
        } => {
            let config = resolve_config(&args)?;
            let engine = ScoringEngine::new(&config)?.with_breakdown(*breakdown);
            let location = Location::new(weather.lat, weather.lon)?;
            let Some(request) =
                FetchRequest::for_evaluations(location, &[*at], config.required_history_hours())
            else {
                bail!("no evaluation instant");
            };
            let provider = provider_for_path(&weather.weather);
            let series = provider.fetch(&request)?;
            let result = engine
                .score(&series, *at)
                .with_context(|| format!("scoring {at}"))?;
            print_json(&result)
        }
        SubCommand::Table {
            weather,
            from,
            nights,
            hour,
            breakdown,
        } => {
            if *hour > 23 {
                bail!("--hour must be 0-23, got {hour}");
            }
            let config = resolve_config(&args)?;
            let engine = ScoringEngine::new(&config)?.with_breakdown(*breakdown);
            let timestamps = nightly_timestamps(*from, *nights, *hour);
            run_table(&engine, weather, &timestamps)
        }
    }
}
