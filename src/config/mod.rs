//! Model Configuration Module
//!
//! Every tunable of the scoring model: factor curves, composition weights,
//! the seasonal table, lunar modulation and the override rules.
//!
//! ## Loading Order
//!
//! 1. `MIGRATION_CONFIG` environment variable (path to TOML file)
//! 2. `model_config.toml` in the current working directory
//! 3. Built-in defaults (Weighted preset)
//!
//! ## Usage
//!
//! ```ignore
//! let config = ModelConfig::load();
//! let engine = ScoringEngine::new(&config)?;
//! ```
//!
//! Configs are plain values passed into the engine. Nothing here is global,
//! so several models can score side by side.

pub mod defaults;
mod model_config;
pub mod presets;
pub mod validation;

pub use model_config::*;
pub use presets::ModelPreset;
