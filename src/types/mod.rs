//! Shared data structures for the migration scoring pipeline
//!
//! - `weather`: WeatherSample / WeatherSeries (provider input)
//! - `features`: LookbackWindow, FeatureSource, FeatureSet (extractor output)
//! - `score`: ScoreResult and its breakdown (engine output)

mod features;
mod score;
mod weather;

pub use features::*;
pub use score::*;
pub use weather::*;
