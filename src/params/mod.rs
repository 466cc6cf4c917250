//! Parameter definitions with documented units and semantics.
//!
//! All tunable numbers live here with:
//! - Documented ranges and meanings
//! - `Default` values matching the stock visual tuning
//! - Validation where a bad value would break the field math

mod audio;
mod config;
mod terrain;

// Re-export all types
pub use audio::{audio_constants, AnalyserConfig, ANALYSER_FFT_SIZE, FREQUENCY_BIN_COUNT};
pub use config::{load_config, ConfigError, NoiseConfig, NoiseKind, VisualizerConfig};
pub use terrain::{Color, TerrainParams, MAX_SEGMENTS};
