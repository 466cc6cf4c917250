//! Audio analysis configuration and constants.

use super::ConfigError;

/// Analysis window size in samples (fixed; the snapshot has half as many bins)
pub const ANALYSER_FFT_SIZE: usize = 512;

/// Number of magnitude bins in a frequency snapshot
pub const FREQUENCY_BIN_COUNT: usize = ANALYSER_FFT_SIZE / 2;

/// Spectrum analyser configuration
///
/// The defaults reproduce the usual browser analyser behaviour: 80% temporal
/// smoothing and a -100..-30 dB window mapped onto 0..=255.
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// Weight of the previous frame's magnitude (0 = no smoothing)
    pub smoothing_time_constant: f32,

    /// Level mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Level mapped to byte 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Centre frequency (Hz) of bin `index` at the given sample rate
    pub fn bin_to_hz(&self, index: usize, sample_rate_hz: u32) -> f32 {
        index as f32 * sample_rate_hz as f32 / ANALYSER_FFT_SIZE as f32
    }

    /// Validate configuration (smoothing in 0..1, sane decibel window)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(ConfigError::Invalid(format!(
                "smoothing_time_constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(ConfigError::Invalid(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Glicol block size (samples per buffer)
    pub const BLOCK_SIZE: usize = 128;

    /// Sample rate of the synthesized default track (Hz)
    pub const DEFAULT_TRACK_SAMPLE_RATE: u32 = 44100;

    /// Length of the synthesized default track (seconds, looped on playback)
    pub const DEFAULT_TRACK_SECONDS: f32 = 8.0;

    /// Output rate used when no audio device is involved (Hz)
    pub const HEADLESS_SAMPLE_RATE: u32 = 44100;

    /// Upper bound on fetched audio payloads (bytes)
    pub const MAX_FETCH_BYTES: u64 = 64 * 1024 * 1024;

    /// Network timeout for URL sources (seconds)
    pub const FETCH_TIMEOUT_SECS: u64 = 10;
}
