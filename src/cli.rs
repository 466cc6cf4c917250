//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::audio::AudioSource;
use crate::params::{load_config, ConfigError, NoiseKind, VisualizerConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "music-terrain")]
#[command(about = "Audio-reactive terrain field driven by live spectrum analysis", long_about = None)]
pub struct Args {
    /// Audio to play: http(s) URL or local path
    #[arg(long, value_name = "URL|PATH", conflicts_with = "default_track")]
    pub audio: Option<String>,

    /// Play the built-in synthesized track
    #[arg(long)]
    pub default_track: bool,

    /// TOML config file (terrain and noise sections)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Grid subdivisions per side (overrides config)
    #[arg(long)]
    pub segments: Option<usize>,

    /// Height per unit of audio energy (overrides config)
    #[arg(long)]
    pub audio_strength: Option<f32>,

    /// Scroll speed (overrides config)
    #[arg(long)]
    pub speed: Option<f32>,

    /// Noise algorithm (overrides config)
    #[arg(long, value_enum)]
    pub noise: Option<NoiseKind>,

    /// Noise seed (overrides config)
    #[arg(long)]
    pub seed: Option<u32>,

    /// Shaded surface instead of wireframe
    #[arg(long)]
    pub solid: bool,

    /// How long to run (seconds of simulated time)
    #[arg(long, value_name = "SECONDS", default_value_t = 10.0)]
    pub duration: f32,

    /// Frame rate of the update loop
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// No audio device: advance playback from the frame clock, as fast as possible
    #[arg(long)]
    pub headless: bool,

    /// Write the final frame as a top-down PNG
    #[arg(long, value_name = "PNG")]
    pub snapshot: Option<PathBuf>,

    /// Pixels per grid cell in the snapshot
    #[arg(long, default_value_t = 8)]
    pub snapshot_scale: u32,
}

impl Args {
    /// Audio source selected on the command line, if any
    pub fn audio_source(&self) -> Option<AudioSource> {
        if self.default_track {
            Some(AudioSource::Default)
        } else {
            self.audio.clone().map(AudioSource::Url)
        }
    }

    /// Config file (or defaults) with command-line overrides applied
    pub fn build_config(&self) -> Result<VisualizerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => VisualizerConfig::default(),
        };

        let terrain = &mut config.terrain;
        if let Some(segments) = self.segments {
            terrain.segments = segments;
        }
        if let Some(strength) = self.audio_strength {
            terrain.audio_strength = strength;
        }
        if let Some(speed) = self.speed {
            terrain.speed = speed;
        }
        if self.solid {
            terrain.wireframe = false;
        }
        if let Some(kind) = self.noise {
            config.noise.kind = kind;
        }
        if let Some(seed) = self.seed {
            config.noise.seed = seed;
        }

        config.terrain.validate()?;
        Ok(config)
    }

    /// Seconds per frame
    pub fn frame_time(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Number of frames to run
    pub fn total_frames(&self) -> usize {
        (self.duration.max(0.0) * self.fps.max(1) as f32).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("music-terrain").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.audio_source().is_none());
        assert_eq!(args.total_frames(), 600);

        let config = args.build_config().unwrap();
        assert_eq!(config, VisualizerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--segments",
            "32",
            "--noise",
            "perlin",
            "--seed",
            "9",
            "--solid",
            "--audio",
            "song.mp3",
        ]);
        let config = args.build_config().unwrap();

        assert_eq!(config.terrain.segments, 32);
        assert!(!config.terrain.wireframe);
        assert_eq!(config.noise.kind, NoiseKind::Perlin);
        assert_eq!(config.noise.seed, 9);
        assert!(matches!(args.audio_source(), Some(AudioSource::Url(ref u)) if u == "song.mp3"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = parse(&["--segments", "0"]);
        assert!(args.build_config().is_err());
    }

    #[test]
    fn test_audio_conflicts_with_default_track() {
        let result = Args::try_parse_from(["music-terrain", "--audio", "a.wav", "--default-track"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_fps_runs_at_one_frame_per_second() {
        let args = parse(&["--fps", "0", "--duration", "3"]);
        assert_eq!(args.frame_time(), 1.0);
        assert_eq!(args.total_frames(), 3);
    }
}
