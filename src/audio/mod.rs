//! Audio capture and FFT analysis.
//!
//! Decodes a source into memory, plays it in a loop through an output
//! backend, and analyses what was just played into a byte-scaled frequency
//! snapshot for the terrain.

mod analyser;
mod error;
mod loader;
mod playback;
mod source;
mod synthesis;
mod system;

// Re-export public types
pub use analyser::{blackman_window, SpectrumAnalyser};
pub use error::AudioError;
pub use loader::AudioLoader;
pub use playback::{
    ActiveOutput, CpalBackend, HeadlessBackend, OutputBackend, Playback, SharedPlayback,
};
pub use source::{decode_bytes, load, mime_for_path, AudioSource, DecodedAudio};
pub use synthesis::{render_composition, render_default_track, DEFAULT_COMPOSITION};
pub use system::{AudioEngine, AudioSession};
