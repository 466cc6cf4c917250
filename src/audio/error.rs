//! Audio loading and playback errors.

use thiserror::Error;

/// Errors surfaced by audio loading and playback
///
/// All of them are recoverable: the caller resets its load controls and the
/// terrain keeps animating on noise alone.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The source could not be retrieved (network failure, missing file, bad status)
    #[error("failed to fetch audio from {source_label}: {reason}")]
    Fetch {
        source_label: String,
        reason: String,
    },

    /// The bytes are not decodable audio
    #[error("failed to decode audio from {source_label}: {reason}")]
    Decode {
        source_label: String,
        reason: String,
    },

    /// Input rejected before decoding because it is not audio-typed
    #[error("unsupported input {source_label}: type '{mime_type}' is not audio")]
    UnsupportedInput {
        source_label: String,
        mime_type: String,
    },

    /// No usable output device or stream
    #[error("audio device error: {0}")]
    Device(String),

    /// The built-in default track could not be rendered
    #[error("default track synthesis failed: {0}")]
    Synthesis(String),

    /// The background loader thread could not be started or died mid-load
    #[error("audio loader thread failed: {0}")]
    Worker(String),

    /// A load request arrived while another one was still running
    #[error("an audio load is already in progress ({0})")]
    LoadInProgress(String),
}
